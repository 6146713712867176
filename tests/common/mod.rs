#![allow(dead_code)]

use greenscan_lib::services::config::ClientConfig;
use serde_json::{json, Value};
use std::io::Read;
use std::sync::{Arc, Mutex, Once};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

pub type Handler = Box<dyn Fn(&RecordedRequest) -> (u16, String) + Send + 'static>;

/// Local HTTP backend answering every request through `handler`.
/// Stops when dropped.
pub struct StubBackend {
    pub url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    server: Arc<Server>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubBackend {
    pub fn start(handler: Handler) -> Self {
        init_logger();
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = thread::spawn({
            let server = server.clone();
            let requests = requests.clone();
            move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let recorded = RecordedRequest {
                        method: request.method().as_str().to_string(),
                        path: request.url().to_string(),
                        body,
                    };
                    requests.lock().unwrap().push(recorded.clone());

                    let (status, body) = handler(&recorded);
                    let header =
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                    let response = Response::from_string(body)
                        .with_status_code(status)
                        .with_header(header);
                    let _ = request.respond(response);
                }
            }
        });

        Self {
            url: format!("http://{addr}"),
            requests,
            server,
            handle: Some(handle),
        }
    }

    /// Always answer with the same status and body.
    pub fn fixed(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::start(Box::new(move |_| (status, body.clone())))
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: Duration::from_secs(5),
            ..ClientConfig::with_base_url(self.url.clone())
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// In-memory scan-history store speaking the server's wire format.
pub fn history_backend(records: Vec<Value>) -> StubBackend {
    let records = Arc::new(Mutex::new(records));
    StubBackend::start(Box::new(move |req| {
        let mut records = records.lock().unwrap();
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/api/scan-history") => (200, Value::Array(records.clone()).to_string()),
            ("DELETE", path) if path.starts_with("/api/scan/") => {
                let id = urlencoding::decode(&path["/api/scan/".len()..])
                    .map(|id| id.into_owned())
                    .unwrap_or_default();
                let before = records.len();
                records.retain(|r| r["id"] != id.as_str());
                if records.len() < before {
                    (200, json!({"success": true}).to_string())
                } else {
                    (404, json!({"detail": "Scan not found"}).to_string())
                }
            }
            _ => (404, json!({"detail": "Not Found"}).to_string()),
        }
    }))
}

pub fn verdict_payload(sustainable: bool) -> Value {
    json!({
        "carbon_footprint": "12 kg CO2e",
        "material_composition": [
            {"material_name": "Polyester", "environmental_consequence": "Sheds microplastics"}
        ],
        "country_origin": "Bangladesh",
        "expected_durability": "2-3 years",
        "final_decision": sustainable,
        "sustainable_tips": ["Wash cold", "Line dry", "Repair seams"],
        "clothing_type": "jacket"
    })
}

pub fn wire_record(id: &str, timestamp: &str) -> Value {
    json!({
        "id": id,
        "image_base64": "data:image/jpeg;base64,/9j/4AAQ",
        "analysis": verdict_payload(false),
        "scan_type": "label",
        "timestamp": timestamp
    })
}

/// Smallest byte string the `image` crate sniffs as JPEG.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0];
