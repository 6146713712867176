pub mod config;
pub mod image_source;
pub mod remote;
pub mod report;
pub mod workflow;
