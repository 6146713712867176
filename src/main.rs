use anyhow::Context;
use clap::Parser;
use greenscan_lib::cli::{Cli, Command, HistoryCommand};
use greenscan_lib::commands::{history_cmds, ping, scan_cmds, AppContext};
use greenscan_lib::services::config::ClientConfig;
use greenscan_lib::types::scan::ScanType;
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    greenscan_lib::init_logging();
    let cli = Cli::parse();
    let ctx = AppContext::init(ClientConfig::from_env()).await;

    match cli.command {
        Command::Scan(args) => {
            let request = scan_cmds::ScanRequest {
                image: args.image,
                scan_type: if args.garment {
                    ScanType::Garment
                } else {
                    ScanType::Label
                },
                clothing_type: args.clothing_type,
                with_alternatives: args.alternatives,
            };
            let view = scan_cmds::scan_image(&ctx, request)
                .await
                .map_err(|e| anyhow::anyhow!("{}: {e}", e.user_message()))?;
            print_json(&view)?;
        }
        Command::History(HistoryCommand::List) => {
            let entries = history_cmds::list_history(&ctx)
                .await
                .context("failed to list scan history")?;
            print_json(&entries)?;
        }
        Command::History(HistoryCommand::Show { id, alternatives }) => {
            let view = history_cmds::show_history(&ctx, &id, alternatives)
                .await
                .with_context(|| format!("failed to open scan {id}"))?;
            print_json(&view)?;
        }
        Command::History(HistoryCommand::Delete { id }) => {
            history_cmds::delete_history(&ctx, &id)
                .await
                .with_context(|| format!("failed to delete scan {id}"))?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        Command::Ping => {
            let status = ping(&ctx).await?;
            print_json(&status)?;
        }
    }

    Ok(())
}
