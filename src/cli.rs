use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "greenscan")]
#[command(about = "Scan clothing labels and garments for sustainability")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze an image file
    Scan(ScanArgs),

    /// Browse or delete stored scans
    #[command(subcommand)]
    History(HistoryCommand),

    /// Check that the backend answers
    Ping,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Photo of the label or garment
    pub image: PathBuf,

    /// The photo shows the whole garment rather than its label
    #[arg(long, default_value_t = false)]
    pub garment: bool,

    /// What kind of clothing the label belongs to (e.g. jacket)
    #[arg(long)]
    pub clothing_type: Option<String>,

    /// Look up sustainable alternatives when the item is judged unsustainable
    #[arg(long, default_value_t = false)]
    pub alternatives: bool,
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List stored scans, most recent first
    List,

    /// Re-open one stored scan
    Show {
        id: String,

        /// Look up sustainable alternatives when the item is judged unsustainable
        #[arg(long, default_value_t = false)]
        alternatives: bool,
    },

    /// Delete one stored scan. Not undoable.
    Delete { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_flags() {
        let cli = Cli::parse_from([
            "greenscan",
            "scan",
            "shirt.jpg",
            "--clothing-type",
            "shirt",
            "--alternatives",
        ]);
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(args.image, PathBuf::from("shirt.jpg"));
                assert!(!args.garment);
                assert_eq!(args.clothing_type.as_deref(), Some("shirt"));
                assert!(args.alternatives);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_parse_history_delete() {
        let cli = Cli::parse_from(["greenscan", "history", "delete", "abc-123"]);
        assert!(matches!(
            cli.command,
            Command::History(HistoryCommand::Delete { ref id }) if id == "abc-123"
        ));
    }
}
