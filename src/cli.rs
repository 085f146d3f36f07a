//! Command-line interface definitions for NewsRadar.
//!
//! Most behavior lives in the YAML config; the CLI carries the config path
//! plus a few per-invocation overrides.

use clap::Parser;

/// Command-line arguments for the NewsRadar application.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "newsradar.yaml")]
    pub config: String,

    /// Override the history CSV path from the config
    #[arg(long)]
    pub history_file: Option<String>,

    /// Override the digest text file path from the config
    #[arg(long)]
    pub digest_file: Option<String>,

    /// Override the maximum article age in days
    #[arg(long)]
    pub max_age_days: Option<u32>,

    /// Notification recipient (overrides the config)
    #[arg(long, env = "RECEIVER_EMAIL")]
    pub receiver_email: Option<String>,

    /// Skip the notification email; storage outputs are still written
    #[arg(long)]
    pub no_email: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["newsradar"]);
        assert_eq!(cli.config, "newsradar.yaml");
        assert!(cli.history_file.is_none());
        assert!(!cli.no_email);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "newsradar",
            "-c",
            "/etc/newsradar.yaml",
            "--history-file",
            "/var/lib/newsradar/articles.csv",
            "--max-age-days",
            "30",
            "--no-email",
        ]);
        assert_eq!(cli.config, "/etc/newsradar.yaml");
        assert_eq!(
            cli.history_file.as_deref(),
            Some("/var/lib/newsradar/articles.csv")
        );
        assert_eq!(cli.max_age_days, Some(30));
        assert!(cli.no_email);
    }
}
