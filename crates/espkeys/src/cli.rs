//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use espkeys_core::Mode;

/// espkeys - Deterministic ESPHome secrets generation
#[derive(Parser, Debug)]
#[command(name = "espkeys")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate secrets for devices in a folder
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Folder containing ESPHome YAMLs (recursively scanned)
    pub folder: Utf8PathBuf,

    /// Type of secret to derive
    #[arg(short, long, default_value = "api")]
    pub mode: Mode,

    /// Master secret (string) for deterministic derivation
    #[arg(long, conflicts_with = "master_secret_file")]
    pub master_secret: Option<String>,

    /// Path to file containing the master secret
    ///
    /// Falls back to the ESPHOME_MASTER_SECRET environment variable when
    /// neither this nor --master-secret is given.
    #[arg(long)]
    pub master_secret_file: Option<Utf8PathBuf>,

    /// Path to secrets.yaml to create/update
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,

    /// Print resulting key/value pairs instead of writing a file
    #[arg(long)]
    pub print: bool,

    /// Output the run summary as JSON
    #[arg(long, conflicts_with = "print")]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["espkeys", "generate", "./devices"]);
        let Commands::Generate(args) = cli.command;

        assert_eq!(args.folder, Utf8PathBuf::from("./devices"));
        assert_eq!(args.mode, Mode::Api);
        assert!(args.output.is_none());
        assert!(!args.print);
    }

    #[test]
    fn test_generate_ota_mode() {
        let cli = Cli::parse_from([
            "espkeys",
            "generate",
            "./devices",
            "--mode",
            "ota",
            "--output",
            "secrets.yaml",
        ]);
        let Commands::Generate(args) = cli.command;

        assert_eq!(args.mode, Mode::Ota);
        assert_eq!(args.output, Some(Utf8PathBuf::from("secrets.yaml")));
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let result = Cli::try_parse_from(["espkeys", "generate", "./devices", "--mode", "psk"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_literal_and_file_secret_conflict() {
        let result = Cli::try_parse_from([
            "espkeys",
            "generate",
            "./devices",
            "--master-secret",
            "x",
            "--master-secret-file",
            "master.key",
        ]);
        assert!(result.is_err());
    }
}
