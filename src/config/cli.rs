//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! nfnn train xor.yaml
//! nfnn train xor.yaml --epochs 500 --lr 0.01 --output weights.json
//! nfnn validate xor.yaml
//! nfnn info xor.yaml --format yaml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// nfnn: arena-backed tensors with reverse-mode autograd
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "nfnn")]
#[command(version)]
#[command(about = "Train small feed-forward networks with an arena-backed autograd engine")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a model from YAML configuration
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),

    /// Display information about a configuration
    Info(InfoArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Override initialization seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override checkpoint output path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Dry run (validate config but don't train)
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show detailed validation report
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for info command
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Unknown output format: {}. Valid formats: text, json, yaml",
                s
            )),
        }
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a TrainSpec
pub fn apply_overrides(spec: &mut super::TrainSpec, args: &TrainArgs) {
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    if let Some(lr) = args.lr {
        spec.optimizer.lr = lr;
    }
    if let Some(seed) = args.seed {
        spec.training.seed = seed;
    }
    if let Some(output) = &args.output {
        spec.output = Some(output.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_command() {
        let cli = parse_args(["nfnn", "train", "config.yaml"]).unwrap();
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.config, PathBuf::from("config.yaml"));
                assert!(!args.dry_run);
                assert!(args.epochs.is_none());
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_parse_train_with_overrides() {
        let cli = parse_args([
            "nfnn",
            "train",
            "config.yaml",
            "--epochs",
            "10",
            "--lr",
            "0.001",
            "--seed",
            "7",
            "--output",
            "weights.json",
        ])
        .unwrap();

        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.epochs, Some(10));
                assert!((args.lr.unwrap() - 0.001).abs() < 1e-6);
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.output, Some(PathBuf::from("weights.json")));
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_parse_validate_detailed() {
        let cli = parse_args(["nfnn", "validate", "config.yaml", "--detailed"]).unwrap();
        match cli.command {
            Command::Validate(args) => assert!(args.detailed),
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_parse_info_formats() {
        let cli = parse_args(["nfnn", "info", "config.yaml"]).unwrap();
        match cli.command {
            Command::Info(args) => assert_eq!(args.format, OutputFormat::Text),
            _ => panic!("Expected Info command"),
        }

        let cli = parse_args(["nfnn", "info", "config.yaml", "--format", "YAML"]).unwrap();
        match cli.command {
            Command::Info(args) => assert_eq!(args.format, OutputFormat::Yaml),
            _ => panic!("Expected Info command"),
        }

        assert!(parse_args(["nfnn", "info", "config.yaml", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = parse_args(["nfnn", "validate", "config.yaml", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.quiet);

        let cli = parse_args(["nfnn", "-q", "info", "config.yaml"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        assert!(parse_args(["nfnn", "train"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut spec: super::super::TrainSpec = serde_yaml::from_str(
            r#"
model: {inputs: 2, hidden: 2, outputs: 1}
optimizer: {name: adam, lr: 0.03}
"#,
        )
        .unwrap();
        let args = TrainArgs {
            config: PathBuf::from("config.yaml"),
            epochs: Some(5),
            lr: None,
            seed: Some(9),
            output: Some(PathBuf::from("out.yaml")),
            dry_run: false,
        };

        apply_overrides(&mut spec, &args);
        assert_eq!(spec.training.epochs, 5);
        assert_eq!(spec.optimizer.lr, 0.03);
        assert_eq!(spec.training.seed, 9);
        assert_eq!(spec.output, Some(PathBuf::from("out.yaml")));
    }
}
