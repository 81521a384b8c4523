//! nfnn CLI
//!
//! Single-command training entry point for the nfnn library.
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! nfnn train xor.yaml
//!
//! # Train with overrides
//! nfnn train xor.yaml --epochs 500 --lr 0.01 --output weights.json
//!
//! # Validate config
//! nfnn validate xor.yaml
//!
//! # Show config info
//! nfnn info xor.yaml --format json
//! ```

use clap::Parser;
use nfnn::config::{
    apply_overrides, load_config, read_config, run_training, validate_config, Cli, Command,
    InfoArgs, OutputFormat, TrainArgs, ValidateArgs,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configure output based on verbose/quiet flags
    let log_level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };
    init_logger(log_level);

    let result = match cli.command {
        Command::Train(args) => run_train(args, log_level),
        Command::Validate(args) => run_validate(args, log_level),
        Command::Info(args) => run_info(args, log_level),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

/// Route library records through env_logger; `RUST_LOG` still wins when set
fn init_logger(level: LogLevel) {
    let filter = match level {
        LogLevel::Quiet => "error",
        LogLevel::Normal => "warn",
        LogLevel::Verbose => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();
}

fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("nfnn: Training from {}", args.config.display()),
    );

    // Overrides apply before validation
    let mut spec = read_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args);
    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Model: {}-{}-{} ({}, init={})",
            spec.model.inputs,
            spec.model.hidden,
            spec.model.outputs,
            spec.model.activation,
            spec.model.init
        ),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Optimizer: {} (lr={})",
            spec.optimizer.name, spec.optimizer.lr
        ),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!("  Epochs: {}", spec.training.epochs),
    );

    if args.dry_run {
        log(
            level,
            LogLevel::Normal,
            "Dry run - config validated successfully",
        );
        return Ok(());
    }

    let result = run_training(&spec).map_err(|e| format!("Training error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Loss: {:.6} -> {:.6} over {} epochs",
            result.initial_loss, result.final_loss, result.epochs
        ),
    );
    if let Some(output) = &spec.output {
        log(
            level,
            LogLevel::Normal,
            &format!("Saved parameters to {}", output.display()),
        );
    }
    log(level, LogLevel::Normal, "Training complete!");
    Ok(())
}

fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating config: {}", args.config.display()),
    );

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed {
        println!();
        println!("Configuration Summary:");
        println!(
            "  Model: {} -> {} -> {}",
            spec.model.inputs, spec.model.hidden, spec.model.outputs
        );
        println!("  Activation: {}", spec.model.activation);
        println!("  Init: {}", spec.model.init);
        println!();
        println!("  Optimizer: {}", spec.optimizer.name);
        println!("  Learning rate: {}", spec.optimizer.lr);
        let mut extra: Vec<_> = spec.optimizer.params.iter().collect();
        extra.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in extra {
            println!("  {key}: {value}");
        }
        println!();
        println!("  Epochs: {}", spec.training.epochs);
        println!("  Loss: {}", spec.training.loss);
        println!("  Seed: {}", spec.training.seed);
        match spec.training.batch_size {
            Some(batch_size) => println!("  Batch size: {batch_size} (shuffled)"),
            None => println!("  Batch size: full"),
        }
        println!();
        println!(
            "  Arenas: {} bytes (parameters), {} bytes (step)",
            spec.memory.parameter_arena_bytes, spec.memory.step_arena_bytes
        );
        if let Some(output) = &spec.output {
            println!("  Output: {}", output.display());
        }
    }

    Ok(())
}

fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Configuration Info:");
            println!();
            println!(
                "Model: {}-{}-{} {}",
                spec.model.inputs, spec.model.hidden, spec.model.outputs, spec.model.activation
            );
            println!(
                "Optimizer: {} (lr={})",
                spec.optimizer.name, spec.optimizer.lr
            );
            println!("Epochs: {}", spec.training.epochs);
            println!("Loss: {}", spec.training.loss);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&spec)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&spec)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
