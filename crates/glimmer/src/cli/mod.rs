//! The `glimmer` command-line interface.
//!
//! Diagnostic lines go to stdout; logs go to stderr.

mod export;
mod info;
pub mod monitor;
mod run;

pub use export::export;
pub use info::info;
pub use monitor::monitor;
pub use run::run;

use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glimmer_model::SineEncoding;

use crate::models;

/// Glimmer - a tiny quantized network driving an LED
#[derive(Debug, Parser)]
#[command(name = "glimmer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start up and run the inference loop, printing diagnostic lines
    Run(RunArgs),

    /// Show a model's schema version, tensors, and operators
    Info {
        /// Model to inspect.
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Write a compiled-in model to a file
    Export {
        /// Which compiled-in model.
        #[arg(long, value_enum, default_value_t = ModelChoice::Int8)]
        model: ModelChoice,

        /// Destination file
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Plot-companion: read diagnostic lines and report prediction error
    Monitor {
        /// Serial device or file to read (default: stdin)
        path: Option<PathBuf>,

        /// Rolling window length in samples
        #[arg(long, default_value_t = monitor::DEFAULT_WINDOW)]
        window: usize,
    },
}

/// Arguments of `glimmer run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Model to run.
    #[command(flatten)]
    pub model: ModelArgs,

    /// TOML loop configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop after this many iterations (default: run until halted)
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Override the iteration period in milliseconds
    #[arg(long)]
    pub period_ms: Option<u64>,
}

/// Compiled-in model selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModelChoice {
    /// Quantized int8 input and output
    Int8,
    /// Float32 throughout
    F32,
}

impl From<ModelChoice> for SineEncoding {
    fn from(choice: ModelChoice) -> Self {
        match choice {
            ModelChoice::Int8 => SineEncoding::Int8,
            ModelChoice::F32 => SineEncoding::Float32,
        }
    }
}

/// Where to take the model from.
#[derive(Debug, Args)]
pub struct ModelArgs {
    /// Compiled-in model (default: int8)
    #[arg(long, value_enum)]
    pub model: Option<ModelChoice>,

    /// Model blob on disk
    #[arg(long, conflicts_with = "model")]
    pub model_file: Option<PathBuf>,
}

impl ModelArgs {
    /// The model blob. A file is read whole; compiled-in blobs are borrowed.
    pub fn load(&self) -> Result<Cow<'static, [u8]>> {
        match &self.model_file {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("cannot read model {}", path.display()))?;
                Ok(Cow::Owned(bytes))
            }
            None => Ok(Cow::Borrowed(models::builtin(self.choice().into()))),
        }
    }

    /// Human-readable name of the selected model.
    pub fn describe(&self) -> String {
        match &self.model_file {
            Some(path) => path.display().to_string(),
            None => format!("builtin sine_{}", SineEncoding::from(self.choice()).name()),
        }
    }

    fn choice(&self) -> ModelChoice {
        self.model.unwrap_or(ModelChoice::Int8)
    }
}

/// Run a parsed command line.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Info { model } => info(&model),
        Commands::Export { model, output } => export(model, &output),
        Commands::Monitor { path, window } => monitor(path.as_deref(), window),
    }
}
