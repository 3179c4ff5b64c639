use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn, LevelFilter};

use lambda_power_tuner::config::{self, Config};
use lambda_power_tuner::outputs::PowerTunerOutputs;
use lambda_power_tuner::sam::{self, ParameterKey, Parameters};
use lambda_power_tuner::stack::{App, PowerTunerStack};
use lambda_power_tuner::template::Format;
use lambda_power_tuner::writer::{self, OutputSettings};

const DEFAULT_CONFIG_PATH: &str = "./power-tuner.yaml";

#[derive(Parser)]
#[command(name = "lambda-power-tuner")]
#[command(about = "Deploy AWS Lambda Power Tuning from the Serverless Application Repository", long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    synth: SynthArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the stack templates (default)
    Synth,

    /// Print the outputs of a deployed power tuner
    Outputs {
        /// Only this stack from the config file
        #[arg(short, long)]
        stack: Option<String>,
    },
}

// Global so they apply with or without an explicit `synth`.
#[derive(Args)]
struct SynthArgs {
    /// Output directory for synth
    #[arg(short, long, global = true, default_value = "cdk.out")]
    out: PathBuf,

    /// Template format for synth
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Application parameter (KEY=VALUE) for synth, overrides the config file
    #[arg(short, long = "parameter", global = true, value_parser = sam::parse_parameter)]
    parameters: Vec<(ParameterKey, String)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Format::Json,
            OutputFormat::Yaml => Format::Yaml,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let config = load_config(cli.config)?;
    match cli.command {
        None | Some(Commands::Synth) => synth(&config, cli.synth),
        Some(Commands::Outputs { stack }) => outputs(&config, stack.as_deref()).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    match config::parse(&path) {
        Ok(config) => Ok(config),
        Err(config::Error::FileNotFound(_)) if !explicit => {
            info!("No config at {}, using defaults", path.display());
            Ok(config::default_config())
        }
        Err(error) => Err(error).with_context(|| format!("Unable to load {}", path.display())),
    }
}

fn synth(config: &Config, args: SynthArgs) -> Result<()> {
    let overrides: Parameters = args.parameters.into_iter().collect();

    let mut app = App::new();
    for config_entry in config {
        let stack_name = match config_entry.stack_name.as_deref() {
            Some(stack_name) => stack_name,
            None => continue,
        };
        PowerTunerStack::new(&mut app, stack_name, config_entry.stack_props(&overrides))?;
    }

    let settings = OutputSettings {
        directory: args.out,
        format: args.format.into(),
    };
    let written = writer::synth(&app, &settings)?;
    info!("Synthesized {} template(s)", written.len());

    return Ok(());
}

async fn outputs(config: &Config, only: Option<&str>) -> Result<()> {
    let entries: Vec<_> = config
        .iter()
        .filter(|entry| only.is_none() || entry.stack_name.as_deref() == only)
        .collect();
    if entries.is_empty() {
        warn!("No stack in the config matches {}", only.unwrap_or("*"));
        return Ok(());
    }

    for config_entry in entries {
        let stack = PowerTunerOutputs::new(config_entry).await?;
        let outputs = stack
            .fetch()
            .await
            .with_context(|| format!("Unable to fetch outputs of {}", stack.stack_name))?;

        for (key, value) in &outputs {
            info!("{}: {} = {}", stack.stack_name, key, value);
        }
        if let Some(outputs_file) = &config_entry.outputs {
            writer::write_outputs(&outputs_file.location, &outputs)?;
        }
    }

    return Ok(());
}

fn setup_logging(verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}] {}: {}",
                Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        // the AWS SDK is chatty at debug level
        .level_for("aws_config", LevelFilter::Warn)
        .level_for("aws_smithy_http_tower", LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;

    return Ok(());
}
