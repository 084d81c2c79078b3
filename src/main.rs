use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use reid_models::{
    Registry, WeightStore, config::ZooConfig, registry::BUILTIN_MODELS, show_available_models,
};

#[derive(Debug, Parser)]
#[command(name = "reid-models", version, about = "Person re-identification model zoo")]
struct Cli {
    /// JSON configuration file, the environment is used when missing.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the directory holding the pretrained checkpoints.
    #[arg(long, global = true)]
    weights_dir: Option<PathBuf>,
    /// Fails when a published ImageNet checkpoint is missing.
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lists the available architectures.
    List,
    /// Builds an architecture and prints its summary.
    Build(BuildArgs),
    /// Saves the parameters of a randomly initialized architecture.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct BuildArgs {
    name: String,
    #[arg(long)]
    num_classes: usize,
    #[arg(long, default_value = "softmax")]
    loss: String,
    #[arg(long)]
    no_pretrained: bool,
    #[arg(long)]
    cpu: bool,
}

#[derive(Debug, Args)]
struct ExportArgs {
    name: String,
    #[arg(long)]
    num_classes: usize,
    #[arg(long, default_value = "softmax")]
    loss: String,
    #[arg(long)]
    out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let registry = registry(cli.config.as_deref(), cli.weights_dir, cli.strict)?;
    debug!("checkpoints are read from {}", registry.store().dir().display());

    match cli.command {
        Command::List => show_available_models(),
        Command::Build(args) => {
            let net = registry.build_with(
                &args.name,
                args.num_classes,
                &args.loss,
                !args.no_pretrained,
                !args.cpu,
            )?;
            println!("{}", serde_json::to_string_pretty(&net.summary())?);
        }
        Command::Export(args) => {
            let net = registry.build_with(&args.name, args.num_classes, &args.loss, false, false)?;
            WeightStore::save(&net, &args.out)
                .with_context(|| format!("failed to export {}", args.name))?;
            info!("exported {} to {}", args.name, args.out.display());
        }
    }

    Ok(())
}

fn registry(config: Option<&Path>, weights_dir: Option<PathBuf>, strict: bool) -> Result<Registry> {
    let mut config = match config {
        Some(path) => ZooConfig::from_json_file(path)
            .with_context(|| format!("invalid configuration {}", path.display()))?,
        None => ZooConfig::from_env(),
    };

    if let Some(dir) = weights_dir {
        config = config.with_weights_dir(dir);
    }
    if strict {
        config = config.with_strict_checkpoints(true);
    }

    Ok(Registry::new(BUILTIN_MODELS, WeightStore::from_config(&config)))
}
