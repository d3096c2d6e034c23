//! orrery-assets - orrery model generation tool
//!
//! Generates the sphere, skybox and ring glTF models and post-processes the
//! body documents (embed geometry, externalize textures, attach the sun light).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod generate;
mod manifest;

#[derive(Parser)]
#[command(name = "orrery-assets")]
#[command(about = "Orrery glTF model tool")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every model described by the manifest
    Generate {
        /// Path to assets.toml manifest
        #[arg(default_value = "assets.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite existing body documents in place
    Process {
        /// Path to assets.toml manifest
        #[arg(default_value = "assets.toml")]
        manifest: PathBuf,

        /// Models directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without writing anything
    Check {
        /// Path to assets.toml manifest
        #[arg(default_value = "assets.toml")]
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match cli.command {
        Commands::Generate { manifest, output } => {
            tracing::info!("Generating models from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            let dir = config.output_dir(output.as_deref());
            let written = generate::generate_all(&config, dir)?;
            tracing::info!("Generated {} files in {:?}", written.len(), dir);
        }

        Commands::Process { manifest, output } => {
            let config = manifest::load_manifest(&manifest)?;
            let dir = config.output_dir(output.as_deref());
            let geometry_bin = dir.join(&config.process.geometry_bin);

            let report = orrery_gltf::process_models(
                dir,
                &config.body_names(),
                Some(&geometry_bin),
                &config.process.options,
            )?;
            tracing::info!(
                "Processed {} documents ({} missing, {} warnings)",
                report.rewritten(),
                report.missing(),
                report.warning_count()
            );
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }
    }

    Ok(())
}
