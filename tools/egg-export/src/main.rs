//! egg-export - glTF skeletal animation to Panda3D .egg exporter
//!
//! Samples animation clips frame by frame and writes them as `.egg`
//! animation tables, one file per clip.

use anyhow::Result;
use clap::{Parser, Subcommand};
use egg_anim::{EggOptions, FileSink, MemorySink};
use std::path::PathBuf;

// Use modules from library
use egg_export::{animation, manifest, scene};

#[derive(Parser)]
#[command(name = "egg-export")]
#[command(about = "Batch export of skeletal animations to Panda3D .egg files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every selected animation of a manifest
    Build {
        /// Path to egg-export.toml manifest
        #[arg(default_value = "egg-export.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest and source animations without writing
    Check {
        /// Path to egg-export.toml manifest
        #[arg(default_value = "egg-export.toml")]
        manifest: PathBuf,
    },

    /// Export a single animation clip from glTF
    Animation {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .egg file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Animation name (default: first animation)
        #[arg(short, long)]
        animation: Option<String>,

        /// Skin name (default: first skin)
        #[arg(short, long)]
        skin: Option<String>,

        /// Frame rate for sampling (default: 30)
        #[arg(short, long)]
        frame_rate: Option<f32>,

        /// First frame, inclusive (default: 0)
        #[arg(long)]
        from: Option<i32>,

        /// Last frame, inclusive (default: end of clip)
        #[arg(long)]
        to: Option<i32>,

        /// Bundle name (default: skin name)
        #[arg(short, long)]
        bundle: Option<String>,

        /// List available animations instead of exporting
        #[arg(long)]
        list: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building animations from {:?}", manifest);
            }
            let config = manifest::ExportManifest::load(&manifest)?;
            let report = manifest::build_all(&config, &manifest, output.as_deref())?;

            if verbose {
                for item in &report.exported {
                    tracing::info!(
                        "  {} -> {:?}: {} bones, {} frames, {} bytes",
                        item.name,
                        item.path,
                        item.summary.bone_count,
                        item.summary.frame_count,
                        item.summary.bytes_written
                    );
                }
            }
            for item in &report.failed {
                tracing::error!("  {}: {:#}", item.name, item.error);
            }

            if !report.is_success() {
                anyhow::bail!(
                    "{} of {} animations failed to export",
                    report.failed.len(),
                    report.failed.len() + report.exported.len()
                );
            }
            tracing::info!(
                "Build complete! {} exported, {} skipped",
                report.exported.len(),
                report.skipped
            );
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            manifest::check(&manifest)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Animation {
            input,
            output,
            animation,
            skin,
            frame_rate,
            from,
            to,
            bundle,
            list,
        } => {
            let fps = frame_rate.unwrap_or(animation::DEFAULT_FRAME_RATE);
            if list {
                scene::list_animations(&input, fps)?;
                return Ok(());
            }

            let (scene, rig) = animation::load_rig(&input, skin.as_deref())?;
            let animation_name = match animation {
                Some(name) => name,
                None => scene
                    .animations()
                    .into_iter()
                    .next()
                    .map(|info| info.name)
                    .ok_or_else(|| anyhow::anyhow!("No animations found in glTF file"))?,
            };

            let clip = animation::ClipExport {
                animation_name: &animation_name,
                fps,
                frame_range: animation::frame_range(&scene, &animation_name, fps, from, to),
                options: EggOptions::new(animation::bundle_name(bundle.as_deref(), &rig)),
            };

            match output {
                Some(output) => {
                    tracing::info!("Exporting animation {:?} -> {:?}", input, output);
                    animation::export_clip(&scene, &rig, &clip, &mut FileSink::new(output))?;
                    tracing::info!("Done!");
                }
                None => {
                    let mut sink = MemorySink::new();
                    animation::export_clip(&scene, &rig, &clip, &mut sink)?;
                    print!("{}", sink.contents());
                }
            }
        }
    }

    Ok(())
}
