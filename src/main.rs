use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use hexworld::{
    config::ConfigLoader,
    export::ExportWriter,
    generate_from_config,
    stats::{log_report, StatisticsCoordinator},
    telemetry,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Procedural hex world map generator")]
struct Cli {
    /// Path to the run config YAML file
    #[arg(long, global = true, default_value = "scenarios/archipelago.yaml")]
    config: PathBuf,

    /// Override the configured log level (RUST_LOG still wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one map and export it
    Generate {
        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the map width
        #[arg(long)]
        width: Option<i32>,

        /// Override the map height
        #[arg(long)]
        height: Option<i32>,

        /// Directory for exported files
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Print and log the statistics report
        #[arg(long)]
        stats: bool,
    },
    /// Generate in the background and serve the result over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut run = ConfigLoader::new(".").load(&cli.config)?;
    let level = cli.log_level.unwrap_or_else(|| run.logging.level.clone());
    telemetry::init_logging(&level);

    match cli.command {
        Command::Generate {
            seed,
            width,
            height,
            export_dir,
            stats,
        } => {
            if let Some(seed) = seed {
                run.seed = seed;
            }
            if let Some(width) = width {
                run.map.width = width;
            }
            if let Some(height) = height {
                run.map.height = height;
            }
            if let Some(dir) = export_dir {
                run.export.dir = dir;
            }

            let map = generate_from_config(&run).await?;
            let report = StatisticsCoordinator::with_default_collectors().generate(&map.cells);
            if stats {
                log_report(&report);
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            let dir = ExportWriter::new(&run.export.dir).write(&map, &report)?;
            info!(
                run = %map.name,
                cells = map.cells.len(),
                rivers = map.rivers.len(),
                cities = map.city_count(),
                dir = %dir.display(),
                "generation finished"
            );
        }
        Command::Serve { host, port } => {
            web::run(WebServerConfig { run, host, port }).await?;
        }
    }
    Ok(())
}
