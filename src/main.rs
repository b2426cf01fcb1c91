use clap::{Parser, Subcommand};
use map_compose::config::AppConfig;
use map_compose::legend::build_legend;
use map_compose::overlays::OverlayLayer;
use map_compose::types::OverlayId;
use map_compose::{HttpFetcher, MapCompositionController, SceneRenderer};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every overlay and write the composed map scene as JSON
    Compose {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the choropleth legend markup
    Legend {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path),
        None => Ok(AppConfig::default()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Compose { config, output } => {
            let app_config = load_config(config.as_deref())?;
            let output = output
                .clone()
                .unwrap_or_else(|| app_config.output.scene_path.clone());
            let zoom = app_config.map.zoom;

            let mut controller =
                MapCompositionController::new(app_config, SceneRenderer::new());
            let report = controller.initialize(&HttpFetcher::default()).await?;
            info!(loaded = ?report.loaded, failed = ?report.failed, "composition complete");

            if let Some(OverlayLayer::Markers(markers)) = controller.overlay(OverlayId::Markers) {
                let clusters = markers.clusters_at(zoom);
                info!(markers = markers.markers.len(), clusters = clusters.len(), zoom, "marker clusters");
            }

            controller.into_renderer().into_scene().write_to(&output)?;
        }
        Commands::Legend { config } => {
            let app_config = load_config(config.as_deref())?;
            let legend = build_legend(&app_config.legend)?;
            println!("{}", legend.to_html());
        }
    }

    Ok(())
}
