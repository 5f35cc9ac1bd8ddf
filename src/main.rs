mod app;
mod config;
mod data;
mod gui;
mod model;
mod pipeline;
mod symbols;

use app::App;
use clap::{Parser, ValueEnum};
use std::io;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, ValueEnum)]
enum GuiRendererChoice {
    Auto,
    Wgpu,
    Glow,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "TrendStock: linear-trend stock price exploration",
    after_help = "EXAMPLES:
    # Launch the window
    cargo run --release

    # Run the pipeline once without a window
    cargo run --release -- --symbols AAPL,MSFT,TSLA

    # Remote-desktop friendly rendering
    cargo run --release -- --renderer glow --safe-mode"
)]
struct Args {
    /// Run the pipeline once without a window — comma-separated symbols (e.g., NVDA,MSFT,AAPL)
    #[arg(long)]
    symbols: Option<String>,

    /// GUI renderer backend (auto|wgpu|glow). Useful for RDP compatibility.
    #[arg(long, value_enum, default_value_t = GuiRendererChoice::Wgpu)]
    renderer: GuiRendererChoice,

    /// Disable vsync/MSAA and hardware acceleration for remote desktops.
    #[arg(long)]
    safe_mode: bool,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trendstock=info,wgpu_core=error,wgpu_hal=error"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();
    let args = Args::parse();

    if let Some(ref symbols_str) = args.symbols {
        let symbols = symbols::parse_symbols(symbols_str);
        if symbols.is_empty() {
            error!("--symbols needs at least one ticker. Example: --symbols NVDA,MSFT,AAPL");
            return Ok(());
        }

        let results = pipeline::run_predictions(&symbols).await;
        if results.is_empty() {
            info!("No valid predictions found.");
        } else {
            for result in &results {
                info!("{}: MSE = {:.2}", result.symbol, result.mse);
            }
            info!("Loaded {} predictions.", results.len());
        }
        return Ok(());
    }

    let mut options = eframe::NativeOptions::default();
    options.renderer = match args.renderer {
        GuiRendererChoice::Auto => eframe::Renderer::Wgpu,
        GuiRendererChoice::Wgpu => eframe::Renderer::Wgpu,
        GuiRendererChoice::Glow => eframe::Renderer::Glow,
    };

    if args.safe_mode {
        options.vsync = false;
        options.multisampling = 0;
        options.depth_buffer = 0;
        options.stencil_buffer = 0;
        options.hardware_acceleration = eframe::HardwareAcceleration::Off;
    }

    info!(
        "Launching window with renderer: {:?}, safe_mode={}",
        args.renderer, args.safe_mode
    );
    eframe::run_native(
        "TrendStock",
        options,
        Box::new(|_cc| Ok(Box::new(gui::GuiApp::new(App::new())))),
    )
    .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(())
}
