//! LED Pixel Art compiler
//!
//! Compiles an image into the JSON update commands a WLED-style LED
//! controller accepts, either once from the command line or on demand
//! through a small HTTP API.
//!
//! ## Rust concepts
//! - clap subcommands with `#[command(flatten)]` to share option groups
//! - `#[tokio::main]` on a helper so only `serve` starts a runtime
//! - `Box<dyn Error>` + `?` for error propagation in a binary
//!
//! ## Usage
//! ```sh
//! led-pixart-rs compile heart.png --wiring zigzag-forward --format shell --host wled.local
//! led-pixart-rs serve --images-dir ./images --port 8080
//! ```

use clap::{Parser, Subcommand};
use led_pixart_rs::config::CompileConfig;
use led_pixart_rs::server::{self, AppState};
use led_pixart_rs::{compiler, preview, sampler};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Compile pixel art into LED controller commands
#[derive(Parser)]
#[command(name = "led-pixart-rs")]
#[command(about = "Compile pixel art into LED controller update commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile one image and print the result to stdout
    Compile {
        /// Image file (PNG, JPEG, GIF or BMP)
        image: PathBuf,

        /// Also write all entries as one uncapped JSON update to this file
        #[arg(long)]
        full_frame: Option<PathBuf>,

        /// Also write a PNG preview of the sampled grid to this file
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Preview box size in pixels
        #[arg(long, default_value_t = preview::DEFAULT_CELL)]
        cell: u32,

        #[command(flatten)]
        config: CompileConfig,
    },

    /// Run the HTTP API
    Serve {
        /// Directory of images that can be compiled by name
        #[arg(long, default_value = "images")]
        images_dir: PathBuf,

        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so compiled output on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .init();

    match cli.command {
        Command::Compile {
            image,
            full_frame,
            preview: preview_path,
            cell,
            config,
        } => run_compile(image, full_frame, preview_path, cell, &config),
        Command::Serve { images_dir, port } => serve(images_dir, port),
    }
}

fn run_compile(
    image_path: PathBuf,
    full_frame: Option<PathBuf>,
    preview_path: Option<PathBuf>,
    cell: u32,
    config: &CompileConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Loading image: {}", image_path.display());
    let image = sampler::load(&image_path)?;
    let grid = sampler::sample(&image, config);
    let result = compiler::compile(&grid, config);

    println!("{}", result.output);
    eprintln!("{}", result.info_with_warnings());

    if let Some(path) = full_frame {
        std::fs::write(&path, &result.full_frame_json)?;
        tracing::info!("Wrote full frame to {}", path.display());
    }

    if let Some(path) = preview_path {
        preview::save(&grid, cell, &path)?;
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn serve(images_dir: PathBuf, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let images_dir = images_dir.canonicalize().unwrap_or_else(|_| {
        tracing::warn!("Could not canonicalize images dir, using as-is");
        images_dir.clone()
    });

    tracing::info!("LED Pixel Art server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Images dir: {}", images_dir.display());

    let app = server::create_router(AppState::new(images_dir));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C so in-flight requests can finish.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
