//! Diagnostic colorbar overlay.
//!
//! `colorbar run` renders four cell groups every display frame: a binary
//! barcode and a hex-color strip for the frame counter, plus hex-color
//! strips for the wall clock and the presentation timestamp. A camera or
//! frame-capture pipeline can recover exact frame indices and timing from
//! a single still. `colorbar decode` is the observer half: it turns
//! captured cell colors back into values.

mod term;
mod vsync;

use std::io;

use clap::{Args, Parser, Subcommand};

use colorbars::Argb;
use overlay::driver::{FrameDriver, SystemWallClock};
use term::TermSurface;
use vsync::TickVsync;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("terminal io failed: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    BadColor(#[from] colorbars::ParseArgbError),
    #[error("cells could not be decoded: {0}")]
    Decode(#[from] colorbars::DecodeError),
    #[error("json render failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "colorbar",
    about = "Diagnostic colorbar overlay for latency and frame-drop measurement"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the overlay until Ctrl-C.
    Run(RunCommand),
    /// Recover values from captured cell colors.
    Decode(DecodeCommand),
}

#[derive(Args, Debug)]
struct RunCommand {
    /// Display refresh rate to emulate, in frames per second.
    #[arg(long, env = "COLORBAR_REFRESH_HZ", default_value_t = 60.0)]
    refresh_hz: f64,
}

#[derive(Args, Debug)]
struct DecodeCommand {
    #[command(subcommand)]
    command: DecodeSubcommand,
}

#[derive(Subcommand, Debug)]
enum DecodeSubcommand {
    /// Decode a 32-cell black/white barcode into a frame counter.
    Barcode {
        /// Cell colors in display order, e.g. `ff000000` or `#ffffffff`.
        cells: Vec<String>,
    },
    /// Decode hex-color cells (8 or 16) into a counter or timestamp.
    Colorbars {
        /// Cell colors in display order, lowest-index cell first.
        cells: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(run) => run_overlay(run).await,
        Command::Decode(decode) => run_decode(&decode),
    }
}

async fn run_overlay(run: RunCommand) -> Result<(), CliError> {
    let (columns, rows) = crossterm::terminal::size()?;
    tracing::info!(refresh_hz = run.refresh_hz, columns, rows, "starting overlay");

    let mut surface = TermSurface::new(io::stdout(), columns, rows);
    tracing::info!(bound = surface.bound_groups().len(), "cell groups bound");
    surface.enter()?;

    let mut driver = FrameDriver::new(surface);
    let stop = driver.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.request_stop();
        }
    });

    let mut ticker = TickVsync::new(run.refresh_hz);
    driver.start(&mut ticker);
    let outcome = drive_frames(&mut driver, &mut ticker).await;

    // Restore the terminal even when a present() call failed mid-run.
    let restored = driver.surface_mut().leave();
    outcome?;
    restored?;

    tracing::info!(frames = driver.frame_count(), "overlay stopped");
    Ok(())
}

async fn drive_frames(
    driver: &mut FrameDriver<TermSurface<io::Stdout>, SystemWallClock>,
    ticker: &mut TickVsync,
) -> Result<(), CliError> {
    while ticker.take_registration() {
        let presentation_ts = ticker.next_frame().await;
        driver.on_frame(presentation_ts, ticker);
        driver.surface_mut().present()?;
    }
    Ok(())
}

fn run_decode(decode: &DecodeCommand) -> Result<(), CliError> {
    match &decode.command {
        DecodeSubcommand::Barcode { cells } => {
            let cells = parse_cells(cells)?;
            let value = colorbars::decode_barcode(&cells)?;
            print_json(&serde_json::json!({
                "kind": "barcode",
                "cells": cells.len(),
                "value": value,
            }))
        }
        DecodeSubcommand::Colorbars { cells } => {
            let cells = parse_cells(cells)?;
            let value = colorbars::decode_colorbars(&cells)?;
            print_json(&serde_json::json!({
                "kind": "colorbars",
                "cells": cells.len(),
                "value": value,
            }))
        }
    }
}

fn parse_cells(raw: &[String]) -> Result<Vec<Argb>, CliError> {
    raw.iter()
        .map(|cell| cell.parse::<Argb>().map_err(CliError::from))
        .collect()
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
