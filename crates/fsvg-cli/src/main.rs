//! fSVG - Main Entry Point

use anyhow::Context;
use fsvg_engine::{Config, Engine};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: fsvg <input.svg> [output.svg] [--pretty] [--debug-css]";

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = Config::default();
    let mut paths = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--pretty" => config.pretty = true,
            "--debug-css" => config.debug_css_style = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ => paths.push(arg),
        }
    }

    let Some(input) = paths.first() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let engine = Engine::new(config);
    let doc = engine
        .load_file(input)
        .with_context(|| format!("failed to load {input}"))?;

    let b = doc.bounds();
    tracing::info!(
        "{}: {} nodes, bounds {}x{} at ({}, {})",
        input,
        doc.node_count(),
        b.width(),
        b.height(),
        b.left,
        b.top
    );

    if let Some(output) = paths.get(1) {
        engine
            .save_file(&doc, output)
            .with_context(|| format!("failed to write {output}"))?;
    }

    Ok(())
}
