mod cli;
mod paths;
mod run;

use std::path::Path;

use anyhow::{Context, Result};
use cli::{Command, ConfigAction};
use paths::AppPaths;
use reveal::{Keyframe, Timeline};
use serde::Serialize;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let config = cli.config.as_deref();
    match cli.command {
        Some(Command::Timeline(args)) => run_timeline(config, args.json),
        Some(Command::Config(config_cmd)) => match config_cmd.action {
            ConfigAction::Where => run_config_where(config),
        },
        None => run::run(cli.run, config),
    }
}

#[derive(Serialize)]
struct TimelineReport {
    total_ms: u64,
    panels: usize,
    keyframes: Vec<Keyframe>,
}

fn run_timeline(config: Option<&Path>, json: bool) -> Result<()> {
    let paths = AppPaths::discover()?;
    let loaded = run::load_scene(config, &paths.config_file())?;
    let timeline = Timeline::from_config(&loaded.scene);
    let report = TimelineReport {
        total_ms: timeline.total().as_millis() as u64,
        panels: timeline.panel_count(),
        keyframes: timeline.keyframes(),
    };

    if json {
        let encoded =
            serde_json::to_string_pretty(&report).context("failed to encode timeline as JSON")?;
        println!("{encoded}");
        return Ok(());
    }

    println!("Reveal timeline ({} panels, {} ms):", report.panels, report.total_ms);
    for frame in &report.keyframes {
        println!("  {:>6} ms  {}", frame.at_ms, frame.label);
    }
    Ok(())
}

fn run_config_where(config: Option<&Path>) -> Result<()> {
    let paths = AppPaths::discover()?;
    let file = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file());
    println!("Configuration:");
    println!(
        "  dir:    {}{}",
        paths.config_dir().display(),
        if paths.overridden() {
            " (from NOIRSMOKE_CONFIG_DIR)"
        } else {
            ""
        }
    );
    println!(
        "  file:   {} ({})",
        file.display(),
        if file.exists() { "present" } else { "missing" }
    );
    Ok(())
}
