mod cli;

use gifsqueeze::config::{self, Config};
use gifsqueeze::passthrough::try_passthrough;
use gifsqueeze::search::{
    CompressionTarget, Encoder, GifsicleEncoder, Orchestrator, RunReport, RunStatus,
};
use gifsqueeze::sweep;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use gifsqueeze_av::{check_tool, check_tool_at, probe_animation, GIFSICLE};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "gifsqueeze=trace,gifsqueeze_av=debug".to_string()
        } else {
            "gifsqueeze=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Sweep {
            dir,
            out_dir,
            from,
            to,
            step,
            target,
            threads,
        }) => {
            let target_kb = target.unwrap_or(config.defaults.target_kb);
            let threads = threads.unwrap_or(config.defaults.threads);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_sweep(
                &config, &dir, &out_dir, from, to, step, target_kb, threads,
            ))
        }
        Some(Commands::Probe { file, json }) => probe_file(&file, json),
        Some(Commands::CheckTools) => check_tools(&config),
        None => {
            let input = cli.input.context("missing <INPUT>")?;
            let output = cli.output.context("missing <OUTPUT>")?;
            let target = CompressionTarget::from_cli_units(
                cli.target.unwrap_or(config.defaults.target_kb),
                cli.min_frames.unwrap_or(config.defaults.min_frames_percent),
                cli.threads.unwrap_or(config.defaults.threads),
            )
            .map_err(engine_error)?;

            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(compress(&config, &input, &output, &target))?;
            print_report(&report, cli.json)
        }
    }
}

fn orchestrator(config: &Config) -> Orchestrator {
    let encoder: Arc<dyn Encoder> = Arc::new(GifsicleEncoder::new(
        config.tools.gifsicle.clone(),
        config.encoder_timeout(),
    ));
    Orchestrator::new(encoder, config.search_options())
}

/// Surface the error category alongside the message.
fn engine_error(err: gifsqueeze::Error) -> anyhow::Error {
    anyhow::anyhow!("{} [{}]", err, err.kind())
}

async fn compress(
    config: &Config,
    input: &Path,
    output: &Path,
    target: &CompressionTarget,
) -> Result<RunReport> {
    let start = Instant::now();

    if config.output.passthrough_small_inputs {
        let (src, dest, limits) = (input.to_path_buf(), output.to_path_buf(), *target);
        let passed = tokio::task::spawn_blocking(move || try_passthrough(&src, &dest, &limits))
            .await?
            .map_err(engine_error)?;
        if let Some(report) = passed {
            tracing::info!("Finished in {:?}", start.elapsed());
            return Ok(report);
        }
    }

    tracing::debug!("Target: {:?}", target);
    let report = orchestrator(config)
        .run(input, output, target)
        .await
        .map_err(engine_error)?;
    tracing::info!("Finished in {:?}", start.elapsed());
    Ok(report)
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = match report.status {
        RunStatus::Success => "success",
        RunStatus::BestEffort => "best effort (target not reachable)",
    };
    println!("Status:   {}", status);
    println!("Target:   {} bytes", report.target_bytes);
    println!(
        "Achieved: {} bytes (from {} bytes)",
        report.achieved_bytes, report.original_bytes
    );
    println!(
        "Frames:   {} of {}",
        report.retained_frames, report.original_frames
    );
    println!("Strategy: {}", report.winner);
    println!(
        "Evaluated {} strategies ({} failed)",
        report.evaluated, report.failed
    );
    println!("Output:   {}", report.output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_sweep(
    config: &Config,
    dir: &Path,
    out_dir: &Path,
    from: u32,
    to: u32,
    step: u32,
    target_kb: f64,
    threads: usize,
) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Input directory does not exist: {:?}", dir);
    }

    let floors = sweep::floors(from, to, step).map_err(engine_error)?;
    let target_bytes = CompressionTarget::from_cli_units(target_kb, from as f64, threads)
        .map_err(engine_error)?
        .target_size_bytes();
    let inputs = sweep::discover_inputs(dir).map_err(engine_error)?;
    if inputs.is_empty() {
        println!("No GIF files found in {}", dir.display());
        return Ok(());
    }

    let entries = sweep::sweep(
        &orchestrator(config),
        &inputs,
        out_dir,
        &floors,
        target_bytes,
        threads,
    )
    .await
    .map_err(engine_error)?;

    for entry in &entries {
        let name = entry.input.display();
        match (&entry.report, entry.floor_percent) {
            (Some(report), Some(floor)) => println!(
                "✓ {} -> {} bytes at {}% floor ({})",
                name, report.achieved_bytes, floor, report.winner
            ),
            _ => println!(
                "✗ {} skipped: {}",
                name,
                entry.skipped.as_deref().unwrap_or("no result")
            ),
        }
    }

    let kept = entries.iter().filter(|e| e.report.is_some()).count();
    println!("\n{} of {} files written to {}", kept, entries.len(), out_dir.display());
    Ok(())
}

fn probe_file(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let info = probe_animation(file)?;

    if json {
        let json_str = serde_json::to_string_pretty(&info)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", info.path.display());
        println!("Size: {} bytes", info.file_size);
        println!("Canvas: {}x{}", info.width, info.height);
        println!("Frames: {}", info.frame_count());
        let total = info.duration_cs();
        println!("Duration: {}.{:02}s", total / 100, total % 100);
    }

    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tool = match &config.tools.gifsicle {
        Some(path) => check_tool_at(GIFSICLE, path),
        None => check_tool(GIFSICLE),
    };

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }
    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }
    println!();

    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("gifsicle is missing. Install it or set [tools] gifsicle in the config.");
    }

    Ok(())
}
