use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ps_core::EngineConfig;
use ps_engine::EngineBuilder;
use ps_script::load_script_path;
use ps_sim::{apply_overrides, load_engine_config, run_script, Opts};
use ps_trace::TraceObserver;

fn main() -> Result<()> {
    let opts = Opts::parse();

    let llv = match opts.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        llv,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let policy = opts.policy().context("Invalid scheduling policy")?;
    let script = load_script_path(&opts.script)
        .with_context(|| format!("Failed to load script {}", opts.script.display()))?;
    let base = match &opts.config {
        Some(path) => load_engine_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let config = apply_overrides(base, policy, script.len(), &opts.sems);

    let script_name = opts
        .script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Script path has no file name")?;
    fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("Failed to create {}", opts.output_dir.display()))?;
    let out_path = opts.output_dir.join(opts.format.file_name(&opts.policy, &script_name));
    let writer = opts
        .format
        .create(&out_path)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;

    let engine = EngineBuilder::new(config)
        .observer(TraceObserver::new(writer))
        .build()
        .context("Failed to start the engine")?;
    let outcome = run_script(&engine, &script, opts.jitter());
    let mut observer = engine.finish().context("Failed to stop the engine")?;

    let summary = outcome.context("Simulation failed")?;
    if let Some(e) = observer.take_error() {
        return Err(e).with_context(|| format!("Failed to write {}", out_path.display()));
    }
    info!(
        "{} under {policy}: {} actors finished by {}, {} records written to {}",
        script_name,
        summary.exit_times.len(),
        summary.makespan(),
        observer.records(),
        out_path.display()
    );
    Ok(())
}
