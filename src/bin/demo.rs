//! demo - end-to-end synthetic run of the proctoring pipeline
//!
//! Runs the monitor against a scripted `stub://` scene for a few seconds,
//! prints the resulting violation ledger as JSON, and writes the final
//! overlay frame to the output directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;

use proctor_monitor::alert::LogNotifier;
use proctor_monitor::{Monitor, MonitorConfig, ViolationLedger};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds for the synthetic session.
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    /// Synthetic frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Scene device (stub:// scheme), e.g. stub://two-faces.
    #[arg(long, default_value = "stub://candidate-phone")]
    device: String,
    /// Output directory for the final overlay snapshot.
    #[arg(long, default_value = "demo_out")]
    out: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }
    if !args.device.starts_with("stub://") {
        return Err(anyhow!("demo runs synthetic scenes; use a stub:// device"));
    }

    let mut cfg = MonitorConfig::default();
    cfg.camera.device = args.device.clone();
    cfg.camera.frame_rate = args.fps;

    let ledger = Arc::new(ViolationLedger::new());
    let mut monitor = Monitor::new(cfg, ledger.clone(), Box::new(LogNotifier));
    let handle = monitor.handle();

    monitor.start()?;

    let seconds = args.seconds;
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(seconds));
        handle.stop();
    });
    monitor.run()?;
    stopper
        .join()
        .map_err(|_| anyhow!("stop timer thread panicked"))?;

    let stats = monitor.stats();
    log::info!(
        "demo finished: {} frames processed, {} skipped",
        stats.frames_processed,
        stats.iterations_skipped
    );

    println!("{}", serde_json::to_string_pretty(&ledger.snapshot())?);

    fs::create_dir_all(&args.out)?;
    let overlay_path = Path::new(&args.out).join("overlay.png");
    monitor.overlay().canvas().save(&overlay_path)?;
    log::info!("overlay snapshot written to {}", overlay_path.display());

    Ok(())
}
