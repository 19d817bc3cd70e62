//! `glimmer run`

use std::io;

use anyhow::{Context, Result};
use glimmer_engine::{LoopConfig, Peripherals, SimulatedLed, Startup, SystemClock};
use tracing::info;

use super::RunArgs;

/// Start up, then loop until halted or `--iterations` is reached.
pub fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => LoopConfig::load(path)?,
        None => LoopConfig::default(),
    };
    if let Some(period_ms) = args.period_ms {
        config.period_ms = period_ms;
    }
    let blob = args.model.load()?;
    info!(model = %args.model.describe(), "starting");

    let board = Peripherals::new(SystemClock::new(), SimulatedLed::new(), io::stdout().lock());
    let mut control = Startup::new(config)
        .start(&blob, board)
        .context("start-up failed")?;

    let limit = args.iterations;
    let report = control
        .run(|done| limit.is_none_or(|max| done < max))
        .context("control loop halted")?;

    info!(
        iterations = report.iterations,
        elapsed_ms = report.elapsed.as_millis() as u64,
        mean_abs_error = report.mean_abs_error,
        max_abs_error = report.max_abs_error,
        led_level = control.peripherals().actuator.level(),
        "run complete"
    );
    Ok(())
}
