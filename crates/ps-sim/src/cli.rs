//! Command-line options for `pssim`.

use std::path::PathBuf;

use clap::Parser;

use ps_core::{CoreResult, Policy};
use ps_trace::TraceFormat;

use crate::runner::Jitter;

/// Simulate CPU scheduling and counting semaphores over a process script and
/// write the resulting Gantt chart.
///
/// Each script line describes one process: its arrival time, its id, then a
/// sequence of `C<n>` (CPU), `I<n>` (IO), `P<s>`/`V<s>` (semaphore) and `E`
/// (exit) ops.  The chart is written to `<output-dir>/gantt-<policy>-<script>`.
#[derive(Debug, Parser)]
#[clap(name = "pssim", version)]
pub struct Opts {
    /// Scheduling policy: 0 or fcfs, 1 or srtf, 2 or mlfq.
    pub policy: String,

    /// Process script to run.
    pub script: PathBuf,

    /// Directory the chart is written to.  Created if missing.
    #[clap(short = 'o', long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Trace format: gantt or csv.
    #[clap(short = 'f', long, default_value = "gantt")]
    pub format: TraceFormat,

    /// JSON engine configuration.  Command-line values take precedence.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Initial value of one semaphore, as ID=VALUE.  May be repeated.
    #[clap(short = 's', long = "sem", value_parser = parse_sem_override)]
    pub sems: Vec<(u16, i64)>,

    /// Upper bound of the random real-time delay injected before each
    /// request, in microseconds.  0 disables jitter.  The chart must not
    /// change.
    #[clap(long, default_value = "0")]
    pub jitter_us: u64,

    /// Seed for the jitter delays.
    #[clap(long, default_value = "0")]
    pub seed: u64,

    /// Enable verbose output.  Specify multiple times to increase verbosity.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Opts {
    /// The scheduling policy named on the command line.
    pub fn policy(&self) -> CoreResult<Policy> {
        self.policy.parse()
    }

    pub fn jitter(&self) -> Option<Jitter> {
        (self.jitter_us > 0).then_some(Jitter { max_us: self.jitter_us, seed: self.seed })
    }
}

/// Parse `ID=VALUE`.
pub fn parse_sem_override(s: &str) -> Result<(u16, i64), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got {s:?}"))?;
    let id = id
        .trim()
        .parse::<u16>()
        .map_err(|e| format!("bad semaphore id {id:?}: {e}"))?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("bad semaphore value {value:?}: {e}"))?;
    if value < 0 {
        return Err(format!("semaphore {id} initial value must be non-negative, got {value}"));
    }
    Ok((id, value))
}
