//! Text Gantt chart.
//!
//! ```text
//!   0~  1: T0, CPU
//!    ~  4: T1, Return from IO
//!    ~  3: T1, Return from P0
//!    ~  3: T0, Return from V0
//! ```
//!
//! CPU lines show the granted tick; every other line shows only the time the
//! call returned.

use std::io::Write;

use ps_engine::{RecordKind, ScheduleRecord};

use crate::writer::TraceWriter;
use crate::TraceResult;

/// Render one record as a chart line, without the newline.
pub fn gantt_line(record: &ScheduleRecord) -> String {
    let (end, actor) = (record.end.0, record.actor.0);
    match record.kind {
        RecordKind::Cpu => format!("{:>3}~{end:>3}: T{actor}, CPU", record.start.0),
        RecordKind::IoReturn => format!("   ~{end:>3}: T{actor}, Return from IO"),
        RecordKind::AcquireReturn(sem) => format!("   ~{end:>3}: T{actor}, Return from P{}", sem.0),
        RecordKind::ReleaseReturn(sem) => format!("   ~{end:>3}: T{actor}, Return from V{}", sem.0),
    }
}

/// Writes [`gantt_line`]s to any `Write` sink.
pub struct GanttWriter<W: Write> {
    out:      W,
    lines:    u64,
    finished: bool,
}

impl<W: Write> GanttWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0, finished: false }
    }

    /// Lines written so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Unwrap the sink (e.g. a `Vec<u8>` in tests).
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceWriter for GanttWriter<W> {
    fn write_record(&mut self, record: &ScheduleRecord) -> TraceResult<()> {
        writeln!(self.out, "{}", gantt_line(record))?;
        self.lines += 1;
        Ok(())
    }

    fn finish(&mut self) -> TraceResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.out.flush()?;
        Ok(())
    }
}
