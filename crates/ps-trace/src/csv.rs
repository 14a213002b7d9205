//! CSV trace backend.
//!
//! Columns: `actor,start,end,kind,semaphore`.  `kind` is one of `cpu`, `io`,
//! `acquire`, `release`; `semaphore` is empty for CPU and IO rows.

use std::io::Write;

use csv::Writer;

use ps_engine::{RecordKind, ScheduleRecord};

use crate::writer::TraceWriter;
use crate::TraceResult;

pub const HEADER: [&str; 5] = ["actor", "start", "end", "kind", "semaphore"];

/// Short name of a record kind, as written to the `kind` column.
pub fn kind_name(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Cpu => "cpu",
        RecordKind::IoReturn => "io",
        RecordKind::AcquireReturn(_) => "acquire",
        RecordKind::ReleaseReturn(_) => "release",
    }
}

/// Writes schedule records as CSV rows.
pub struct CsvTraceWriter<W: Write> {
    rows:     Writer<W>,
    finished: bool,
}

impl<W: Write> CsvTraceWriter<W> {
    /// Wrap `out` and write the header row.
    pub fn new(out: W) -> TraceResult<Self> {
        let mut rows = Writer::from_writer(out);
        rows.write_record(HEADER)?;
        Ok(Self { rows, finished: false })
    }

    /// Flush and unwrap the sink.
    pub fn into_inner(self) -> TraceResult<W> {
        self.rows.into_inner().map_err(|e| e.into_error().into())
    }
}

impl<W: Write> TraceWriter for CsvTraceWriter<W> {
    fn write_record(&mut self, record: &ScheduleRecord) -> TraceResult<()> {
        let semaphore = match record.kind {
            RecordKind::AcquireReturn(sem) | RecordKind::ReleaseReturn(sem) => sem.0.to_string(),
            RecordKind::Cpu | RecordKind::IoReturn => String::new(),
        };
        self.rows.write_record(&[
            record.actor.0.to_string(),
            record.start.0.to_string(),
            record.end.0.to_string(),
            kind_name(record.kind).to_owned(),
            semaphore,
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> TraceResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.rows.flush()?;
        Ok(())
    }
}
