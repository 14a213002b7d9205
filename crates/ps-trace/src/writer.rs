//! The `TraceWriter` trait and format selection.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

use ps_engine::ScheduleRecord;

use crate::{CsvTraceWriter, GanttWriter, TraceError, TraceResult};

/// Sink for schedule records, implemented by the Gantt and CSV writers.
pub trait TraceWriter {
    /// Append one record.
    fn write_record(&mut self, record: &ScheduleRecord) -> TraceResult<()>;

    /// Flush everything written so far.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> TraceResult<()>;
}

impl<T: TraceWriter + ?Sized> TraceWriter for Box<T> {
    fn write_record(&mut self, record: &ScheduleRecord) -> TraceResult<()> {
        (**self).write_record(record)
    }

    fn finish(&mut self) -> TraceResult<()> {
        (**self).finish()
    }
}

/// Output format of a trace file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum TraceFormat {
    /// The classic text chart, one line per record.
    #[default]
    Gantt,
    Csv,
}

impl TraceFormat {
    /// `gantt-<policy>-<script>` for Gantt charts; CSV traces add `.csv`.
    pub fn file_name(self, policy: &str, script_name: &str) -> String {
        match self {
            TraceFormat::Gantt => format!("gantt-{policy}-{script_name}"),
            TraceFormat::Csv => format!("gantt-{policy}-{script_name}.csv"),
        }
    }

    /// Create `path` and return a writer for this format.
    pub fn create(self, path: &Path) -> TraceResult<Box<dyn TraceWriter + Send>> {
        let file = BufWriter::new(File::create(path)?);
        Ok(match self {
            TraceFormat::Gantt => Box::new(GanttWriter::new(file)),
            TraceFormat::Csv => Box::new(CsvTraceWriter::new(file)?),
        })
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraceFormat::Gantt => "gantt",
            TraceFormat::Csv => "csv",
        })
    }
}

impl FromStr for TraceFormat {
    type Err = TraceError;

    fn from_str(s: &str) -> TraceResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gantt" => Ok(TraceFormat::Gantt),
            "csv" => Ok(TraceFormat::Csv),
            other => Err(TraceError::UnknownFormat(other.to_owned())),
        }
    }
}
