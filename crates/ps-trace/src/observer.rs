//! `TraceObserver<W>` — bridges `EngineObserver` to a `TraceWriter`.

use ps_core::Tick;
use ps_engine::{EngineObserver, ScheduleRecord};

use crate::writer::TraceWriter;
use crate::{TraceError, TraceResult};

/// An [`EngineObserver`] that streams every schedule record to a
/// [`TraceWriter`].
///
/// Observer callbacks cannot fail, so the first write error is stored and
/// later writes are skipped.  Check [`take_error`][Self::take_error] once the
/// engine has finished.
pub struct TraceObserver<W: TraceWriter> {
    writer:     W,
    records:    u64,
    last_error: Option<TraceError>,
}

impl<W: TraceWriter> TraceObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0, last_error: None }
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<TraceError> {
        self.last_error.take()
    }

    /// Records successfully handed to the writer.
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: TraceResult<()>) {
        if let Err(e) = result {
            log::error!("trace write failed: {e}");
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: TraceWriter + Send + 'static> EngineObserver for TraceObserver<W> {
    fn on_record(&mut self, record: &ScheduleRecord) {
        if self.last_error.is_some() {
            return;
        }
        let result = self.writer.write_record(record);
        if result.is_ok() {
            self.records += 1;
        }
        self.store_err(result);
    }

    fn on_finish(&mut self, final_tick: Tick) {
        log::debug!("trace closed at {final_tick} after {} records", self.records);
        let result = self.writer.finish();
        self.store_err(result);
    }
}
