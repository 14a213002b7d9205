//! `ps-trace` — schedule trace writers.
//!
//! | Format  | Writer              | Content                                        |
//! |---------|---------------------|------------------------------------------------|
//! | `gantt` | [`GanttWriter`]     | one fixed-width text line per record           |
//! | `csv`   | [`CsvTraceWriter`]  | `actor,start,end,kind,semaphore` rows          |
//!
//! Both implement [`TraceWriter`] and are driven by [`TraceObserver`], which
//! implements `ps_engine::EngineObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! let writer = TraceFormat::Gantt.create(Path::new("output/gantt-0-input.txt"))?;
//! let engine = EngineBuilder::new(config).observer(TraceObserver::new(writer)).build()?;
//! // ... run the actors ...
//! let mut obs = engine.finish()?;
//! obs.take_error().map(|e| eprintln!("trace error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod gantt;
pub mod observer;
pub mod writer;


pub use self::csv::CsvTraceWriter;
pub use error::{TraceError, TraceResult};
pub use gantt::{gantt_line, GanttWriter};
pub use observer::TraceObserver;
pub use writer::{TraceFormat, TraceWriter};
