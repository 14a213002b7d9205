//! Schedule records and the observer trait that receives them.

use ps_core::{ActorId, SemId, Tick};

/// What a [`ScheduleRecord`] describes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RecordKind {
    /// The actor held the CPU for the tick `[start, end)`.
    Cpu,
    /// An IO request issued at `start` returned at `end`.
    IoReturn,
    /// A `P` issued at `start` returned at `end`.
    AcquireReturn(SemId),
    /// A `V` issued at `start` returned at `end`.
    ReleaseReturn(SemId),
}

/// One entry of the execution trace.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ScheduleRecord {
    pub actor: ActorId,
    pub start: Tick,
    pub end:   Tick,
    pub kind:  RecordKind,
}

/// Callbacks invoked by the engine as the schedule unfolds.
///
/// Every callback runs under the engine's lock, in schedule order, so the
/// sequence an observer sees is identical from run to run regardless of how
/// the actor threads were interleaved.  Callbacks must not call back into the
/// engine.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait EngineObserver: Send + 'static {
    /// Called right after the clock advances to `tick`.
    fn on_tick(&mut self, _tick: Tick) {}

    /// Called once per trace entry.
    fn on_record(&mut self, _record: &ScheduleRecord) {}

    /// Called when an MLFQ actor is demoted to `level` at `tick`.
    fn on_demote(&mut self, _actor: ActorId, _level: usize, _tick: Tick) {}

    /// Called once, after the last actor terminates or when the engine is
    /// finished early.
    fn on_finish(&mut self, _final_tick: Tick) {}
}

/// An [`EngineObserver`] that does nothing.
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// An [`EngineObserver`] that keeps everything it sees in memory.
#[derive(Default, Debug)]
pub struct RecordingObserver {
    pub records:    Vec<ScheduleRecord>,
    /// `(actor, new level, tick)` for every MLFQ demotion.
    pub demotions:  Vec<(ActorId, usize, Tick)>,
    /// Ticks reported through `on_tick`, in order.
    pub ticks:      Vec<Tick>,
    pub final_tick: Option<Tick>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// CPU ticks granted to `actor`, as `(start, end)` pairs.
    pub fn cpu_slices(&self, actor: ActorId) -> Vec<(u64, u64)> {
        self.records
            .iter()
            .filter(|r| r.actor == actor && r.kind == RecordKind::Cpu)
            .map(|r| (r.start.0, r.end.0))
            .collect()
    }

    /// The actor holding the CPU for each granted tick, in tick order.
    pub fn cpu_order(&self) -> Vec<u32> {
        self.records
            .iter()
            .filter(|r| r.kind == RecordKind::Cpu)
            .map(|r| r.actor.0)
            .collect()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_tick(&mut self, tick: Tick) {
        self.ticks.push(tick);
    }

    fn on_record(&mut self, record: &ScheduleRecord) {
        self.records.push(*record);
    }

    fn on_demote(&mut self, actor: ActorId, level: usize, tick: Tick) {
        self.demotions.push((actor, level, tick));
    }

    fn on_finish(&mut self, final_tick: Tick) {
        self.final_tick = Some(final_tick);
    }
}
