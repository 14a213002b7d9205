//! Unit and threaded scenario tests for ps-engine.

use std::sync::mpsc;
use std::thread;

use ps_core::{ActorId, EngineConfig, Policy, SemId, Tick};

use crate::{Engine, EngineBuilder, EngineError, EngineObserver, EngineResult, RecordingObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
enum Op {
    C(u64),
    I(u64),
    P(u16),
    V(u16),
}

/// Run one actor's ops, feeding each returned time into the next call.
fn drive<O: EngineObserver>(engine: &Engine<O>, actor: u32, arrival: u64, ops: &[Op]) -> EngineResult<Vec<Tick>> {
    let id = ActorId(actor);
    let mut t = Tick(arrival);
    let mut returns = Vec::new();
    for &op in ops {
        t = match op {
            Op::C(burst) => {
                for left in (0..=burst).rev() {
                    t = engine.request_cpu(t, id, left)?;
                }
                t
            }
            Op::I(duration) => engine.request_io(t, id, duration)?,
            Op::P(sem) => engine.acquire(t, id, SemId(sem))?,
            Op::V(sem) => engine.release(t, id, SemId(sem))?,
        };
        returns.push(t);
    }
    engine.terminate(id)?;
    Ok(returns)
}

type Outcome = (RecordingObserver, Vec<EngineResult<Vec<Tick>>>);

fn run_with(engine: Engine<RecordingObserver>, scripts: &[(u64, &[Op])]) -> Outcome {
    let results = thread::scope(|s| {
        let handles: Vec<_> = scripts
            .iter()
            .enumerate()
            .map(|(i, &(arrival, ops))| {
                let engine = &engine;
                s.spawn(move || drive(engine, i as u32, arrival, ops))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    (engine.finish().unwrap(), results)
}

fn run(policy: Policy, scripts: &[(u64, &[Op])]) -> Outcome {
    let engine = EngineBuilder::new(EngineConfig::new(policy, scripts.len()))
        .observer(RecordingObserver::new())
        .build()
        .unwrap();
    run_with(engine, scripts)
}

fn returns(results: Vec<EngineResult<Vec<Tick>>>) -> Vec<Vec<u64>> {
    results
        .into_iter()
        .map(|r| r.unwrap().into_iter().map(|t| t.0).collect())
        .collect()
}

// ── Semaphore ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod semaphore {
    use super::*;
    use crate::semaphore::{AcquireOutcome, ReleaseOutcome, Semaphore, SemaphoreTable};
    use ps_core::SemaphoreConfig;

    #[test]
    fn acquire_proceeds_while_counter_stays_non_negative() {
        let mut s = Semaphore::new(1);
        assert_eq!(s.acquire(ActorId(0)).unwrap(), AcquireOutcome::Proceed);
        assert_eq!(s.value(), 0);
        assert!(s.waiters().is_empty());
    }

    #[test]
    fn waiters_track_negative_counter() {
        let mut s = Semaphore::new(0);
        assert_eq!(s.acquire(ActorId(2)).unwrap(), AcquireOutcome::Blocked);
        assert_eq!(s.acquire(ActorId(0)).unwrap(), AcquireOutcome::Blocked);
        assert_eq!(s.value(), -2);
        assert_eq!(s.waiters(), vec![ActorId(2), ActorId(0)]);
        s.check().unwrap();
    }

    #[test]
    fn release_wakes_in_arrival_order_not_id_order() {
        let mut s = Semaphore::new(0);
        for id in [3, 1, 2] {
            s.acquire(ActorId(id)).unwrap();
        }
        let woken: Vec<_> = (0..3).map(|_| s.release().unwrap()).collect();
        assert_eq!(
            woken,
            vec![
                ReleaseOutcome::Woke(ActorId(3)),
                ReleaseOutcome::Woke(ActorId(1)),
                ReleaseOutcome::Woke(ActorId(2)),
            ]
        );
        assert_eq!(s.release().unwrap(), ReleaseOutcome::NoWaiter);
        assert_eq!(s.value(), 1);
    }

    #[test]
    fn table_rejects_out_of_range_ids() {
        let mut table = SemaphoreTable::new(&SemaphoreConfig::default());
        assert_eq!(table.len(), 10);
        assert!(table.validate(SemId(9)).is_ok());
        let err = table.acquire(SemId(10), ActorId(0)).unwrap_err();
        assert_eq!(err, EngineError::UnknownSemaphore { sem: SemId(10), count: 10 });
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn table_applies_overrides() {
        let mut cfg = SemaphoreConfig::default();
        cfg.overrides.insert(4, 3);
        let table = SemaphoreTable::new(&cfg);
        assert_eq!(table.get(SemId(4)).unwrap().value(), 3);
        assert_eq!(table.get(SemId(5)).unwrap().value(), 0);
    }
}

// ── IO dispatcher ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod io {
    use super::*;
    use crate::io::IoDispatcher;

    #[test]
    fn head_completes_once_clock_reaches_it() {
        let mut io = IoDispatcher::new(2);
        io.enqueue(ActorId(0), Tick(2), 3).unwrap();
        assert_eq!(io.next_completion().unwrap(), Some(Tick(5)));
        assert!(io.complete(Tick(4)).unwrap().is_none());
        let done = io.complete(Tick(5)).unwrap().unwrap();
        assert_eq!(done.actor, ActorId(0));
        assert_eq!(done.requested_at, Tick(2));
        assert_eq!(io.watermark(), Tick(5));
        assert!(io.is_empty());
    }

    #[test]
    fn back_to_back_requests_serialize_on_watermark() {
        let mut io = IoDispatcher::new(2);
        io.enqueue(ActorId(1), Tick(0), 3).unwrap();
        io.enqueue(ActorId(0), Tick(0), 3).unwrap();
        // Equal arrival: lower id first.
        assert_eq!(io.complete(Tick(3)).unwrap().unwrap().actor, ActorId(0));
        assert_eq!(io.next_completion().unwrap(), Some(Tick(6)));
        assert!(io.complete(Tick(5)).unwrap().is_none());
        assert_eq!(io.complete(Tick(6)).unwrap().unwrap().actor, ActorId(1));
    }

    #[test]
    fn completion_past_the_end_of_time_is_an_error() {
        let mut io = IoDispatcher::new(1);
        io.enqueue(ActorId(0), Tick(1), u64::MAX).unwrap();
        assert!(matches!(io.next_completion(), Err(EngineError::Invariant(_))));
        assert!(matches!(io.complete(Tick(1)), Err(EngineError::Invariant(_))));
    }

    #[test]
    fn late_arrival_ignores_stale_watermark() {
        let mut io = IoDispatcher::new(1);
        io.enqueue(ActorId(0), Tick(10), 2).unwrap();
        assert_eq!(io.next_completion().unwrap(), Some(Tick(12)));
    }

    #[test]
    fn at_most_one_completion_per_call() {
        let mut io = IoDispatcher::new(2);
        io.enqueue(ActorId(0), Tick(0), 0).unwrap();
        io.enqueue(ActorId(1), Tick(0), 0).unwrap();
        assert!(io.complete(Tick(1)).unwrap().is_some());
        assert_eq!(io.len(), 1);
    }
}

// ── CPU dispatcher ────────────────────────────────────────────────────────────

#[cfg(test)]
mod cpu {
    use super::*;
    use crate::cpu::CpuDispatcher;
    use crate::process::ProcessTable;
    use ps_core::MlfqConfig;

    fn ready(cpu: &mut CpuDispatcher, procs: &mut ProcessTable, actor: u32, at: u64, burst: u64, now: u64) {
        let proc = procs.get_mut(ActorId(actor)).unwrap();
        proc.requested_at = Tick(at);
        cpu.enqueue(proc, burst, Tick(now)).unwrap();
    }

    #[test]
    fn fcfs_orders_by_burst_arrival_then_id() {
        let mut procs = ProcessTable::new(3);
        let mut cpu = CpuDispatcher::new(Policy::Fcfs, MlfqConfig::default());
        ready(&mut cpu, &mut procs, 2, 0, 1, 3);
        ready(&mut cpu, &mut procs, 1, 3, 9, 3);
        ready(&mut cpu, &mut procs, 0, 0, 5, 3);
        assert_eq!(cpu.ready_actors(), vec![ActorId(0), ActorId(2), ActorId(1)]);
        assert_eq!(cpu.dispatch(&mut procs, Tick(4)).unwrap(), Some(ActorId(0)));
    }

    #[test]
    fn fcfs_keeps_first_arrival_across_ticks() {
        let mut procs = ProcessTable::new(1);
        let mut cpu = CpuDispatcher::new(Policy::Fcfs, MlfqConfig::default());
        ready(&mut cpu, &mut procs, 0, 2, 3, 2);
        cpu.dispatch(&mut procs, Tick(3)).unwrap();
        ready(&mut cpu, &mut procs, 0, 3, 2, 3);
        assert_eq!(procs.get(ActorId(0)).unwrap().burst_arrival, Some(Tick(2)));
    }

    #[test]
    fn srtf_orders_by_remaining_burst() {
        let mut procs = ProcessTable::new(3);
        let mut cpu = CpuDispatcher::new(Policy::Srtf, MlfqConfig::default());
        ready(&mut cpu, &mut procs, 0, 0, 8, 2);
        ready(&mut cpu, &mut procs, 1, 2, 3, 2);
        ready(&mut cpu, &mut procs, 2, 1, 3, 2);
        assert_eq!(cpu.ready_actors(), vec![ActorId(1), ActorId(2), ActorId(0)]);
        assert_eq!(cpu.dispatch(&mut procs, Tick(3)).unwrap(), Some(ActorId(1)));
        assert_eq!(procs.get(ActorId(1)).unwrap().remaining, 2);
    }

    #[test]
    fn mlfq_demotes_after_a_full_quantum() {
        let mut procs = ProcessTable::new(1);
        let mut cpu = CpuDispatcher::new(Policy::Mlfq, MlfqConfig::default());
        let mut demotions = Vec::new();
        for now in 0..16u64 {
            let proc = procs.get_mut(ActorId(0)).unwrap();
            proc.requested_at = Tick(now);
            if let Some(d) = cpu.enqueue(proc, 100 - now, Tick(now)).unwrap() {
                demotions.push((d.level, d.at.0));
            }
            cpu.dispatch(&mut procs, Tick(now + 1)).unwrap();
        }
        assert_eq!(demotions, vec![(1, 5), (2, 15)]);
    }

    #[test]
    fn mlfq_gap_resets_consecutive_count() {
        let mut procs = ProcessTable::new(1);
        let mut cpu = CpuDispatcher::new(Policy::Mlfq, MlfqConfig::default());
        for now in 0..4u64 {
            ready(&mut cpu, &mut procs, 0, now, 10, now);
            cpu.dispatch(&mut procs, Tick(now + 1)).unwrap();
        }
        assert_eq!(procs.get(ActorId(0)).unwrap().run_at_level, 4);
        // Returns two ticks later: the run was interrupted.
        ready(&mut cpu, &mut procs, 0, 6, 6, 6);
        assert_eq!(procs.get(ActorId(0)).unwrap().run_at_level, 0);
        assert_eq!(procs.get(ActorId(0)).unwrap().level, 0);
    }

    #[test]
    fn mlfq_prefers_lower_levels() {
        let mut procs = ProcessTable::new(2);
        let mut cpu = CpuDispatcher::new(Policy::Mlfq, MlfqConfig::default());
        procs.get_mut(ActorId(0)).unwrap().level = 2;
        ready(&mut cpu, &mut procs, 0, 0, 5, 7);
        ready(&mut cpu, &mut procs, 1, 7, 5, 7);
        assert_eq!(cpu.ready_actors(), vec![ActorId(1), ActorId(0)]);
    }

    #[test]
    fn release_clears_burst_state() {
        let mut procs = ProcessTable::new(1);
        let mut cpu = CpuDispatcher::new(Policy::Mlfq, MlfqConfig::default());
        ready(&mut cpu, &mut procs, 0, 0, 1, 0);
        cpu.dispatch(&mut procs, Tick(1)).unwrap();
        cpu.release(procs.get_mut(ActorId(0)).unwrap());
        let proc = procs.get(ActorId(0)).unwrap();
        assert_eq!(proc.burst_arrival, None);
        assert_eq!(proc.last_run, None);
        assert_eq!(proc.run_at_level, 0);
    }

    #[test]
    fn double_enqueue_is_an_invariant_violation() {
        let mut procs = ProcessTable::new(1);
        let mut cpu = CpuDispatcher::new(Policy::Fcfs, MlfqConfig::default());
        ready(&mut cpu, &mut procs, 0, 0, 2, 0);
        let proc = procs.get_mut(ActorId(0)).unwrap();
        let err = cpu.enqueue(proc, 2, Tick(0)).unwrap_err();
        assert!(matches!(err, EngineError::Invariant(_)));
        assert!(err.is_fatal());
    }
}

// ── Process table ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod process {
    use super::*;
    use crate::process::ProcessTable;

    #[test]
    fn barrier_full_tracks_live_population() {
        let mut procs = ProcessTable::new(2);
        procs.get_mut(ActorId(0)).unwrap().active = true;
        assert!(!procs.barrier_full());
        procs.terminate(ActorId(1)).unwrap();
        assert_eq!(procs.live(), 1);
        assert!(procs.barrier_full());
    }

    #[test]
    fn terminate_twice_is_rejected() {
        let mut procs = ProcessTable::new(1);
        procs.terminate(ActorId(0)).unwrap();
        assert_eq!(procs.terminate(ActorId(0)), Err(EngineError::Terminated(ActorId(0))));
        assert_eq!(procs.live(), 0);
    }

    #[test]
    fn busy_actor_cannot_terminate() {
        let mut procs = ProcessTable::new(1);
        procs.get_mut(ActorId(0)).unwrap().active = true;
        assert_eq!(procs.terminate(ActorId(0)), Err(EngineError::OutstandingRequest(ActorId(0))));
    }

    #[test]
    fn unknown_actor() {
        let procs = ProcessTable::new(1);
        assert!(matches!(procs.get(ActorId(5)), Err(EngineError::UnknownActor(ActorId(5)))));
    }
}

// ── Admission gate ────────────────────────────────────────────────────────────

#[cfg(test)]
mod gate {
    use std::sync::Mutex;

    use super::*;
    use crate::gate::AdmissionGate;

    #[test]
    fn pass_release_admits_next() {
        let gate = AdmissionGate::new();
        {
            let _pass = gate.enter();
            assert_eq!(gate.queued(), 1);
        }
        assert_eq!(gate.queued(), 0);
        let _again = gate.enter();
    }

    #[test]
    fn every_contender_gets_through() {
        let gate = AdmissionGate::new();
        let seen = Mutex::new(Vec::new());
        thread::scope(|s| {
            for i in 0..8 {
                let (gate, seen) = (&gate, &seen);
                s.spawn(move || {
                    let _pass = gate.enter();
                    seen.lock().unwrap().push(i);
                });
            }
        });
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert_eq!(gate.queued(), 0);
    }
}

// ── Engine: scenarios ─────────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use super::*;
    use crate::RecordKind;

    #[test]
    fn fcfs_two_equal_arrivals_run_back_to_back() {
        let (trace, results) = run(Policy::Fcfs, &[(0, &[Op::C(5)]), (0, &[Op::C(5)])]);
        assert_eq!(returns(results), vec![vec![5], vec![10]]);
        assert_eq!(trace.cpu_slices(ActorId(0)), vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
        assert_eq!(trace.cpu_slices(ActorId(1)), vec![(5, 6), (6, 7), (7, 8), (8, 9), (9, 10)]);
    }

    #[test]
    fn fcfs_never_preempts_for_a_later_arrival() {
        let (trace, _) = run(Policy::Fcfs, &[(0, &[Op::C(4)]), (1, &[Op::C(1)])]);
        assert_eq!(trace.cpu_order(), vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn srtf_preempts_for_shorter_burst() {
        let (trace, results) = run(Policy::Srtf, &[(0, &[Op::C(10)]), (2, &[Op::C(3)])]);
        assert_eq!(trace.cpu_order(), vec![0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(returns(results), vec![vec![13], vec![5]]);
    }

    #[test]
    fn mlfq_single_actor_walks_down_every_level() {
        let (trace, results) = run(Policy::Mlfq, &[(0, &[Op::C(60)])]);
        assert_eq!(returns(results), vec![vec![60]]);
        let a = ActorId(0);
        assert_eq!(
            trace.demotions,
            vec![(a, 1, Tick(5)), (a, 2, Tick(15)), (a, 3, Tick(30)), (a, 4, Tick(50))]
        );
        assert_eq!(trace.cpu_slices(a).len(), 60);
    }

    #[test]
    fn mlfq_fresh_arrival_beats_demoted_actor() {
        let (trace, results) = run(Policy::Mlfq, &[(0, &[Op::C(8)]), (6, &[Op::C(2)])]);
        assert_eq!(trace.cpu_order(), vec![0, 0, 0, 0, 0, 0, 1, 1, 0, 0]);
        assert_eq!(returns(results), vec![vec![10], vec![8]]);
    }

    #[test]
    fn semaphore_handoff_returns_at_release_time() {
        let engine = EngineBuilder::new(EngineConfig::new(Policy::Fcfs, 2))
            .observer(RecordingObserver::new())
            .semaphore_initial(SemId(0), 1)
            .build()
            .unwrap();
        let (trace, results) = run_with(
            engine,
            &[(0, &[Op::P(0), Op::C(3), Op::V(0)]), (1, &[Op::P(0)])],
        );
        assert_eq!(returns(results), vec![vec![0, 3, 3], vec![3]]);

        let b_acquire = trace
            .records
            .iter()
            .find(|r| r.actor == ActorId(1) && r.kind == RecordKind::AcquireReturn(SemId(0)))
            .unwrap();
        assert_eq!((b_acquire.start, b_acquire.end), (Tick(1), Tick(3)));
    }

    #[test]
    fn semaphore_wakes_waiters_fifo() {
        let ops: &[Op] = &[Op::C(5), Op::V(0), Op::V(0), Op::V(0)];
        let (trace, results) = run(
            Policy::Fcfs,
            &[(0, ops), (2, &[Op::P(0)]), (0, &[Op::P(0)]), (1, &[Op::P(0)])],
        );
        assert_eq!(returns(results), vec![vec![5, 5, 5, 5], vec![5], vec![5], vec![5]]);
        let woken: Vec<u32> = trace
            .records
            .iter()
            .filter(|r| matches!(r.kind, RecordKind::AcquireReturn(_)))
            .map(|r| r.actor.0)
            .collect();
        assert_eq!(woken, vec![2, 3, 1]);
    }

    #[test]
    fn release_without_waiter_returns_requested_time() {
        let (trace, results) = run(Policy::Fcfs, &[(4, &[Op::V(3)])]);
        assert_eq!(returns(results), vec![vec![4]]);
        let rec = trace.records[0];
        assert_eq!((rec.start, rec.end, rec.kind), (Tick(4), Tick(4), RecordKind::ReleaseReturn(SemId(3))));
    }

    #[test]
    fn io_requests_serialize_on_one_device() {
        let (trace, results) = run(Policy::Fcfs, &[(0, &[Op::I(3)]), (0, &[Op::I(3)])]);
        assert_eq!(returns(results), vec![vec![3], vec![6]]);
        let io: Vec<_> = trace.records.iter().filter(|r| r.kind == RecordKind::IoReturn).collect();
        assert_eq!(io.len(), 2);
    }

    #[test]
    fn io_overlaps_with_cpu() {
        let (_, results) = run(Policy::Fcfs, &[(0, &[Op::I(2), Op::C(1)]), (0, &[Op::C(3)])]);
        // Actor 0's CPU burst queues behind actor 1's, which arrived first.
        assert_eq!(returns(results), vec![vec![2, 4], vec![3]]);
    }

    #[test]
    fn clock_advances_one_tick_at_a_time() {
        let (trace, _) = run(Policy::Srtf, &[(0, &[Op::C(2), Op::I(3)]), (3, &[Op::C(4)])]);
        let expected: Vec<Tick> = (1..=trace.final_tick.unwrap().0).map(Tick).collect();
        assert_eq!(trace.ticks, expected);
    }

    #[test]
    fn repeated_runs_produce_identical_traces() {
        let scripts: &[(u64, &[Op])] = &[
            (0, &[Op::C(3), Op::I(2), Op::C(2)]),
            (1, &[Op::C(4), Op::V(1)]),
            (0, &[Op::P(1), Op::C(1)]),
        ];
        let (first, _) = run(Policy::Mlfq, scripts);
        for _ in 0..5 {
            let (again, _) = run(Policy::Mlfq, scripts);
            assert_eq!(again.records, first.records);
        }
    }
}

// ── Engine: errors ────────────────────────────────────────────────────────────

#[cfg(test)]
mod errors {
    use super::*;

    fn engine(n: usize) -> Engine<RecordingObserver> {
        EngineBuilder::new(EngineConfig::new(Policy::Fcfs, n))
            .observer(RecordingObserver::new())
            .build()
            .unwrap()
    }

    #[test]
    fn invalid_arguments_leave_engine_usable() {
        let engine = engine(1);
        let a = ActorId(0);
        let err = engine.acquire(Tick(0), a, SemId(10)).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(engine.request_io(Tick(0), ActorId(3), 1), Err(EngineError::UnknownActor(ActorId(3))));

        assert_eq!(engine.request_cpu(Tick(0), a, 1).unwrap(), Tick(1));
        assert_eq!(engine.request_cpu(Tick(1), a, 0).unwrap(), Tick(1));
        engine.terminate(a).unwrap();
        assert_eq!(engine.terminate(a), Err(EngineError::Terminated(a)));
        assert_eq!(engine.live_actors().unwrap(), 0);
    }

    #[test]
    fn mutual_wait_is_reported_as_deadlock() {
        let engine = engine(2);
        let (engine, results) = thread::scope(|s| {
            let e = &engine;
            let a = s.spawn(move || e.acquire(Tick(0), ActorId(0), SemId(0)));
            let b = s.spawn(move || e.acquire(Tick(0), ActorId(1), SemId(1)));
            (e, vec![a.join().unwrap(), b.join().unwrap()])
        });
        let expected = EngineError::Aborted(Box::new(EngineError::Deadlock {
            at:      Tick(0),
            blocked: vec![ActorId(0), ActorId(1)],
        }));
        for result in results {
            assert_eq!(result, Err(expected.clone()));
        }
        assert!(matches!(engine.terminate(ActorId(0)), Err(EngineError::Aborted(_))));
        assert!(matches!(engine.abort_cause().unwrap(), Some(EngineError::Deadlock { .. })));
    }

    #[test]
    fn second_call_in_flight_is_rejected() {
        let engine = engine(2);
        let a = ActorId(0);
        let (tx, rx) = mpsc::channel();
        thread::scope(|s| {
            for _ in 0..2 {
                let tx = tx.clone();
                let e = &engine;
                s.spawn(move || tx.send(e.request_cpu(Tick(0), a, 1)).unwrap());
            }
            // Actor 1 is idle, so the accepted request cannot be granted yet.
            assert_eq!(rx.recv().unwrap(), Err(EngineError::OutstandingRequest(a)));
            assert_eq!(engine.now().unwrap(), Tick::ZERO);
            assert_eq!(engine.live_actors().unwrap(), 2);
            assert_eq!(engine.abort_cause().unwrap(), None);

            engine.terminate(ActorId(1)).unwrap();
            assert_eq!(rx.recv().unwrap(), Ok(Tick(1)));
        });
        assert_eq!(engine.request_cpu(Tick(1), a, 0).unwrap(), Tick(1));
        engine.terminate(a).unwrap();
        let trace = engine.finish().unwrap();
        assert_eq!(trace.cpu_slices(a), vec![(0, 1)]);
    }

    #[test]
    fn io_past_the_end_of_time_aborts() {
        let engine = engine(1);
        match engine.request_io(Tick(1), ActorId(0), u64::MAX) {
            Err(EngineError::Aborted(cause)) => {
                assert!(matches!(*cause, EngineError::Invariant(_)), "{cause}");
            }
            other => panic!("expected an abort, got {other:?}"),
        }
        // The lock survived and later calls see the abort.
        assert_eq!(engine.now().unwrap(), Tick(2));
        assert!(matches!(engine.abort_cause().unwrap(), Some(EngineError::Invariant(_))));
        assert!(matches!(engine.request_cpu(Tick(2), ActorId(0), 1), Err(EngineError::Aborted(_))));
    }

    /// Panics on the first tick.
    struct FailingObserver;

    impl EngineObserver for FailingObserver {
        fn on_tick(&mut self, _: Tick) {
            panic!("observer failed");
        }
    }

    #[test]
    fn panic_in_clock_answers_blocked_actors() {
        let engine = EngineBuilder::new(EngineConfig::new(Policy::Fcfs, 1))
            .observer(FailingObserver)
            .build()
            .unwrap();
        match engine.request_cpu(Tick(0), ActorId(0), 1) {
            Err(EngineError::Aborted(cause)) => {
                assert_eq!(*cause, EngineError::Invariant("clock supervisor panicked".into()));
            }
            other => panic!("expected an abort, got {other:?}"),
        }
        assert!(engine.now().is_ok());
        assert!(engine.finish().is_ok());
    }

    #[test]
    fn finish_reports_once_and_returns_observer() {
        let engine = engine(1);
        engine.request_io(Tick(0), ActorId(0), 2).unwrap();
        engine.terminate(ActorId(0)).unwrap();
        let trace = engine.finish().unwrap();
        assert_eq!(trace.final_tick, Some(Tick(2)));
    }

    #[test]
    fn bad_config_fails_to_build() {
        let mut config = EngineConfig::new(Policy::Mlfq, 1);
        config.mlfq.levels = 0;
        assert!(matches!(EngineBuilder::new(config).build(), Err(EngineError::Config(_))));
    }

    #[test]
    fn zero_actor_engine_finishes_cleanly() {
        let engine = Engine::builder(EngineConfig::new(Policy::Fcfs, 0)).build().unwrap();
        assert_eq!(engine.now().unwrap(), Tick::ZERO);
        engine.finish().unwrap();
    }
}
