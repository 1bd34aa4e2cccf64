use helios_import::pipeline::{ErrorBudget, Phase, PipelineState, ShutdownCoordinator, StopSignal};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

// --- ErrorBudget ---

#[test]
fn test_budget_exhausts_after_limit_plus_one() {
    let mut budget = ErrorBudget::new(2);
    assert!(!budget.record_failure());
    assert!(!budget.record_failure());
    assert_eq!(budget.remaining(), 0);
    assert!(budget.record_failure());
    assert_eq!(budget.remaining(), -1);
    assert!(budget.is_exhausted());
}

#[test]
fn test_unlimited_budget_never_exhausts() {
    let mut budget = ErrorBudget::new(0);
    assert!(budget.is_unlimited());
    for _ in 0..100 {
        assert!(!budget.record_failure());
    }
    assert_eq!(budget.remaining(), -100);
    assert!(!budget.is_exhausted());
}

// --- StopSignal ---

#[test]
fn test_stop_signal_is_set_once() {
    let stop = StopSignal::new();
    let clone = stop.clone();
    assert!(!stop.is_requested());
    assert!(clone.request());
    assert!(!stop.request());
    assert!(stop.is_requested());
}

#[test]
fn test_stop_signal_first_requester_wins_across_threads() {
    let stop = StopSignal::new();
    let winners = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let (stop, winners) = (stop.clone(), Arc::clone(&winners));
            thread::spawn(move || {
                if stop.request() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(winners.load(Ordering::SeqCst), 1);
}

// --- PipelineState ---

#[test]
fn test_state_reports_exhaustion_once() {
    let state = PipelineState::new(1, StopSignal::new());
    assert!(!state.record_failure("a", "boom".into()));
    assert!(state.record_failure("b", "boom".into()));
    assert!(!state.record_failure("c", "boom".into()));
    assert_eq!(state.errors_remaining(), -2);
    assert!(state.is_budget_exhausted());
    assert_eq!(state.failures().len(), 3);
}

#[test]
fn test_state_refuses_jobs_after_stop() {
    let state = PipelineState::new(0, StopSignal::new());
    assert_eq!(state.begin_job(), Some(1));
    assert_eq!(state.begin_job(), Some(2));
    state.stop_signal().request();
    assert_eq!(state.begin_job(), None);
    let snap = state.snapshot();
    assert_eq!(snap.songs_processed, 2);
    assert_eq!(snap.abandoned, 1);
}

#[test]
fn test_state_refuses_jobs_once_budget_exhausted() {
    let state = PipelineState::new(1, StopSignal::new());
    state.record_failure("a", "x".into());
    state.record_failure("b", "x".into());
    // Stop is raised by the worker afterwards; the budget alone already closes the door.
    assert!(!state.is_stop_requested());
    assert_eq!(state.begin_job(), None);
}

#[test]
fn test_state_failures_keep_completion_order() {
    let state = PipelineState::new(0, StopSignal::new());
    state.record_failure("x", "first".into());
    state.record_failure("y", "second".into());
    let refs: Vec<_> = state.failures().into_iter().map(|f| f.reference).collect();
    assert_eq!(refs, vec!["x", "y"]);
}

// --- ShutdownCoordinator ---

fn spawn_idle_workers(
    n: usize,
    stop: &StopSignal,
    exits: &Arc<AtomicUsize>,
) -> Vec<thread::JoinHandle<()>> {
    (0..n)
        .map(|_| {
            let (stop, exits) = (stop.clone(), Arc::clone(exits));
            thread::spawn(move || {
                while !stop.is_requested() {
                    thread::sleep(Duration::from_millis(5));
                }
                exits.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect()
}

#[test]
fn test_shutdown_phases() {
    let stop = StopSignal::new();
    let coord = ShutdownCoordinator::new(stop.clone());
    assert_eq!(coord.phase(), Phase::Idle);

    let exits = Arc::new(AtomicUsize::new(0));
    assert!(coord.launch(spawn_idle_workers(2, &stop, &exits)));
    assert_eq!(coord.phase(), Phase::Running);

    coord.request_stop();
    assert_eq!(coord.phase(), Phase::StopRequested);

    coord.stop();
    assert_eq!(coord.phase(), Phase::Stopped);
    assert_eq!(exits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shutdown_sees_stop_raised_elsewhere() {
    let stop = StopSignal::new();
    let coord = ShutdownCoordinator::new(stop.clone());
    let exits = Arc::new(AtomicUsize::new(0));
    coord.launch(spawn_idle_workers(1, &stop, &exits));
    stop.request();
    assert_eq!(coord.phase(), Phase::StopRequested);
    coord.stop();
}

#[test]
fn test_shutdown_concurrent_stop_calls_all_return_after_join() {
    let stop = StopSignal::new();
    let coord = Arc::new(ShutdownCoordinator::new(stop.clone()));
    let exits = Arc::new(AtomicUsize::new(0));
    coord.launch(spawn_idle_workers(4, &stop, &exits));

    let barrier = Arc::new(Barrier::new(8));
    let callers: Vec<_> = (0..8)
        .map(|_| {
            let coord = Arc::clone(&coord);
            let barrier = Arc::clone(&barrier);
            let exits = Arc::clone(&exits);
            thread::spawn(move || {
                barrier.wait();
                coord.stop();
                // Whoever returns must see every worker gone.
                assert_eq!(exits.load(Ordering::SeqCst), 4);
                assert_eq!(coord.phase(), Phase::Stopped);
            })
        })
        .collect();
    for c in callers {
        c.join().unwrap();
    }
    assert_eq!(exits.load(Ordering::SeqCst), 4);
    coord.stop();
}

#[test]
fn test_shutdown_stop_before_launch() {
    let stop = StopSignal::new();
    let coord = ShutdownCoordinator::new(stop.clone());
    coord.stop();
    assert!(stop.is_requested());
    assert_eq!(coord.phase(), Phase::Stopped);

    let exits = Arc::new(AtomicUsize::new(0));
    let late = spawn_idle_workers(1, &stop, &exits);
    assert!(!coord.launch(late));
}

#[test]
fn test_shutdown_stop_from_worker_does_not_deadlock() {
    let stop = StopSignal::new();
    let coord = Arc::new(ShutdownCoordinator::new(stop.clone()));
    let go = Arc::new(AtomicBool::new(false));
    let worker = {
        let (coord, go) = (Arc::clone(&coord), Arc::clone(&go));
        thread::spawn(move || {
            while !go.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(2));
            }
            coord.stop();
        })
    };
    assert!(coord.launch(vec![worker]));
    go.store(true, Ordering::SeqCst);

    coord.stop();
    assert!(stop.is_requested());
    assert_eq!(coord.phase(), Phase::Stopped);
}
