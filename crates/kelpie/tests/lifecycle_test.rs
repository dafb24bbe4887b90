use kelpie::{
    AlgorithmState, Control, Error, LayoutAlgorithm, LayoutEvent, LayoutRegistry, Lifecycle,
    Result, VertexPositions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Minimal iterative algorithm: moves nothing, but drives the lifecycle the
/// way the real algorithms do — checkpoint at the loop head, report at the
/// end of each iteration.
struct CountingAlgorithm {
    lifecycle: Lifecycle,
    iterations: usize,
    completed: usize,
    cleaned: bool,
    fail_at: Option<usize>,
    positions: VertexPositions,
}

impl CountingAlgorithm {
    fn new(iterations: usize) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            iterations,
            completed: 0,
            cleaned: false,
            fail_at: None,
            positions: VertexPositions::default(),
        }
    }
}

impl LayoutAlgorithm for CountingAlgorithm {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn initialize(&mut self) -> Result<()> {
        self.completed = 0;
        Ok(())
    }

    fn internal_compute(&mut self) -> Result<()> {
        for i in 0..self.iterations {
            self.lifecycle.check_continue()?;
            if self.fail_at == Some(i) {
                return Err(Error::MissingVertex {
                    vertex: "synthetic".to_string(),
                });
            }
            self.completed += 1;
            let percent = (i + 1) as f64 / self.iterations as f64 * 100.0;
            self.lifecycle
                .report_iteration(i + 1, percent, "step", &self.positions);
        }
        Ok(())
    }

    fn clean(&mut self) {
        self.cleaned = true;
    }
}

fn event_tag(event: &LayoutEvent<'_>) -> String {
    match event {
        LayoutEvent::Started => "started".to_string(),
        LayoutEvent::StateChanged(s) => format!("state:{s:?}"),
        LayoutEvent::ProgressChanged { .. } => "progress".to_string(),
        LayoutEvent::IterationEnded { iteration, .. } => format!("iteration:{iteration}"),
        LayoutEvent::Finished => "finished".to_string(),
        LayoutEvent::Aborted => "aborted".to_string(),
    }
}

#[test]
fn successful_run_walks_not_running_to_finished() {
    let mut alg = CountingAlgorithm::new(3);
    assert_eq!(alg.state(), AlgorithmState::NotRunning);
    alg.compute().unwrap();
    assert_eq!(alg.state(), AlgorithmState::Finished);
    assert_eq!(alg.completed, 3);
    assert!(alg.cleaned);
}

#[test]
fn events_fire_synchronously_in_program_order() {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);

    let mut alg = CountingAlgorithm::new(2);
    alg.lifecycle_mut().subscribe(move |event| {
        sink.lock().unwrap().push(event_tag(event));
        Control::Continue
    });
    alg.compute().unwrap();

    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "state:Running",
            "started",
            "iteration:1",
            "progress",
            "iteration:2",
            "progress",
            "state:Finished",
            "finished",
        ]
    );
}

#[test]
fn iteration_events_carry_strictly_increasing_indices_and_percent() {
    let seen: Arc<Mutex<Vec<(usize, f64)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut alg = CountingAlgorithm::new(10);
    alg.lifecycle_mut().subscribe(move |event| {
        if let LayoutEvent::IterationEnded {
            iteration, percent, ..
        } = event
        {
            sink.lock().unwrap().push((*iteration, *percent));
        }
        Control::Continue
    });
    alg.compute().unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 10);
    for pair in seen.windows(2) {
        assert!(pair[1].0 > pair[0].0);
        assert!(pair[1].1 > pair[0].1);
    }
}

#[test]
fn observer_abort_stops_at_the_next_checkpoint() {
    let mut alg = CountingAlgorithm::new(100);
    alg.lifecycle_mut().subscribe(|event| {
        if let LayoutEvent::IterationEnded { iteration, .. } = event {
            if *iteration >= 5 {
                return Control::Abort;
            }
        }
        Control::Continue
    });

    // Cancellation is not an error.
    alg.compute().unwrap();
    assert_eq!(alg.state(), AlgorithmState::Aborted);
    // The iteration that triggered the abort still completed; no later one
    // did.
    assert_eq!(alg.completed, 5);
    assert!(alg.cleaned);
}

#[test]
fn failure_propagates_after_clean_and_leaves_a_consistent_state() {
    let mut alg = CountingAlgorithm::new(10);
    alg.fail_at = Some(4);
    let err = alg.compute().unwrap_err();
    assert!(matches!(err, Error::MissingVertex { .. }));
    assert_ne!(alg.state(), AlgorithmState::Running);
    assert!(alg.cleaned);
    assert_eq!(alg.completed, 4);
}

#[test]
fn a_finished_instance_can_compute_again() {
    let mut alg = CountingAlgorithm::new(2);
    alg.compute().unwrap();
    alg.compute().unwrap();
    assert_eq!(alg.state(), AlgorithmState::Finished);
    assert_eq!(alg.completed, 2);
}

#[test]
fn abort_handle_is_a_no_op_unless_running() {
    let alg = CountingAlgorithm::new(2);
    let handle = alg.abort_handle();
    handle.abort();
    assert_eq!(handle.state(), AlgorithmState::NotRunning);
    assert!(!handle.is_abort_requested());
}

#[test]
fn no_observer_means_no_snapshot_work() {
    // `report_iteration` must not touch the position map when nobody is
    // listening; the counting algorithm reaches Finished without any
    // observer-related work.
    let mut alg = CountingAlgorithm::new(3);
    assert!(!alg.lifecycle().has_observers());
    alg.compute().unwrap();
    assert_eq!(alg.state(), AlgorithmState::Finished);
}

#[test]
fn registry_tracks_and_aborts_active_handles() {
    let count = Arc::new(AtomicUsize::new(0));

    let alg_a = CountingAlgorithm::new(2);
    let alg_b = CountingAlgorithm::new(2);

    let mut registry = LayoutRegistry::new();
    registry.register("a", alg_a.abort_handle());
    registry.register("b", alg_b.abort_handle());
    assert_eq!(registry.len(), 2);

    let visits = Arc::clone(&count);
    registry.for_each(|_, _| {
        visits.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(count.load(Ordering::SeqCst), 2);

    // Aborting idle handles is harmless.
    registry.abort_all();
    assert_eq!(alg_a.state(), AlgorithmState::NotRunning);

    assert!(registry.unregister("a").is_some());
    assert!(registry.unregister("a").is_none());
    assert_eq!(registry.len(), 1);
    assert!(registry.get("b").is_some());
}
