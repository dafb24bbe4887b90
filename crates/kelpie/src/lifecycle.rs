//! Shared algorithm lifecycle: state machine, cooperative cancellation and
//! synchronous progress events.
//!
//! Every layout algorithm embeds a [`Lifecycle`] and implements
//! [`LayoutAlgorithm`]; the provided `compute()` drives the state machine
//! (NotRunning → Running → Finished | PendingAbortion → Aborted), runs the
//! `initialize`/`internal_compute`/`clean` hooks and guarantees that `clean`
//! runs no matter how the compute step ends. Cancellation is cooperative:
//! `AbortHandle::abort()` raises a flag that the compute loop polls at
//! iteration boundaries, so the current iteration always completes before the
//! run unwinds with a valid partial result.

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::graph::VertexId;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmState {
    #[default]
    NotRunning,
    Running,
    PendingAbortion,
    Finished,
    Aborted,
}

/// Observer verdict for an event: keep going or stop at the next checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Abort,
}

#[derive(Debug)]
pub enum LayoutEvent<'a> {
    Started,
    StateChanged(AlgorithmState),
    ProgressChanged {
        percent: f64,
    },
    IterationEnded {
        iteration: usize,
        percent: f64,
        message: &'a str,
        positions: &'a FxHashMap<VertexId, Point>,
    },
    Finished,
    Aborted,
}

pub type Observer = Box<dyn FnMut(&LayoutEvent<'_>) -> Control + Send>;

#[derive(Debug, Default)]
struct LifecycleInner {
    state: Mutex<AlgorithmState>,
    cancel: AtomicBool,
}

/// Cloneable, thread-safe handle used to observe the state and request
/// cancellation of a running algorithm.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    inner: Arc<LifecycleInner>,
}

impl AbortHandle {
    pub fn state(&self) -> AlgorithmState {
        *self.inner.state.lock().expect("lifecycle state poisoned")
    }

    /// Requests cancellation. Only has an effect while the algorithm is
    /// `Running`; the flag is observed at the next iteration checkpoint.
    pub fn abort(&self) {
        let mut state = self.inner.state.lock().expect("lifecycle state poisoned");
        if *state == AlgorithmState::Running {
            *state = AlgorithmState::PendingAbortion;
            self.inner.cancel.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_abort_requested(&self) -> bool {
        self.inner.cancel.load(Ordering::SeqCst)
    }
}

/// Lifecycle state owned by one algorithm instance.
pub struct Lifecycle {
    inner: Arc<LifecycleInner>,
    observers: Vec<Observer>,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LifecycleInner::default()),
            observers: Vec::new(),
        }
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn state(&self) -> AlgorithmState {
        *self.inner.state.lock().expect("lifecycle state poisoned")
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&LayoutEvent<'_>) -> Control + Send + 'static,
    ) {
        self.observers.push(Box::new(observer));
    }

    /// True when at least one observer is registered. Algorithms use this to
    /// skip building per-iteration snapshots nobody will see.
    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    /// Errors with [`Error::Canceled`] once an abort has been requested.
    /// Algorithms poll this at least once per outer iteration.
    pub fn check_continue(&self) -> Result<()> {
        if self.inner.cancel.load(Ordering::SeqCst) {
            return Err(Error::Canceled);
        }
        Ok(())
    }

    /// Delivers an event to every observer, synchronously and in order. An
    /// `Abort` verdict from any observer raises the cancellation flag, which
    /// takes effect at the next checkpoint.
    pub fn emit(&mut self, event: &LayoutEvent<'_>) {
        let mut abort = false;
        for observer in &mut self.observers {
            if observer(event) == Control::Abort {
                abort = true;
            }
        }
        if abort {
            self.abort_handle().abort();
        }
    }

    /// Reports the end of one iteration. The caller passes the live position
    /// map; it is only touched when someone is listening.
    pub fn report_iteration(
        &mut self,
        iteration: usize,
        percent: f64,
        message: &str,
        positions: &FxHashMap<VertexId, Point>,
    ) {
        if !self.has_observers() {
            return;
        }
        self.emit(&LayoutEvent::IterationEnded {
            iteration,
            percent,
            message,
            positions,
        });
        self.emit(&LayoutEvent::ProgressChanged { percent });
    }

    fn transition(&mut self, to: AlgorithmState) {
        {
            let mut state = self.inner.state.lock().expect("lifecycle state poisoned");
            *state = to;
        }
        self.emit(&LayoutEvent::StateChanged(to));
        match to {
            AlgorithmState::Running => self.emit(&LayoutEvent::Started),
            AlgorithmState::Finished => self.emit(&LayoutEvent::Finished),
            AlgorithmState::Aborted => self.emit(&LayoutEvent::Aborted),
            AlgorithmState::NotRunning | AlgorithmState::PendingAbortion => {}
        }
    }

    fn begin(&mut self) -> Result<()> {
        {
            let mut state = self.inner.state.lock().expect("lifecycle state poisoned");
            match *state {
                AlgorithmState::NotRunning | AlgorithmState::Finished | AlgorithmState::Aborted => {
                    *state = AlgorithmState::Running;
                }
                AlgorithmState::Running | AlgorithmState::PendingAbortion => {
                    return Err(Error::AlgorithmAlreadyRunning);
                }
            }
            self.inner.cancel.store(false, Ordering::SeqCst);
        }
        self.emit(&LayoutEvent::StateChanged(AlgorithmState::Running));
        self.emit(&LayoutEvent::Started);
        Ok(())
    }

    fn finish(&mut self, result: Result<()>) -> Result<()> {
        let abort_requested = self.inner.cancel.load(Ordering::SeqCst);
        match result {
            Ok(()) => {
                if abort_requested {
                    self.transition(AlgorithmState::Aborted);
                } else {
                    self.transition(AlgorithmState::Finished);
                }
                Ok(())
            }
            Err(Error::Canceled) => {
                self.transition(AlgorithmState::Aborted);
                Ok(())
            }
            Err(e) => {
                // The run failed; the instance must not be left `Running`.
                self.transition(AlgorithmState::Aborted);
                Err(e)
            }
        }
    }
}

/// The contract every layout algorithm implements. `compute()` is provided
/// and must not be overridden; algorithms supply the three hooks.
pub trait LayoutAlgorithm {
    fn lifecycle(&self) -> &Lifecycle;
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Validation and working-state setup. Runs after the transition to
    /// `Running`.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// The algorithm-specific computation.
    fn internal_compute(&mut self) -> Result<()>;

    /// Always runs after `internal_compute`, whether it succeeded, failed or
    /// was canceled.
    fn clean(&mut self) {}

    /// Runs the full lifecycle. Cancellation is not an error: an aborted run
    /// returns `Ok(())` with the state left as `Aborted` and a valid partial
    /// result. Any other error propagates after `clean` has run.
    fn compute(&mut self) -> Result<()> {
        self.lifecycle_mut().begin()?;
        let result = self.initialize().and_then(|()| self.internal_compute());
        self.clean();
        self.lifecycle_mut().finish(result)
    }

    fn state(&self) -> AlgorithmState {
        self.lifecycle().state()
    }

    fn abort_handle(&self) -> AbortHandle {
        self.lifecycle().abort_handle()
    }
}
