//! Task Implementation
//!
//! A Task is a runner whose operation completes asynchronously. Instead of
//! returning a result, the operation receives a fresh completion
//! [`Signal`] and arranges for it to be emitted later, on whatever
//! scheduling primitive the host provides (timer, frame callback,
//! immediate). The core takes no position on which.
//!
//! # Last-Call-Wins
//!
//! In throttled mode, each call bumps a generation counter and the new
//! completion signal carries a guard that vetoes its dispatch unless its
//! generation is still the latest. Rapid repeated calls therefore collapse
//! to a single observer notification from the final call; stale
//! completions are permanently silenced.
//!
//! # Burst Coalescing
//!
//! [`Task::deferred`] goes one step further for render-style work: a burst
//! of calls shares one completion signal and one scheduled execution,
//! which runs the wrapped function once with the latest arguments.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use super::core::{Dispatch, Runner, Step};
use super::hook::{Guard, Hook};
use super::signal::Signal;

/// State shared by the calls of one deferred burst.
struct Burst<A, R>
where
    R: Clone + Send + Sync + 'static,
{
    args: Option<A>,
    completion: Option<Signal<R>>,
    armed: bool,
}

impl<A, R> Burst<A, R>
where
    R: Clone + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            args: None,
            completion: None,
            armed: false,
        }
    }
}

/// A runner with asynchronous completion.
///
/// # Example
///
/// ```rust,ignore
/// let fetch = Task::new(|done: Signal<String>, url: &String| {
///     let url = url.clone();
///     spawn_on_host(move || done.emit(load(&url)));
/// });
///
/// fetch.add(&Hook::new(|body: &String| println!("{body}")));
/// fetch.call("https://example".to_string());
/// ```
pub struct Task<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    runner: Runner<A, R>,
    latest: Arc<RwLock<Option<Signal<R>>>>,
    generation: Arc<AtomicU64>,
}

impl<A, R> Task<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Wrap an operation; every completion dispatches.
    pub fn new<F>(operation: F) -> Self
    where
        F: Fn(Signal<R>, &A) + Send + Sync + 'static,
    {
        Self::build(Arc::new(operation), false)
    }

    /// Wrap an operation with last-call-wins semantics: a call supersedes
    /// any pending completion, which is then silenced for good.
    pub fn throttled<F>(operation: F) -> Self
    where
        F: Fn(Signal<R>, &A) + Send + Sync + 'static,
    {
        Self::build(Arc::new(operation), true)
    }

    fn build(operation: Arc<dyn Fn(Signal<R>, &A) + Send + Sync>, throttled: bool) -> Self {
        let latest: Arc<RwLock<Option<Signal<R>>>> = Arc::new(RwLock::new(None));
        let generation = Arc::new(AtomicU64::new(0));

        let latest_cell = latest.clone();
        let generation_counter = generation.clone();
        let runner = Runner::from_step(move |args: &A| {
            let current = generation_counter.fetch_add(1, Ordering::SeqCst) + 1;
            let completion: Signal<R> = Signal::new();

            if throttled {
                let counter = generation_counter.clone();
                completion.before(&Guard::new(move |_: &R| {
                    counter.load(Ordering::SeqCst) != current
                }));
            }

            {
                let mut pending = latest_cell.write().expect("latest lock poisoned");
                if throttled && pending.is_some() {
                    debug!(generation = current, "pending completion superseded");
                }
                *pending = Some(completion.clone());
            }

            operation(completion.clone(), args);
            Step::Deferred(completion)
        });

        Self {
            runner,
            latest,
            generation,
        }
    }

    /// Invoke the task.
    ///
    /// The operation is started and its completion signal returned
    /// immediately; observers fire when the signal is emitted. `None` if a
    /// guard on the task vetoed the call.
    pub fn call(&self, args: A) -> Option<Signal<R>> {
        self.runner.call(args).and_then(Dispatch::into_deferred)
    }

    /// The most recently created completion signal, if any.
    pub fn pending(&self) -> Option<Signal<R>> {
        self.latest.read().expect("latest lock poisoned").clone()
    }

    /// How many times the task has been invoked.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Register an observer. It is chained onto each call's completion
    /// signal. Idempotent per hook identity.
    pub fn add(&self, hook: &Hook<R>) {
        self.runner.add(hook);
    }

    /// Deregister an observer from future completions.
    pub fn remove(&self, hook: &Hook<R>) {
        self.runner.remove(hook);
    }

    /// Register an observer and catch it up on the most recent completion
    /// signal, including its value if it already fired.
    pub fn bind(&self, hook: &Hook<R>) {
        self.runner.bind(hook);
    }

    /// Register a veto guard on the task itself.
    pub fn before(&self, guard: &Guard<A>) {
        self.runner.before(guard);
    }

    /// Deregister a veto guard.
    pub fn remove_before(&self, guard: &Guard<A>) {
        self.runner.remove_before(guard);
    }

    /// Access the underlying runner.
    pub fn runner(&self) -> &Runner<A, R> {
        &self.runner
    }
}

impl<A, R> Task<A, R>
where
    A: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Coalesce bursts of calls into one execution of `f`.
    ///
    /// Each call overwrites the queued arguments. The first call of a
    /// burst creates the burst's completion signal and hands a fire
    /// closure to `schedule`; when the host runs it, `f` executes once
    /// with the latest arguments and the signal emits the result.
    pub fn deferred<F, S>(f: F, schedule: S) -> Self
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
        S: Fn(Box<dyn FnOnce() + Send>) + Send + Sync + 'static,
    {
        let latest: Arc<RwLock<Option<Signal<R>>>> = Arc::new(RwLock::new(None));
        let generation = Arc::new(AtomicU64::new(0));
        let state: Arc<Mutex<Burst<A, R>>> = Arc::new(Mutex::new(Burst::new()));
        let f = Arc::new(f);

        let latest_cell = latest.clone();
        let generation_counter = generation.clone();
        let runner = Runner::from_step(move |args: &A| {
            generation_counter.fetch_add(1, Ordering::SeqCst);

            let mut burst = state.lock().expect("burst lock poisoned");
            burst.args = Some(args.clone());

            if let Some(completion) = burst.completion.clone().filter(|_| burst.armed) {
                return Step::Deferred(completion);
            }

            let completion: Signal<R> = Signal::new();
            burst.armed = true;
            burst.completion = Some(completion.clone());
            *latest_cell.write().expect("latest lock poisoned") = Some(completion.clone());
            drop(burst);

            let state = state.clone();
            let f = f.clone();
            schedule(Box::new(move || {
                let (args, completion) = {
                    let mut burst = state.lock().expect("burst lock poisoned");
                    burst.armed = false;
                    (burst.args.take(), burst.completion.take())
                };
                if let (Some(args), Some(completion)) = (args, completion) {
                    completion.emit(f(&args));
                }
            }));

            Step::Deferred(completion)
        });

        Self {
            runner,
            latest,
            generation,
        }
    }
}

impl<A, R> Clone for Task<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            latest: Arc::clone(&self.latest),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<A, R> Debug for Task<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.runner.id())
            .field("generation", &self.generation())
            .finish()
    }
}
