//! Runner Implementation
//!
//! A Runner is the fundamental dispatch primitive. It wraps an operation
//! and notifies observers with each call's result.
//!
//! # How Runners Work
//!
//! 1. Guards run in registration order against the call arguments; the
//!    first one returning `true` blocks the call.
//!
//! 2. The wrapped operation runs and produces a [`Dispatch`]: either a
//!    plain value or a deferred completion signal.
//!
//! 3. If the one-shot lock flag is set, it resets and dispatch is skipped
//!    for this call. Otherwise the result is cached as `last` and the
//!    observers are notified in registration order.
//!
//! 4. A deferred result is not handed to observers directly; instead the
//!    observers are chained onto the completion signal, so they fire when
//!    the asynchronous work reports back.
//!
//! # Thread Safety
//!
//! A Runner is a cheap cloneable handle over shared state. Hook and guard
//! lists are snapshotted before calling out, so observers may re-enter the
//! runner (add hooks, invoke it again) without deadlocking.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::hook::{Guard, Hook};
use super::signal::Signal;

/// Counter for generating unique runner IDs.
static RUNNER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique runner ID.
fn next_runner_id() -> u64 {
    RUNNER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The result of a runner invocation, as seen by observers.
///
/// The wrapped operation declares up front whether it produced a value or
/// deferred to a completion signal; dispatch pattern-matches on the tag
/// instead of probing the result at runtime.
pub enum Dispatch<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// A synchronous result, delivered to each observer directly.
    Value(R),

    /// An asynchronous result. Observers are chained onto the completion
    /// signal and fire when it does.
    Deferred(Signal<R>),
}

impl<R> Dispatch<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Extract the synchronous value, if any.
    pub fn into_value(self) -> Option<R> {
        match self {
            Dispatch::Value(value) => Some(value),
            Dispatch::Deferred(_) => None,
        }
    }

    /// Extract the completion signal, if any.
    pub fn into_deferred(self) -> Option<Signal<R>> {
        match self {
            Dispatch::Value(_) => None,
            Dispatch::Deferred(signal) => Some(signal),
        }
    }

    pub(crate) fn into_step(self) -> Step<R> {
        match self {
            Dispatch::Value(value) => Step::Value(value),
            Dispatch::Deferred(signal) => Step::Deferred(signal),
        }
    }
}

impl<R> Clone for Dispatch<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        match self {
            Dispatch::Value(value) => Dispatch::Value(value.clone()),
            Dispatch::Deferred(signal) => Dispatch::Deferred(signal.clone()),
        }
    }
}

impl<R> Debug for Dispatch<R>
where
    R: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatch::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Dispatch::Deferred(signal) => f.debug_tuple("Deferred").field(&signal.id()).finish(),
        }
    }
}

/// Internal form of an operation's result.
///
/// `Muted` carries a value back to the caller without updating `last` or
/// notifying anyone. Properties use it for reads and redundant writes.
pub(crate) enum Step<R>
where
    R: Clone + Send + Sync + 'static,
{
    Value(R),
    Deferred(Signal<R>),
    Muted(R),
}

impl<R> Step<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn into_dispatch(self) -> Dispatch<R> {
        match self {
            Step::Value(value) | Step::Muted(value) => Dispatch::Value(value),
            Step::Deferred(signal) => Dispatch::Deferred(signal),
        }
    }
}

/// Internal outcome of a full invocation, used for scope chaining.
pub(crate) enum Outcome<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// A guard vetoed the call; nothing ran.
    Blocked,
    /// The operation ran but no dispatch occurred (muted or locked).
    Quiet(Dispatch<R>),
    /// The operation ran and observers were notified.
    Live(Dispatch<R>),
}

/// The previous operation, handed to an override as an explicit argument.
pub type SuperOp<A, R> = Arc<dyn Fn(&A) -> Dispatch<R> + Send + Sync>;

type StepOp<A, R> = Arc<dyn Fn(&A) -> Step<R> + Send + Sync>;

/// How a runner produces its result: by running an owned operation, or by
/// delegating to the base runner it was scoped from.
enum Exec<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    Op(RwLock<StepOp<A, R>>),
    Chained(Runner<A, R>),
}

struct Inner<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    id: u64,
    exec: Exec<A, R>,
    guards: RwLock<SmallVec<[Guard<A>; 2]>>,
    hooks: RwLock<SmallVec<[Hook<R>; 4]>>,
    lock: AtomicBool,
    last: RwLock<Option<Dispatch<R>>>,
    scopes: RwLock<HashMap<String, Runner<A, R>>>,
}

/// A wrapped operation with observer and guard management.
///
/// # Example
///
/// ```rust,ignore
/// let double = Runner::new(|n: &i32| Dispatch::Value(n * 2));
///
/// let seen = Hook::new(|result: &i32| println!("got {result}"));
/// double.add(&seen);
///
/// double.call(21); // prints "got 42"
/// ```
pub struct Runner<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    inner: Arc<Inner<A, R>>,
}

impl<A, R> Runner<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Wrap an operation into a runner.
    pub fn new<F>(op: F) -> Self
    where
        F: Fn(&A) -> Dispatch<R> + Send + Sync + 'static,
    {
        Self::from_step(move |args| op(args).into_step())
    }

    /// Wrap a step-level operation. Crate-internal: the `Muted` variant is
    /// how properties express "return without dispatching".
    pub(crate) fn from_step<F>(op: F) -> Self
    where
        F: Fn(&A) -> Step<R> + Send + Sync + 'static,
    {
        Self::build(Exec::Op(RwLock::new(Arc::new(op))))
    }

    fn chained(base: Runner<A, R>) -> Self {
        Self::build(Exec::Chained(base))
    }

    fn build(exec: Exec<A, R>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: next_runner_id(),
                exec,
                guards: RwLock::new(SmallVec::new()),
                hooks: RwLock::new(SmallVec::new()),
                lock: AtomicBool::new(false),
                last: RwLock::new(None),
                scopes: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Get the runner's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Invoke the runner.
    ///
    /// Returns `None` if a guard vetoed the call; otherwise the result,
    /// whether or not it was dispatched to observers.
    pub fn call(&self, args: A) -> Option<Dispatch<R>> {
        match self.invoke(&args) {
            Outcome::Blocked => None,
            Outcome::Quiet(result) | Outcome::Live(result) => Some(result),
        }
    }

    pub(crate) fn invoke(&self, args: &A) -> Outcome<R> {
        // Snapshot before calling out so guards may mutate registrations.
        let guards = self
            .inner
            .guards
            .read()
            .expect("guards lock poisoned")
            .clone();
        for guard in guards.iter() {
            if guard.check(args) {
                trace!(runner = self.inner.id, guard = ?guard.id(), "call vetoed");
                return Outcome::Blocked;
            }
        }

        let step = match &self.inner.exec {
            Exec::Op(slot) => {
                let op = slot.read().expect("op lock poisoned").clone();
                op(args)
            }
            // A scoped runner performs the base's full invocation first
            // (its guards, its operation, its dispatch) and only then
            // dispatches the same result to its own observers. Suppression
            // anywhere upstream silences the whole cascade.
            Exec::Chained(base) => match base.invoke(args) {
                Outcome::Blocked => return Outcome::Blocked,
                Outcome::Quiet(result) => return Outcome::Quiet(result),
                Outcome::Live(result) => result.into_step(),
            },
        };

        let result = match step {
            Step::Muted(value) => return Outcome::Quiet(Dispatch::Value(value)),
            other => other.into_dispatch(),
        };

        // One-shot suppression: consumed by exactly one qualifying call.
        if self.inner.lock.swap(false, Ordering::SeqCst) {
            trace!(runner = self.inner.id, "dispatch suppressed by lock");
            return Outcome::Quiet(result);
        }

        *self.inner.last.write().expect("last lock poisoned") = Some(result.clone());

        let hooks = self
            .inner
            .hooks
            .read()
            .expect("hooks lock poisoned")
            .clone();
        match &result {
            Dispatch::Value(value) => {
                for hook in hooks.iter() {
                    hook.invoke(value);
                }
            }
            Dispatch::Deferred(signal) => {
                for hook in hooks.iter() {
                    signal.add(hook);
                }
            }
        }
        trace!(runner = self.inner.id, observers = hooks.len(), "dispatched");

        Outcome::Live(result)
    }

    /// Register an observer hook. Idempotent per hook identity.
    pub fn add(&self, hook: &Hook<R>) {
        let mut hooks = self.inner.hooks.write().expect("hooks lock poisoned");
        if hooks.iter().all(|existing| existing.id() != hook.id()) {
            hooks.push(hook.clone());
        }
    }

    /// Deregister an observer hook by identity.
    pub fn remove(&self, hook: &Hook<R>) {
        self.inner
            .hooks
            .write()
            .expect("hooks lock poisoned")
            .retain(|existing| existing.id() != hook.id());
    }

    /// Subscribe and replay: register the hook and, if something has been
    /// dispatched before, catch the hook up with it immediately.
    pub fn bind(&self, hook: &Hook<R>) {
        self.add(hook);
        let last = self.inner.last.read().expect("last lock poisoned").clone();
        match last {
            Some(Dispatch::Value(value)) => hook.invoke(&value),
            Some(Dispatch::Deferred(signal)) => signal.bind(hook),
            None => {}
        }
    }

    /// Register a veto guard. Idempotent per guard identity.
    pub fn before(&self, guard: &Guard<A>) {
        let mut guards = self.inner.guards.write().expect("guards lock poisoned");
        if guards.iter().all(|existing| existing.id() != guard.id()) {
            guards.push(guard.clone());
        }
    }

    /// Deregister a veto guard by identity.
    pub fn remove_before(&self, guard: &Guard<A>) {
        self.inner
            .guards
            .write()
            .expect("guards lock poisoned")
            .retain(|existing| existing.id() != guard.id());
    }

    /// Suppress the next qualifying dispatch. The flag resets after being
    /// consumed once.
    pub fn lock(&self) {
        self.inner.lock.store(true, Ordering::SeqCst);
    }

    /// Check whether the one-shot lock is currently set.
    pub fn is_locked(&self) -> bool {
        self.inner.lock.load(Ordering::SeqCst)
    }

    /// Get the most recently dispatched result, if any.
    pub fn last(&self) -> Option<Dispatch<R>> {
        self.inner.last.read().expect("last lock poisoned").clone()
    }

    /// Get the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.hooks.read().expect("hooks lock poisoned").len()
    }

    /// Rebind the operation, exposing the previous one to the override as
    /// an explicit first argument (the super-call). Repeated overrides
    /// compose, most-derived first.
    ///
    /// Scoped runners own no operation; overriding one is ignored.
    pub fn override_with<F>(&self, f: F)
    where
        F: Fn(&SuperOp<A, R>, &A) -> Dispatch<R> + Send + Sync + 'static,
    {
        match &self.inner.exec {
            Exec::Op(slot) => {
                let mut op = slot.write().expect("op lock poisoned");
                let prev = op.clone();
                let super_op: SuperOp<A, R> = Arc::new(move |args: &A| prev(args).into_dispatch());
                *op = Arc::new(move |args: &A| f(&super_op, args).into_step());
                debug!(runner = self.inner.id, "operation overridden");
            }
            Exec::Chained(_) => {
                warn!(
                    runner = self.inner.id,
                    "override ignored: scoped runner delegates to its base"
                );
            }
        }
    }

    /// Get (creating if absent) the named scope derived from this runner.
    ///
    /// A scope is a runner that chains off its base: invoking the scope
    /// invokes the base first, so the base's observers fire, then the
    /// scope's own observers fire with the same result. Invoking the base
    /// never triggers the scope. The same name always returns the same
    /// derived runner.
    pub fn scope(&self, name: &str) -> Runner<A, R> {
        let mut scopes = self.inner.scopes.write().expect("scopes lock poisoned");
        if let Some(existing) = scopes.get(name) {
            return existing.clone();
        }
        debug!(runner = self.inner.id, scope = name, "scope derived");
        let derived = Runner::chained(self.clone());
        scopes.insert(name.to_owned(), derived.clone());
        derived
    }
}

impl<A, R> Clone for Runner<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> Debug for Runner<A, R>
where
    A: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("id", &self.inner.id)
            .field("observer_count", &self.observer_count())
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn counting_hook(counter: &Arc<AtomicI32>) -> Hook<i32> {
        let counter = counter.clone();
        Hook::new(move |_: &i32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn runner_notifies_observers_with_result() {
        let double = Runner::new(|n: &i32| Dispatch::Value(n * 2));
        let seen = Arc::new(AtomicI32::new(0));
        let seen_clone = seen.clone();

        double.add(&Hook::new(move |result: &i32| {
            seen_clone.store(*result, Ordering::SeqCst);
        }));

        let result = double.call(21).and_then(Dispatch::into_value);
        assert_eq!(result, Some(42));
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn adding_same_hook_twice_is_a_noop() {
        let runner = Runner::new(|_: &i32| Dispatch::Value(0));
        let calls = Arc::new(AtomicI32::new(0));
        let hook = counting_hook(&calls);

        runner.add(&hook);
        runner.add(&hook);
        assert_eq!(runner.observer_count(), 1);

        runner.call(1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_hook_is_not_called() {
        let runner = Runner::new(|_: &i32| Dispatch::Value(0));
        let calls = Arc::new(AtomicI32::new(0));
        let hook = counting_hook(&calls);

        runner.add(&hook);
        runner.call(1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        runner.remove(&hook);
        runner.call(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guard_veto_blocks_op_and_dispatch() {
        let ran = Arc::new(AtomicI32::new(0));
        let ran_clone = ran.clone();
        let runner = Runner::new(move |_: &i32| {
            ran_clone.fetch_add(1, Ordering::SeqCst);
            Dispatch::Value(0)
        });

        let calls = Arc::new(AtomicI32::new(0));
        runner.add(&counting_hook(&calls));
        runner.before(&Guard::new(|_: &i32| true));

        assert!(runner.call(1).is_none());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn guards_run_in_order_and_short_circuit() {
        let trail = Arc::new(RwLock::new(String::new()));
        let runner = Runner::new(|_: &i32| Dispatch::Value(0));

        let t1 = trail.clone();
        runner.before(&Guard::new(move |_: &i32| {
            t1.write().unwrap().push('a');
            true
        }));
        let t2 = trail.clone();
        runner.before(&Guard::new(move |_: &i32| {
            t2.write().unwrap().push('b');
            false
        }));

        runner.call(1);
        assert_eq!(*trail.read().unwrap(), "a");
    }

    #[test]
    fn lock_suppresses_exactly_one_dispatch() {
        let runner = Runner::new(|n: &i32| Dispatch::Value(*n));
        let calls = Arc::new(AtomicI32::new(0));
        runner.add(&counting_hook(&calls));

        runner.lock();
        assert!(runner.is_locked());

        // Suppressed, but the caller still gets the result.
        let result = runner.call(1).and_then(Dispatch::into_value);
        assert_eq!(result, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!runner.is_locked());

        runner.call(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bind_replays_last_dispatched_value() {
        let runner = Runner::new(|n: &i32| Dispatch::Value(*n));
        let seen = Arc::new(AtomicI32::new(-1));

        runner.call(7);

        let seen_clone = seen.clone();
        runner.bind(&Hook::new(move |value: &i32| {
            seen_clone.store(*value, Ordering::SeqCst);
        }));
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn bind_does_not_replay_before_first_dispatch() {
        let runner = Runner::new(|n: &i32| Dispatch::Value(*n));
        let calls = Arc::new(AtomicI32::new(0));

        runner.bind(&counting_hook(&calls));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        runner.call(1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lock_suppressed_call_does_not_update_last() {
        let runner = Runner::new(|n: &i32| Dispatch::Value(*n));

        runner.call(1);
        runner.lock();
        runner.call(2);

        let last = runner.last().and_then(Dispatch::into_value);
        assert_eq!(last, Some(1));
    }

    #[test]
    fn override_composes_with_super_call() {
        let runner = Runner::new(|n: &i32| Dispatch::Value(*n));

        runner.override_with(|prev, args: &i32| {
            let base = prev(args).into_value().expect("base returns a value");
            Dispatch::Value(base * 10)
        });
        runner.override_with(|prev, args: &i32| {
            let base = prev(args).into_value().expect("base returns a value");
            Dispatch::Value(base + 1)
        });

        // Most-derived first: (5 * 10) + 1
        let result = runner.call(5).and_then(Dispatch::into_value);
        assert_eq!(result, Some(51));
    }

    #[test]
    fn scope_is_memoized_per_name() {
        let base = Runner::new(|n: &i32| Dispatch::Value(*n));

        let a1 = base.scope("a");
        let a2 = base.scope("a");
        let b = base.scope("b");

        assert_eq!(a1.id(), a2.id());
        assert_ne!(a1.id(), b.id());
    }

    #[test]
    fn scope_cascade_fires_base_then_scope() {
        let base = Runner::new(|n: &i32| Dispatch::Value(*n));
        let inner = base.scope("a").scope("b");

        let trail = Arc::new(RwLock::new(String::new()));
        let t = trail.clone();
        base.add(&Hook::new(move |_: &i32| t.write().unwrap().push('1')));
        let t = trail.clone();
        base.scope("a").add(&Hook::new(move |_: &i32| t.write().unwrap().push('2')));
        let t = trail.clone();
        inner.add(&Hook::new(move |_: &i32| t.write().unwrap().push('3')));

        inner.call(0);
        assert_eq!(*trail.read().unwrap(), "123");

        // Outer invocations never cascade inward.
        base.call(0);
        assert_eq!(*trail.read().unwrap(), "1231");
    }

    #[test]
    fn blocked_base_silences_scope() {
        let base = Runner::new(|n: &i32| Dispatch::Value(*n));
        let scoped = base.scope("a");

        let calls = Arc::new(AtomicI32::new(0));
        scoped.add(&counting_hook(&calls));

        base.before(&Guard::new(|_: &i32| true));
        assert!(scoped.call(1).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn locked_base_silences_scope_once() {
        let base = Runner::new(|n: &i32| Dispatch::Value(*n));
        let scoped = base.scope("a");

        let calls = Arc::new(AtomicI32::new(0));
        scoped.add(&counting_hook(&calls));

        base.lock();
        scoped.call(1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        scoped.call(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
