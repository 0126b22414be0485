//! The oracle contract and oracle decorators.
//!
//! An oracle classifies one candidate as [`Verdict::Fail`],
//! [`Verdict::Pass`] or [`Verdict::Unresolved`]. Everything an oracle does to
//! reach that verdict (spawning processes, writing files, enforcing timeouts)
//! is its own business; reducers only await the answer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::verdict::{Verdict, VerdictCounts};

/// A pass/fail test over candidates of type `C`.
///
/// Oracles are called through `&self` and may be called concurrently when a
/// reducer is configured with more than one worker, so stateful oracles need
/// interior mutability.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use deltamin_core::{Oracle, Verdict};
///
/// struct ContainsSeven;
///
/// #[async_trait]
/// impl Oracle<[u32]> for ContainsSeven {
///     async fn test(&self, candidate: &[u32]) -> Verdict {
///         if candidate.contains(&7) {
///             Verdict::Fail
///         } else {
///             Verdict::Pass
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Oracle<C: ?Sized + Sync>: Send + Sync {
    /// Test one candidate.
    async fn test(&self, candidate: &C) -> Verdict;

    /// Name used in logs.
    fn name(&self) -> &str {
        "oracle"
    }
}

#[async_trait]
impl<C, O> Oracle<C> for &O
where
    C: ?Sized + Sync,
    O: Oracle<C> + ?Sized,
{
    async fn test(&self, candidate: &C) -> Verdict {
        (**self).test(candidate).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<C, O> Oracle<C> for Arc<O>
where
    C: ?Sized + Sync,
    O: Oracle<C> + ?Sized,
{
    async fn test(&self, candidate: &C) -> Verdict {
        (**self).test(candidate).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// An oracle backed by a synchronous closure.
pub struct FnOracle<F> {
    name: String,
    func: F,
}

impl<F> FnOracle<F> {
    /// Wrap `func` as an oracle.
    pub fn new(func: F) -> Self {
        Self {
            name: "fn".to_string(),
            func,
        }
    }

    /// Set the name used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Wrap a synchronous closure as an oracle.
pub fn oracle_fn<C, F>(func: F) -> FnOracle<F>
where
    C: ?Sized,
    F: Fn(&C) -> Verdict + Send + Sync,
{
    FnOracle::new(func)
}

#[async_trait]
impl<C, F> Oracle<C> for FnOracle<F>
where
    C: ?Sized + Sync,
    F: Fn(&C) -> Verdict + Send + Sync,
{
    async fn test(&self, candidate: &C) -> Verdict {
        (self.func)(candidate)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Decorator that counts the verdicts of the wrapped oracle.
pub struct RecordingOracle<O> {
    inner: O,
    fail: AtomicUsize,
    pass: AtomicUsize,
    unresolved: AtomicUsize,
}

impl<O> RecordingOracle<O> {
    /// Start counting the verdicts of `inner`.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            fail: AtomicUsize::new(0),
            pass: AtomicUsize::new(0),
            unresolved: AtomicUsize::new(0),
        }
    }

    /// Snapshot of the counters.
    pub fn counts(&self) -> VerdictCounts {
        VerdictCounts {
            fail: self.fail.load(Ordering::Relaxed),
            pass: self.pass.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
        }
    }

    /// Total number of calls forwarded to the wrapped oracle.
    pub fn calls(&self) -> usize {
        self.counts().total()
    }

    /// The wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

#[async_trait]
impl<C, O> Oracle<C> for RecordingOracle<O>
where
    C: ?Sized + Sync,
    O: Oracle<C>,
{
    async fn test(&self, candidate: &C) -> Verdict {
        let verdict = self.inner.test(candidate).await;
        let counter = match verdict {
            Verdict::Fail => &self.fail,
            Verdict::Pass => &self.pass,
            Verdict::Unresolved => &self.unresolved,
        };
        let seen = counter.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(oracle = self.inner.name(), %verdict, seen, "Oracle verdict");
        verdict
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
