//! The reader/writer gate shared by every stateful component.
//!
//! A [`ThreadSafeResource`] owns its state behind a `parking_lot::RwLock`.
//! Callers never block indefinitely: each acquisition is attempted up to
//! [`LockPolicy::max_attempts`] times, each attempt waiting at most
//! [`LockPolicy::attempt_timeout`]. If every attempt fails the caller gets
//! [`Error::Collision`] and must decide whether to retry, abort or propagate.
//!
//! Release is tied to the returned guard. Dropping it ends the read or the
//! write, on every exit path including unwinding.
//!
//! The underlying lock is task-fair: once a writer is waiting, new readers
//! queue behind it, so a steady stream of readers cannot starve writers.
//! Guards are not reentrant. Acquiring a read guard while already holding
//! one on the same resource can collide if a writer is queued in between.
//!
//! ```
//! use tessera_core::resource::ThreadSafeResource;
//!
//! let counter = ThreadSafeResource::new("counter", 0u32);
//! *counter.begin_write().unwrap() += 1;
//! assert_eq!(*counter.begin_read().unwrap(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tessera_common::utils::{AccessMode, Error, Result};

/// Shared read access to a gated resource. Dropping it ends the read.
pub type ReadGuard<'a, T> = RwLockReadGuard<'a, T>;

/// Exclusive write access to a gated resource. Dropping it ends the write.
pub type WriteGuard<'a, T> = RwLockWriteGuard<'a, T>;

/// Retry budget applied to every acquisition on a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// How many times acquisition is attempted before reporting a collision.
    pub max_attempts: u32,
    /// How long a single attempt may wait.
    pub attempt_timeout: Duration,
}

impl LockPolicy {
    /// Default number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

    /// Default wait per attempt.
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(25);

    /// Creates a policy with the given budget.
    #[must_use]
    pub const fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            attempt_timeout,
        }
    }

    /// A policy that tries exactly once and gives up after `timeout`.
    #[must_use]
    pub const fn fail_fast(timeout: Duration) -> Self {
        Self::new(1, timeout)
    }

    /// Sets the number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the wait per attempt.
    #[must_use]
    pub const fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Upper bound on the total time one acquisition can wait.
    #[must_use]
    pub fn total_budget(&self) -> Duration {
        self.attempt_timeout.saturating_mul(self.max_attempts)
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_ATTEMPT_TIMEOUT)
    }
}

/// A named piece of state guarded by a bounded reader/writer gate.
pub struct ThreadSafeResource<T> {
    name: String,
    policy: LockPolicy,
    state: RwLock<T>,
    collisions: AtomicU64,
}

impl<T> ThreadSafeResource<T> {
    /// Wraps `state` with the default [`LockPolicy`].
    pub fn new(name: impl Into<String>, state: T) -> Self {
        Self::with_policy(name, state, LockPolicy::default())
    }

    /// Wraps `state` with an explicit policy.
    pub fn with_policy(name: impl Into<String>, state: T, policy: LockPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            state: RwLock::new(state),
            collisions: AtomicU64::new(0),
        }
    }

    /// Name reported in collision errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The active retry budget.
    #[must_use]
    pub const fn policy(&self) -> LockPolicy {
        self.policy
    }

    /// Replaces the retry budget.
    pub fn set_policy(&mut self, policy: LockPolicy) {
        self.policy = policy;
    }

    /// Number of acquisitions on this gate that ended in a collision.
    #[must_use]
    pub fn collisions(&self) -> u64 {
        self.collisions.load(Ordering::Relaxed)
    }

    /// Enters the gate for shared reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Collision`] if no attempt obtained read access.
    pub fn begin_read(&self) -> Result<ReadGuard<'_, T>> {
        for attempt in 1..=self.policy.max_attempts {
            if let Some(guard) = self.state.try_read_for(self.policy.attempt_timeout) {
                return Ok(guard);
            }
            tracing::trace!(resource = %self.name, attempt, "read access not yet granted");
        }
        Err(self.collision(AccessMode::Read))
    }

    /// Enters the gate for exclusive writing.
    ///
    /// Succeeds only once no reader and no other writer is inside.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Collision`] if no attempt obtained write access.
    pub fn begin_write(&self) -> Result<WriteGuard<'_, T>> {
        for attempt in 1..=self.policy.max_attempts {
            if let Some(guard) = self.state.try_write_for(self.policy.attempt_timeout) {
                return Ok(guard);
            }
            tracing::trace!(resource = %self.name, attempt, "write access not yet granted");
        }
        Err(self.collision(AccessMode::Write))
    }

    /// Direct access when the caller already holds the resource exclusively.
    pub fn get_mut(&mut self) -> &mut T {
        self.state.get_mut()
    }

    /// Consumes the gate and returns the state.
    pub fn into_inner(self) -> T {
        self.state.into_inner()
    }

    fn collision(&self, access: AccessMode) -> Error {
        self.collisions.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            resource = %self.name,
            %access,
            attempts = self.policy.max_attempts,
            "gate collision"
        );
        Error::Collision {
            resource: self.name.clone(),
            access,
            attempts: self.policy.max_attempts,
        }
    }
}

impl<T: Default> Default for ThreadSafeResource<T> {
    fn default() -> Self {
        Self::new(std::any::type_name::<T>(), T::default())
    }
}

impl<T> std::fmt::Debug for ThreadSafeResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadSafeResource")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("collisions", &self.collisions())
            .finish_non_exhaustive()
    }
}
