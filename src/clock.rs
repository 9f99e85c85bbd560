//! Time source abstraction consulted for every credential validity decision.

// self
use crate::_prelude::*;

/// Injectable time source.
///
/// Production code uses [`SystemClock`]; tests inject [`ManualClock`] to walk
/// credentials across their expiry instant without sleeping.
pub trait Clock: 'static + Send + Sync {
	/// Current instant in UTC.
	fn now(&self) -> OffsetDateTime;
}

/// System clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for tests.
#[cfg(any(test, feature = "test"))]
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
#[cfg(any(test, feature = "test"))]
impl ManualClock {
	/// Creates a clock frozen at the provided instant.
	pub fn starting_at(instant: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(instant)))
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Jumps the clock to an absolute instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
#[cfg(any(test, feature = "test"))]
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
