//! Monotonic time abstraction shared by the engine and its hosts.
//!
//! The engine never reads a clock on its own. Every operation receives the
//! current instant from the caller, and every timer is stored as a deadline
//! expressed in the same instant type. Hosts pick the representation: the
//! async runtime wraps `embassy_time::Instant`, while tests and the emulator
//! use the virtual [`SimInstant`].

use core::ops::{Add, AddAssign};
use core::time::Duration;

/// Monotonic instant understood by the panel engine.
pub trait PanelInstant: Copy + Ord + Add<Duration, Output = Self> {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Virtual instant counted in microseconds from an arbitrary origin.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SimInstant(u64);

impl SimInstant {
    /// Origin of the virtual clock.
    pub const ZERO: Self = Self(0);

    /// Creates an instant `micros` microseconds after the origin.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Creates an instant `millis` milliseconds after the origin.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Microseconds elapsed since the origin.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Whole milliseconds elapsed since the origin.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(micros))
    }
}

impl AddAssign<Duration> for SimInstant {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl PanelInstant for SimInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_saturates_instead_of_wrapping() {
        let late = SimInstant::from_micros(u64::MAX - 1);
        assert_eq!(late + Duration::from_secs(5), SimInstant::from_micros(u64::MAX));
    }

    #[test]
    fn duration_since_never_goes_negative() {
        let early = SimInstant::from_millis(10);
        let late = SimInstant::from_millis(250);
        assert_eq!(
            late.saturating_duration_since(early),
            Duration::from_millis(240)
        );
        assert_eq!(early.saturating_duration_since(late), Duration::ZERO);
    }
}
