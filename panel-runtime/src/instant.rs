//! Binds the engine's instant abstraction to Embassy's monotonic clock.

use core::ops::Add;
use core::time::Duration;

use embassy_time::{Duration as EmbassyDuration, Instant};
use panel_core::time::PanelInstant;

/// Embassy instant usable as the panel engine's clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RuntimeInstant(Instant);

impl RuntimeInstant {
    /// Reads the Embassy clock.
    #[must_use]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(Instant::from_micros(micros))
    }

    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Instant::from_millis(millis))
    }

    #[must_use]
    pub const fn as_embassy(self) -> Instant {
        self.0
    }
}

impl From<Instant> for RuntimeInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl From<RuntimeInstant> for Instant {
    fn from(instant: RuntimeInstant) -> Self {
        instant.0
    }
}

impl Add<Duration> for RuntimeInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        match self.0.checked_add(EmbassyDuration::from_micros(micros)) {
            Some(instant) => Self(instant),
            None => Self(Instant::MAX),
        }
    }
}

impl PanelInstant for RuntimeInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        let micros = self
            .0
            .checked_duration_since(earlier.0)
            .map_or(0, |elapsed| elapsed.as_micros());
        Duration::from_micros(micros)
    }
}
