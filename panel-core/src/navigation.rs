//! Navigation side effects triggered by presses and macro steps.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Failure reported by a [`Navigator`]. The engine logs it and carries on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NavigationError {
    /// The host refused to open the link.
    Blocked(String),
    /// The host has nowhere to open links.
    Unavailable,
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::Blocked(url) => write!(f, "navigation to {url} was blocked"),
            NavigationError::Unavailable => f.write_str("navigation is unavailable"),
        }
    }
}

/// Opens links on behalf of the engine.
pub trait Navigator {
    fn open(&mut self, url: &str) -> Result<(), NavigationError>;
}

/// Navigator that accepts every link and does nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn open(&mut self, _url: &str) -> Result<(), NavigationError> {
        Ok(())
    }
}

/// Navigator that remembers every link it was asked to open.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    opened: Vec<String>,
    fail: bool,
}

impl RecordingNavigator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            opened: Vec::new(),
            fail: false,
        }
    }

    /// Navigator that records each attempt and then reports it as blocked.
    #[must_use]
    pub const fn failing() -> Self {
        Self {
            opened: Vec::new(),
            fail: true,
        }
    }

    #[must_use]
    pub fn opened(&self) -> &[String] {
        &self.opened
    }

    /// Drains the links recorded so far.
    pub fn take_opened(&mut self) -> Vec<String> {
        core::mem::take(&mut self.opened)
    }
}

impl Navigator for RecordingNavigator {
    fn open(&mut self, url: &str) -> Result<(), NavigationError> {
        self.opened.push(String::from(url));
        if self.fail {
            Err(NavigationError::Blocked(String::from(url)))
        } else {
            Ok(())
        }
    }
}
