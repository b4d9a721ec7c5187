//! Host runtime for the panel engine built on Embassy's clock and channels.

pub mod driver;
pub mod instant;

use log::info;
use panel_core::navigation::{NavigationError, Navigator};

pub use driver::{EventQueue, EventReceiver, EventSender, Handled, PanelDriver, PanelEvent};
pub use instant::RuntimeInstant;

/// Navigator for headless hosts: links are written to the log.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn open(&mut self, url: &str) -> Result<(), NavigationError> {
        info!("open {url}");
        Ok(())
    }
}
