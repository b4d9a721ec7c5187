//! Async task that owns a panel and sleeps until its next deadline.
//!
//! Producers push [`PanelEvent`]s into an [`EventQueue`]; the driver wakes on
//! either a new event or the earliest pending engine deadline, whichever comes
//! first, so macro steps, long presses, and completion flags fire on time
//! without a polling tick.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::Timer;
use log::{debug, info, warn};
use panel_core::behavior::{ButtonDefinition, ButtonId, Signal};
use panel_core::executor::{ActionExecutor, ExecutorError, PressOutcome};
use panel_core::navigation::Navigator;

use crate::instant::RuntimeInstant;

/// Depth of the event queue shared between producers and the driver.
pub const EVENT_QUEUE_DEPTH: usize = 8;

type PanelMutex = NoopRawMutex;

/// Queue used to hand input events to the driver.
pub type EventQueue = Channel<PanelMutex, PanelEvent, EVENT_QUEUE_DEPTH>;

/// Convenience sender type alias for the event queue.
pub type EventSender<'a> = Sender<'a, PanelMutex, PanelEvent, EVENT_QUEUE_DEPTH>;

/// Convenience receiver type alias for the event queue.
pub type EventReceiver<'a> = Receiver<'a, PanelMutex, PanelEvent, EVENT_QUEUE_DEPTH>;

/// Input delivered to the driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelEvent {
    Press(ButtonId),
    PressStart(ButtonId),
    PressEnd(ButtonId),
    Input(ButtonId, String),
    Signal(Signal, bool),
    /// Replace the button list wholesale.
    Load(Vec<ButtonDefinition>),
    /// Apply an edited button list; surviving buttons keep their state.
    Sync(Vec<ButtonDefinition>),
    Remove(ButtonId),
    /// Cancel every pending timer and stop the driver.
    Shutdown,
}

/// What handling one event produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handled {
    Press(PressOutcome),
    /// A long-press gesture was armed or disarmed.
    Gesture(bool),
    Applied,
    Shutdown,
}

/// Owns an [`ActionExecutor`] and drives it from a queue and the clock.
pub struct PanelDriver<N> {
    executor: ActionExecutor<RuntimeInstant, N>,
}

impl<N: Navigator> PanelDriver<N> {
    #[must_use]
    pub const fn new(executor: ActionExecutor<RuntimeInstant, N>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &ActionExecutor<RuntimeInstant, N> {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut ActionExecutor<RuntimeInstant, N> {
        &mut self.executor
    }

    pub fn into_inner(self) -> ActionExecutor<RuntimeInstant, N> {
        self.executor
    }

    /// Applies one event at `now`, firing due timers first.
    pub fn handle(&mut self, event: PanelEvent, now: RuntimeInstant) -> Result<Handled, ExecutorError> {
        // Presses and gesture starts fire due timers themselves.
        if !matches!(event, PanelEvent::Press(_) | PanelEvent::PressStart(_)) {
            self.executor.poll(now);
        }
        match event {
            PanelEvent::Press(id) => self.executor.press(id, now).map(Handled::Press),
            PanelEvent::PressStart(id) => self.executor.press_start(id, now).map(Handled::Gesture),
            PanelEvent::PressEnd(id) => self.executor.press_end(id).map(Handled::Gesture),
            PanelEvent::Input(id, text) => {
                self.executor.set_input(id, &text)?;
                Ok(Handled::Applied)
            }
            PanelEvent::Signal(signal, enabled) => {
                self.executor.set_signal(signal, enabled);
                Ok(Handled::Applied)
            }
            PanelEvent::Load(definitions) => {
                self.executor.load_buttons(definitions)?;
                Ok(Handled::Applied)
            }
            PanelEvent::Sync(definitions) => {
                self.executor.sync_buttons(definitions)?;
                Ok(Handled::Applied)
            }
            PanelEvent::Remove(id) => {
                self.executor.remove_button(id)?;
                Ok(Handled::Applied)
            }
            PanelEvent::Shutdown => {
                self.executor.teardown();
                Ok(Handled::Shutdown)
            }
        }
    }

    /// Runs until a [`PanelEvent::Shutdown`] arrives.
    pub async fn run(&mut self, receiver: EventReceiver<'_>) {
        info!("panel driver started with {} buttons", self.executor.ids().len());
        loop {
            let event = match self.executor.next_deadline() {
                Some(deadline) => {
                    match select(receiver.receive(), Timer::at(deadline.as_embassy())).await {
                        Either::First(event) => Some(event),
                        Either::Second(()) => None,
                    }
                }
                None => Some(receiver.receive().await),
            };

            let now = RuntimeInstant::now();
            let Some(event) = event else {
                let fired = self.executor.poll(now);
                debug!("{fired} timers fired");
                continue;
            };

            match self.handle(event, now) {
                Ok(Handled::Shutdown) => {
                    info!("panel driver stopped");
                    return;
                }
                Ok(handled) => debug!("event handled: {handled:?}"),
                Err(error) => warn!("event rejected: {error}"),
            }
        }
    }
}
