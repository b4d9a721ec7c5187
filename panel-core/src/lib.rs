#![no_std]

extern crate alloc;

// Shared logic for the action-button panel.
//
// Everything here is deterministic and executor-agnostic: hosts inject time
// through [`time::PanelInstant`] and drive pending timers with
// [`executor::ActionExecutor::poll`], so the same sequence of inputs always
// yields the same runtime state, presentation, and log.

pub mod behavior;
pub mod executor;
pub mod gesture;
pub mod navigation;
pub mod presentation;
pub mod repl;
pub mod sequencer;
pub mod state;
pub mod telemetry;
pub mod time;
