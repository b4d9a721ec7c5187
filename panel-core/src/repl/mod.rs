//! Operator console for driving a panel from text commands.
//!
//! Commands are declared once in [`catalog`], lexed and parsed by
//! [`grammar`], dispatched by [`commands`], and rendered by [`status`].

pub mod catalog;
pub mod commands;
pub mod grammar;
pub mod status;
