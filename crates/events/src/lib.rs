//! Domain events.
//!
//! Aggregates report every state change as an event implementing [`Event`].

pub mod event;

pub use event::Event;
