//! Event bus utilities providing fan-out to pluggable sinks.
//!
//! The module is organised around a flume-backed [`EventBus`] with a
//! background listener task, a structured [`Event`] type, and [`EventSink`]
//! implementations for terminal output and in-memory capture.

pub mod bus;
pub mod event;
pub mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, Event, NodeEvent};
pub use sink::{EventSink, MemorySink, StdOutSink};
