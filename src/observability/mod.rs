//! Structured logging surface.
//!
//! The crate emits `tracing` events with canonical event names and field
//! formats; it never installs a global subscriber. Binaries and tests own
//! one-time `tracing-subscriber` initialization at process boundaries.

pub(crate) mod events;
pub(crate) mod fields;
