//! Single-writer runtime handle and events.

/// Runtime event payloads.
pub mod events;
/// Command handle and runtime loop.
pub mod handle;
