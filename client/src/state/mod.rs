//! Client-side reactive state.
//!
//! DESIGN
//! ======
//! Plain data structs wrapped in `RwSignal` and provided via context. The
//! imperative registration session writes into them; components only read
//! them and forward user intents back to the session.

pub mod ui;
