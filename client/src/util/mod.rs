//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! `layout` holds pure, testable layout math. The other modules touch the
//! browser (DOM measurements, files, object URLs, marker elements) and only
//! exist in the `hydrate` build.

#[cfg(feature = "hydrate")]
pub mod dom;
#[cfg(feature = "hydrate")]
pub mod files;
pub mod layout;
#[cfg(feature = "hydrate")]
pub mod overlay_dom;
