//! Browser adapters for the outside world.
//!
//! SYSTEM CONTEXT
//! ==============
//! `http` implements the registration `Backend` over `gloo-net`; `leaflet`
//! binds the terrain map, its markers and the preview overlay.

pub mod http;
#[cfg(feature = "hydrate")]
pub mod leaflet;
