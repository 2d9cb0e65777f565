//! Map registration core: fits a scanned orienteering map onto the terrain.
//!
//! The user places the same control points on the terrain map and on the
//! map image; the backend computes bounds and rotation from those pairs.
//! This crate holds everything that does not need a DOM: point storage,
//! marker bookkeeping for both views, overlay pan/zoom math, the backend
//! protocol, and the actions that tie them together. The browser shell
//! supplies the map widget, DOM marker layers, object URLs, and an HTTP
//! [`api::Backend`] through small traits.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`coords`] | Paired terrain/image slot store with change subscriptions |
//! | [`map_markers`] | Terrain marker manager over a [`map_markers::TerrainMarkerLayer`] |
//! | [`overlay_markers`] | Image marker manager and marker drag handling |
//! | [`pan_zoom`] | Overlay viewport transform and pointer gestures |
//! | [`input`] | Pointer event model |
//! | [`palette`] | Marker colours, labels, and the coordinate panel text |
//! | [`registration`] | Registration data, phase, and URL-owning session store |
//! | [`actions`] | Compute, save, drop, and saved-map loading |
//! | [`preview`] | Translucent preview layer on the terrain map |
//! | [`catalog`] | Saved-map list helpers |
//! | [`api`] | Backend endpoints, wire types, and error mapping |
//! | [`request`] | Last-writer-wins request tickets |
//! | [`config`] | Page configuration from the location |
//! | [`geometry`] | Points, sizes, rectangles, and geographic bounds |
//! | [`consts`] | Shared numeric constants (zoom limits, marker sizes, etc.) |

pub mod actions;
pub mod api;
pub mod catalog;
pub mod config;
pub mod consts;
pub mod coords;
pub mod error;
pub mod geometry;
pub mod input;
pub mod map_markers;
pub mod overlay_markers;
pub mod palette;
pub mod pan_zoom;
pub mod preview;
pub mod registration;
pub mod request;
