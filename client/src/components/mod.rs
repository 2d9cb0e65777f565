//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render `RegisterUiState` from context and forward user
//! intents to the registration session through the `SessionSlot`.

pub mod action_bar;
pub mod coordinate_panel;
pub mod drop_zone;
pub mod existing_maps;
pub mod marker_palette;
pub mod metadata_form;
pub mod mobile_tabs;
pub mod overlay_view;
pub mod status_bar;
pub mod terrain_map;
