//! # client
//!
//! Leptos + WASM frontend for registering scanned orienteering maps onto
//! terrain. Pages and components render `RegisterUiState`; the imperative
//! [`session::Session`] owns the registration core from the `registration`
//! crate and drives Leaflet and the overlay viewport.
//!
//! Everything that touches the browser is behind the `hydrate` feature so
//! the pure state and layout helpers test on the host.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
#[cfg(feature = "hydrate")]
pub mod session;
pub mod state;
pub mod util;

/// WASM entry point: logging, panic hook, then mount the app.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::error_1(&format!("logger init failed: {err}").into());
    }
    leptos::mount::mount_to_body(app::App);
}
