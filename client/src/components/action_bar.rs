//! Fit, save, preview and export buttons.
//!
//! Each button is enabled from `RegisterUiState` gating; the click spawns
//! the matching session action.

use leptos::prelude::*;

#[cfg(feature = "hydrate")]
use crate::session::{Session, SessionSlot, spawn_with_session, with_session};
use crate::state::ui::{RegisterUiState, preview_button_label};

#[component]
pub fn ActionBar() -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();
    #[cfg(feature = "hydrate")]
    let slot = expect_context::<SessionSlot>();

    let on_compute = {
        #[cfg(feature = "hydrate")]
        {
            move |_ev: leptos::ev::MouseEvent| {
                spawn_with_session(slot, |session| async move { session.compute().await });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::MouseEvent| {}
        }
    };

    let on_save = {
        #[cfg(feature = "hydrate")]
        {
            move |_ev: leptos::ev::MouseEvent| {
                spawn_with_session(slot, |session| async move { session.save().await });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::MouseEvent| {}
        }
    };

    let on_preview = {
        #[cfg(feature = "hydrate")]
        {
            move |_ev: leptos::ev::MouseEvent| {
                with_session(slot, Session::toggle_preview);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::MouseEvent| {}
        }
    };

    let on_export = {
        #[cfg(feature = "hydrate")]
        {
            move |_ev: leptos::ev::MouseEvent| {
                spawn_with_session(slot, |session| async move { session.export_database().await });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::MouseEvent| {}
        }
    };

    view! {
        <div class="action-bar">
            <button
                type="button"
                class="btn btn--primary"
                disabled=move || !ui.with(RegisterUiState::can_compute)
                on:click=on_compute
            >
                "Fit map to terrain"
            </button>
            <button
                type="button"
                class="btn"
                disabled=move || !ui.with(RegisterUiState::can_save)
                on:click=on_save
            >
                "Save map"
            </button>
            <button
                type="button"
                class="btn"
                disabled=move || !ui.with(RegisterUiState::can_preview)
                on:click=on_preview
            >
                {move || preview_button_label(ui.with(|u| u.preview_visible))}
            </button>
            <button
                type="button"
                class="btn btn--ghost"
                disabled=move || ui.with(|u| u.exporting)
                on:click=on_export
            >
                "Export database"
            </button>
        </div>
    }
}
