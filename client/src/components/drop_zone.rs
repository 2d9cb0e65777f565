//! Drop target and file picker for a new map image.
//!
//! SYSTEM CONTEXT
//! ==============
//! Whatever file arrives is read into memory and handed to the session
//! unchecked; the registration core decides whether the type is supported
//! and reports it through the status line when it is not.

use leptos::prelude::*;

#[cfg(feature = "hydrate")]
use crate::session::{SessionSlot, spawn_with_session};
use crate::state::ui::RegisterUiState;

/// File types offered by the picker.
const ACCEPTED_TYPES: &str = "image/*,application/pdf";

#[cfg(feature = "hydrate")]
fn accept_browser_file(slot: SessionSlot, file: Option<web_sys::File>) {
    let Some(file) = file else {
        log::debug!("drop without a file");
        return;
    };
    spawn_with_session(slot, |session| async move {
        match crate::util::files::read_file(&file).await {
            Ok(image) => session.accept_file(image).await,
            Err(err) => log::error!("could not read {}: {err}", file.name()),
        }
    });
}

#[component]
pub fn DropZone() -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();
    #[cfg(feature = "hydrate")]
    let slot = expect_context::<SessionSlot>();
    let hovering = RwSignal::new(false);

    let on_drag_over = move |ev: leptos::ev::DragEvent| {
        ev.prevent_default();
        hovering.set(true);
    };
    let on_drag_leave = move |_ev: leptos::ev::DragEvent| hovering.set(false);

    let on_drop = {
        #[cfg(feature = "hydrate")]
        {
            move |ev: leptos::ev::DragEvent| {
                ev.prevent_default();
                hovering.set(false);
                let files = ev.data_transfer().and_then(|transfer| transfer.files());
                accept_browser_file(slot, crate::util::files::first_file(files));
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |ev: leptos::ev::DragEvent| {
                ev.prevent_default();
                hovering.set(false);
            }
        }
    };

    let on_pick = {
        #[cfg(feature = "hydrate")]
        {
            move |ev: leptos::ev::Event| {
                use wasm_bindgen::JsCast;

                let Some(input) = ev.target().and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok()) else {
                    return;
                };
                accept_browser_file(slot, crate::util::files::first_file(input.files()));
                input.set_value("");
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::Event| {}
        }
    };

    view! {
        <div
            class="drop-zone"
            class:drop-zone--hover=move || hovering.get()
            class:drop-zone--busy=move || ui.with(|u| u.uploading)
            on:dragover=on_drag_over
            on:dragenter=on_drag_over
            on:dragleave=on_drag_leave
            on:drop=on_drop
        >
            <p>{move || if ui.with(|u| u.uploading) { "Processing image..." } else { "Drop a scanned map here" }}</p>
            <label class="btn">
                "Choose file"
                <input type="file" class="drop-zone__input" accept=ACCEPTED_TYPES on:change=on_pick/>
            </label>
        </div>
    }
}
