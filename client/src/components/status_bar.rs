//! Status line under the page header.
//!
//! SYSTEM CONTEXT
//! ==============
//! Shows the latest message the registration actions reported. The level
//! picks the colour class; the text replaces the previous message.

use leptos::prelude::*;

use crate::state::ui::{RegisterUiState, status_class};

#[component]
pub fn StatusBar() -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();

    let class = move || ui.with(|u| u.status.as_ref().map_or("registration-status", |s| status_class(s.level)));
    let text = move || ui.with(|u| u.status.as_ref().map(|s| s.text.clone()).unwrap_or_default());

    view! {
        <p class=class role="status" aria-live="polite">
            {text}
        </p>
    }
}
