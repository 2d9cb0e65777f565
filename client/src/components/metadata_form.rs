//! Descriptive fields saved with the registration.
//!
//! The inputs write straight into `RegisterUiState::metadata`; actions read
//! the current values when they run.

use leptos::prelude::*;

use crate::state::ui::{METADATA_FIELDS, RegisterUiState, metadata_field};

#[component]
pub fn MetadataForm() -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();

    let fields = METADATA_FIELDS
        .iter()
        .map(|&(key, label)| {
            let id = format!("metadata-{key}");
            let for_id = id.clone();
            let value = move || ui.with(|u| metadata_field(&u.metadata, key).unwrap_or_default().to_owned());
            view! {
                <label class="metadata-form__field" for=for_id>
                    <span>{label}</span>
                    <input
                        id=id
                        type="text"
                        name=key
                        prop:value=value
                        on:input=move |ev| {
                            let text = event_target_value(&ev);
                            ui.update(|u| u.set_metadata_field(key, text));
                        }
                    />
                </label>
            }
        })
        .collect_view();

    view! {
        <form class="metadata-form" on:submit=|ev| ev.prevent_default()>
            {fields}
        </form>
    }
}
