//! Saved-map browser.
//!
//! SYSTEM CONTEXT
//! ==============
//! Lists what `list_maps` returned, newest first, filtered by the name box.
//! Clicking a card loads that map's image, points and metadata back into
//! the session so it can be adjusted and saved again.

use leptos::prelude::*;
use registration::api::MapEntry;
use registration::catalog::{card_title, meta_line};

#[cfg(feature = "hydrate")]
use crate::session::{SessionSlot, spawn_with_session};
use crate::state::ui::RegisterUiState;

fn card_class(active: bool) -> &'static str {
    if active { "map-card map-card--active" } else { "map-card" }
}

#[component]
fn MapCard(entry: MapEntry, active: Signal<bool>) -> impl IntoView {
    #[cfg(feature = "hydrate")]
    let slot = expect_context::<SessionSlot>();

    let title = card_title(&entry).to_owned();
    let meta = meta_line(&entry);

    let on_click = {
        #[cfg(feature = "hydrate")]
        {
            move |_ev: leptos::ev::MouseEvent| {
                let entry = entry.clone();
                spawn_with_session(slot, |session| async move { session.load_map(entry).await });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::MouseEvent| {}
        }
    };

    view! {
        <li>
            <button type="button" class=move || card_class(active.get()) on:click=on_click>
                <span class="map-card__title">{title}</span>
                <span class="map-card__meta">{meta}</span>
            </button>
        </li>
    }
}

#[component]
pub fn ExistingMaps() -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();

    let visible = Memo::new(move |_| ui.with(|u| u.visible_maps().into_iter().cloned().collect::<Vec<MapEntry>>()));
    let cards = move || {
        visible
            .get()
            .into_iter()
            .map(|entry| {
                let map_id = entry.map_id;
                let active = Signal::derive(move || map_id.is_some() && ui.with(|u| u.active_map_id) == map_id);
                view! { <MapCard entry=entry active=active/> }
            })
            .collect_view()
    };

    view! {
        <section class="existing-maps">
            <div class="existing-maps__filter">
                <input
                    type="search"
                    placeholder="Filter by map name"
                    aria-label="Filter saved maps"
                    prop:value=move || ui.with(|u| u.map_filter.clone())
                    on:input=move |ev| {
                        let text = event_target_value(&ev);
                        ui.update(|u| u.map_filter = text);
                    }
                />
                <button
                    type="button"
                    class="btn btn--ghost"
                    disabled=move || ui.with(|u| u.map_filter.is_empty())
                    on:click=move |_| ui.update(|u| u.map_filter.clear())
                >
                    "Clear"
                </button>
            </div>
            {move || ui.with(|u| u.empty_maps_text()).map(|text| view! { <p class="existing-maps__empty">{text}</p> })}
            <ul class="existing-maps__list">{cards}</ul>
        </section>
    }
}
