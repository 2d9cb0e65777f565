//! Numbered marker buttons for one coordinate space.
//!
//! A free button selects the slot the next click fills; a placed one
//! clears its marker.

use leptos::prelude::*;
use registration::coords::Space;
use registration::palette::{marker_style, palette_entries};

#[cfg(feature = "hydrate")]
use crate::session::{SessionSlot, with_session};
use crate::state::ui::RegisterUiState;

#[cfg(test)]
#[path = "marker_palette_test.rs"]
mod marker_palette_test;

fn palette_class(placed: bool, active: bool) -> &'static str {
    match (placed, active) {
        (true, _) => "marker-palette__button marker-palette__button--placed",
        (false, true) => "marker-palette__button marker-palette__button--active",
        (false, false) => "marker-palette__button",
    }
}

#[component]
pub fn MarkerPalette(space: Space) -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();
    #[cfg(feature = "hydrate")]
    let slot = expect_context::<SessionSlot>();

    let entries = Memo::new(move |_| ui.with(|u| palette_entries(&u.snapshot, space)));
    let label = match space {
        Space::Terrain => "Terrain markers",
        Space::Image => "Map markers",
    };

    view! {
        <div class="marker-palette" role="toolbar" aria-label=label>
            {move || {
                entries
                    .get()
                    .into_iter()
                    .map(|entry| {
                        let index = entry.index;
                        let style = marker_style(index);
                        let on_click = {
                            #[cfg(feature = "hydrate")]
                            {
                                move |_ev: leptos::ev::MouseEvent| {
                                    with_session(slot, |session| session.palette_click(space, index));
                                }
                            }
                            #[cfg(not(feature = "hydrate"))]
                            {
                                move |_ev: leptos::ev::MouseEvent| {}
                            }
                        };
                        view! {
                            <button
                                type="button"
                                class=palette_class(entry.placed, entry.active)
                                style=format!("--marker-color: {}", style.color)
                                title=entry.title
                                aria-pressed=if entry.active { "true" } else { "false" }
                                on:click=on_click
                            >
                                {style.short_label}
                            </button>
                        }
                    })
                    .collect_view()
            }}
        </div>
    }
}
