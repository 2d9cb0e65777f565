//! Terrain map panel.
//!
//! The Leaflet map mounts into the div this component renders; the page
//! hands the same `NodeRef` to the session once it exists. Only the
//! basemap toggle is reactive here.

use leptos::prelude::*;
use registration::coords::Space;

use crate::components::marker_palette::MarkerPalette;
#[cfg(feature = "hydrate")]
use crate::session::{Session, SessionSlot, with_session};
use crate::state::ui::{RegisterUiState, basemap_toggle_label};

#[component]
pub fn TerrainMap(map_ref: NodeRef<leptos::html::Div>) -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();
    #[cfg(feature = "hydrate")]
    let slot = expect_context::<SessionSlot>();

    let on_toggle = {
        #[cfg(feature = "hydrate")]
        {
            move |_ev: leptos::ev::MouseEvent| with_session(slot, Session::toggle_basemap)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::MouseEvent| {}
        }
    };

    view! {
        <section class="terrain-panel">
            <header class="panel-header">
                <h2>"Terrain"</h2>
                <button type="button" class="btn btn--ghost" on:click=on_toggle>
                    {move || basemap_toggle_label(ui.with(|u| u.aerial))}
                </button>
            </header>
            <MarkerPalette space=Space::Terrain/>
            <div class="terrain-panel__map" node_ref=map_ref></div>
        </section>
    }
}
