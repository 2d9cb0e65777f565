//! Readout of every terrain and image point.

use leptos::prelude::*;
use registration::palette::{CoordinateLine, coordinate_panel_lines};

use crate::state::ui::RegisterUiState;

fn render_lines(lines: Vec<CoordinateLine>) -> impl IntoView {
    lines
        .into_iter()
        .map(|line| {
            let class = if line.bold { "coordinate-panel__line coordinate-panel__line--next" } else { "coordinate-panel__line" };
            view! { <li class=class>{line.text}</li> }
        })
        .collect_view()
}

#[component]
pub fn CoordinatePanel() -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();
    let lines = Memo::new(move |_| ui.with(|u| coordinate_panel_lines(&u.snapshot)));

    view! {
        <section class="coordinate-panel">
            <div class="coordinate-panel__column">
                <h3>"Terrain"</h3>
                <ul>{move || render_lines(lines.get().0)}</ul>
            </div>
            <div class="coordinate-panel__column">
                <h3>"Map image"</h3>
                <ul>{move || render_lines(lines.get().1)}</ul>
            </div>
        </section>
    }
}
