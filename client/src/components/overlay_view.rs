//! Pan/zoom viewport for the scanned map image.
//!
//! ARCHITECTURE
//! ============
//! The viewport clips a canvas that carries the CSS transform; the image
//! and the absolutely positioned marker layer live inside the canvas so
//! they move together. Marker elements are created by the session, so
//! every pointer handler sits on the viewport and finds the marker, if
//! any, with `closest([data-marker-index])`.

use leptos::prelude::*;
use registration::coords::Space;

use crate::components::marker_palette::MarkerPalette;
#[cfg(feature = "hydrate")]
use crate::session::{Session, SessionSlot, with_session};
use crate::state::ui::RegisterUiState;
#[cfg(feature = "hydrate")]
use crate::util::dom::{client_point, marker_from_event, pointer_input};

#[cfg(feature = "hydrate")]
fn capture_pointer(marker: &web_sys::Element, pointer_id: i32) {
    if let Err(err) = marker.set_pointer_capture(pointer_id) {
        log::debug!("pointer capture failed: {err:?}");
    }
}

#[cfg(feature = "hydrate")]
fn release_pointer(marker: &web_sys::Element, pointer_id: i32) {
    if marker.has_pointer_capture(pointer_id) {
        if let Err(err) = marker.release_pointer_capture(pointer_id) {
            log::debug!("pointer release failed: {err:?}");
        }
    }
}

#[component]
pub fn OverlayView(
    viewport_ref: NodeRef<leptos::html::Div>,
    canvas_ref: NodeRef<leptos::html::Div>,
    image_ref: NodeRef<leptos::html::Img>,
    marker_layer_ref: NodeRef<leptos::html::Div>,
) -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();
    #[cfg(feature = "hydrate")]
    let slot = expect_context::<SessionSlot>();

    let on_pointer_down = {
        #[cfg(feature = "hydrate")]
        {
            move |ev: leptos::ev::PointerEvent| {
                with_session(slot, |session| {
                    let input = pointer_input(&ev);
                    if let Some((index, marker)) = marker_from_event(&ev) {
                        if session.overlay_marker_pointer_down(index, &input, &marker) {
                            ev.prevent_default();
                            ev.stop_propagation();
                            capture_pointer(&marker, ev.pointer_id());
                            return;
                        }
                    }
                    session.overlay_pointer_down(&input);
                });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::PointerEvent| {}
        }
    };

    let on_pointer_move = {
        #[cfg(feature = "hydrate")]
        {
            move |ev: leptos::ev::PointerEvent| {
                with_session(slot, |session| {
                    if session.overlay_pointer_move(&pointer_input(&ev)) {
                        ev.prevent_default();
                    }
                });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::PointerEvent| {}
        }
    };

    let on_pointer_up = {
        #[cfg(feature = "hydrate")]
        {
            move |ev: leptos::ev::PointerEvent| {
                with_session(slot, |session| {
                    if session.overlay_pointer_up(&pointer_input(&ev)) {
                        if let Some((_, marker)) = marker_from_event(&ev) {
                            release_pointer(&marker, ev.pointer_id());
                        }
                    }
                });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::PointerEvent| {}
        }
    };

    let on_wheel = {
        #[cfg(feature = "hydrate")]
        {
            move |ev: leptos::ev::WheelEvent| {
                with_session(slot, |session| {
                    if session.overlay_wheel(client_point(&ev), ev.delta_y()) {
                        ev.prevent_default();
                    }
                });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::WheelEvent| {}
        }
    };

    let on_click = {
        #[cfg(feature = "hydrate")]
        {
            move |ev: leptos::ev::MouseEvent| {
                if marker_from_event(&ev).is_some() {
                    return;
                }
                with_session(slot, |session| session.overlay_click(client_point(&ev)));
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::MouseEvent| {}
        }
    };

    let on_context_menu = {
        #[cfg(feature = "hydrate")]
        {
            move |ev: leptos::ev::MouseEvent| {
                let Some((index, _)) = marker_from_event(&ev) else {
                    return;
                };
                with_session(slot, |session| {
                    if session.overlay_marker_context_menu(index) {
                        ev.prevent_default();
                    }
                });
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::MouseEvent| {}
        }
    };

    let on_image_load = {
        #[cfg(feature = "hydrate")]
        {
            move |_ev: leptos::ev::Event| with_session(slot, Session::on_image_loaded)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            move |_ev: leptos::ev::Event| {}
        }
    };

    view! {
        <section class="overlay-panel">
            <header class="panel-header">
                <h2>"Map image"</h2>
            </header>
            <MarkerPalette space=Space::Image/>
            <div
                class="overlay-viewport"
                class:overlay-viewport--empty=move || ui.with(|u| u.overlay_src.is_none())
                node_ref=viewport_ref
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointercancel=on_pointer_up
                on:wheel=on_wheel
                on:click=on_click
                on:contextmenu=on_context_menu
            >
                <div class="overlay-canvas" node_ref=canvas_ref>
                    <img
                        class="overlay-image"
                        alt="Scanned map"
                        draggable="false"
                        node_ref=image_ref
                        src=move || ui.with(|u| u.overlay_src.clone())
                        on:load=on_image_load
                    />
                    <div class="overlay-markers" node_ref=marker_layer_ref></div>
                </div>
                <Show when=move || ui.with(|u| u.overlay_src.is_none())>
                    <p class="overlay-viewport__hint">"Drop a map image to start placing points."</p>
                </Show>
            </div>
        </section>
    }
}
