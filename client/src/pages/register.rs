//! Register page: the whole map-registration workspace.
//!
//! ARCHITECTURE
//! ============
//! The page is the composition root. It creates `RegisterUiState` and the
//! empty `SessionSlot`, renders every panel, and once the terrain div and
//! the overlay elements have mounted, builds the `Session` from them and
//! drops it into the slot.
//!
//! SYSTEM CONTEXT
//! ==============
//! After mount the page loads the saved-map list and the signed-in user,
//! and keeps the layout in step with the window: a debounced `resize`
//! listener re-reads the mobile breakpoint, and a `ResizeObserver` on the
//! viewport and image re-measures the overlay.

use leptos::prelude::*;

use crate::components::action_bar::ActionBar;
use crate::components::coordinate_panel::CoordinatePanel;
use crate::components::drop_zone::DropZone;
use crate::components::existing_maps::ExistingMaps;
use crate::components::metadata_form::MetadataForm;
use crate::components::mobile_tabs::MobileTabs;
use crate::components::overlay_view::OverlayView;
use crate::components::status_bar::StatusBar;
use crate::components::terrain_map::TerrainMap;
use crate::state::ui::{MobileTab, RegisterUiState};

#[cfg(feature = "hydrate")]
use std::rc::Rc;

#[cfg(feature = "hydrate")]
use crate::session::{OverlayElements, Session, SessionSlot};

#[cfg(test)]
#[path = "register_test.rs"]
mod register_test;

/// On the narrow layout only the selected tab's pane is shown.
fn pane_hidden(state: &RegisterUiState, pane: MobileTab) -> bool {
    state.mobile && state.tab != pane
}

fn pane_class(state: &RegisterUiState, pane: MobileTab) -> String {
    if pane_hidden(state, pane) {
        format!("register-pane register-pane--{} register-pane--hidden", pane.key())
    } else {
        format!("register-pane register-pane--{}", pane.key())
    }
}

#[cfg(feature = "hydrate")]
fn install_resize_listeners(session: &Rc<Session>, viewport: &web_sys::Element, image: &web_sys::Element) {
    use std::cell::RefCell;

    use gloo_timers::callback::Timeout;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    use crate::util::layout::RESIZE_DEBOUNCE_MS;

    let Some(window) = web_sys::window() else {
        return;
    };

    // A new resize drops the pending timeout, which cancels it.
    let pending: Rc<RefCell<Option<Timeout>>> = Rc::default();
    let weak = Rc::downgrade(session);
    let on_resize = Closure::<dyn FnMut()>::new(move || {
        let weak = weak.clone();
        let timeout = Timeout::new(RESIZE_DEBOUNCE_MS, move || {
            if let Some(session) = weak.upgrade() {
                session.on_window_resized();
            }
        });
        *pending.borrow_mut() = Some(timeout);
    });
    match window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref()) {
        Ok(()) => on_resize.forget(),
        Err(err) => log::warn!("resize listener not installed: {err:?}"),
    }

    let weak = Rc::downgrade(session);
    let on_observed = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries: js_sys::Array| {
        if let Some(session) = weak.upgrade() {
            session.on_overlay_resized();
        }
    });
    match web_sys::ResizeObserver::new(on_observed.as_ref().unchecked_ref()) {
        Ok(observer) => {
            observer.observe(viewport);
            observer.observe(image);
            on_observed.forget();
        }
        Err(err) => log::warn!("ResizeObserver unavailable, relying on window resize: {err:?}"),
    }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let ui = RwSignal::new(RegisterUiState::default());
    provide_context(ui);
    #[cfg(feature = "hydrate")]
    let slot: SessionSlot = StoredValue::new_local(None);
    #[cfg(feature = "hydrate")]
    provide_context(slot);

    let map_ref = NodeRef::<leptos::html::Div>::new();
    let viewport_ref = NodeRef::<leptos::html::Div>::new();
    let canvas_ref = NodeRef::<leptos::html::Div>::new();
    let image_ref = NodeRef::<leptos::html::Img>::new();
    let marker_layer_ref = NodeRef::<leptos::html::Div>::new();

    #[cfg(feature = "hydrate")]
    {
        use registration::config::RegisterConfig;

        use crate::util::dom::{is_mobile_layout, location_parts};

        Effect::new(move || {
            let (Some(map), Some(viewport), Some(canvas), Some(image), Some(marker_layer)) =
                (map_ref.get(), viewport_ref.get(), canvas_ref.get(), image_ref.get(), marker_layer_ref.get())
            else {
                return;
            };
            if slot.with_value(Option::is_some) {
                return;
            }

            let (hostname, search) = location_parts();
            let config = RegisterConfig::from_location(&hostname, &search);
            ui.update(|u| u.mobile = is_mobile_layout());
            let overlay = OverlayElements {
                viewport: viewport.clone().into(),
                canvas: canvas.into(),
                image: image.clone(),
                marker_layer: marker_layer.into(),
            };
            let session = Session::new(config, ui, &map, overlay);
            install_resize_listeners(&session, &viewport, &image);
            slot.set_value(Some(Rc::clone(&session)));

            wasm_bindgen_futures::spawn_local(async move {
                session.refresh_maps().await;
                session.greet_user().await;
            });
        });
    }

    let pane = move |tab: MobileTab| move || ui.with(|u| pane_class(u, tab));

    view! {
        <div class="register-page" class:register-page--mobile=move || ui.with(|u| u.mobile)>
            <header class="register-page__header">
                <h1>"Register map"</h1>
                <StatusBar/>
            </header>
            <MobileTabs/>
            <main class="register-page__grid">
                <div class=pane(MobileTab::Start)>
                    <DropZone/>
                    <ExistingMaps/>
                </div>
                <div class=pane(MobileTab::Terrain)>
                    <TerrainMap map_ref=map_ref/>
                </div>
                <div class=pane(MobileTab::Overlay)>
                    <OverlayView
                        viewport_ref=viewport_ref
                        canvas_ref=canvas_ref
                        image_ref=image_ref
                        marker_layer_ref=marker_layer_ref
                    />
                    <CoordinatePanel/>
                </div>
                <div class=pane(MobileTab::Metadata)>
                    <MetadataForm/>
                </div>
            </main>
            <footer class="register-page__footer">
                <ActionBar/>
            </footer>
        </div>
    }
}
