//! The live registration session behind the page.
//!
//! ARCHITECTURE
//! ============
//! One [`Session`] owns every imperative piece: both stores, the pan/zoom
//! controller, both marker managers, the preview controller, the Leaflet
//! map and the registration actions. Components reach it through the
//! [`SessionSlot`] context, filled once the DOM it needs has mounted.
//!
//! After anything changes, the session republishes a plain copy of the
//! store state into `RwSignal<RegisterUiState>` for rendering.
//!
//! BORROWS
//! =======
//! The coordinate store calls its subscriber synchronously, and the
//! subscriber borrows the registration store and both marker managers.
//! Every path that applies an `Edit` therefore computes it first, releases
//! all borrows, and only then mutates the coordinate store.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use registration::actions::{ActionOutcome, RegistrationActions, StatusLevel, StatusSink};
use registration::api::{ImageFile, MapEntry};
use registration::config::RegisterConfig;
use registration::coords::{CoordinateSnapshot, CoordinateStore, Edit, Space};
use registration::geometry::{Point, Rect};
use registration::input::PointerInput;
use registration::map_markers::MapMarkerManager;
use registration::overlay_markers::OverlayMarkerManager;
use registration::palette::palette_click;
use registration::pan_zoom::{PanZoomController, ViewGeometry};
use registration::preview::PreviewController;
use registration::registration::RegistrationStore;
use wasm_bindgen::closure::Closure;

use crate::net::http::HttpBackend;
use crate::net::leaflet::{LeafletMap, LeafletMarkers, LeafletPreview, TerrainEvent, TerrainEventSink};
use crate::state::ui::{MobileTab, RegisterUiState};
use crate::util::dom::{element_rect, is_mobile_layout, layout_size, natural_size, set_style};
use crate::util::files::BrowserObjectUrls;
use crate::util::layout::{MARKER_SCALE_VAR, TAB_REVEAL_DELAY_MS, marker_scale_css};
use crate::util::overlay_dom::DomOverlayMarkers;

pub type Actions = RegistrationActions<HttpBackend, LeafletPreview, BrowserObjectUrls>;

/// Context handle to the session, empty until the page has mounted.
pub type SessionSlot = StoredValue<Option<Rc<Session>>, LocalStorage>;

/// Elements of the overlay viewport.
pub struct OverlayElements {
    pub viewport: web_sys::HtmlElement,
    pub canvas: web_sys::HtmlElement,
    pub image: web_sys::HtmlImageElement,
    pub marker_layer: web_sys::HtmlElement,
}

pub struct Session {
    this: Weak<Session>,
    config: RegisterConfig,
    ui: RwSignal<RegisterUiState>,
    coords: Rc<RefCell<CoordinateStore>>,
    store: Rc<RefCell<RegistrationStore<BrowserObjectUrls>>>,
    preview: Rc<RefCell<PreviewController<LeafletPreview>>>,
    actions: Actions,
    map: LeafletMap,
    map_markers: RefCell<MapMarkerManager<LeafletMarkers>>,
    pan_zoom: RefCell<PanZoomController>,
    overlay_markers: RefCell<OverlayMarkerManager<DomOverlayMarkers>>,
    overlay: OverlayElements,
}

impl Session {
    pub fn new(
        config: RegisterConfig,
        ui: RwSignal<RegisterUiState>,
        map_element: &web_sys::HtmlElement,
        overlay: OverlayElements,
    ) -> Rc<Self> {
        let session = Rc::new_cyclic(|weak: &Weak<Session>| {
            let sink: TerrainEventSink = {
                let weak = weak.clone();
                Rc::new(move |event| weak.upgrade().and_then(|session| session.on_terrain_event(event)))
            };
            let map = LeafletMap::new(map_element, config.start_lat_lon, config.default_map_zoom, Rc::clone(&sink));
            let map_markers = MapMarkerManager::new(map.markers(sink));
            let preview = Rc::new(RefCell::new(PreviewController::new(map.preview_host())));
            let coords = Rc::new(RefCell::new(CoordinateStore::new(config.coordinate_pairs)));
            let store = Rc::new(RefCell::new(RegistrationStore::new(BrowserObjectUrls)));
            let status: StatusSink = Rc::new(move |level: StatusLevel, text: &str| {
                ui.update(|u| u.set_status(level, text));
            });
            let actions = RegistrationActions::new(
                HttpBackend::new(config.api_base.clone()),
                Rc::clone(&coords),
                Rc::clone(&store),
                Rc::clone(&preview),
                status,
                config.focus_zoom,
            );
            let mut overlay_markers = OverlayMarkerManager::new(DomOverlayMarkers::new(overlay.marker_layer.clone()));
            overlay_markers.set_mobile_layout(is_mobile_layout());
            Session {
                this: weak.clone(),
                config,
                ui,
                coords,
                store,
                preview,
                actions,
                map,
                map_markers: RefCell::new(map_markers),
                pan_zoom: RefCell::new(PanZoomController::new()),
                overlay_markers: RefCell::new(overlay_markers),
                overlay,
            }
        });

        let weak = Rc::downgrade(&session);
        session.coords.borrow_mut().subscribe(move |snapshot| {
            if let Some(session) = weak.upgrade() {
                session.on_coordinates_changed(snapshot);
            }
        });
        let snapshot = session.coords.borrow().snapshot();
        session.on_coordinates_changed(&snapshot);
        if session.config.debug_handles {
            session.expose_debug_handle();
        }
        log::info!("registration session ready with {} point pairs", session.config.coordinate_pairs);
        session
    }

    // --- Publishing ---

    fn on_coordinates_changed(&self, snapshot: &CoordinateSnapshot) {
        self.store.borrow_mut().refresh_readiness(snapshot);
        self.map_markers.borrow_mut().sync(snapshot);
        self.overlay_markers.borrow_mut().sync(snapshot, &self.pan_zoom.borrow());
        self.publish_with(snapshot.clone());
    }

    /// Copy store state into the UI signal.
    fn publish(&self) {
        let snapshot = self.coords.borrow().snapshot();
        self.publish_with(snapshot);
    }

    fn publish_with(&self, snapshot: CoordinateSnapshot) {
        let (phase, overlay_src, has_registration) = {
            let store = self.store.borrow();
            (store.phase(), store.source_url().map(str::to_owned), store.registration_data().has_bounds())
        };
        let preview_visible = self.preview.borrow().is_visible();
        self.ui.update(|u| {
            u.snapshot = snapshot;
            u.phase = phase;
            u.overlay_src = overlay_src;
            u.has_registration = has_registration;
            u.preview_visible = preview_visible;
        });
    }

    fn apply(&self, edit: Edit) {
        self.coords.borrow_mut().apply(edit);
    }

    // --- Terrain map ---

    fn on_terrain_event(&self, event: TerrainEvent) -> Option<f64> {
        match event {
            TerrainEvent::Click(at) => {
                let edit = self.map_markers.borrow().on_map_click(&self.coords.borrow(), at);
                if let Some(edit) = edit {
                    self.apply(edit);
                }
                None
            }
            TerrainEvent::DragStart(index) => self.map_markers.borrow().drag_start_shift(index),
            TerrainEvent::DragEnd { index, at } => {
                let edit = self.map_markers.borrow_mut().on_marker_drag_end(index, at);
                self.apply(edit);
                None
            }
            TerrainEvent::ContextMenu(index) => {
                let edit = self.map_markers.borrow_mut().on_marker_context_menu(index);
                self.apply(edit);
                None
            }
            TerrainEvent::PointerDown { index, kind, client_y, marker_top, marker_height } => {
                self.map_markers.borrow_mut().capture_touch_offset(index, kind, client_y, marker_top, marker_height);
                None
            }
        }
    }

    pub fn toggle_basemap(&self) {
        let aerial = !self.ui.get_untracked().aerial;
        self.map.set_basemap(aerial);
        self.ui.update(|u| u.aerial = aerial);
    }

    // --- Palettes ---

    pub fn palette_click(&self, space: Space, index: usize) {
        let snapshot = self.coords.borrow().snapshot();
        self.apply(palette_click(&snapshot, space, index));
    }

    // --- Overlay viewport ---

    fn measure_overlay(&self) -> ViewGeometry {
        ViewGeometry {
            viewport: element_rect(&self.overlay.viewport),
            image_base: layout_size(&self.overlay.image),
            natural: natural_size(&self.overlay.image),
        }
    }

    fn apply_transform(&self) {
        let transform = self.pan_zoom.borrow().transform();
        set_style(&self.overlay.canvas, "transform", &transform.css_matrix());
        set_style(&self.overlay.canvas, MARKER_SCALE_VAR, &marker_scale_css(&transform));
    }

    /// A new overlay image finished loading.
    pub fn on_image_loaded(&self) {
        {
            let mut pan_zoom = self.pan_zoom.borrow_mut();
            pan_zoom.set_geometry(self.measure_overlay());
            pan_zoom.reset();
        }
        self.apply_transform();
        self.overlay_markers.borrow_mut().refresh_positions(&self.pan_zoom.borrow());
        self.map.invalidate_size();
    }

    /// Re-measure after the viewport, image or window changed size.
    pub fn on_overlay_resized(&self) {
        self.pan_zoom.borrow_mut().set_geometry(self.measure_overlay());
        self.apply_transform();
        self.overlay_markers.borrow_mut().refresh_positions(&self.pan_zoom.borrow());
    }

    pub fn on_window_resized(&self) {
        let mobile = is_mobile_layout();
        self.overlay_markers.borrow_mut().set_mobile_layout(mobile);
        self.ui.update(|u| u.mobile = mobile);
        self.map.invalidate_size();
        self.on_overlay_resized();
    }

    fn refresh_viewport(&self) {
        self.pan_zoom.borrow_mut().set_viewport(element_rect(&self.overlay.viewport));
    }

    /// Press on an overlay marker. Returns `true` when the marker took the
    /// pointer and the caller should capture it.
    pub fn overlay_marker_pointer_down(&self, index: usize, input: &PointerInput, marker: &web_sys::Element) -> bool {
        self.refresh_viewport();
        let rect: Rect = element_rect(marker);
        self.overlay_markers.borrow_mut().on_marker_pointer_down(index, input, rect, &self.pan_zoom.borrow())
    }

    /// Press on the viewport background.
    pub fn overlay_pointer_down(&self, input: &PointerInput) {
        self.refresh_viewport();
        self.pan_zoom.borrow_mut().on_pointer_down(input);
    }

    /// Returns `true` when the move was consumed and the default action
    /// should be suppressed.
    pub fn overlay_pointer_move(&self, input: &PointerInput) -> bool {
        if self.overlay_markers.borrow().dragging().is_some() {
            let edit = self.overlay_markers.borrow_mut().on_marker_pointer_move(input, &self.pan_zoom.borrow());
            if let Some(edit) = edit {
                self.apply(edit);
            }
            return true;
        }
        let consumed = self.pan_zoom.borrow_mut().on_pointer_move(input);
        if consumed {
            self.apply_transform();
        }
        consumed
    }

    /// Returns `true` when a marker drag ended and capture should be released.
    pub fn overlay_pointer_up(&self, input: &PointerInput) -> bool {
        self.pan_zoom.borrow_mut().on_pointer_up(input);
        self.overlay_markers.borrow_mut().on_marker_pointer_up(input)
    }

    pub fn overlay_wheel(&self, client: Point, delta_y: f64) -> bool {
        self.refresh_viewport();
        let consumed = self.pan_zoom.borrow_mut().on_wheel(client, delta_y);
        if consumed {
            self.apply_transform();
        }
        consumed
    }

    pub fn overlay_click(&self, client: Point) {
        self.refresh_viewport();
        let edit = {
            let coords = self.coords.borrow();
            self.overlay_markers.borrow().handle_image_click(&coords, &mut self.pan_zoom.borrow_mut(), client)
        };
        if let Some(edit) = edit {
            self.apply(edit);
        }
    }

    /// Returns `true` when the context menu was used to clear a marker.
    pub fn overlay_marker_context_menu(&self, index: usize) -> bool {
        let edit = self.overlay_markers.borrow_mut().on_marker_context_menu(index);
        match edit {
            Some(edit) => {
                self.apply(edit);
                true
            }
            None => false,
        }
    }

    // --- Tabs ---

    pub fn show_tab(&self, tab: MobileTab) {
        self.ui.update(|u| u.tab = tab);
        if tab == MobileTab::Terrain {
            let this = self.this.clone();
            gloo_timers::callback::Timeout::new(TAB_REVEAL_DELAY_MS, move || {
                if let Some(session) = this.upgrade() {
                    session.map.invalidate_size();
                }
            })
            .forget();
        }
    }

    // --- Actions ---

    pub async fn compute(&self) {
        let overlay = self.pan_zoom.borrow().geometry().natural;
        let metadata = self.ui.get_untracked().metadata;
        let result = self.actions.compute_registration(overlay, &metadata).await;
        self.publish();
        if matches!(result, Ok(ActionOutcome::Applied)) {
            self.show_tab(MobileTab::Terrain);
        }
    }

    pub async fn save(&self) {
        let metadata = self.ui.get_untracked().metadata;
        let result = self.actions.save_registration(&metadata).await;
        self.publish();
        if matches!(result, Ok(ActionOutcome::Applied)) {
            self.refresh_maps().await;
        }
    }

    pub fn toggle_preview(&self) {
        let visible = self.actions.toggle_preview();
        log::debug!("preview visible: {visible}");
        self.publish();
    }

    pub async fn export_database(&self) {
        self.ui.update(|u| u.exporting = true);
        if let Err(err) = self.actions.export_database().await {
            log::debug!("export ended with {err}");
        }
        self.ui.update(|u| u.exporting = false);
    }

    pub async fn accept_file(&self, file: ImageFile) {
        let metadata = self.ui.get_untracked().metadata;
        self.ui.update(|u| u.uploading = true);
        let result = self.actions.accept_dropped_file(file, metadata).await;
        self.ui.update(|u| u.uploading = false);
        self.publish();
        if let Ok(Some(metadata)) = result {
            self.ui.update(|u| {
                u.metadata = metadata;
                u.active_map_id = None;
            });
            self.show_tab(MobileTab::Terrain);
        }
    }

    pub async fn refresh_maps(&self) {
        match self.actions.list_maps().await {
            Ok(maps) => self.ui.update(|u| {
                u.maps = maps;
                u.maps_loaded = true;
            }),
            Err(err) => {
                log::warn!("saved maps unavailable: {err}");
                self.ui.update(|u| u.maps_loaded = true);
            }
        }
    }

    pub async fn load_map(&self, entry: MapEntry) {
        self.ui.update(|u| u.active_map_id = entry.map_id);
        let result = self.actions.load_existing_map(&entry).await;
        self.publish();
        let Ok(Some(loaded)) = result else {
            return;
        };
        if let Some(center) = loaded.focus {
            self.map.set_view(center, loaded.zoom);
        } else {
            log::warn!("saved map has no usable bounds to focus on");
        }
        self.ui.update(|u| u.metadata = loaded.metadata);
        self.show_tab(MobileTab::Terrain);
    }

    pub async fn greet_user(&self) {
        match self.actions.current_user().await {
            Ok(user) => log::info!("signed in as {}", user.username.or(user.email).unwrap_or_default()),
            Err(err) => log::warn!("current user unavailable: {err}"),
        }
    }

    // --- Debug ---

    fn expose_debug_handle(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let coords = Rc::clone(&self.coords);
        let snapshot = Closure::<dyn Fn() -> String>::new(move || debug_snapshot_json(&coords.borrow().snapshot()));
        let handle = js_sys::Object::new();
        let installed = js_sys::Reflect::set(&handle, &"snapshot".into(), &snapshot.into_js_value())
            .and_then(|_| js_sys::Reflect::set(&window, &"__mapreg".into(), &handle));
        match installed {
            Ok(_) => log::info!("debug handle installed at window.__mapreg"),
            Err(err) => log::warn!("debug handle not installed: {err:?}"),
        }
    }
}

fn debug_snapshot_json(snapshot: &CoordinateSnapshot) -> String {
    let lat_lon: Vec<Option<[f64; 2]>> = snapshot.lat_lon.iter().map(|p| p.map(|p| [p.lat, p.lon])).collect();
    let xy: Vec<Option<[f64; 2]>> = snapshot.xy.iter().map(|p| p.map(|p| [p.x, p.y])).collect();
    serde_json::json!({
        "latLon": lat_lon,
        "xy": xy,
        "currentLatLonIndex": snapshot.current_lat_lon_index,
        "currentXyIndex": snapshot.current_xy_index,
    })
    .to_string()
}

// ── Slot access ─────────────────────────────────────────────────

/// Run `f` against the session once the page has mounted it.
pub fn with_session(slot: SessionSlot, f: impl FnOnce(&Session)) {
    match slot.try_get_value().flatten() {
        Some(session) => f(&session),
        None => log::debug!("session not mounted; event ignored"),
    }
}

/// Spawn an async session action on the browser task queue.
pub fn spawn_with_session<F, Fut>(slot: SessionSlot, f: F)
where
    F: FnOnce(Rc<Session>) -> Fut,
    Fut: Future<Output = ()> + 'static,
{
    match slot.try_get_value().flatten() {
        Some(session) => wasm_bindgen_futures::spawn_local(f(session)),
        None => log::debug!("session not mounted; action ignored"),
    }
}
