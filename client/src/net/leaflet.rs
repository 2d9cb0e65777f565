//! Leaflet binding for the terrain map.
//!
//! ARCHITECTURE
//! ============
//! A small inline JS module wraps the handful of Leaflet calls the page
//! needs. Leaflet itself is loaded globally by `index.html`. Rust keeps the
//! callback closures alive for as long as the map lives and forwards every
//! Leaflet event as a [`TerrainEvent`] to one sink owned by the session.
//!
//! [`LeafletMarkers`] is the `TerrainMarkerLayer` the marker manager drives;
//! [`LeafletPreview`] is the `PreviewHost` for the semi-transparent overlay.

use std::rc::Rc;

use registration::consts::{MARKER_ICON_ANCHOR, MARKER_ICON_SIZE};
use registration::geometry::{GeoBounds, LatLon};
use registration::input::PointerKind;
use registration::map_markers::TerrainMarkerLayer;
use registration::palette::{MarkerStyle, marker_svg_markup};
use registration::preview::PreviewHost;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;

#[wasm_bindgen(inline_js = r#"
const RASTER_URL = 'https://cache.kartverket.no/v1/wmts/1.0.0/topo/default/webmercator/{z}/{y}/{x}.png';
const AERIAL_URL = 'https://opencache{s}.statkart.no/gatekeeper/gk/gk.open_nib_web_mercator_wmts_v2'
  + '?SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0'
  + '&LAYER=Nibcache_web_mercator_v2'
  + '&STYLE=default'
  + '&FORMAT=image/jpgpng'
  + '&tileMatrixSet=default028mm'
  + '&tileMatrix={z}&tileRow={y}&tileCol={x}';

const basemaps = new WeakMap();

export function createMap(element, lat, lon, zoom, onClick) {
  const map = L.map(element).setView([lat, lon], zoom);
  const raster = L.tileLayer(RASTER_URL, {
    maxZoom: 18,
    attribution: '&copy; <a href="http://www.kartverket.no/">Kartverket</a>'
  });
  const aerial = L.tileLayer(AERIAL_URL, {
    subdomains: ['', '2', '3'],
    maxZoom: 19,
    attribution: '&copy; Norge i bilder / Kartverket, Geovekst m.fl.'
  });
  raster.addTo(map);
  basemaps.set(map, { raster, aerial });
  map.on('click', (event) => onClick(event.latlng.lat, event.latlng.lng));
  return map;
}

export function setBasemap(map, aerial) {
  const layers = basemaps.get(map);
  if (!layers) {
    return;
  }
  const off = aerial ? layers.raster : layers.aerial;
  const on = aerial ? layers.aerial : layers.raster;
  if (map.hasLayer(off)) {
    map.removeLayer(off);
  }
  if (!map.hasLayer(on)) {
    on.addTo(map);
  }
}

export function setView(map, lat, lon, zoom) {
  map.setView([lat, lon], zoom);
}

export function invalidateSize(map) {
  map.invalidateSize();
}

export function addMarker(map, index, lat, lon, html, width, height, anchorX, anchorY,
                          onDragStart, onDragEnd, onContextMenu, onPointerDown) {
  const icon = L.divIcon({
    className: 'registration-marker registration-marker--map',
    html,
    iconSize: [width, height],
    iconAnchor: [anchorX, anchorY]
  });
  const marker = L.marker([lat, lon], { draggable: true, autoPan: true, icon });
  marker.on('dragstart', () => {
    const dy = onDragStart(index);
    const draggable = marker.dragging && marker.dragging._draggable;
    const start = draggable && draggable._startPoint;
    if (start && Number.isFinite(dy)) {
      start.y -= dy;
    }
  });
  marker.on('dragend', () => {
    const at = marker.getLatLng();
    onDragEnd(index, at.lat, at.lng);
  });
  marker.on('contextmenu', (event) => {
    if (event.originalEvent) {
      event.originalEvent.preventDefault();
      event.originalEvent.stopPropagation();
    }
    onContextMenu(index);
  });
  marker.addTo(map);
  const element = marker.getElement();
  if (element) {
    element.addEventListener('pointerdown', (event) => {
      const rect = element.getBoundingClientRect();
      onPointerDown(index, event.pointerType, event.clientY, rect.top, rect.height || height);
    }, { capture: true });
  }
  return marker;
}

export function moveMarker(marker, lat, lon) {
  marker.setLatLng([lat, lon]);
}

export function removeLayer(layer) {
  layer.remove();
}

export function addImageOverlay(map, url, nwLat, nwLon, seLat, seLon, opacity) {
  return L.imageOverlay(url, [[nwLat, nwLon], [seLat, seLon]], { opacity }).addTo(map);
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = createMap)]
    fn create_map(element: &web_sys::HtmlElement, lat: f64, lon: f64, zoom: u8, on_click: &Closure<dyn FnMut(f64, f64)>) -> JsValue;

    #[wasm_bindgen(js_name = setBasemap)]
    fn set_basemap(map: &JsValue, aerial: bool);

    #[wasm_bindgen(js_name = setView)]
    fn set_view(map: &JsValue, lat: f64, lon: f64, zoom: u8);

    #[wasm_bindgen(js_name = invalidateSize)]
    fn invalidate_size(map: &JsValue);

    #[allow(clippy::too_many_arguments)]
    #[wasm_bindgen(js_name = addMarker)]
    fn add_marker(
        map: &JsValue,
        index: u32,
        lat: f64,
        lon: f64,
        html: &str,
        width: f64,
        height: f64,
        anchor_x: f64,
        anchor_y: f64,
        on_drag_start: &Closure<dyn FnMut(u32) -> f64>,
        on_drag_end: &Closure<dyn FnMut(u32, f64, f64)>,
        on_context_menu: &Closure<dyn FnMut(u32)>,
        on_pointer_down: &Closure<dyn FnMut(u32, String, f64, f64, f64)>,
    ) -> JsValue;

    #[wasm_bindgen(js_name = moveMarker)]
    fn move_marker(marker: &JsValue, lat: f64, lon: f64);

    #[wasm_bindgen(js_name = removeLayer)]
    fn remove_layer(layer: &JsValue);

    #[wasm_bindgen(js_name = addImageOverlay)]
    fn add_image_overlay(map: &JsValue, url: &str, nw_lat: f64, nw_lon: f64, se_lat: f64, se_lon: f64, opacity: f64) -> JsValue;
}

/// Something happened on the terrain map.
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainEvent {
    Click(LatLon),
    /// A marker drag is starting; the sink may answer with a start-point shift.
    DragStart(usize),
    DragEnd { index: usize, at: LatLon },
    ContextMenu(usize),
    PointerDown { index: usize, kind: PointerKind, client_y: f64, marker_top: f64, marker_height: f64 },
}

/// Receives every [`TerrainEvent`]. Only `DragStart` uses the return value.
pub type TerrainEventSink = Rc<dyn Fn(TerrainEvent) -> Option<f64>>;

#[allow(clippy::cast_possible_truncation)]
fn js_index(index: usize) -> u32 {
    index as u32
}

// ── Map ─────────────────────────────────────────────────────────

/// The Leaflet map with its raster/aerial basemaps.
pub struct LeafletMap {
    map: JsValue,
    _on_click: Closure<dyn FnMut(f64, f64)>,
}

impl LeafletMap {
    pub fn new(element: &web_sys::HtmlElement, center: LatLon, zoom: u8, sink: TerrainEventSink) -> Self {
        let on_click = Closure::<dyn FnMut(f64, f64)>::new(move |lat: f64, lon: f64| {
            sink(TerrainEvent::Click(LatLon::new(lat, lon)));
        });
        let map = create_map(element, center.lat, center.lon, zoom, &on_click);
        log::debug!("terrain map created at {center:?} z{zoom}");
        Self { map, _on_click: on_click }
    }

    pub fn set_view(&self, center: LatLon, zoom: u8) {
        set_view(&self.map, center.lat, center.lon, zoom);
    }

    pub fn set_basemap(&self, aerial: bool) {
        set_basemap(&self.map, aerial);
    }

    pub fn invalidate_size(&self) {
        invalidate_size(&self.map);
    }

    pub fn markers(&self, sink: TerrainEventSink) -> LeafletMarkers {
        LeafletMarkers::new(self.map.clone(), sink)
    }

    pub fn preview_host(&self) -> LeafletPreview {
        LeafletPreview { map: self.map.clone() }
    }
}

// ── Markers ─────────────────────────────────────────────────────

/// Draggable divIcon markers, one per terrain slot.
pub struct LeafletMarkers {
    map: JsValue,
    on_drag_start: Closure<dyn FnMut(u32) -> f64>,
    on_drag_end: Closure<dyn FnMut(u32, f64, f64)>,
    on_context_menu: Closure<dyn FnMut(u32)>,
    on_pointer_down: Closure<dyn FnMut(u32, String, f64, f64, f64)>,
}

impl LeafletMarkers {
    fn new(map: JsValue, sink: TerrainEventSink) -> Self {
        let drag_start_sink = Rc::clone(&sink);
        let on_drag_start = Closure::<dyn FnMut(u32) -> f64>::new(move |index: u32| {
            drag_start_sink(TerrainEvent::DragStart(index as usize)).unwrap_or(f64::NAN)
        });
        let drag_end_sink = Rc::clone(&sink);
        let on_drag_end = Closure::<dyn FnMut(u32, f64, f64)>::new(move |index: u32, lat: f64, lon: f64| {
            drag_end_sink(TerrainEvent::DragEnd { index: index as usize, at: LatLon::new(lat, lon) });
        });
        let context_sink = Rc::clone(&sink);
        let on_context_menu = Closure::<dyn FnMut(u32)>::new(move |index: u32| {
            context_sink(TerrainEvent::ContextMenu(index as usize));
        });
        let on_pointer_down = Closure::<dyn FnMut(u32, String, f64, f64, f64)>::new(
            move |index: u32, pointer_type: String, client_y: f64, marker_top: f64, marker_height: f64| {
                sink(TerrainEvent::PointerDown {
                    index: index as usize,
                    kind: PointerKind::from_dom(&pointer_type),
                    client_y,
                    marker_top,
                    marker_height,
                });
            },
        );
        Self { map, on_drag_start, on_drag_end, on_context_menu, on_pointer_down }
    }
}

impl TerrainMarkerLayer for LeafletMarkers {
    type Handle = JsValue;

    fn add_marker(&mut self, index: usize, at: LatLon, style: &MarkerStyle) -> JsValue {
        add_marker(
            &self.map,
            js_index(index),
            at.lat,
            at.lon,
            &marker_svg_markup(style),
            MARKER_ICON_SIZE.0,
            MARKER_ICON_SIZE.1,
            MARKER_ICON_ANCHOR.0,
            MARKER_ICON_ANCHOR.1,
            &self.on_drag_start,
            &self.on_drag_end,
            &self.on_context_menu,
            &self.on_pointer_down,
        )
    }

    fn move_marker(&mut self, handle: &JsValue, at: LatLon) {
        move_marker(handle, at.lat, at.lon);
    }

    fn remove_marker(&mut self, handle: JsValue) {
        remove_layer(&handle);
    }
}

// ── Preview ─────────────────────────────────────────────────────

/// Adds and removes the registered image as a Leaflet image overlay.
pub struct LeafletPreview {
    map: JsValue,
}

impl PreviewHost for LeafletPreview {
    type Layer = JsValue;

    fn add_overlay(&mut self, bounds: GeoBounds, url: &str, opacity: f64) -> JsValue {
        add_image_overlay(&self.map, url, bounds.nw.lat, bounds.nw.lon, bounds.se.lat, bounds.se.lon, opacity)
    }

    fn remove_overlay(&mut self, layer: JsValue) {
        remove_layer(&layer);
    }
}
