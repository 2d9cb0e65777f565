//! Paired control-point storage for one registration session.
//!
//! The store keeps two fixed-length slot arrays, terrain (lat/lon) and image
//! (natural pixels), each with an occupancy view and a "current" pointer that
//! names the slot the next click will fill. Every mutation notifies
//! subscribers synchronously with an owned [`CoordinateSnapshot`] before the
//! mutating call returns.
//!
//! Marker managers never mutate the store from inside a listener. They return
//! an [`Edit`] that the host applies with [`CoordinateStore::apply`] once its
//! own borrows are released.

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

use serde::Deserialize;
use serde_json::Value;

use crate::geometry::{ImagePoint, LatLon};

/// Options for slot writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Keep the current pointer where it is. Used while dragging a placed
    /// marker, where advancing would steal the active slot.
    pub skip_advance: bool,
}

impl SetOptions {
    #[must_use]
    pub fn skip_advance() -> Self {
        Self { skip_advance: true }
    }
}

/// Which coordinate space a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Terrain,
    Image,
}

/// A store mutation requested by a marker manager or palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edit {
    SetLatLon { index: usize, point: LatLon, skip_advance: bool },
    SetImage { index: usize, point: ImagePoint, skip_advance: bool },
    ClearLatLon(usize),
    ClearImage(usize),
    SelectLatLon(usize),
    SelectImage(usize),
}

/// Defensive copy of the store state handed to listeners and consumers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateSnapshot {
    pub lat_lon: Vec<Option<LatLon>>,
    pub xy: Vec<Option<ImagePoint>>,
    pub lat_lon_occupied: Vec<bool>,
    pub xy_occupied: Vec<bool>,
    pub current_lat_lon_index: Option<usize>,
    pub current_xy_index: Option<usize>,
}

impl CoordinateSnapshot {
    /// Number of pairs per space.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lat_lon.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lat_lon.is_empty()
    }

    /// All terrain points, or `None` while any slot is unset.
    #[must_use]
    pub fn lat_lon_points(&self) -> Option<Vec<LatLon>> {
        self.lat_lon.iter().copied().collect()
    }

    /// All image points, or `None` while any slot is unset.
    #[must_use]
    pub fn image_points(&self) -> Option<Vec<ImagePoint>> {
        self.xy.iter().copied().collect()
    }

    /// Every slot in both spaces is occupied (and there is at least one).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.is_empty() && self.lat_lon_occupied.iter().all(|&o| o) && self.xy_occupied.iter().all(|&o| o)
    }

    /// Nothing placed in either space.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        !self.lat_lon_occupied.iter().any(|&o| o) && !self.xy_occupied.iter().any(|&o| o)
    }
}

/// Error from parsing one externally supplied coordinate pair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PairParseError {
    #[error("coordinate pair is missing")]
    Missing,
    #[error("coordinate pair must have 2 components, found {0}")]
    WrongArity(usize),
    #[error("coordinate component `{0}` is not a finite number")]
    NotNumeric(&'static str),
    #[error("coordinate pair has an unsupported shape")]
    UnsupportedShape,
    #[error("lat/lon out of range: {lat}, {lon}")]
    OutOfRange { lat: f64, lon: f64 },
    #[error("image coordinate is negative: {x}, {y}")]
    Negative { x: f64, y: f64 },
}

fn component(value: Option<&Value>, name: &'static str) -> Result<f64, PairParseError> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => return Err(PairParseError::NotNumeric(name)),
        },
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(PairParseError::NotNumeric(name)),
    }
}

fn pair_components(
    value: &Value,
    first: &'static str,
    second: &'static str,
    second_alias: Option<&'static str>,
) -> Result<(f64, f64), PairParseError> {
    match value {
        Value::Null => Err(PairParseError::Missing),
        Value::Array(items) => {
            if items.len() != 2 {
                return Err(PairParseError::WrongArity(items.len()));
            }
            Ok((component(items.first(), first)?, component(items.get(1), second)?))
        }
        Value::Object(map) => {
            let a = component(map.get(first), first)?;
            let b = match (map.get(second), second_alias) {
                (Some(v), _) => component(Some(v), second)?,
                (None, Some(alias)) => component(map.get(alias), second)?,
                (None, None) => return Err(PairParseError::NotNumeric(second)),
            };
            Ok((a, b))
        }
        _ => Err(PairParseError::UnsupportedShape),
    }
}

/// Parse a terrain pair from `[lat, lon]` or `{ "lat", "lon" | "lng" }`.
///
/// # Errors
///
/// Returns a [`PairParseError`] for null, wrongly sized, non-numeric, or
/// out-of-range input.
pub fn parse_lat_lon_pair(value: &Value) -> Result<LatLon, PairParseError> {
    let (lat, lon) = pair_components(value, "lat", "lon", Some("lng"))?;
    let point = LatLon::new(lat, lon);
    if !point.is_valid() {
        return Err(PairParseError::OutOfRange { lat, lon });
    }
    Ok(point)
}

/// Parse an image pair from `[x, y]` or `{ "x", "y" }`.
///
/// # Errors
///
/// Returns a [`PairParseError`] for null, wrongly sized, non-numeric, or
/// negative input.
pub fn parse_image_pair(value: &Value) -> Result<ImagePoint, PairParseError> {
    let (x, y) = pair_components(value, "x", "y", None)?;
    if x < 0.0 || y < 0.0 {
        return Err(PairParseError::Negative { x, y });
    }
    Ok(ImagePoint::new(x, y))
}

/// Pair lists used to bulk-load a store, e.g. from a saved map entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HydrationInput {
    #[serde(default)]
    pub lat_lon_pairs: Vec<Value>,
    #[serde(default)]
    pub image_pairs: Vec<Value>,
}

/// Entries rejected during hydration, by slot index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrationReport {
    pub lat_lon_errors: Vec<(usize, PairParseError)>,
    pub image_errors: Vec<(usize, PairParseError)>,
}

impl HydrationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.lat_lon_errors.is_empty() && self.image_errors.is_empty()
    }
}

/// One coordinate space: fixed slots plus the current pointer.
#[derive(Debug, Clone)]
struct Slots<T> {
    points: Vec<Option<T>>,
    current: Option<usize>,
}

impl<T: Copy> Slots<T> {
    fn new(len: usize) -> Self {
        Self { points: vec![None; len], current: if len > 0 { Some(0) } else { None } }
    }

    fn clamp(&self, index: usize) -> Option<usize> {
        let last = self.points.len().checked_sub(1)?;
        Some(index.min(last))
    }

    fn is_set(&self, index: usize) -> bool {
        self.clamp(index)
            .and_then(|i| self.points.get(i))
            .is_some_and(Option::is_some)
    }

    fn has_free(&self) -> bool {
        self.points.iter().any(Option::is_none)
    }

    fn first_free(&self) -> Option<usize> {
        self.points.iter().position(Option::is_none)
    }

    /// Circular scan starting just after `index`; first unoccupied wins.
    fn next_free_after(&self, index: usize) -> Option<usize> {
        let len = self.points.len();
        (1..=len)
            .map(|step| (index + step) % len)
            .find(|&i| self.points[i].is_none())
    }

    fn set(&mut self, index: usize, point: T, options: SetOptions) -> bool {
        let Some(index) = self.clamp(index) else {
            return false;
        };
        self.points[index] = Some(point);
        if !options.skip_advance {
            self.current = self.next_free_after(index);
        }
        true
    }

    fn clear(&mut self, index: usize) -> bool {
        let Some(index) = self.clamp(index) else {
            return false;
        };
        self.points[index] = None;
        self.current = Some(index);
        true
    }

    fn select(&mut self, index: usize) -> bool {
        let Some(index) = self.clamp(index) else {
            return false;
        };
        self.current = Some(index);
        true
    }

    fn hydrate<E>(&mut self, entries: &[Value], parse: impl Fn(&Value) -> Result<T, E>) -> Vec<(usize, E)> {
        let mut errors = Vec::new();
        for (index, slot) in self.points.iter_mut().enumerate() {
            *slot = match entries.get(index) {
                Some(entry) => match parse(entry) {
                    Ok(point) => Some(point),
                    Err(err) => {
                        errors.push((index, err));
                        None
                    }
                },
                None => None,
            };
        }
        self.current = self.first_free();
        errors
    }

    fn occupied(&self) -> Vec<bool> {
        self.points.iter().map(Option::is_some).collect()
    }
}

/// Identifies a store subscription for [`CoordinateStore::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CoordinateSnapshot)>;

/// Terrain/image control points for one registration session.
pub struct CoordinateStore {
    lat_lon: Slots<LatLon>,
    xy: Slots<ImagePoint>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for CoordinateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateStore")
            .field("lat_lon", &self.lat_lon)
            .field("xy", &self.xy)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CoordinateStore {
    /// Create an empty store with `pairs` slots per space.
    #[must_use]
    pub fn new(pairs: usize) -> Self {
        Self { lat_lon: Slots::new(pairs), xy: Slots::new(pairs), listeners: Vec::new(), next_subscription: 0 }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lat_lon.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- Subscriptions ---

    /// Register a change listener. It is called synchronously after every
    /// mutation with the post-mutation snapshot.
    pub fn subscribe(&mut self, listener: impl FnMut(&CoordinateSnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn emit_change(&mut self) {
        let snapshot = self.snapshot();
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
    }

    // --- Terrain space ---

    pub fn set_lat_lon_at(&mut self, index: usize, lat: f64, lon: f64, options: SetOptions) {
        if self.lat_lon.set(index, LatLon::new(lat, lon), options) {
            self.emit_change();
        }
    }

    pub fn clear_lat_lon_at(&mut self, index: usize) {
        if self.lat_lon.clear(index) {
            self.emit_change();
        }
    }

    pub fn select_lat_lon_index(&mut self, index: usize) {
        if self.lat_lon.select(index) {
            self.emit_change();
        }
    }

    #[must_use]
    pub fn is_lat_lon_set(&self, index: usize) -> bool {
        self.lat_lon.is_set(index)
    }

    #[must_use]
    pub fn has_available_lat_lon_slot(&self) -> bool {
        self.lat_lon.has_free()
    }

    #[must_use]
    pub fn current_lat_lon_index(&self) -> Option<usize> {
        self.lat_lon.current
    }

    // --- Image space ---

    pub fn set_image_coordinate_at(&mut self, index: usize, x: f64, y: f64, options: SetOptions) {
        if self.xy.set(index, ImagePoint::new(x, y), options) {
            self.emit_change();
        }
    }

    pub fn clear_image_coordinate_at(&mut self, index: usize) {
        if self.xy.clear(index) {
            self.emit_change();
        }
    }

    pub fn select_xy_index(&mut self, index: usize) {
        if self.xy.select(index) {
            self.emit_change();
        }
    }

    #[must_use]
    pub fn is_image_coordinate_set(&self, index: usize) -> bool {
        self.xy.is_set(index)
    }

    #[must_use]
    pub fn has_available_image_slot(&self) -> bool {
        self.xy.has_free()
    }

    #[must_use]
    pub fn current_xy_index(&self) -> Option<usize> {
        self.xy.current
    }

    // --- Bulk ---

    /// Replace both spaces from external pair lists. Malformed or missing
    /// entries leave their slot unset; each current pointer moves to the first
    /// unset slot. Emits once.
    pub fn hydrate_coordinates(&mut self, input: &HydrationInput) -> HydrationReport {
        if self.is_empty() {
            return HydrationReport::default();
        }
        let report = HydrationReport {
            lat_lon_errors: self.lat_lon.hydrate(&input.lat_lon_pairs, parse_lat_lon_pair),
            image_errors: self.xy.hydrate(&input.image_pairs, parse_image_pair),
        };
        if !report.is_clean() {
            log::warn!(
                "hydration skipped {} terrain and {} image pairs",
                report.lat_lon_errors.len(),
                report.image_errors.len()
            );
        }
        self.emit_change();
        report
    }

    /// Apply a manager-produced edit.
    pub fn apply(&mut self, edit: Edit) {
        match edit {
            Edit::SetLatLon { index, point, skip_advance } => {
                self.set_lat_lon_at(index, point.lat, point.lon, SetOptions { skip_advance });
            }
            Edit::SetImage { index, point, skip_advance } => {
                self.set_image_coordinate_at(index, point.x, point.y, SetOptions { skip_advance });
            }
            Edit::ClearLatLon(index) => self.clear_lat_lon_at(index),
            Edit::ClearImage(index) => self.clear_image_coordinate_at(index),
            Edit::SelectLatLon(index) => self.select_lat_lon_index(index),
            Edit::SelectImage(index) => self.select_xy_index(index),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.is_empty() && !self.has_available_lat_lon_slot() && !self.has_available_image_slot()
    }

    #[must_use]
    pub fn snapshot(&self) -> CoordinateSnapshot {
        CoordinateSnapshot {
            lat_lon: self.lat_lon.points.clone(),
            xy: self.xy.points.clone(),
            lat_lon_occupied: self.lat_lon.occupied(),
            xy_occupied: self.xy.occupied(),
            current_lat_lon_index: self.lat_lon.current,
            current_xy_index: self.xy.current,
        }
    }
}
