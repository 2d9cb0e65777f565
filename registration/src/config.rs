//! Page configuration derived from the browser location.

use crate::consts::{COORDINATE_PAIRS, MAX_COORDINATE_PAIRS};
use crate::geometry::LatLon;

/// Backend origin used when the page is served from a development host.
pub const LOCAL_API_BASE: &str = "http://127.0.0.1:5000";
pub const START_LAT_LON: LatLon = LatLon { lat: 60.3368, lon: 5.33669 };
pub const DEFAULT_MAP_ZOOM: u8 = 10;
/// Terrain zoom after loading a saved map.
pub const FOCUS_ZOOM: u8 = 13;

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterConfig {
    /// Prefix for every API path. Empty means same origin.
    pub api_base: String,
    pub coordinate_pairs: usize,
    pub start_lat_lon: LatLon,
    pub default_map_zoom: u8,
    pub focus_zoom: u8,
    /// Expose a debug handle on `window`.
    pub debug_handles: bool,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            coordinate_pairs: COORDINATE_PAIRS,
            start_lat_lon: START_LAT_LON,
            default_map_zoom: DEFAULT_MAP_ZOOM,
            focus_zoom: FOCUS_ZOOM,
            debug_handles: false,
        }
    }
}

impl RegisterConfig {
    /// Build config from `location.hostname` and `location.search`.
    ///
    /// Recognised query keys:
    /// - `debug`: `1`/`true`/bare key enables debug handles
    /// - `pairs`: control-point pair count, clamped to `1..=16`
    #[must_use]
    pub fn from_location(hostname: &str, query: &str) -> Self {
        let mut config = Self { api_base: api_base_for_host(hostname).to_owned(), ..Self::default() };
        for (key, value) in query_pairs(query) {
            match key {
                "debug" => config.debug_handles = parse_flag(value),
                "pairs" => match value.parse::<usize>() {
                    Ok(n) => config.coordinate_pairs = n.clamp(1, MAX_COORDINATE_PAIRS),
                    Err(_) => log::warn!("ignoring invalid pairs={value}"),
                },
                _ => {}
            }
        }
        config
    }

    /// `api_base` joined with an absolute API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base.trim_end_matches('/'))
    }
}

fn api_base_for_host(hostname: &str) -> &'static str {
    match hostname {
        "" | "localhost" | "127.0.0.1" => LOCAL_API_BASE,
        _ => "",
    }
}

fn query_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| part.split_once('=').unwrap_or((part, "")))
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw, "" | "1" | "true" | "yes" | "on")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
