use super::*;

#[test]
fn production_host_uses_same_origin() {
    let cfg = RegisterConfig::from_location("kart.example.no", "");
    assert_eq!(cfg.api_base, "");
    assert_eq!(cfg.coordinate_pairs, 3);
    assert_eq!(cfg.default_map_zoom, 10);
    assert_eq!(cfg.focus_zoom, 13);
    assert_eq!(cfg.start_lat_lon, START_LAT_LON);
    assert!(!cfg.debug_handles);
    assert_eq!(cfg.url("/api/auth/me"), "/api/auth/me");
}

#[test]
fn development_hosts_use_local_backend() {
    for host in ["localhost", "127.0.0.1", ""] {
        let cfg = RegisterConfig::from_location(host, "");
        assert_eq!(cfg.api_base, LOCAL_API_BASE, "host {host:?}");
    }
    let cfg = RegisterConfig::from_location("localhost", "");
    assert_eq!(cfg.url("/api/dal/list_maps"), "http://127.0.0.1:5000/api/dal/list_maps");
}

#[test]
fn debug_flag_from_query() {
    assert!(RegisterConfig::from_location("localhost", "?debug=1").debug_handles);
    assert!(RegisterConfig::from_location("localhost", "?x=2&debug").debug_handles);
    assert!(!RegisterConfig::from_location("localhost", "?debug=0").debug_handles);
}

#[test]
fn pair_count_is_clamped() {
    assert_eq!(RegisterConfig::from_location("", "?pairs=4").coordinate_pairs, 4);
    assert_eq!(RegisterConfig::from_location("", "?pairs=0").coordinate_pairs, 1);
    assert_eq!(RegisterConfig::from_location("", "?pairs=99").coordinate_pairs, 16);
    assert_eq!(RegisterConfig::from_location("", "?pairs=many").coordinate_pairs, 3);
}
