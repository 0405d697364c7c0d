//! Map overlay planning and the Leaflet bridge.
//!
//! Each sync builds an [`OverlaySnapshot`] of the layers that should be on
//! the map and diffs it against the last rendered one, so unchanged markers
//! and polylines are left alone.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_wasm_bindgen::to_value;
use shared::{Bounds, Coordinates, MapState};
use wasm_bindgen::prelude::{wasm_bindgen, JsValue};

pub const DEFAULT_ZOOM: u8 = 13;
const FIT_PADDING_PX: u16 = 50;
const ROUTE_WEIGHT: u8 = 5;
const ROUTE_OPACITY: f64 = 0.8;

#[wasm_bindgen(module = "/leaflet_map.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    fn init_map(lat: f64, lng: f64, zoom: u8);
    #[wasm_bindgen(js_name = applyOverlay)]
    fn apply_overlay_js(ops: JsValue);
    #[wasm_bindgen(js_name = setViewport)]
    fn set_viewport_js(viewport: JsValue);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Layer {
    Marker {
        lat: f64,
        lng: f64,
        popup: String,
    },
    Polyline {
        points: Vec<[f64; 2]>,
        color: &'static str,
        weight: u8,
        opacity: f64,
        popup: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Viewport {
    Center { lat: f64, lng: f64, zoom: u8 },
    Fit { bounds: Bounds, padding: u16 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum OverlayOp {
    Remove { key: String },
    Add { key: String, layer: Layer },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlaySnapshot {
    layers: BTreeMap<String, Layer>,
    viewport: Option<Viewport>,
}

impl OverlaySnapshot {
    pub fn build(user: Coordinates, map: &MapState) -> Self {
        let mut layers = BTreeMap::new();
        let mut points = vec![user];

        layers.insert(
            "user".to_string(),
            Layer::Marker {
                lat: user.lat,
                lng: user.lng,
                popup: "Tu Ubicación".to_string(),
            },
        );

        if let Some(destination) = map.destination() {
            layers.insert(
                "destination".to_string(),
                Layer::Marker {
                    lat: destination.lat,
                    lng: destination.lng,
                    popup: format!("Destino: {}", destination.name),
                },
            );
            points.push(destination.coordinates());
        }

        for (idx, route) in map.routes().iter().enumerate() {
            if route.polyline.is_empty() {
                continue;
            }
            layers.insert(
                format!("route-{idx}"),
                Layer::Polyline {
                    points: route.polyline.iter().map(|p| [p.lat, p.lng]).collect(),
                    color: route.mode.color(),
                    weight: ROUTE_WEIGHT,
                    opacity: ROUTE_OPACITY,
                    popup: format!("Ruta: {}", route.mode.label()),
                },
            );
            points.extend_from_slice(&route.polyline);
        }

        let viewport = match Bounds::from_points(&points) {
            Some(bounds) if points.len() > 1 => Viewport::Fit {
                bounds,
                padding: FIT_PADDING_PX,
            },
            _ => Viewport::Center {
                lat: user.lat,
                lng: user.lng,
                zoom: DEFAULT_ZOOM,
            },
        };

        Self {
            layers,
            viewport: Some(viewport),
        }
    }

    #[cfg(test)]
    fn layers(&self) -> impl Iterator<Item = (&str, &Layer)> {
        self.layers.iter().map(|(key, layer)| (key.as_str(), layer))
    }

    #[cfg(test)]
    fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayPatch {
    pub ops: Vec<OverlayOp>,
    pub viewport: Option<Viewport>,
}

impl OverlayPatch {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.viewport.is_none()
    }
}

/// Removals come first so a changed layer is replaced under the same key.
pub fn diff(prev: &OverlaySnapshot, next: &OverlaySnapshot) -> OverlayPatch {
    let mut ops = Vec::new();

    for (key, layer) in &prev.layers {
        if next.layers.get(key) != Some(layer) {
            ops.push(OverlayOp::Remove { key: key.clone() });
        }
    }
    for (key, layer) in &next.layers {
        if prev.layers.get(key) != Some(layer) {
            ops.push(OverlayOp::Add {
                key: key.clone(),
                layer: layer.clone(),
            });
        }
    }

    // Any overlay change re-applies the viewport, so a panned map is brought
    // back to the current result.
    let viewport = if !ops.is_empty() || prev.viewport != next.viewport {
        next.viewport.clone()
    } else {
        None
    };

    OverlayPatch { ops, viewport }
}

/// Owns the last snapshot pushed to Leaflet.
#[derive(Debug, Default)]
pub struct MapRenderer {
    rendered: OverlaySnapshot,
    initialized: bool,
}

impl MapRenderer {
    /// Computes the patch that brings the map to `(user, map)` and records
    /// the new snapshot as rendered.
    pub fn plan(&mut self, user: Coordinates, map: &MapState) -> OverlayPatch {
        let next = OverlaySnapshot::build(user, map);
        let patch = diff(&self.rendered, &next);
        self.rendered = next;
        patch
    }

    pub fn sync(&mut self, user: Coordinates, map: &MapState) {
        if !self.initialized {
            init_map(user.lat, user.lng, DEFAULT_ZOOM);
            self.initialized = true;
        }

        let patch = self.plan(user, map);
        if patch.is_empty() {
            return;
        }
        web_sys::console::debug_1(
            &format!(
                "[frontend] map patch: {} op(s), viewport change: {}",
                patch.ops.len(),
                patch.viewport.is_some()
            )
            .into(),
        );
        if !patch.ops.is_empty() {
            if let Ok(value) = to_value(&patch.ops) {
                apply_overlay_js(value);
            }
        }
        if let Some(viewport) = patch.viewport {
            if let Ok(value) = to_value(&viewport) {
                set_viewport_js(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Destination, RouteSegment, TravelInfo, TravelMode};

    fn here() -> Coordinates {
        Coordinates::new(40.7, -74.0)
    }

    fn covers(bounds: &Bounds, point: &Coordinates) -> bool {
        (bounds.min_lat..=bounds.max_lat).contains(&point.lat)
            && (bounds.min_lng..=bounds.max_lng).contains(&point.lng)
    }

    fn parque_central_map() -> MapState {
        MapState::from(&TravelInfo {
            summary: String::new(),
            destination: Destination {
                name: "Parque Central".into(),
                lat: 40.78,
                lng: -73.97,
            },
            routes: vec![
                RouteSegment {
                    mode: TravelMode::Walking,
                    polyline: vec![here(), Coordinates::new(40.75, -73.99), Coordinates::new(40.78, -73.97)],
                },
                RouteSegment {
                    mode: TravelMode::Driving,
                    polyline: vec![here(), Coordinates::new(40.78, -73.97)],
                },
                RouteSegment {
                    mode: TravelMode::Transit,
                    polyline: Vec::new(),
                },
            ],
        })
    }

    #[test]
    fn user_only_snapshot_centers_on_user() {
        let snapshot = OverlaySnapshot::build(here(), &MapState::cleared());
        assert_eq!(snapshot.layers().count(), 1);
        assert_eq!(
            snapshot.viewport(),
            Some(&Viewport::Center {
                lat: 40.7,
                lng: -74.0,
                zoom: DEFAULT_ZOOM
            })
        );
    }

    #[test]
    fn query_result_adds_destination_and_colored_routes() {
        let snapshot = OverlaySnapshot::build(here(), &parque_central_map());
        let layers: Vec<_> = snapshot.layers().collect();

        // user, destination, and two non-empty routes
        assert_eq!(layers.len(), 4);
        let colors: Vec<_> = layers
            .iter()
            .filter_map(|(_, layer)| match layer {
                Layer::Polyline { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(colors, vec!["#22c55e", "#3b82f6"]);
        assert!(layers.iter().any(|(key, layer)| *key == "destination"
            && matches!(layer, Layer::Marker { popup, .. } if popup == "Destino: Parque Central")));

        match snapshot.viewport() {
            Some(Viewport::Fit { bounds, padding }) => {
                assert_eq!(*padding, 50);
                assert!(covers(bounds, &here()));
                assert!(covers(bounds, &Coordinates::new(40.78, -73.97)));
            }
            other => panic!("expected fit viewport, got {other:?}"),
        }
    }

    #[test]
    fn first_plan_adds_everything() {
        let mut renderer = MapRenderer::default();
        let patch = renderer.plan(here(), &parque_central_map());
        assert_eq!(patch.ops.len(), 4);
        assert!(patch
            .ops
            .iter()
            .all(|op| matches!(op, OverlayOp::Add { .. })));
        assert!(patch.viewport.is_some());
    }

    #[test]
    fn unchanged_state_produces_empty_patch() {
        let mut renderer = MapRenderer::default();
        renderer.plan(here(), &parque_central_map());
        let patch = renderer.plan(here(), &parque_central_map());
        assert!(patch.is_empty());
    }

    #[test]
    fn overlay_change_reapplies_unchanged_viewport() {
        let mut renderer = MapRenderer::default();
        renderer.plan(here(), &parque_central_map());

        let mut renamed = TravelInfo {
            summary: String::new(),
            destination: Destination {
                name: "Central Park".into(),
                lat: 40.78,
                lng: -73.97,
            },
            routes: parque_central_map().routes().to_vec(),
        };
        let patch = renderer.plan(here(), &MapState::from(&renamed));

        assert_eq!(patch.ops.len(), 2, "destination replaced in place");
        assert!(matches!(patch.viewport, Some(Viewport::Fit { .. })));

        renamed.summary = "otra respuesta".into();
        let patch = renderer.plan(here(), &MapState::from(&renamed));
        assert!(patch.is_empty());
    }

    #[test]
    fn clearing_map_removes_only_query_layers() {
        let mut renderer = MapRenderer::default();
        renderer.plan(here(), &parque_central_map());
        let patch = renderer.plan(here(), &MapState::cleared());

        let mut removed: Vec<_> = patch
            .ops
            .iter()
            .map(|op| match op {
                OverlayOp::Remove { key } => key.as_str(),
                OverlayOp::Add { key, .. } => panic!("unexpected add of {key}"),
            })
            .collect();
        removed.sort();
        assert_eq!(removed, vec!["destination", "route-0", "route-1"]);
        assert!(matches!(patch.viewport, Some(Viewport::Center { .. })));
    }

    #[test]
    fn moved_user_is_replaced_in_place() {
        let mut renderer = MapRenderer::default();
        renderer.plan(here(), &MapState::cleared());
        let patch = renderer.plan(Coordinates::new(41.0, -73.0), &MapState::cleared());

        assert_eq!(
            patch.ops.first(),
            Some(&OverlayOp::Remove {
                key: "user".into()
            })
        );
        assert!(matches!(patch.ops.get(1), Some(OverlayOp::Add { key, .. }) if key == "user"));
    }

    #[test]
    fn ops_serialize_with_tags() {
        let op = OverlayOp::Add {
            key: "user".into(),
            layer: Layer::Marker {
                lat: 1.0,
                lng: 2.0,
                popup: "Tu Ubicación".into(),
            },
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["op"], "add");
        assert_eq!(value["layer"]["kind"], "marker");
        assert_eq!(value["layer"]["popup"], "Tu Ubicación");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_coord() -> impl Strategy<Value = Coordinates> {
            (-90.0..=90.0, -180.0..=180.0).prop_map(|(lat, lng)| Coordinates { lat, lng })
        }

        fn map_state() -> impl Strategy<Value = MapState> {
            prop_oneof![
                Just(MapState::cleared()),
                (valid_coord(), prop::collection::vec(valid_coord(), 0..6)).prop_map(
                    |(dest, polyline)| {
                        MapState::from(&TravelInfo {
                            summary: String::new(),
                            destination: Destination {
                                name: "x".into(),
                                lat: dest.lat,
                                lng: dest.lng,
                            },
                            routes: vec![RouteSegment {
                                mode: TravelMode::Walking,
                                polyline,
                            }],
                        })
                    }
                ),
            ]
        }

        proptest! {
            #[test]
            fn prop_applying_patch_reaches_target_layers(
                user in valid_coord(),
                first in map_state(),
                second in map_state()
            ) {
                let mut renderer = MapRenderer::default();
                renderer.plan(user, &first);
                let mut shown: BTreeMap<String, Layer> = OverlaySnapshot::build(user, &first)
                    .layers
                    .clone();

                let patch = renderer.plan(user, &second);
                for op in patch.ops {
                    match op {
                        OverlayOp::Remove { key } => {
                            prop_assert!(shown.remove(&key).is_some());
                        }
                        OverlayOp::Add { key, layer } => {
                            prop_assert!(shown.insert(key, layer).is_none());
                        }
                    }
                }

                prop_assert_eq!(shown, OverlaySnapshot::build(user, &second).layers);
            }

            #[test]
            fn prop_fit_bounds_cover_every_plotted_point(
                user in valid_coord(),
                state in map_state()
            ) {
                let snapshot = OverlaySnapshot::build(user, &state);
                if let Some(Viewport::Fit { bounds, .. }) = snapshot.viewport() {
                    prop_assert!(super::covers(bounds, &user));
                    if let Some(destination) = state.destination() {
                        prop_assert!(super::covers(bounds, &destination.coordinates()));
                    }
                }
            }
        }
    }
}
