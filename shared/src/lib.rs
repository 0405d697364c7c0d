use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Position as reported by the browser geolocation API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Location> for Coordinates {
    fn from(location: Location) -> Self {
        Self {
            lat: location.latitude,
            lng: location.longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Walking,
    Transit,
    #[serde(other)]
    Other,
}

impl TravelMode {
    pub const LEGEND: [TravelMode; 3] = [
        TravelMode::Driving,
        TravelMode::Walking,
        TravelMode::Transit,
    ];

    pub fn color(self) -> &'static str {
        match self {
            TravelMode::Driving => "#3b82f6",
            TravelMode::Walking => "#22c55e",
            TravelMode::Transit => "#f97316",
            TravelMode::Other => "#ffffff",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TravelMode::Driving => "Coche",
            TravelMode::Walking => "A pie",
            TravelMode::Transit => "Transporte Público",
            TravelMode::Other => "Otro",
        }
    }

    /// Shorter label used by the map legend.
    pub fn legend_label(self) -> &'static str {
        match self {
            TravelMode::Transit => "T. Público",
            other => other.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub mode: TravelMode,
    pub polyline: Vec<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Destination {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Structured answer the model is constrained to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelInfo {
    pub summary: String,
    pub destination: Destination,
    pub routes: Vec<RouteSegment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapsSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Citation attached by the grounding tool. Only maps citations are
/// rendered; other chunk kinds deserialize with `maps: None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<MapsSource>,
}

impl GroundingSource {
    pub fn maps_link(&self) -> Option<(&str, &str)> {
        let maps = self.maps.as_ref()?;
        let uri = maps.uri.as_deref()?;
        let title = maps.title.as_deref().unwrap_or("Ver en Google Maps");
        Some((uri, title))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<GroundingSource>,
}

/// What the map shows for the most recently completed query.
///
/// Destination and routes only ever change together: the sole ways to build
/// one are [`MapState::cleared`] and `From<&TravelInfo>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapState {
    destination: Option<Destination>,
    routes: Vec<RouteSegment>,
}

impl MapState {
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn routes(&self) -> &[RouteSegment] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_none() && self.routes.is_empty()
    }
}

impl From<&TravelInfo> for MapState {
    fn from(info: &TravelInfo) -> Self {
        Self {
            destination: Some(info.destination.clone()),
            routes: info.routes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Coordinates>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Bounds {
                    min_lat: p.lat,
                    max_lat: p.lat,
                    min_lng: p.lng,
                    max_lng: p.lng,
                },
                Some(b) => Bounds {
                    min_lat: b.min_lat.min(p.lat),
                    max_lat: b.max_lat.max(p.lat),
                    min_lng: b.min_lng.min(p.lng),
                    max_lng: b.max_lng.max(p.lng),
                },
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelQueryRequest {
    pub prompt: String,
    pub location: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelQueryResponse {
    pub data: TravelInfo,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechResponse {
    pub audio_base64: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
