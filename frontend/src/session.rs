//! Conversation state and the per-query state machine.
//!
//! Everything here is plain data so the transitions can be tested natively;
//! `lib.rs` drives it from seed messages and performs the side effects.

use shared::{
    ChatTurn, Coordinates, MapState, Role, TravelQueryRequest, TravelQueryResponse, TurnId,
};

pub const WELCOME_MESSAGE: &str = "¡Hola! Soy tu asistente de viajes. Ya tengo tu ubicación. ¿A dónde te gustaría ir? Puedo estimar los tiempos de viaje a pie, en coche o en transporte público.";
pub const LOCATION_UNAVAILABLE: &str =
    "No se puede enviar el mensaje: la ubicación no está disponible.";
pub const UNEXPECTED_ERROR: &str = "Ocurrió un error inesperado.";

#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    Pending,
    Ready(Coordinates),
    Failed(String),
}

/// Identifies one travel query; only the completion carrying the in-flight
/// ticket is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    EmptyText,
    Busy,
    LocationPending,
    LocationFailed,
}

#[derive(Debug)]
pub struct Session {
    location: LocationStatus,
    turns: Vec<ChatTurn>,
    map: MapState,
    in_flight: Option<QueryTicket>,
    error: Option<String>,
    next_turn: u64,
    next_ticket: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            location: LocationStatus::Pending,
            turns: Vec::new(),
            map: MapState::cleared(),
            in_flight: None,
            error: None,
            next_turn: 0,
            next_ticket: 0,
        }
    }

    pub fn location(&self) -> &LocationStatus {
        &self.location
    }

    pub fn user_location(&self) -> Option<Coordinates> {
        match self.location {
            LocationStatus::Ready(coords) => Some(coords),
            _ => None,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn map(&self) -> &MapState {
        &self.map
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the input affordance should accept a message right now.
    pub fn can_send(&self) -> bool {
        !self.is_loading() && matches!(self.location, LocationStatus::Ready(_))
    }

    /// Records the one-shot geolocation result. The welcome turn is seeded
    /// the first time a location arrives on an empty transcript.
    pub fn location_resolved(&mut self, result: Result<Coordinates, String>) {
        if !matches!(self.location, LocationStatus::Pending) {
            return;
        }
        match result {
            Ok(coords) => {
                self.location = LocationStatus::Ready(coords);
                if self.turns.is_empty() {
                    self.push_turn(Role::Assistant, WELCOME_MESSAGE.to_string(), Vec::new());
                }
            }
            Err(message) => self.location = LocationStatus::Failed(message),
        }
    }

    /// Idle -> Sending: appends the user turn, clears the error and the map.
    pub fn begin_query(
        &mut self,
        text: &str,
    ) -> Result<(QueryTicket, TravelQueryRequest), SendRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::EmptyText);
        }
        if self.is_loading() {
            return Err(SendRejected::Busy);
        }
        let location = match &self.location {
            LocationStatus::Ready(coords) => *coords,
            LocationStatus::Failed(_) => return Err(SendRejected::LocationFailed),
            LocationStatus::Pending => {
                self.error = Some(LOCATION_UNAVAILABLE.to_string());
                return Err(SendRejected::LocationPending);
            }
        };

        self.push_turn(Role::User, text.to_string(), Vec::new());
        let ticket = QueryTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.error = None;
        self.map = MapState::cleared();

        Ok((
            ticket,
            TravelQueryRequest {
                prompt: text.to_string(),
                location,
            },
        ))
    }

    /// Sending -> Idle. Returns `false` when `ticket` is stale and nothing
    /// changed.
    pub fn finish_query(
        &mut self,
        ticket: QueryTicket,
        result: Result<TravelQueryResponse, String>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(TravelQueryResponse { data, sources }) => {
                self.map = MapState::from(&data);
                self.push_turn(Role::Assistant, data.summary, sources);
            }
            Err(message) if message.trim().is_empty() => {
                self.error = Some(UNEXPECTED_ERROR.to_string());
            }
            Err(message) => self.error = Some(message),
        }
        true
    }

    pub fn turn(&self, id: TurnId) -> Option<&ChatTurn> {
        self.turns.iter().find(|turn| turn.id == id)
    }

    fn push_turn(&mut self, role: Role, text: String, sources: Vec<shared::GroundingSource>) {
        let id = TurnId(self.next_turn);
        self.next_turn += 1;
        self.turns.push(ChatTurn {
            id,
            role,
            text,
            sources,
        });
    }
}
