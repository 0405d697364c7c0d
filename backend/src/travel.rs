use serde_json::{json, Value};
use shared::{Coordinates, TravelInfo, TravelQueryResponse};

use crate::error::ServiceError;
use crate::gemini::{
    Content, GenerateContentRequest, GenerationConfig, GenerativeModel, LatLng, RetrievalConfig,
    Tool, ToolConfig,
};

pub const SYSTEM_INSTRUCTION: &str = "Eres un asistente experto en viajes y mapas. Tu objetivo es estimar los tiempos de viaje y proporcionar datos de ruta desde la ubicación actual de un usuario hasta un destino que proporcionen.
- Analiza la solicitud del usuario para identificar el destino.
- Utiliza las herramientas y los datos de ubicación proporcionados para obtener información del viaje.
- Proporciona un resumen conciso y fácil de leer de los tiempos de viaje en formato Markdown.
- SIEMPRE devuelve un objeto JSON válido que coincida con el esquema proporcionado, que contenga el resumen, las coordenadas del destino y las polilíneas de la ruta para caminar, conducir y transporte público.
- Las polilíneas deben ser un array de objetos de coordenadas lat/lng que representen el trazado.";

/// JSON schema the model's answer is constrained to; mirrors [`TravelInfo`].
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "Un resumen en formato markdown de los tiempos de viaje a pie, en coche y en transporte público."
            },
            "destination": {
                "type": "OBJECT",
                "description": "Las coordenadas y el nombre del destino.",
                "properties": {
                    "name": { "type": "STRING", "description": "El nombre de la ubicación de destino." },
                    "lat": { "type": "NUMBER", "description": "La latitud del destino." },
                    "lng": { "type": "NUMBER", "description": "La longitud del destino." }
                },
                "required": ["name", "lat", "lng"]
            },
            "routes": {
                "type": "ARRAY",
                "description": "Un array de objetos de ruta para diferentes modos de viaje.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "mode": { "type": "STRING", "description": "Modo de viaje: 'walking', 'driving', o 'transit'." },
                        "polyline": {
                            "type": "ARRAY",
                            "description": "Un array de objetos de coordenadas que representan la ruta.",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "lat": { "type": "NUMBER" },
                                    "lng": { "type": "NUMBER" }
                                },
                                "required": ["lat", "lng"]
                            }
                        }
                    },
                    "required": ["mode", "polyline"]
                }
            }
        },
        "required": ["summary", "destination", "routes"]
    })
}

pub fn build_travel_request(prompt: &str, location: Coordinates) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user_text(prompt)],
        system_instruction: Some(Content::system_text(SYSTEM_INSTRUCTION)),
        tools: vec![Tool::google_maps()],
        tool_config: Some(ToolConfig {
            retrieval_config: RetrievalConfig {
                lat_lng: LatLng {
                    latitude: location.lat,
                    longitude: location.lng,
                },
            },
        }),
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".into()),
            response_schema: Some(response_schema()),
            ..Default::default()
        }),
    }
}

/// Asks the model for travel times and routes from `location` to whatever
/// destination `prompt` names.
pub async fn get_travel_info(
    model: &dyn GenerativeModel,
    model_name: &str,
    prompt: &str,
    location: Coordinates,
) -> Result<TravelQueryResponse, ServiceError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ServiceError::InvalidInput("El mensaje no puede estar vacío."));
    }
    if !location.is_valid() {
        return Err(ServiceError::InvalidInput("La ubicación proporcionada no es válida."));
    }

    tracing::info!(
        lat = location.lat,
        lng = location.lng,
        "requesting travel info"
    );
    let request = build_travel_request(prompt, location);
    let response = model.generate_content(model_name, &request).await?;

    let sources = response.grounding_sources();
    let Some(text) = response.text() else {
        tracing::warn!(
            finish_reason = response.finish_reason(),
            "travel response carried no text"
        );
        return Err(ServiceError::MissingText);
    };
    let data: TravelInfo = serde_json::from_str(strip_code_fence(&text))?;

    tracing::debug!(
        destination = %data.destination.name,
        routes = data.routes.len(),
        sources = sources.len(),
        "parsed travel info"
    );
    Ok(TravelQueryResponse { data, sources })
}

/// Models occasionally wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_anchors_retrieval_to_location() {
        let request = build_travel_request("al museo", Coordinates::new(40.7, -74.0));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "al museo");
        assert_eq!(
            value["toolConfig"]["retrievalConfig"]["latLng"],
            json!({"latitude": 40.7, "longitude": -74.0})
        );
        assert_eq!(value["tools"], json!([{"googleMaps": {}}]));
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(value["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Eres un asistente experto en viajes"));
    }

    #[test]
    fn schema_requires_all_top_level_fields() {
        let schema = response_schema();
        assert_eq!(schema["required"], json!(["summary", "destination", "routes"]));
        assert_eq!(
            schema["properties"]["routes"]["items"]["properties"]["polyline"]["items"]["required"],
            json!(["lat", "lng"])
        );
    }

    #[test]
    fn schema_accepts_what_travel_info_serializes() {
        let info: TravelInfo = serde_json::from_value(json!({
            "summary": "s",
            "destination": {"name": "n", "lat": 1.0, "lng": 2.0},
            "routes": [{"mode": "driving", "polyline": [{"lat": 1.0, "lng": 2.0}]}]
        }))
        .unwrap();
        let value = serde_json::to_value(&info).unwrap();
        let schema = response_schema();
        for key in schema["required"].as_array().unwrap() {
            assert!(value.get(key.as_str().unwrap()).is_some());
        }
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {} "), "{}");
        assert_eq!(strip_code_fence("```json {"), "```json {");
    }
}
