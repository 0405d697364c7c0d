use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use shared::SpeechResponse;

use crate::error::ServiceError;
use crate::gemini::{
    Content, GenerateContentRequest, GenerationConfig, GenerativeModel, Modality, SpeechConfig,
};
use crate::wav::{pcm_format_from_mime, wrap_pcm};

pub fn build_speech_request(text: &str, voice: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user_text(format!("Di: {text}"))],
        system_instruction: None,
        tools: Vec::new(),
        tool_config: None,
        generation_config: Some(GenerationConfig {
            response_modalities: vec![Modality::Audio],
            speech_config: Some(SpeechConfig::prebuilt(voice)),
            ..Default::default()
        }),
    }
}

/// Synthesises `text` and returns base64 audio the browser can play as is.
pub async fn text_to_speech(
    model: &dyn GenerativeModel,
    model_name: &str,
    voice: &str,
    text: &str,
) -> Result<SpeechResponse, ServiceError> {
    if text.trim().is_empty() {
        return Err(ServiceError::InvalidInput("No hay texto para leer."));
    }

    let request = build_speech_request(text, voice);
    let response = model.generate_content(model_name, &request).await?;
    let inline = response
        .first_inline_data()
        .filter(|inline| !inline.data.is_empty())
        .ok_or(ServiceError::MissingAudio)?;

    let Some(format) = pcm_format_from_mime(&inline.mime_type) else {
        tracing::debug!(mime = %inline.mime_type, "passing audio through unchanged");
        return Ok(SpeechResponse {
            audio_base64: inline.data.clone(),
            mime_type: inline.mime_type.clone(),
        });
    };

    let pcm = BASE64.decode(&inline.data).map_err(|err| {
        tracing::warn!("TTS payload is not valid base64: {err}");
        ServiceError::MissingAudio
    })?;
    let wav = wrap_pcm(&pcm, format).map_err(|err| {
        tracing::warn!("cannot wrap TTS payload: {err}");
        ServiceError::MissingAudio
    })?;
    tracing::debug!(
        bytes = pcm.len(),
        sample_rate = format.sample_rate,
        "wrapped TTS audio as WAV"
    );

    Ok(SpeechResponse {
        audio_base64: BASE64.encode(wav),
        mime_type: "audio/wav".into(),
    })
}
