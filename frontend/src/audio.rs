use js_sys::Promise;
use shared::SpeechResponse;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

/// Plays the clip and resolves once playback has ended.
pub async fn play(audio: &SpeechResponse) -> Result<(), String> {
    let src = format!("data:{};base64,{}", audio.mime_type, audio.audio_base64);
    let element = HtmlAudioElement::new_with_src(&src).map_err(|err| format!("{err:?}"))?;

    let ended = Promise::new(&mut |resolve, reject| {
        element.set_onended(Some(&resolve));
        element.set_onerror(Some(&reject));
    });

    let started = element.play().map_err(|err| format!("{err:?}"))?;
    JsFuture::from(started)
        .await
        .map_err(|err| format!("playback refused: {err:?}"))?;
    JsFuture::from(ended)
        .await
        .map_err(|err| format!("playback failed: {err:?}"))?;

    element.set_onended(None);
    element.set_onerror(None);
    Ok(())
}
