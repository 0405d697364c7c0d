use js_sys::Promise;
use shared::{Coordinates, Location};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Position, PositionError, PositionOptions};

const UNSUPPORTED: &str = "La geolocalización no es compatible con tu navegador.";
const TIMEOUT_MS: u32 = 10_000;

/// One-shot high-accuracy position request; never reuses a cached fix.
pub async fn current_position() -> Result<Coordinates, String> {
    let geolocation = web_sys::window()
        .and_then(|window| window.navigator().geolocation().ok())
        .ok_or_else(|| UNSUPPORTED.to_string())?;

    let options = PositionOptions::new();
    options.set_enable_high_accuracy(true);
    options.set_timeout(TIMEOUT_MS);
    options.set_maximum_age(0);

    let promise = Promise::new(&mut |resolve, reject| {
        if let Err(err) =
            geolocation.get_current_position_with_error_callback_and_options(&resolve, Some(&reject), &options)
        {
            let _ = reject.call1(&JsValue::NULL, &err);
        }
    });

    match JsFuture::from(promise).await {
        Ok(value) => {
            let position: Position = value.unchecked_into();
            let coords = position.coords();
            let location = Location {
                latitude: coords.latitude(),
                longitude: coords.longitude(),
            };
            web_sys::console::debug_1(
                &format!(
                    "[frontend] location lat={:.5} lng={:.5}",
                    location.latitude, location.longitude
                )
                .into(),
            );
            Ok(location.into())
        }
        Err(err) => {
            let message = err
                .dyn_ref::<PositionError>()
                .map(|error| error.message())
                .unwrap_or_else(|| format!("{err:?}"));
            Err(failure_message(&message))
        }
    }
}

fn failure_message(reason: &str) -> String {
    format!("No se pudo obtener la ubicación: {reason}")
}
