use std::cell::RefCell;
use std::collections::HashMap;

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use js_sys::{Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::*;

type JsCallback = Closure<dyn FnMut(JsValue)>;

/// `navigator.geolocation` through `web-sys`.
pub struct BrowserGeolocation {
    geolocation: web_sys::Geolocation,
    /// Callbacks of live watches, kept alive until `clear_watch`.
    watches: RefCell<HashMap<i32, (JsCallback, JsCallback)>>,
}

impl BrowserGeolocation {
    pub fn new(geolocation: web_sys::Geolocation) -> Self {
        Self {
            geolocation,
            watches: RefCell::new(HashMap::new()),
        }
    }
}

fn field(target: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn number(target: &JsValue, name: &str) -> Option<f64> {
    field(target, name).and_then(|v| v.as_f64())
}

fn read_position(value: &JsValue) -> Result<Position, PositionError> {
    let malformed = || PositionError::unavailable("malformed GeolocationPosition");
    let coords = field(value, "coords").ok_or_else(malformed)?;
    Ok(Position {
        coords: Coordinates {
            latitude: number(&coords, "latitude").ok_or_else(malformed)?,
            longitude: number(&coords, "longitude").ok_or_else(malformed)?,
            accuracy: number(&coords, "accuracy"),
            altitude: number(&coords, "altitude"),
            altitude_accuracy: number(&coords, "altitudeAccuracy"),
            heading: number(&coords, "heading"),
            speed: number(&coords, "speed"),
        },
        timestamp: number(value, "timestamp").unwrap_or_default(),
    })
}

fn read_error(value: &JsValue) -> PositionError {
    let code = number(value, "code")
        .and_then(|c| PositionErrorCode::from_code(c as u16))
        .unwrap_or(PositionErrorCode::PositionUnavailable);
    let message = field(value, "message")
        .and_then(|m| m.as_string())
        .unwrap_or_default();
    PositionError::new(code, message)
}

fn millis(duration: web_time::Duration) -> JsValue {
    JsValue::from_f64(duration.as_millis() as f64)
}

fn options(params: &GeolocationParams) -> web_sys::PositionOptions {
    let object = Object::new();
    let set = |name: &str, value: JsValue| {
        let _ = Reflect::set(&object, &JsValue::from_str(name), &value);
    };
    if let Some(age) = params.maximum_age {
        set("maximumAge", millis(age));
    }
    if let Some(timeout) = params.timeout {
        set("timeout", millis(timeout));
    }
    set(
        "enableHighAccuracy",
        JsValue::from_bool(params.enable_high_accuracy),
    );
    object.unchecked_into()
}

impl NativeGeolocation for BrowserGeolocation {
    fn get_current_position(
        &self,
        params: &GeolocationParams,
    ) -> LocalBoxFuture<'static, Result<Position, PositionError>> {
        let (tx, rx) = oneshot::channel::<Result<Position, PositionError>>();
        let tx = std::rc::Rc::new(RefCell::new(Some(tx)));

        let on_success: JsCallback = {
            let tx = tx.clone();
            Closure::once(move |value: JsValue| {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(read_position(&value));
                }
            })
        };
        let on_error: JsCallback = Closure::once(move |value: JsValue| {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(Err(read_error(&value)));
            }
        });

        let started = self
            .geolocation
            .get_current_position_with_error_callback_and_options(
                on_success.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
                &options(params),
            );

        Box::pin(async move {
            if let Err(err) = started {
                return Err(PositionError::unavailable(format!("{err:?}")));
            }
            let result = rx
                .await
                .unwrap_or_else(|_| Err(PositionError::unavailable("request dropped")));
            drop((on_success, on_error));
            result
        })
    }

    fn watch_position(
        &self,
        on_position: PositionCallback,
        on_error: ErrorCallback<PositionError>,
        params: &GeolocationParams,
    ) -> Result<i32, PositionError> {
        let success: JsCallback = {
            let on_error = on_error.clone();
            Closure::new(move |value: JsValue| match read_position(&value) {
                Ok(position) => on_position(position),
                Err(err) => on_error(err),
            })
        };
        let failure: JsCallback = Closure::new(move |value: JsValue| on_error(read_error(&value)));

        let id = self
            .geolocation
            .watch_position_with_error_callback_and_options(
                success.as_ref().unchecked_ref(),
                Some(failure.as_ref().unchecked_ref()),
                &options(params),
            )
            .map_err(|err| PositionError::unavailable(format!("{err:?}")))?;
        self.watches.borrow_mut().insert(id, (success, failure));
        Ok(id)
    }

    fn clear_watch(&self, id: i32) {
        self.geolocation.clear_watch(id);
        self.watches.borrow_mut().remove(&id);
    }
}
