use std::rc::Rc;

use super::*;

fn unavailable<T>() -> Result<T, HostError> {
    Err(HostError::Unavailable("the browser"))
}

/// Outside of `wasm32` there is no browser: every read fails and adapters use
/// their documented defaults.
#[derive(Debug, Default)]
pub struct BrowserHost;

impl Host for BrowserHost {
    fn is_online(&self) -> Result<bool, HostError> {
        unavailable()
    }

    fn visibility_state(&self) -> Result<VisibilityState, HostError> {
        unavailable()
    }

    fn has_focus(&self) -> Result<bool, HostError> {
        unavailable()
    }

    fn matches_media(&self, _query: &str) -> Result<bool, HostError> {
        unavailable()
    }

    fn orientation(&self) -> Result<ScreenOrientation, HostError> {
        unavailable()
    }

    fn languages(&self) -> Result<Vec<String>, HostError> {
        unavailable()
    }

    fn window_metrics(&self) -> Result<WindowMetrics, HostError> {
        unavailable()
    }

    fn listen(
        &self,
        _target: &Target,
        _event: &'static str,
        _callback: HostCallback,
    ) -> Result<ListenerId, HostError> {
        unavailable()
    }

    fn on_frame(&self, _callback: Rc<dyn Fn()>) -> Result<ListenerId, HostError> {
        unavailable()
    }

    fn unlisten(&self, _id: ListenerId) {}

    fn geolocation(&self) -> Option<Rc<dyn NativeGeolocation>> {
        None
    }
}
