//! Access to browser globals.
//!
//! Adapters never touch `window`/`document` directly; they go through a
//! [`Host`]. [`BrowserHost`] is the real thing on `wasm32` and reports every
//! API as unavailable elsewhere, so adapters fall back to their defaults when
//! running natively (server rendering, tests).

use std::rc::Rc;

use bitflags::bitflags;
use tether_core::{Event, Lifecycle, Listener, setup_listener};

use crate::geolocation::NativeGeolocation;

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

pub use imp::BrowserHost;

slotmap::new_key_type! {
    /// Handle for a callback registered with [`Host::listen`] or [`Host::on_frame`].
    pub struct ListenerId;
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("{0} is not available in this environment")]
    Unavailable(&'static str),
    #[error("browser call failed: {0}")]
    Js(String),
}

/// Where a listener is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Window,
    Document,
    ScreenOrientation,
    /// The `MediaQueryList` for this query.
    MediaQuery(String),
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const CTRL  = 0b0001;
        const ALT   = 0b0010;
        const SHIFT = 0b0100;
        const META  = 0b1000;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPress {
    /// `KeyboardEvent.key`: `"a"`, `"Enter"`, `"Shift"`, ...
    pub key: String,
    pub modifiers: Modifiers,
    pub repeat: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::empty(),
            repeat: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// What a host callback receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// The event carries nothing adapters care about.
    Signal,
    Key(KeyPress),
}

pub type HostCallback = Rc<dyn Fn(&HostEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityState {
    Visible,
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrientationType {
    PortraitPrimary,
    PortraitSecondary,
    LandscapePrimary,
    LandscapeSecondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenOrientation {
    pub kind: OrientationType,
    pub angle: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowMetrics {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub inner_width: f64,
    pub inner_height: f64,
    pub outer_width: f64,
    pub outer_height: f64,
    pub screen_top: f64,
    pub screen_left: f64,
}

pub trait Host {
    /// `navigator.onLine`
    fn is_online(&self) -> Result<bool, HostError>;
    /// `document.visibilityState`
    fn visibility_state(&self) -> Result<VisibilityState, HostError>;
    /// `document.hasFocus()`
    fn has_focus(&self) -> Result<bool, HostError>;
    /// `window.matchMedia(query).matches`
    fn matches_media(&self, query: &str) -> Result<bool, HostError>;
    /// `screen.orientation`
    fn orientation(&self) -> Result<ScreenOrientation, HostError>;
    /// `navigator.languages`
    fn languages(&self) -> Result<Vec<String>, HostError>;
    fn window_metrics(&self) -> Result<WindowMetrics, HostError>;

    fn listen(
        &self,
        target: &Target,
        event: &'static str,
        callback: HostCallback,
    ) -> Result<ListenerId, HostError>;
    /// Calls `callback` once per animation frame until unlistened.
    fn on_frame(&self, callback: Rc<dyn Fn()>) -> Result<ListenerId, HostError>;
    fn unlisten(&self, id: ListenerId);

    /// `navigator.geolocation`, if there is one.
    fn geolocation(&self) -> Option<Rc<dyn NativeGeolocation>>;
}

pub fn browser_host() -> Rc<dyn Host> {
    Rc::new(BrowserHost::default())
}

/// Attaches to `event` on `target` for the lifetime of `lifecycle`.
pub fn listen(
    host: &Rc<dyn Host>,
    target: Target,
    event: &'static str,
    lifecycle: &Lifecycle,
) -> Event<HostEvent> {
    let add_host = host.clone();
    let remove_host = host.clone();
    setup_listener(
        move |listener: Listener<HostEvent>| {
            let callback: HostCallback = Rc::new(move |ev: &HostEvent| listener(ev.clone()));
            match add_host.listen(&target, event, callback) {
                Ok(id) => Some(id),
                Err(err) => {
                    log::debug!("cannot listen to `{event}` on {target:?}: {err}");
                    None
                }
            }
        },
        move |id| remove_host.unlisten(id),
        lifecycle,
    )
}

/// Fires once per animation frame for the lifetime of `lifecycle`.
pub(crate) fn poll_frames(host: &Rc<dyn Host>, lifecycle: &Lifecycle) -> Event<()> {
    let add_host = host.clone();
    let remove_host = host.clone();
    setup_listener(
        move |listener: Listener<()>| {
            let callback: Rc<dyn Fn()> = Rc::new(move || listener(()));
            match add_host.on_frame(callback) {
                Ok(id) => Some(id),
                Err(err) => {
                    log::debug!("cannot poll animation frames: {err}");
                    None
                }
            }
        },
        move |id| remove_host.unlisten(id),
        lifecycle,
    )
}

#[cfg(any(test, feature = "testing"))]
pub mod fake;
