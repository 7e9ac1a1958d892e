//! # Browser APIs as stores
//!
//! Every adapter here comes as a `*Tracker` holding an [`host::Host`] plus a
//! `track_*` shortcut that uses the real browser. Nothing is attached until
//! the lifecycle's `setup` fires, and everything is released on `teardown`:
//!
//! ```rust
//! use tether_core::Lifecycle;
//! use tether_web::network_status::track_network_status;
//!
//! let lifecycle = Lifecycle::manual();
//! let network = track_network_status(&lifecycle);
//!
//! lifecycle.setup.fire(());
//! // Outside a browser the adapter keeps its documented default.
//! assert!(network.is_online.get());
//! ```
//!
//! Trackers also implement [`tether_core::TriggerProtocol`], so other
//! libraries can use them as a plain "something happened" signal.

pub mod geolocation;
pub mod host;
pub mod media_query;
pub mod network_status;
pub mod page_visibility;
pub mod preferred_languages;
pub mod screen_orientation;
pub mod window_dimensions;
pub mod window_focus;

pub use geolocation::{Geolocation, GeolocationConfig, track_geolocation};
pub use host::{BrowserHost, Host, HostError, browser_host};
pub use media_query::{MediaQuery, MediaQueryTracker, track_media_queries, track_media_query};
pub use network_status::{NetworkStatus, NetworkStatusTracker, track_network_status};
pub use page_visibility::{PageVisibility, PageVisibilityTracker, track_page_visibility};
pub use preferred_languages::{
    PreferredLanguages, PreferredLanguagesTracker, track_preferred_languages,
};
pub use screen_orientation::{ScreenOrientationTracker, track_screen_orientation};
pub use window_dimensions::{WindowDimensions, WindowDimensionsTracker, track_window_dimensions};
pub use window_focus::{WindowFocus, WindowFocusTracker, track_window_focus};
