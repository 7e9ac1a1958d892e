//! Position tracking across several providers.
//!
//! ```rust
//! use std::rc::Rc;
//! use futures::executor::block_on;
//! use tether_web::geolocation::*;
//!
//! struct Fixed;
//!
//! impl PositionSource for Fixed {
//!     fn get_current_position(
//!         &self,
//!     ) -> futures::future::LocalBoxFuture<'static, Result<Position, GeolocationError>> {
//!         Box::pin(async { Ok(Position::now(41.89, 12.49)) })
//!     }
//!
//!     fn watch_position(
//!         &self,
//!         _on_position: PositionCallback,
//!         _on_error: ErrorCallback<GeolocationError>,
//!     ) -> Result<tether_core::Dispose, GeolocationError> {
//!         Ok(tether_core::Dispose::noop())
//!     }
//! }
//!
//! let geo = track_geolocation(
//!     GeolocationConfig::default()
//!         .with_providers(vec![Provider::custom(|_| Rc::new(Fixed) as Rc<dyn PositionSource>)]),
//! );
//! block_on(geo.request()).unwrap();
//! assert_eq!(geo.latitude.get(), Some(41.89));
//! ```

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use tether_core::{Dispose, Event, ReadStore, Store, Trigger};

use crate::host::{Host, browser_host};

#[cfg(target_arch = "wasm32")]
mod browser;
mod provider;
mod types;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserGeolocation;
pub use provider::*;
pub use types::*;

/// Provider resolution state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    Uninitialized,
    Initializing,
    Ready,
}

pub struct GeolocationConfig {
    pub params: GeolocationParams,
    pub providers: Providers,
    pub host: Rc<dyn Host>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            params: GeolocationParams::default(),
            providers: Providers::default(),
            host: browser_host(),
        }
    }
}

impl GeolocationConfig {
    pub fn with_params(mut self, params: GeolocationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_providers(mut self, providers: impl Into<Providers>) -> Self {
        self.providers = providers.into();
        self
    }

    pub fn with_host(mut self, host: Rc<dyn Host>) -> Self {
        self.host = host;
        self
    }
}

#[derive(Clone)]
pub struct Watching {
    pub start: Trigger,
    pub stop: Trigger,
    /// Whether `start` fired more recently than `stop`.
    pub active: ReadStore<bool>,
}

#[derive(Clone)]
pub struct Reporting {
    pub failed: Event<GeolocationError>,
}

#[derive(Clone)]
pub struct Geolocation {
    pub location: ReadStore<Option<Location>>,
    pub latitude: ReadStore<Option<f64>>,
    pub longitude: ReadStore<Option<f64>>,
    pub watching: Watching,
    pub reporting: Reporting,
    engine: Rc<Engine>,
}

/// Active watches, split by how they are cancelled.
#[derive(Default)]
struct WatchSet {
    native: Vec<(Rc<dyn NativeGeolocation>, i32)>,
    custom: Vec<Dispose>,
    /// Cleared on stop so late callbacks from a provider are dropped.
    live: Rc<Cell<bool>>,
}

struct Engine {
    params: GeolocationParams,
    providers: Providers,
    host: Rc<dyn Host>,
    phase: Cell<EnginePhase>,
    resolved: RefCell<Vec<Resolved>>,
    watches: RefCell<WatchSet>,
    active: Store<bool>,
    new_position: Event<Position>,
    failed: Event<GeolocationError>,
}

pub fn track_geolocation(config: GeolocationConfig) -> Geolocation {
    let GeolocationConfig {
        params,
        providers,
        host,
    } = config;

    let new_position = Event::<Position>::new();
    let failed = Event::<GeolocationError>::new();

    let location = Store::new(None::<Location>);
    location.on(&new_position, |_, position| Some(position.location()));

    let engine = Rc::new(Engine {
        params,
        providers,
        host,
        phase: Cell::new(EnginePhase::Uninitialized),
        resolved: RefCell::new(Vec::new()),
        watches: RefCell::new(WatchSet::default()),
        active: Store::new(false),
        new_position,
        failed: failed.clone(),
    });

    if let Providers::Reactive(store) = &engine.providers {
        let weak = Rc::downgrade(&engine);
        let _ = store.updates().watch(move |_| {
            if let Some(engine) = weak.upgrade() {
                engine.phase.set(EnginePhase::Uninitialized);
            }
        });
    }

    let start = Trigger::new();
    let stop = Trigger::new();
    let weak: Weak<Engine> = Rc::downgrade(&engine);
    let _ = start.watch(move |_| {
        if let Some(engine) = weak.upgrade() {
            engine.start_watching();
        }
    });
    let weak: Weak<Engine> = Rc::downgrade(&engine);
    let _ = stop.watch(move |_| {
        if let Some(engine) = weak.upgrade() {
            engine.stop_watching();
        }
    });

    Geolocation {
        latitude: location.map(|l| l.map(|l| l.latitude)),
        longitude: location.map(|l| l.map(|l| l.longitude)),
        location: location.read_only(),
        watching: Watching {
            start,
            stop,
            active: engine.active.read_only(),
        },
        reporting: Reporting { failed },
        engine,
    }
}

impl Geolocation {
    /// Asks every provider, in order, for the current position.
    ///
    /// Providers are queried one after another, never concurrently. Each
    /// failure is reported on `reporting.failed` right away and the next
    /// provider is tried. When several succeed the one listed *last* wins, so
    /// precise providers go at the end and fallbacks at the front. If none
    /// succeeds the request fails with `POSITION_UNAVAILABLE` (also reported)
    /// and the location is left untouched.
    pub fn request(&self) -> impl Future<Output = Result<Location, GeolocationError>> + 'static {
        let engine = self.engine.clone();
        async move { engine.request().await }
    }

    /// Runs [`Geolocation::request`] on the browser's event loop.
    #[cfg(target_arch = "wasm32")]
    pub fn spawn_request(&self) {
        let request = self.request();
        wasm_bindgen_futures::spawn_local(async move {
            let _ = request.await;
        });
    }

    pub fn phase(&self) -> EnginePhase {
        self.engine.phase.get()
    }
}

impl Engine {
    fn providers(&self) -> Vec<Resolved> {
        if self.phase.get() != EnginePhase::Ready {
            self.phase.set(EnginePhase::Initializing);
            let resolved: Vec<Resolved> = self
                .providers
                .current()
                .iter()
                .filter_map(|p| self.resolve(p))
                .collect();
            *self.resolved.borrow_mut() = resolved;
            self.phase.set(EnginePhase::Ready);
        }
        self.resolved.borrow().clone()
    }

    fn resolve(&self, provider: &Provider) -> Option<Resolved> {
        match provider {
            Provider::Browser => {
                let native = self.host.geolocation();
                if native.is_none() {
                    log::debug!("browser geolocation is not available, skipping provider");
                }
                native.map(Resolved::Native)
            }
            Provider::Native(native) => Some(Resolved::Native(native.clone())),
            Provider::Custom(custom) => Some(Resolved::Custom(custom.create(&self.params))),
        }
    }

    fn report(&self, err: GeolocationError) {
        log::warn!("geolocation: {err}");
        self.failed.fire(err);
    }

    async fn request(&self) -> Result<Location, GeolocationError> {
        let providers = self.providers();

        let mut latest: Option<Position> = None;
        for provider in &providers {
            let attempt = match provider {
                Resolved::Native(native) => native
                    .get_current_position(&self.params)
                    .await
                    .map_err(GeolocationError::from),
                Resolved::Custom(source) => source.get_current_position().await,
            };
            match attempt {
                Ok(position) => latest = Some(position),
                Err(err) => self.report(err),
            }
        }

        match latest {
            Some(position) => {
                let location = position.location();
                self.new_position.fire(position);
                Ok(location)
            }
            None => {
                let err = GeolocationError::from(PositionError::unavailable(
                    "no geolocation provider returned a position",
                ));
                self.report(err.clone());
                Err(err)
            }
        }
    }

    fn start_watching(&self) {
        if self.active.get() {
            log::debug!("geolocation: already watching, ignoring start");
            return;
        }

        let live = Rc::new(Cell::new(true));
        let on_position: PositionCallback = {
            let new_position = self.new_position.clone();
            let live = live.clone();
            Rc::new(move |position| {
                if live.get() {
                    new_position.fire(position);
                }
            })
        };
        let on_failure = {
            let failed = self.failed.clone();
            let live = live.clone();
            move |err: GeolocationError| {
                if live.get() {
                    log::warn!("geolocation: {err}");
                    failed.fire(err);
                }
            }
        };

        let mut watches = WatchSet {
            live,
            ..WatchSet::default()
        };
        for provider in self.providers() {
            match provider {
                Resolved::Native(native) => {
                    let on_failure = on_failure.clone();
                    let on_error: ErrorCallback<PositionError> =
                        Rc::new(move |err| on_failure(err.into()));
                    match native.watch_position(on_position.clone(), on_error, &self.params) {
                        Ok(id) => watches.native.push((native, id)),
                        Err(err) => self.report(err.into()),
                    }
                }
                Resolved::Custom(source) => {
                    let on_error: ErrorCallback<GeolocationError> = Rc::new(on_failure.clone());
                    match source.watch_position(on_position.clone(), on_error) {
                        Ok(unwatch) => watches.custom.push(unwatch),
                        Err(err) => self.report(err),
                    }
                }
            }
        }

        *self.watches.borrow_mut() = watches;
        self.active.set(true);
    }

    fn stop_watching(&self) {
        let watches = std::mem::take(&mut *self.watches.borrow_mut());
        watches.live.set(false);
        for (native, id) in watches.native {
            native.clear_watch(id);
        }
        for unwatch in watches.custom {
            unwatch.run();
        }
        self.active.set(false);
    }
}

#[cfg(test)]
mod tests;
