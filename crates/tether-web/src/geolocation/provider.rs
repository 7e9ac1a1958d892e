use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use tether_core::{Dispose, ReadStore, Store};

use super::{GeolocationError, GeolocationParams, Position, PositionError};

pub type PositionCallback = Rc<dyn Fn(Position)>;
pub type ErrorCallback<E> = Rc<dyn Fn(E)>;

/// The shape of `navigator.geolocation`.
pub trait NativeGeolocation {
    fn get_current_position(
        &self,
        params: &GeolocationParams,
    ) -> LocalBoxFuture<'static, Result<Position, PositionError>>;

    /// Returns the watch id `clear_watch` expects.
    fn watch_position(
        &self,
        on_position: PositionCallback,
        on_error: ErrorCallback<PositionError>,
        params: &GeolocationParams,
    ) -> Result<i32, PositionError>;

    fn clear_watch(&self, id: i32);
}

/// A custom source of positions, e.g. an IP lookup or a native bridge.
pub trait PositionSource {
    fn get_current_position(&self) -> LocalBoxFuture<'static, Result<Position, GeolocationError>>;

    /// Starts delivering positions until the returned handle is run.
    fn watch_position(
        &self,
        on_position: PositionCallback,
        on_error: ErrorCallback<GeolocationError>,
    ) -> Result<Dispose, GeolocationError>;
}

/// Builds a [`PositionSource`] from the adapter's params. Invoked once per
/// initialization, not once per request.
#[derive(Clone)]
pub struct CustomProvider(Rc<dyn Fn(&GeolocationParams) -> Rc<dyn PositionSource>>);

impl CustomProvider {
    pub fn new(create: impl Fn(&GeolocationParams) -> Rc<dyn PositionSource> + 'static) -> Self {
        Self(Rc::new(create))
    }

    pub(crate) fn create(&self, params: &GeolocationParams) -> Rc<dyn PositionSource> {
        (self.0)(params)
    }
}

/// One entry in the provider list.
#[derive(Clone)]
pub enum Provider {
    /// `navigator.geolocation` of the adapter's host; dropped when there is none.
    Browser,
    /// An already live native-shaped geolocation object.
    Native(Rc<dyn NativeGeolocation>),
    Custom(CustomProvider),
}

impl Provider {
    pub fn custom(create: impl Fn(&GeolocationParams) -> Rc<dyn PositionSource> + 'static) -> Self {
        Self::Custom(CustomProvider::new(create))
    }

    pub fn native(geolocation: Rc<dyn NativeGeolocation>) -> Self {
        Self::Native(geolocation)
    }
}

impl PartialEq for Provider {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Browser, Self::Browser) => true,
            (Self::Native(a), Self::Native(b)) => Rc::ptr_eq(a, b),
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browser => f.write_str("Browser"),
            Self::Native(_) => f.write_str("Native(..)"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The configured provider list. Order matters: see `Geolocation::request`.
#[derive(Clone, Debug)]
pub enum Providers {
    Static(Vec<Provider>),
    /// Changing the store re-resolves providers on the next request or watch
    /// start; watches already running are left alone.
    Reactive(ReadStore<Vec<Provider>>),
}

impl Providers {
    pub(crate) fn current(&self) -> Vec<Provider> {
        match self {
            Self::Static(list) => list.clone(),
            Self::Reactive(store) => store.get(),
        }
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::Static(vec![Provider::Browser])
    }
}

impl From<Vec<Provider>> for Providers {
    fn from(list: Vec<Provider>) -> Self {
        Self::Static(list)
    }
}

impl From<Store<Vec<Provider>>> for Providers {
    fn from(store: Store<Vec<Provider>>) -> Self {
        Self::Reactive(store.read_only())
    }
}

impl From<ReadStore<Vec<Provider>>> for Providers {
    fn from(store: ReadStore<Vec<Provider>>) -> Self {
        Self::Reactive(store)
    }
}

/// A provider after initialization.
#[derive(Clone)]
pub(crate) enum Resolved {
    Native(Rc<dyn NativeGeolocation>),
    Custom(Rc<dyn PositionSource>),
}
