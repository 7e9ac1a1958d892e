use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tether_core::{Dispose, ReadStore, Store};

/// Interpolation values, `{{name}}` → value.
pub type Variables = BTreeMap<String, String>;

/// Completion callback of the asynchronous instance operations.
pub type Done = Box<dyn FnOnce(Result<(), I18nError>)>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum I18nError {
    #[error("i18n init failed: {0}")]
    Init(String),
    #[error("cannot switch language to `{language}`: {reason}")]
    ChangeLanguage { language: String, reason: String },
    #[error("i18n instance could not be loaded: {0}")]
    Load(String),
}

/// Payload of the instance's missing-key notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingKey {
    /// Languages that were searched.
    pub languages: Vec<String>,
    pub namespace: String,
    pub key: String,
    /// What `translate` returned instead.
    pub fallback: String,
}

/// The parts of an i18next-like localization instance the bridge uses.
pub trait I18nInstance {
    fn is_initialized(&self) -> bool;
    fn init(&self, done: Done);

    fn translate(&self, key: &str, variables: &Variables) -> String;
    fn language(&self) -> Option<String>;
    fn change_language(&self, language: &str, done: Done);

    fn on_language_changed(&self, listener: Rc<dyn Fn(&str)>) -> Dispose;
    fn on_missing_key(&self, listener: Rc<dyn Fn(&MissingKey)>) -> Dispose;
    /// Fires when resources are added to the instance's store.
    fn on_resources_added(&self, listener: Rc<dyn Fn()>) -> Dispose;
}

/// A shared instance. Equal when it is the same instance.
#[derive(Clone)]
pub struct InstanceHandle(Rc<dyn I18nInstance>);

impl InstanceHandle {
    pub fn new(instance: impl I18nInstance + 'static) -> Self {
        Self(Rc::new(instance))
    }
}

impl std::ops::Deref for InstanceHandle {
    type Target = dyn I18nInstance;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for InstanceHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceHandle({:p})", Rc::as_ptr(&self.0))
    }
}

impl<T: I18nInstance + 'static> From<Rc<T>> for InstanceHandle {
    fn from(instance: Rc<T>) -> Self {
        Self(instance)
    }
}

/// Hands the loaded instance (or the failure) to the bridge.
pub type Deliver = Box<dyn FnOnce(Result<InstanceHandle, I18nError>)>;

/// Where the bridge gets its instance from.
#[derive(Clone)]
pub enum InstanceSource {
    Ready(InstanceHandle),
    /// Followed for its whole lifetime; `None` means not available yet.
    Reactive(ReadStore<Option<InstanceHandle>>),
    /// Called on the first setup; delivers the instance whenever it is loaded.
    Deferred(Rc<dyn Fn(Deliver)>),
}

impl InstanceSource {
    pub fn deferred(load: impl Fn(Deliver) + 'static) -> Self {
        Self::Deferred(Rc::new(load))
    }
}

impl From<InstanceHandle> for InstanceSource {
    fn from(instance: InstanceHandle) -> Self {
        Self::Ready(instance)
    }
}

impl<T: I18nInstance + 'static> From<Rc<T>> for InstanceSource {
    fn from(instance: Rc<T>) -> Self {
        Self::Ready(instance.into())
    }
}

impl From<ReadStore<Option<InstanceHandle>>> for InstanceSource {
    fn from(store: ReadStore<Option<InstanceHandle>>) -> Self {
        Self::Reactive(store)
    }
}

impl From<Store<Option<InstanceHandle>>> for InstanceSource {
    fn from(store: Store<Option<InstanceHandle>>) -> Self {
        Self::Reactive(store.read_only())
    }
}
