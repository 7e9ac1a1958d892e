use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tether_core::{Event, Lifecycle, ReadStore, Scope, Store, combine};

use crate::instance::{I18nError, InstanceHandle, InstanceSource, MissingKey, Variables};

/// The translate function of the current instance.
///
/// Before the instance is initialized this is the identity: keys come back
/// unchanged. A new `Translator` is published whenever the language or the
/// resources change, so anything derived from it recomputes.
#[derive(Clone)]
pub struct Translator {
    instance: Option<InstanceHandle>,
    revision: u64,
}

impl Translator {
    pub fn identity() -> Self {
        Self {
            instance: None,
            revision: 0,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.instance.is_none()
    }

    pub fn translate(&self, key: &str) -> String {
        self.translate_with(key, &Variables::new())
    }

    pub fn translate_with(&self, key: &str, variables: &Variables) -> String {
        match &self.instance {
            Some(instance) => instance.translate(key, variables),
            None => key.to_owned(),
        }
    }
}

impl PartialEq for Translator {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision && self.instance == other.instance
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(_) => write!(f, "Translator(rev {})", self.revision),
            None => f.write_str("Translator(identity)"),
        }
    }
}

/// Something to render with the current translator.
#[derive(Clone)]
pub enum Translation {
    Key(String),
    KeyWithVariables {
        key: String,
        variables: BTreeMap<String, ReadStore<String>>,
    },
    /// Literal parts interleaved with values: `parts[0] values[0] parts[1] ...`.
    /// The joined text is the key.
    Template {
        parts: Vec<String>,
        values: Vec<ReadStore<String>>,
    },
}

impl Translation {
    fn key(&self) -> String {
        match self {
            Self::Key(key) | Self::KeyWithVariables { key, .. } => key.clone(),
            Self::Template { parts, values } => {
                let mut key = String::new();
                for (i, part) in parts.iter().enumerate() {
                    key.push_str(part);
                    if let Some(value) = values.get(i) {
                        key.push_str(&value.get());
                    }
                }
                key
            }
        }
    }

    fn variables(&self) -> Variables {
        match self {
            Self::KeyWithVariables { variables, .. } => variables
                .iter()
                .map(|(name, value)| (name.clone(), value.get()))
                .collect(),
            _ => Variables::new(),
        }
    }

    fn dependencies(&self) -> Vec<ReadStore<String>> {
        match self {
            Self::Key(_) => Vec::new(),
            Self::KeyWithVariables { variables, .. } => variables.values().cloned().collect(),
            Self::Template { values, .. } => values.clone(),
        }
    }

    fn render(&self, t: &Translator) -> String {
        t.translate_with(&self.key(), &self.variables())
    }
}

#[derive(Clone)]
pub struct Reporting {
    pub missing_key: Event<MissingKey>,
    pub failed: Event<I18nError>,
}

/// A localization instance exposed as stores and events.
///
/// Nothing touches the instance before `setup`. On setup the bridge
/// initializes the instance if needed, subscribes to its notifications and
/// only then publishes `t`, `is_ready` and `language`. Teardown releases the
/// subscriptions and clears `is_ready`.
#[derive(Clone)]
pub struct I18nIntegration {
    pub instance: ReadStore<Option<InstanceHandle>>,
    pub t: ReadStore<Translator>,
    pub is_ready: ReadStore<bool>,
    /// `None` until the instance is ready.
    pub language: ReadStore<Option<String>>,
    /// Asks the instance to switch languages. Does nothing without an instance.
    pub change_language: Event<String>,
    pub reporting: Reporting,
}

struct Bridge {
    instance: Store<Option<InstanceHandle>>,
    t: Store<Translator>,
    is_ready: Store<bool>,
    language: Store<Option<String>>,
    missing_key: Event<MissingKey>,
    failed: Event<I18nError>,
    attached: Scope,
    active: Cell<bool>,
    revision: Cell<u64>,
}

impl Bridge {
    fn report(&self, err: I18nError) {
        log::error!("i18n: {err}");
        self.failed.fire(err);
    }

    fn attach(self: &Rc<Self>) {
        self.attached.dispose();
        let Some(handle) = self.instance.get() else {
            self.detach();
            return;
        };
        if handle.is_initialized() {
            self.ready(&handle);
            return;
        }

        let bridge = Rc::downgrade(self);
        let pending = handle.clone();
        handle.init(Box::new(move |result| {
            let Some(bridge) = bridge.upgrade() else {
                return;
            };
            if let Err(err) = result {
                bridge.report(err);
                return;
            }
            // Dropped if torn down or swapped while initializing.
            if bridge.active.get() && bridge.instance.get().as_ref() == Some(&pending) {
                bridge.ready(&pending);
            }
        }));
    }

    fn ready(self: &Rc<Self>, handle: &InstanceHandle) {
        let bridge = Rc::downgrade(self);
        let on_context_changed = Rc::new(move || {
            if let Some(bridge) = bridge.upgrade() {
                bridge.publish();
            }
        });
        {
            let changed = on_context_changed.clone();
            self.attached
                .add(handle.on_language_changed(Rc::new(move |_: &str| changed())));
        }
        self.attached.add(handle.on_resources_added(on_context_changed));
        {
            let missing_key = self.missing_key.clone();
            self.attached.add(
                handle.on_missing_key(Rc::new(move |missing: &MissingKey| {
                    log::debug!("i18n: missing key {}:{}", missing.namespace, missing.key);
                    missing_key.fire(missing.clone());
                })),
            );
        }

        self.publish();
        self.is_ready.set(true);
    }

    fn publish(&self) {
        let Some(handle) = self.instance.get() else {
            return;
        };
        self.revision.set(self.revision.get() + 1);
        self.language.set(handle.language());
        self.t.set(Translator {
            instance: Some(handle),
            revision: self.revision.get(),
        });
    }

    fn detach(&self) {
        self.is_ready.set(false);
        self.t.set(Translator::identity());
        self.language.set(None);
    }
}

/// Bridges a localization instance into stores, driven by `lifecycle`.
pub fn create_i18n_integration(
    instance: impl Into<InstanceSource>,
    lifecycle: &Lifecycle,
) -> I18nIntegration {
    let source = instance.into();
    let initial = match &source {
        InstanceSource::Ready(handle) => Some(handle.clone()),
        InstanceSource::Reactive(store) => store.get(),
        InstanceSource::Deferred(_) => None,
    };

    let bridge = Rc::new(Bridge {
        instance: Store::new(initial),
        t: Store::new(Translator::identity()),
        is_ready: Store::new(false),
        language: Store::new(None),
        missing_key: Event::new(),
        failed: Event::new(),
        attached: Scope::new(),
        active: Cell::new(false),
        revision: Cell::new(0),
    });

    if let InstanceSource::Reactive(external) = &source {
        let instance = bridge.instance.clone();
        let _ = external.watch(move |next| instance.set(next.clone()));
    }

    {
        let weak = Rc::downgrade(&bridge);
        let _ = bridge.instance.updates().watch(move |_| {
            if let Some(bridge) = weak.upgrade() {
                if bridge.active.get() {
                    bridge.attach();
                }
            }
        });
    }

    let loader = match source {
        InstanceSource::Deferred(load) => Some(load),
        _ => None,
    };
    let loading = Rc::new(RefCell::new(loader));
    {
        let bridge = bridge.clone();
        let _ = lifecycle.setup.watch(move |_| {
            bridge.active.set(true);
            if bridge.instance.get().is_none() {
                // The loader runs once; the loaded instance is kept.
                let load = loading.borrow_mut().take();
                if let Some(load) = load {
                    let weak = Rc::downgrade(&bridge);
                    load(Box::new(move |result| {
                        let Some(bridge) = weak.upgrade() else {
                            return;
                        };
                        match result {
                            Ok(handle) => bridge.instance.set(Some(handle)),
                            Err(err) => bridge.report(err),
                        }
                    }));
                    return;
                }
            }
            bridge.attach();
        });
    }

    if let Some(teardown) = &lifecycle.teardown {
        let weak = Rc::downgrade(&bridge);
        let _ = teardown.watch(move |_| {
            if let Some(bridge) = weak.upgrade() {
                bridge.active.set(false);
                bridge.attached.dispose();
                bridge.is_ready.set(false);
            }
        });
    }

    let change_language = Event::<String>::new();
    {
        let weak = Rc::downgrade(&bridge);
        let _ = change_language.watch(move |language: &String| {
            let Some(bridge) = weak.upgrade() else {
                return;
            };
            let Some(handle) = bridge.instance.get() else {
                log::debug!("i18n: no instance, ignoring change to {language}");
                return;
            };
            let reporter = Rc::downgrade(&bridge);
            handle.change_language(
                language,
                Box::new(move |result| {
                    if let (Err(err), Some(bridge)) = (result, reporter.upgrade()) {
                        bridge.report(err);
                    }
                }),
            );
        });
    }

    I18nIntegration {
        instance: bridge.instance.read_only(),
        t: bridge.t.read_only(),
        is_ready: bridge.is_ready.read_only(),
        language: bridge.language.read_only(),
        change_language,
        reporting: Reporting {
            missing_key: bridge.missing_key.clone(),
            failed: bridge.failed.clone(),
        },
    }
}

impl I18nIntegration {
    /// `translation` rendered with the current translator, recomputed when
    /// either changes.
    pub fn translated(&self, translation: Translation) -> ReadStore<String> {
        let values = translation.dependencies();
        let mut deps: Vec<&dyn tether_core::Dependency> = vec![&self.t];
        deps.extend(values.iter().map(|v| v as &dyn tether_core::Dependency));

        let t = self.t.clone();
        combine(&deps, move || translation.render(&t.get()))
    }

    pub fn translated_key(&self, key: impl Into<String>) -> ReadStore<String> {
        self.translated(Translation::Key(key.into()))
    }

    pub fn translated_key_with_variables<'a>(
        &self,
        key: impl Into<String>,
        variables: impl IntoIterator<Item = (&'a str, ReadStore<String>)>,
    ) -> ReadStore<String> {
        self.translated(Translation::KeyWithVariables {
            key: key.into(),
            variables: variables
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value))
                .collect(),
        })
    }

    pub fn translated_template(
        &self,
        parts: &[&str],
        values: impl IntoIterator<Item = ReadStore<String>>,
    ) -> ReadStore<String> {
        self.translated(Translation::Template {
            parts: parts.iter().map(|p| (*p).to_owned()).collect(),
            values: values.into_iter().collect(),
        })
    }
}
