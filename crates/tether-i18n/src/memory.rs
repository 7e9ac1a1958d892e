use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use slotmap::{DefaultKey, SlotMap};
use tether_core::Dispose;

use crate::instance::{Done, I18nInstance, MissingKey, Variables};

pub const DEFAULT_NAMESPACE: &str = "translation";
/// The language an instance settles on when none was configured.
pub const DEV_LANGUAGE: &str = "dev";

type Resources = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

struct Listeners<T: ?Sized>(Rc<RefCell<SlotMap<DefaultKey, Rc<T>>>>);

impl<T: ?Sized + 'static> Listeners<T> {
    fn new() -> Self {
        Self(Rc::new(RefCell::new(SlotMap::new())))
    }

    fn add(&self, listener: Rc<T>) -> Dispose {
        let key = self.0.borrow_mut().insert(listener);
        let weak = Rc::downgrade(&self.0);
        Dispose::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.borrow_mut().remove(key);
            }
        })
    }

    /// Copied out so listeners may subscribe or unsubscribe while notified.
    fn snapshot(&self) -> Vec<Rc<T>> {
        self.0.borrow().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

struct State {
    initialized: bool,
    language: Option<String>,
    fallback_language: Option<String>,
    default_namespace: String,
    save_missing: bool,
    resources: Resources,
}

/// An in-memory localization instance.
///
/// Keys are `namespace:key` or a bare key in the default namespace. Lookups
/// try the current language, then the fallback language. Values interpolate
/// `{{name}}` from the passed variables. A key found nowhere translates to
/// itself without the namespace and, with `save_missing`, notifies the
/// missing-key listeners.
pub struct MemoryI18n {
    state: RefCell<State>,
    language_changed: Listeners<dyn Fn(&str)>,
    missing_key: Listeners<dyn Fn(&MissingKey)>,
    resources_added: Listeners<dyn Fn()>,
}

impl MemoryI18n {
    pub fn builder() -> MemoryI18nBuilder {
        MemoryI18nBuilder::default()
    }

    pub fn add_resource(&self, language: &str, namespace: &str, key: &str, value: &str) {
        self.add_resources(language, namespace, [(key, value)]);
    }

    /// Adds a batch and notifies once.
    pub fn add_resources<'a>(
        &self,
        language: &str,
        namespace: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        {
            let mut state = self.state.borrow_mut();
            let bundle = state
                .resources
                .entry(language.to_owned())
                .or_default()
                .entry(namespace.to_owned())
                .or_default();
            for (key, value) in entries {
                bundle.insert(key.to_owned(), value.to_owned());
            }
        }
        log::trace!("resources added for {language}/{namespace}");
        for listener in self.resources_added.snapshot() {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.language_changed.len() + self.missing_key.len() + self.resources_added.len()
    }

    fn split_key<'k>(&self, key: &'k str) -> (String, &'k str) {
        match key.split_once(':') {
            Some((namespace, key)) if !namespace.is_empty() => (namespace.to_owned(), key),
            _ => (self.state.borrow().default_namespace.clone(), key),
        }
    }

    fn languages(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut languages: Vec<String> = state.language.iter().cloned().collect();
        if let Some(fallback) = &state.fallback_language {
            if !languages.contains(fallback) {
                languages.push(fallback.clone());
            }
        }
        languages
    }

    fn lookup(&self, languages: &[String], namespace: &str, key: &str) -> Option<String> {
        let state = self.state.borrow();
        languages.iter().find_map(|language| {
            state
                .resources
                .get(language)?
                .get(namespace)?
                .get(key)
                .cloned()
        })
    }
}

impl I18nInstance for MemoryI18n {
    fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    fn init(&self, done: Done) {
        {
            let mut state = self.state.borrow_mut();
            state.initialized = true;
            if state.language.is_none() {
                state.language = Some(DEV_LANGUAGE.to_owned());
            }
        }
        done(Ok(()));
    }

    fn translate(&self, key: &str, variables: &Variables) -> String {
        let (namespace, bare) = self.split_key(key);
        let languages = self.languages();
        if let Some(value) = self.lookup(&languages, &namespace, bare) {
            return interpolate(&value, variables);
        }

        let fallback = bare.to_owned();
        if self.state.borrow().save_missing {
            let missing = MissingKey {
                languages,
                namespace,
                key: bare.to_owned(),
                fallback: fallback.clone(),
            };
            for listener in self.missing_key.snapshot() {
                listener(&missing);
            }
        }
        fallback
    }

    fn language(&self) -> Option<String> {
        self.state.borrow().language.clone()
    }

    fn change_language(&self, language: &str, done: Done) {
        self.state.borrow_mut().language = Some(language.to_owned());
        log::debug!("language changed to {language}");
        for listener in self.language_changed.snapshot() {
            listener(language);
        }
        done(Ok(()));
    }

    fn on_language_changed(&self, listener: Rc<dyn Fn(&str)>) -> Dispose {
        self.language_changed.add(listener)
    }

    fn on_missing_key(&self, listener: Rc<dyn Fn(&MissingKey)>) -> Dispose {
        self.missing_key.add(listener)
    }

    fn on_resources_added(&self, listener: Rc<dyn Fn()>) -> Dispose {
        self.resources_added.add(listener)
    }
}

#[derive(Default)]
pub struct MemoryI18nBuilder {
    language: Option<String>,
    fallback_language: Option<String>,
    default_namespace: Option<String>,
    save_missing: bool,
    initialized: bool,
    resources: Resources,
}

impl MemoryI18nBuilder {
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn fallback_language(mut self, language: impl Into<String>) -> Self {
        self.fallback_language = Some(language.into());
        self
    }

    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    pub fn save_missing(mut self, save_missing: bool) -> Self {
        self.save_missing = save_missing;
        self
    }

    /// Builds an instance that is already initialized.
    pub fn initialized(mut self) -> Self {
        self.initialized = true;
        self
    }

    pub fn resource(mut self, language: &str, namespace: &str, key: &str, value: &str) -> Self {
        self.resources
            .entry(language.to_owned())
            .or_default()
            .entry(namespace.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn build(self) -> MemoryI18n {
        let language = match (self.language, self.initialized) {
            (None, true) => Some(DEV_LANGUAGE.to_owned()),
            (language, _) => language,
        };
        MemoryI18n {
            state: RefCell::new(State {
                initialized: self.initialized,
                language,
                fallback_language: self.fallback_language,
                default_namespace: self
                    .default_namespace
                    .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned()),
                save_missing: self.save_missing,
                resources: self.resources,
            }),
            language_changed: Listeners::new(),
            missing_key: Listeners::new(),
            resources_added: Listeners::new(),
        }
    }
}

/// Replaces `{{name}}` placeholders. Unknown names are left as they are.
pub fn interpolate(template: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + len;
        out.push_str(&rest[..start]);
        match variables.get(rest[start + 2..end].trim()) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..end + 2]),
        }
        rest = &rest[end + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_interpolate() {
        let v = vars(&[("name", "Ann"), ("count", "3")]);
        assert_eq!(interpolate("Hi {{name}}, {{ count }} new", &v), "Hi Ann, 3 new");
        assert_eq!(interpolate("{{missing}} stays", &v), "{{missing}} stays");
        assert_eq!(interpolate("open {{name", &v), "open {{name");
    }

    #[test]
    fn test_lookup_with_namespace_and_fallback() {
        let i18n = MemoryI18n::builder()
            .language("th")
            .fallback_language("en")
            .resource("en", "common", "key", "en value")
            .resource("en", "translation", "plain", "plain value")
            .resource("th", "common", "key", "th value")
            .initialized()
            .build();
        let none = Variables::new();

        assert_eq!(i18n.translate("common:key", &none), "th value");
        assert_eq!(i18n.translate("plain", &none), "plain value");

        i18n.change_language("fr", Box::new(|_| {}));
        assert_eq!(i18n.translate("common:key", &none), "en value");
    }

    #[test]
    fn test_missing_key_notifies_only_when_saving() {
        let i18n = Rc::new(
            MemoryI18n::builder()
                .save_missing(true)
                .initialized()
                .build(),
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let dispose = i18n.on_missing_key(Rc::new(move |m: &MissingKey| sink.borrow_mut().push(m.clone())));

        assert_eq!(i18n.translate("common:other_key", &Variables::new()), "other_key");
        assert_eq!(
            *seen.borrow(),
            vec![MissingKey {
                languages: vec!["dev".into()],
                namespace: "common".into(),
                key: "other_key".into(),
                fallback: "other_key".into(),
            }]
        );

        dispose.run();
        let _ = i18n.translate("common:other_key", &Variables::new());
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(i18n.listener_count(), 0);
    }

    #[test]
    fn test_added_resources_notify_once_per_batch() {
        let i18n = MemoryI18n::builder().build();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let _ = i18n.on_resources_added(Rc::new(move || counter.set(counter.get() + 1)));

        i18n.add_resources("en", "common", [("a", "A"), ("b", "B")]);
        assert_eq!(calls.get(), 1);
        assert!(!i18n.is_initialized());
        assert_eq!(i18n.language(), None);
    }
}
