use std::rc::Rc;

use tether_core::{
    Lifecycle, ReadStore, Store, Trigger, TriggerParts, TriggerProtocol, combine, read_value,
};

use crate::host::{Host, Target, browser_host, listen};

/// `navigator.languages`, overridable by an `Accept-Language` header.
///
/// The header store lets server-side rendering supply the request's
/// preferences. While it yields at least one language it wins over the
/// navigator.
#[derive(Clone)]
pub struct PreferredLanguagesTracker {
    host: Rc<dyn Host>,
    accept_language_header: Store<Option<String>>,
}

#[derive(Clone)]
pub struct PreferredLanguages {
    pub languages: ReadStore<Vec<String>>,
    /// The most preferred language.
    pub language: ReadStore<Option<String>>,
    pub language_changed: Trigger,
}

/// Language tags of an `Accept-Language` value, in order, without quality
/// weights or the `*` wildcard.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    header
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .filter(|lang| !lang.is_empty() && *lang != "*")
        .map(str::to_owned)
        .collect()
}

impl PreferredLanguagesTracker {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self {
            host,
            accept_language_header: Store::new(None),
        }
    }

    pub fn accept_language_header(&self) -> &Store<Option<String>> {
        &self.accept_language_header
    }

    pub fn track(&self, lifecycle: &Lifecycle) -> PreferredLanguages {
        let read = {
            let host = self.host.clone();
            move || read_value(|| host.languages(), Vec::new())
        };

        let from_navigator = Store::new(read());
        let changed = listen(&self.host, Target::Window, "languagechange", lifecycle)
            .map(move |_| read());
        from_navigator.on(&changed, |_, languages| languages.clone());

        let from_header = self
            .accept_language_header
            .map(|header| header.as_deref().map(parse_accept_language).unwrap_or_default());

        let languages = {
            let (header, navigator) = (from_header.clone(), from_navigator.clone());
            combine(&[&from_header, &from_navigator], move || {
                let header = header.get();
                if header.is_empty() { navigator.get() } else { header }
            })
        };

        PreferredLanguages {
            language: languages.map(|languages| languages.first().cloned()),
            languages,
            language_changed: changed.unit(),
        }
    }
}

impl Default for PreferredLanguagesTracker {
    fn default() -> Self {
        Self::new(browser_host())
    }
}

impl TriggerProtocol for PreferredLanguagesTracker {
    fn trigger(&self) -> TriggerParts {
        let lifecycle = Lifecycle::manual();
        let languages = self.track(&lifecycle);
        TriggerParts {
            setup: lifecycle.setup,
            teardown: lifecycle.teardown,
            fired: languages.language_changed,
        }
    }
}

pub fn track_preferred_languages(lifecycle: &Lifecycle) -> PreferredLanguages {
    PreferredLanguagesTracker::default().track(lifecycle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostEvent;
    use crate::host::fake::FakeHost;

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_accept_language() {
        insta::assert_debug_snapshot!(
            parse_accept_language("fr-CH, fr;q=0.9, en;q=0.8, de;q=0.7, *;q=0.5"),
            @r#"
        [
            "fr-CH",
            "fr",
            "en",
            "de",
        ]
        "#
        );
        assert!(parse_accept_language("").is_empty());
        assert!(parse_accept_language("*").is_empty());
    }

    #[test]
    fn test_follows_languagechange() {
        let host = FakeHost::new();
        *host.languages.borrow_mut() = Some(langs(&["en-US", "en"]));
        let lifecycle = Lifecycle::manual();
        let prefs = PreferredLanguagesTracker::new(host.clone()).track(&lifecycle);

        let changes = Store::new(0);
        changes.on(&prefs.language_changed, |n, _| n + 1);
        assert_eq!(prefs.language.get().as_deref(), Some("en-US"));

        lifecycle.setup.fire(());
        *host.languages.borrow_mut() = Some(langs(&["de"]));
        host.dispatch(&Target::Window, "languagechange", HostEvent::Signal);

        assert_eq!(prefs.languages.get(), langs(&["de"]));
        assert_eq!(prefs.language.get().as_deref(), Some("de"));
        assert_eq!(changes.get(), 1);
    }

    #[test]
    fn test_header_wins_when_present() {
        let host = FakeHost::new();
        *host.languages.borrow_mut() = Some(langs(&["en"]));
        let tracker = PreferredLanguagesTracker::new(host);
        let prefs = tracker.track(&Lifecycle::manual());

        tracker
            .accept_language_header()
            .set(Some("es-ES;q=1, es;q=0.8".into()));
        assert_eq!(prefs.languages.get(), langs(&["es-ES", "es"]));

        tracker.accept_language_header().set(Some("*".into()));
        assert_eq!(prefs.language.get().as_deref(), Some("en"));
    }

    #[test]
    fn test_nothing_known_means_no_language() {
        let prefs = track_preferred_languages(&Lifecycle::manual());
        assert!(prefs.languages.get().is_empty());
        assert_eq!(prefs.language.get(), None);
    }
}
