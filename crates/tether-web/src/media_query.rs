use std::collections::BTreeMap;
use std::rc::Rc;

use tether_core::{Lifecycle, ReadStore, Store, Trigger, TriggerParts, TriggerProtocol, read_value};

use crate::host::{Host, Target, browser_host, listen};

/// One `window.matchMedia` query.
#[derive(Clone)]
pub struct MediaQueryTracker {
    host: Rc<dyn Host>,
    query: String,
}

#[derive(Clone)]
pub struct MediaQuery {
    pub active: ReadStore<bool>,
    pub inactive: ReadStore<bool>,
    /// Fires each time the query starts matching.
    pub activated: Trigger,
}

impl MediaQueryTracker {
    pub fn new(host: Rc<dyn Host>, query: impl Into<String>) -> Self {
        Self {
            host,
            query: query.into(),
        }
    }

    /// One tracker per key, all sharing `host`.
    pub fn keyed<K: Ord>(
        host: Rc<dyn Host>,
        queries: impl IntoIterator<Item = (K, impl Into<String>)>,
    ) -> BTreeMap<K, Self> {
        queries
            .into_iter()
            .map(|(key, query)| (key, Self::new(host.clone(), query)))
            .collect()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn track(&self, lifecycle: &Lifecycle) -> MediaQuery {
        let read = {
            let host = self.host.clone();
            let query = self.query.clone();
            move || read_value(|| host.matches_media(&query), false)
        };

        let active = Store::new(read());
        let changed = listen(
            &self.host,
            Target::MediaQuery(self.query.clone()),
            "change",
            lifecycle,
        )
        .map(move |_| read());
        active.on(&changed, |_, matches| *matches);

        MediaQuery {
            inactive: active.map(|a| !a),
            activated: active.updates().filter(|a| *a).unit(),
            active: active.read_only(),
        }
    }
}

impl TriggerProtocol for MediaQueryTracker {
    fn trigger(&self) -> TriggerParts {
        let lifecycle = Lifecycle::manual();
        let query = self.track(&lifecycle);
        TriggerParts {
            setup: lifecycle.setup,
            teardown: lifecycle.teardown,
            fired: query.activated,
        }
    }
}

pub fn track_media_query(query: impl Into<String>, lifecycle: &Lifecycle) -> MediaQuery {
    MediaQueryTracker::new(browser_host(), query).track(lifecycle)
}

/// Tracks several named queries under one lifecycle.
pub fn track_media_queries<K: Ord>(
    queries: impl IntoIterator<Item = (K, impl Into<String>)>,
    lifecycle: &Lifecycle,
) -> BTreeMap<K, MediaQuery> {
    MediaQueryTracker::keyed(browser_host(), queries)
        .into_iter()
        .map(|(key, tracker)| (key, tracker.track(lifecycle)))
        .collect()
}
