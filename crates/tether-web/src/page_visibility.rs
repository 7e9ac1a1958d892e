use std::rc::Rc;

use tether_core::{Lifecycle, ReadStore, Store, Trigger, TriggerParts, TriggerProtocol, read_value};

use crate::host::{Host, Target, VisibilityState, browser_host, listen};

/// `document.visibilityState` and its `visibilitychange` event.
#[derive(Clone)]
pub struct PageVisibilityTracker {
    host: Rc<dyn Host>,
}

#[derive(Clone)]
pub struct PageVisibility {
    pub visible: Trigger,
    pub hidden: Trigger,
    pub is_visible: ReadStore<bool>,
    pub is_hidden: ReadStore<bool>,
}

impl PageVisibilityTracker {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn track(&self, lifecycle: &Lifecycle) -> PageVisibility {
        let read_host = self.host.clone();
        let changed = listen(&self.host, Target::Document, "visibilitychange", lifecycle)
            .map(move |_| read_value(|| read_host.visibility_state(), VisibilityState::Visible));

        let host = self.host.clone();
        let state = Store::new(read_value(|| host.visibility_state(), VisibilityState::Visible));
        state.on(&changed, |_, next| *next);

        PageVisibility {
            visible: changed
                .filter(|s| *s == VisibilityState::Visible)
                .unit(),
            hidden: changed.filter(|s| *s == VisibilityState::Hidden).unit(),
            is_visible: state.map(|s| *s == VisibilityState::Visible),
            is_hidden: state.map(|s| *s == VisibilityState::Hidden),
        }
    }
}

impl Default for PageVisibilityTracker {
    fn default() -> Self {
        Self::new(browser_host())
    }
}

impl TriggerProtocol for PageVisibilityTracker {
    fn trigger(&self) -> TriggerParts {
        let lifecycle = Lifecycle::manual();
        let visibility = self.track(&lifecycle);
        TriggerParts {
            setup: lifecycle.setup,
            teardown: lifecycle.teardown,
            fired: visibility.visible,
        }
    }
}

pub fn track_page_visibility(lifecycle: &Lifecycle) -> PageVisibility {
    PageVisibilityTracker::default().track(lifecycle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostEvent;
    use crate::host::fake::FakeHost;

    fn flip(host: &FakeHost, state: VisibilityState) {
        host.visibility.set(Some(state));
        host.dispatch(&Target::Document, "visibilitychange", HostEvent::Signal);
    }

    #[test]
    fn test_follows_visibility_changes() {
        let host = FakeHost::new();
        host.visibility.set(Some(VisibilityState::Visible));
        let lifecycle = Lifecycle::manual();
        let page = PageVisibilityTracker::new(host.clone()).track(&lifecycle);

        let hidden = Store::new(0);
        hidden.on(&page.hidden, |n, _| n + 1);

        lifecycle.setup.fire(());
        flip(&host, VisibilityState::Hidden);

        assert!(page.is_hidden.get());
        assert!(!page.is_visible.get());
        assert_eq!(hidden.get(), 1);

        flip(&host, VisibilityState::Visible);
        assert!(page.is_visible.get());
        assert_eq!(hidden.get(), 1);
    }

    #[test]
    fn test_defaults_to_visible() {
        let page = track_page_visibility(&Lifecycle::manual());
        assert!(page.is_visible.get());
        assert!(!page.is_hidden.get());
    }

    #[test]
    fn test_no_updates_after_teardown() {
        let host = FakeHost::new();
        let lifecycle = Lifecycle::manual();
        let page = PageVisibilityTracker::new(host.clone()).track(&lifecycle);

        lifecycle.setup.fire(());
        if let Some(teardown) = &lifecycle.teardown {
            teardown.fire(());
        }
        flip(&host, VisibilityState::Hidden);

        assert!(page.is_visible.get());
    }
}
