use std::rc::Rc;

use tether_core::{Lifecycle, ReadStore, Store, Trigger, TriggerParts, TriggerProtocol, read_value};

use crate::host::{Host, Target, browser_host, listen};

/// `navigator.onLine` and the window's `online`/`offline` events.
#[derive(Clone)]
pub struct NetworkStatusTracker {
    host: Rc<dyn Host>,
}

#[derive(Clone)]
pub struct NetworkStatus {
    pub online: Trigger,
    pub offline: Trigger,
    /// `true` until the host says otherwise.
    pub is_online: ReadStore<bool>,
    pub is_offline: ReadStore<bool>,
}

impl NetworkStatusTracker {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn track(&self, lifecycle: &Lifecycle) -> NetworkStatus {
        let online = listen(&self.host, Target::Window, "online", lifecycle).unit();
        let offline = listen(&self.host, Target::Window, "offline", lifecycle).unit();

        let host = self.host.clone();
        let is_online = Store::new(read_value(|| host.is_online(), true));
        is_online.on(&online, |_, _| true).on(&offline, |_, _| false);

        NetworkStatus {
            is_offline: is_online.map(|online| !online),
            is_online: is_online.read_only(),
            online,
            offline,
        }
    }
}

impl Default for NetworkStatusTracker {
    fn default() -> Self {
        Self::new(browser_host())
    }
}

impl TriggerProtocol for NetworkStatusTracker {
    fn trigger(&self) -> TriggerParts {
        let lifecycle = Lifecycle::manual();
        let status = self.track(&lifecycle);
        TriggerParts {
            setup: lifecycle.setup,
            teardown: lifecycle.teardown,
            fired: status.online,
        }
    }
}

pub fn track_network_status(lifecycle: &Lifecycle) -> NetworkStatus {
    NetworkStatusTracker::default().track(lifecycle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostEvent;
    use crate::host::fake::FakeHost;

    #[test]
    fn test_reads_initial_value_and_follows_events() {
        let host = FakeHost::new();
        host.online.set(Some(false));
        let lifecycle = Lifecycle::manual();
        let status = NetworkStatusTracker::new(host.clone()).track(&lifecycle);

        assert!(!status.is_online.get());
        assert!(status.is_offline.get());

        lifecycle.setup.fire(());
        host.dispatch(&Target::Window, "online", HostEvent::Signal);
        assert!(status.is_online.get());

        host.dispatch(&Target::Window, "offline", HostEvent::Signal);
        assert!(status.is_offline.get());
    }

    #[test]
    fn test_defaults_to_online_without_navigator() {
        let status = track_network_status(&Lifecycle::manual());
        assert!(status.is_online.get());
        assert!(!status.is_offline.get());
    }

    #[test]
    fn test_nothing_attached_before_setup_or_after_teardown() {
        let host = FakeHost::new();
        let lifecycle = Lifecycle::manual();
        let status = NetworkStatusTracker::new(host.clone()).track(&lifecycle);

        host.dispatch(&Target::Window, "offline", HostEvent::Signal);
        assert!(status.is_online.get());
        assert_eq!(host.listener_count(), 0);

        lifecycle.setup.fire(());
        assert_eq!(host.listener_count(), 2);

        if let Some(teardown) = &lifecycle.teardown {
            teardown.fire(());
        }
        assert_eq!(host.listener_count(), 0);
        host.dispatch(&Target::Window, "offline", HostEvent::Signal);
        assert!(status.is_online.get());
    }

    #[test]
    fn test_trigger_fires_when_back_online() {
        let host = FakeHost::new();
        let parts = NetworkStatusTracker::new(host.clone()).trigger();
        let fired = Store::new(0);
        fired.on(&parts.fired, |n, _| n + 1);

        parts.setup.fire(());
        host.dispatch(&Target::Window, "offline", HostEvent::Signal);
        host.dispatch(&Target::Window, "online", HostEvent::Signal);

        assert_eq!(fired.get(), 1);
    }
}
