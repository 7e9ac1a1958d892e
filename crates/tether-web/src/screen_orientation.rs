use std::rc::Rc;

use tether_core::{Lifecycle, ReadStore, Store, TriggerParts, TriggerProtocol};

use crate::host::{Host, OrientationType, Target, browser_host, listen};

/// `screen.orientation` and its `change` event.
#[derive(Clone)]
pub struct ScreenOrientationTracker {
    host: Rc<dyn Host>,
}

#[derive(Clone)]
pub struct ScreenOrientation {
    /// `None` where the screen orientation API is missing.
    pub orientation_type: ReadStore<Option<OrientationType>>,
    pub angle: ReadStore<Option<u16>>,
    pub is_portrait: ReadStore<bool>,
    pub is_landscape: ReadStore<bool>,
}

impl ScreenOrientationTracker {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn track(&self, lifecycle: &Lifecycle) -> ScreenOrientation {
        let read = {
            let host = self.host.clone();
            move || match host.orientation() {
                Ok(orientation) => Some(orientation),
                Err(err) => {
                    log::debug!("screen orientation: {err}");
                    None
                }
            }
        };

        let current = Store::new(read());
        let changed = listen(&self.host, Target::ScreenOrientation, "change", lifecycle)
            .map(move |_| read());
        current.on(&changed, |_, next| *next);

        let orientation_type = current.map(|o| o.map(|o| o.kind));
        ScreenOrientation {
            angle: current.map(|o| o.map(|o| o.angle)),
            is_portrait: orientation_type.map(|kind| {
                matches!(
                    kind,
                    Some(OrientationType::PortraitPrimary | OrientationType::PortraitSecondary)
                )
            }),
            is_landscape: orientation_type.map(|kind| {
                matches!(
                    kind,
                    Some(OrientationType::LandscapePrimary | OrientationType::LandscapeSecondary)
                )
            }),
            orientation_type,
        }
    }
}

impl Default for ScreenOrientationTracker {
    fn default() -> Self {
        Self::new(browser_host())
    }
}

impl TriggerProtocol for ScreenOrientationTracker {
    /// Fires whenever the orientation type changes.
    fn trigger(&self) -> TriggerParts {
        let lifecycle = Lifecycle::manual();
        let orientation = self.track(&lifecycle);
        TriggerParts {
            setup: lifecycle.setup,
            teardown: lifecycle.teardown,
            fired: orientation.orientation_type.updates().unit(),
        }
    }
}

pub fn track_screen_orientation(lifecycle: &Lifecycle) -> ScreenOrientation {
    ScreenOrientationTracker::default().track(lifecycle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostEvent, ScreenOrientation as Reading};
    use crate::host::fake::FakeHost;

    fn rotate(host: &FakeHost, kind: OrientationType, angle: u16) {
        host.orientation.set(Some(Reading { kind, angle }));
        host.dispatch(&Target::ScreenOrientation, "change", HostEvent::Signal);
    }

    #[test]
    fn test_rotation_updates_type_and_angle() {
        let host = FakeHost::new();
        host.orientation.set(Some(Reading {
            kind: OrientationType::PortraitPrimary,
            angle: 0,
        }));
        let lifecycle = Lifecycle::manual();
        let screen = ScreenOrientationTracker::new(host.clone()).track(&lifecycle);
        assert!(screen.is_portrait.get());

        lifecycle.setup.fire(());
        rotate(&host, OrientationType::LandscapePrimary, 90);

        assert_eq!(screen.orientation_type.get(), Some(OrientationType::LandscapePrimary));
        assert_eq!(screen.angle.get(), Some(90));
        assert!(screen.is_landscape.get());
        assert!(!screen.is_portrait.get());
    }

    #[test]
    fn test_trigger_fires_on_type_change_only() {
        let host = FakeHost::new();
        let parts = ScreenOrientationTracker::new(host.clone()).trigger();
        let fired = Store::new(0);
        fired.on(&parts.fired, |n, _| n + 1);

        parts.setup.fire(());
        rotate(&host, OrientationType::LandscapePrimary, 90);
        rotate(&host, OrientationType::LandscapePrimary, 90);
        rotate(&host, OrientationType::PortraitPrimary, 0);

        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_missing_api_is_neither() {
        let screen = track_screen_orientation(&Lifecycle::manual());
        assert_eq!(screen.orientation_type.get(), None);
        assert_eq!(screen.angle.get(), None);
        assert!(!screen.is_portrait.get());
        assert!(!screen.is_landscape.get());
    }
}
