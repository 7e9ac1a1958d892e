use std::rc::Rc;

use tether_core::{Lifecycle, ReadStore, Store, Trigger, TriggerParts, TriggerProtocol, read_value};

use crate::host::{Host, Target, browser_host, listen};

/// The window's `focus`/`blur` events.
#[derive(Clone)]
pub struct WindowFocusTracker {
    host: Rc<dyn Host>,
}

#[derive(Clone)]
pub struct WindowFocus {
    pub focused: Trigger,
    pub blurred: Trigger,
    pub is_focused: ReadStore<bool>,
}

impl WindowFocusTracker {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn track(&self, lifecycle: &Lifecycle) -> WindowFocus {
        let focused = listen(&self.host, Target::Window, "focus", lifecycle).unit();
        let blurred = listen(&self.host, Target::Window, "blur", lifecycle).unit();

        let host = self.host.clone();
        let is_focused = Store::new(read_value(|| host.has_focus(), false));
        is_focused.on(&focused, |_, _| true).on(&blurred, |_, _| false);

        WindowFocus {
            focused,
            blurred,
            is_focused: is_focused.read_only(),
        }
    }
}

impl Default for WindowFocusTracker {
    fn default() -> Self {
        Self::new(browser_host())
    }
}

impl TriggerProtocol for WindowFocusTracker {
    fn trigger(&self) -> TriggerParts {
        let lifecycle = Lifecycle::manual();
        let focus = self.track(&lifecycle);
        TriggerParts {
            setup: lifecycle.setup,
            teardown: lifecycle.teardown,
            fired: focus.focused,
        }
    }
}

pub fn track_window_focus(lifecycle: &Lifecycle) -> WindowFocus {
    WindowFocusTracker::default().track(lifecycle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostEvent;
    use crate::host::fake::FakeHost;

    #[test]
    fn test_focus_and_blur() {
        let host = FakeHost::new();
        host.focus.set(Some(true));
        let lifecycle = Lifecycle::manual();
        let focus = WindowFocusTracker::new(host.clone()).track(&lifecycle);
        assert!(focus.is_focused.get());

        lifecycle.setup.fire(());
        host.dispatch(&Target::Window, "blur", HostEvent::Signal);
        assert!(!focus.is_focused.get());

        host.dispatch(&Target::Window, "focus", HostEvent::Signal);
        assert!(focus.is_focused.get());
    }

    #[test]
    fn test_unfocused_without_document() {
        let focus = track_window_focus(&Lifecycle::new(&Trigger::new()));
        assert!(!focus.is_focused.get());
    }
}
