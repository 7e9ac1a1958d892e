use std::rc::Rc;

use tether_core::{Lifecycle, ReadStore, Store, Trigger, TriggerParts, TriggerProtocol, read_value};

use crate::host::{Host, Target, WindowMetrics, browser_host, listen, poll_frames};

/// Scroll offsets, window sizes, and the window's position on screen.
#[derive(Clone)]
pub struct WindowDimensionsTracker {
    host: Rc<dyn Host>,
}

#[derive(Clone)]
pub struct WindowDimensions {
    pub scroll_x: ReadStore<f64>,
    pub scroll_y: ReadStore<f64>,
    pub inner_width: ReadStore<f64>,
    pub inner_height: ReadStore<f64>,
    pub outer_width: ReadStore<f64>,
    pub outer_height: ReadStore<f64>,
    pub screen_top: ReadStore<f64>,
    pub screen_left: ReadStore<f64>,
    pub scrolled: Trigger,
    pub resized: Trigger,
}

fn follow(
    initial: &WindowMetrics,
    source: &tether_core::Event<WindowMetrics>,
    field: fn(&WindowMetrics) -> f64,
) -> ReadStore<f64> {
    let store = Store::new(field(initial));
    store.on(source, move |_, metrics| field(metrics));
    store.read_only()
}

impl WindowDimensionsTracker {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn track(&self, lifecycle: &Lifecycle) -> WindowDimensions {
        let read = {
            let host = self.host.clone();
            move || read_value(|| host.window_metrics(), WindowMetrics::default())
        };
        let initial = read();

        let scrolled = listen(&self.host, Target::Document, "scroll", lifecycle).unit();
        let resized = listen(&self.host, Target::Window, "resize", lifecycle).unit();
        let on_scroll = scrolled.map({
            let read = read.clone();
            move |_| read()
        });
        let on_resize = resized.map({
            let read = read.clone();
            move |_| read()
        });
        // No event reports a moved window, so poll once per frame. Stores skip
        // equal values, so only real moves propagate.
        let on_frame = poll_frames(&self.host, lifecycle).map(move |_| read());

        WindowDimensions {
            scroll_x: follow(&initial, &on_scroll, |m| m.scroll_x),
            scroll_y: follow(&initial, &on_scroll, |m| m.scroll_y),
            inner_width: follow(&initial, &on_resize, |m| m.inner_width),
            inner_height: follow(&initial, &on_resize, |m| m.inner_height),
            outer_width: follow(&initial, &on_resize, |m| m.outer_width),
            outer_height: follow(&initial, &on_resize, |m| m.outer_height),
            screen_top: follow(&initial, &on_frame, |m| m.screen_top),
            screen_left: follow(&initial, &on_frame, |m| m.screen_left),
            scrolled,
            resized,
        }
    }
}

impl Default for WindowDimensionsTracker {
    fn default() -> Self {
        Self::new(browser_host())
    }
}

impl TriggerProtocol for WindowDimensionsTracker {
    fn trigger(&self) -> TriggerParts {
        let lifecycle = Lifecycle::manual();
        let dimensions = self.track(&lifecycle);
        TriggerParts {
            setup: lifecycle.setup,
            teardown: lifecycle.teardown,
            fired: dimensions.resized,
        }
    }
}

pub fn track_window_dimensions(lifecycle: &Lifecycle) -> WindowDimensions {
    WindowDimensionsTracker::default().track(lifecycle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostEvent;
    use crate::host::fake::FakeHost;

    fn metrics() -> WindowMetrics {
        WindowMetrics {
            inner_width: 1280.0,
            inner_height: 720.0,
            outer_width: 1280.0,
            outer_height: 800.0,
            ..WindowMetrics::default()
        }
    }

    #[test]
    fn test_scroll_and_resize() {
        let host = FakeHost::new();
        host.metrics.set(Some(metrics()));
        let lifecycle = Lifecycle::manual();
        let window = WindowDimensionsTracker::new(host.clone()).track(&lifecycle);
        assert_eq!(window.inner_width.get(), 1280.0);

        lifecycle.setup.fire(());
        host.metrics.set(Some(WindowMetrics {
            scroll_y: 300.0,
            inner_width: 640.0,
            ..metrics()
        }));

        host.dispatch(&Target::Document, "scroll", HostEvent::Signal);
        assert_eq!(window.scroll_y.get(), 300.0);
        assert_eq!(window.inner_width.get(), 1280.0);

        host.dispatch(&Target::Window, "resize", HostEvent::Signal);
        assert_eq!(window.inner_width.get(), 640.0);
    }

    #[test]
    fn test_screen_position_updates_only_on_change() {
        let host = FakeHost::new();
        host.metrics.set(Some(metrics()));
        let lifecycle = Lifecycle::manual();
        let window = WindowDimensionsTracker::new(host.clone()).track(&lifecycle);

        let moves = Store::new(0);
        moves.on(&window.screen_left.updates(), |n, _| n + 1);

        lifecycle.setup.fire(());
        host.frame();
        host.frame();
        assert_eq!(moves.get(), 0);

        host.metrics.set(Some(WindowMetrics {
            screen_left: 50.0,
            ..metrics()
        }));
        host.frame();
        host.frame();
        assert_eq!(window.screen_left.get(), 50.0);
        assert_eq!(moves.get(), 1);

        if let Some(teardown) = &lifecycle.teardown {
            teardown.fire(());
        }
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_zero_without_window() {
        let window = track_window_dimensions(&Lifecycle::manual());
        assert_eq!(window.scroll_x.get(), 0.0);
        assert_eq!(window.outer_height.get(), 0.0);
    }
}
