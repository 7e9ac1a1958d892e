//! A scriptable [`Host`] for tests, enabled by the `testing` feature.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use slotmap::SlotMap;

use super::*;

enum Registration {
    Event {
        target: Target,
        event: &'static str,
        callback: HostCallback,
    },
    Frame(Rc<dyn Fn()>),
}

/// Scriptable host for adapter tests.
#[derive(Default)]
pub struct FakeHost {
    pub online: Cell<Option<bool>>,
    pub visibility: Cell<Option<VisibilityState>>,
    pub focus: Cell<Option<bool>>,
    pub media: RefCell<Vec<(String, bool)>>,
    pub orientation: Cell<Option<ScreenOrientation>>,
    pub languages: RefCell<Option<Vec<String>>>,
    pub metrics: Cell<Option<WindowMetrics>>,
    pub geolocation: RefCell<Option<Rc<dyn NativeGeolocation>>>,
    registrations: RefCell<SlotMap<ListenerId, Registration>>,
    pub unlistened: Cell<usize>,
}

fn absent<T>(value: Option<T>, what: &'static str) -> Result<T, HostError> {
    value.ok_or(HostError::Unavailable(what))
}

impl FakeHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn dispatch(&self, target: &Target, event: &str, payload: HostEvent) {
        let callbacks: Vec<HostCallback> = self
            .registrations
            .borrow()
            .values()
            .filter_map(|r| match r {
                Registration::Event {
                    target: t,
                    event: e,
                    callback,
                } if t == target && *e == event => Some(callback.clone()),
                _ => None,
            })
            .collect();
        for cb in callbacks {
            cb(&payload);
        }
    }

    pub fn frame(&self) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .registrations
            .borrow()
            .values()
            .filter_map(|r| match r {
                Registration::Frame(cb) => Some(cb.clone()),
                _ => None,
            })
            .collect();
        for cb in callbacks {
            cb();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.borrow().len()
    }
}

impl Host for FakeHost {
    fn is_online(&self) -> Result<bool, HostError> {
        absent(self.online.get(), "navigator")
    }

    fn visibility_state(&self) -> Result<VisibilityState, HostError> {
        absent(self.visibility.get(), "document")
    }

    fn has_focus(&self) -> Result<bool, HostError> {
        absent(self.focus.get(), "document")
    }

    fn matches_media(&self, query: &str) -> Result<bool, HostError> {
        let media = self.media.borrow();
        let found = media.iter().find(|(q, _)| q == query).map(|(_, m)| *m);
        absent(found, "matchMedia")
    }

    fn orientation(&self) -> Result<ScreenOrientation, HostError> {
        absent(self.orientation.get(), "screen.orientation")
    }

    fn languages(&self) -> Result<Vec<String>, HostError> {
        absent(self.languages.borrow().clone(), "navigator")
    }

    fn window_metrics(&self) -> Result<WindowMetrics, HostError> {
        absent(self.metrics.get(), "window")
    }

    fn listen(
        &self,
        target: &Target,
        event: &'static str,
        callback: HostCallback,
    ) -> Result<ListenerId, HostError> {
        Ok(self.registrations.borrow_mut().insert(Registration::Event {
            target: target.clone(),
            event,
            callback,
        }))
    }

    fn on_frame(&self, callback: Rc<dyn Fn()>) -> Result<ListenerId, HostError> {
        Ok(self
            .registrations
            .borrow_mut()
            .insert(Registration::Frame(callback)))
    }

    fn unlisten(&self, id: ListenerId) {
        if self.registrations.borrow_mut().remove(id).is_some() {
            self.unlistened.set(self.unlistened.get() + 1);
        }
    }

    fn geolocation(&self) -> Option<Rc<dyn NativeGeolocation>> {
        self.geolocation.borrow().clone()
    }
}
