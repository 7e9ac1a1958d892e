use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use slotmap::SlotMap;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::*;
use crate::geolocation::BrowserGeolocation;

struct Attached {
    target: web_sys::EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

struct FrameLoop {
    handle: Cell<i32>,
    closure: RefCell<Option<Closure<dyn FnMut()>>>,
}

enum Registration {
    Event(Attached),
    Frame(Rc<FrameLoop>),
}

/// `window`/`document`/`navigator` through `web-sys`.
#[derive(Default)]
pub struct BrowserHost {
    registrations: RefCell<SlotMap<ListenerId, Registration>>,
}

fn js_err(err: JsValue) -> HostError {
    HostError::Js(format!("{err:?}"))
}

fn window() -> Result<web_sys::Window, HostError> {
    web_sys::window().ok_or(HostError::Unavailable("window"))
}

fn document() -> Result<web_sys::Document, HostError> {
    window()?
        .document()
        .ok_or(HostError::Unavailable("document"))
}

fn media_query_list(query: &str) -> Result<web_sys::MediaQueryList, HostError> {
    window()?
        .match_media(query)
        .map_err(js_err)?
        .ok_or(HostError::Unavailable("matchMedia"))
}

fn number(target: &JsValue, name: &str) -> Result<f64, HostError> {
    Reflect::get(target, &JsValue::from_str(name))
        .map_err(js_err)?
        .as_f64()
        .ok_or(HostError::Unavailable("window metrics"))
}

fn key_press(ev: &web_sys::KeyboardEvent) -> KeyPress {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::CTRL, ev.ctrl_key());
    modifiers.set(Modifiers::ALT, ev.alt_key());
    modifiers.set(Modifiers::SHIFT, ev.shift_key());
    modifiers.set(Modifiers::META, ev.meta_key());
    KeyPress {
        key: ev.key(),
        modifiers,
        repeat: ev.repeat(),
    }
}

impl Host for BrowserHost {
    fn is_online(&self) -> Result<bool, HostError> {
        Ok(window()?.navigator().on_line())
    }

    fn visibility_state(&self) -> Result<VisibilityState, HostError> {
        Ok(match document()?.visibility_state() {
            web_sys::VisibilityState::Hidden => VisibilityState::Hidden,
            _ => VisibilityState::Visible,
        })
    }

    fn has_focus(&self) -> Result<bool, HostError> {
        document()?.has_focus().map_err(js_err)
    }

    fn matches_media(&self, query: &str) -> Result<bool, HostError> {
        Ok(media_query_list(query)?.matches())
    }

    fn orientation(&self) -> Result<ScreenOrientation, HostError> {
        let orientation = window()?.screen().map_err(js_err)?.orientation();
        let kind = match orientation.type_().map_err(js_err)? {
            web_sys::OrientationType::PortraitPrimary => OrientationType::PortraitPrimary,
            web_sys::OrientationType::PortraitSecondary => OrientationType::PortraitSecondary,
            web_sys::OrientationType::LandscapePrimary => OrientationType::LandscapePrimary,
            web_sys::OrientationType::LandscapeSecondary => OrientationType::LandscapeSecondary,
            _ => return Err(HostError::Unavailable("screen.orientation")),
        };
        Ok(ScreenOrientation {
            kind,
            angle: orientation.angle().map_err(js_err)?,
        })
    }

    fn languages(&self) -> Result<Vec<String>, HostError> {
        Ok(window()?
            .navigator()
            .languages()
            .iter()
            .filter_map(|lang| lang.as_string())
            .collect())
    }

    fn window_metrics(&self) -> Result<WindowMetrics, HostError> {
        let w: JsValue = window()?.into();
        Ok(WindowMetrics {
            scroll_x: number(&w, "scrollX")?,
            scroll_y: number(&w, "scrollY")?,
            inner_width: number(&w, "innerWidth")?,
            inner_height: number(&w, "innerHeight")?,
            outer_width: number(&w, "outerWidth")?,
            outer_height: number(&w, "outerHeight")?,
            screen_top: number(&w, "screenTop")?,
            screen_left: number(&w, "screenLeft")?,
        })
    }

    fn listen(
        &self,
        target: &Target,
        event: &'static str,
        callback: HostCallback,
    ) -> Result<ListenerId, HostError> {
        let target: web_sys::EventTarget = match target {
            Target::Window => window()?.into(),
            Target::Document => document()?.into(),
            Target::ScreenOrientation => window()?.screen().map_err(js_err)?.orientation().into(),
            Target::MediaQuery(query) => media_query_list(query)?.into(),
        };

        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |ev: web_sys::Event| {
            let payload = match ev.dyn_ref::<web_sys::KeyboardEvent>() {
                Some(key) => HostEvent::Key(key_press(key)),
                None => HostEvent::Signal,
            };
            callback(&payload);
        });
        target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(js_err)?;

        Ok(self
            .registrations
            .borrow_mut()
            .insert(Registration::Event(Attached {
                target,
                event,
                closure,
            })))
    }

    fn on_frame(&self, callback: Rc<dyn Fn()>) -> Result<ListenerId, HostError> {
        let win = window()?;
        let frame = Rc::new(FrameLoop {
            handle: Cell::new(0),
            closure: RefCell::new(None),
        });

        let weak = Rc::downgrade(&frame);
        let win_clone = win.clone();
        *frame.closure.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
            let Some(frame) = weak.upgrade() else {
                return;
            };
            callback();
            if let Some(closure) = frame.closure.borrow().as_ref()
                && let Ok(handle) = win_clone.request_animation_frame(closure.as_ref().unchecked_ref())
            {
                frame.handle.set(handle);
            }
        }));

        let first = match frame.closure.borrow().as_ref() {
            Some(closure) => win
                .request_animation_frame(closure.as_ref().unchecked_ref())
                .map_err(js_err)?,
            None => return Err(HostError::Unavailable("requestAnimationFrame")),
        };
        frame.handle.set(first);

        Ok(self
            .registrations
            .borrow_mut()
            .insert(Registration::Frame(frame)))
    }

    fn unlisten(&self, id: ListenerId) {
        let Some(registration) = self.registrations.borrow_mut().remove(id) else {
            return;
        };
        match registration {
            Registration::Event(attached) => {
                let _ = attached.target.remove_event_listener_with_callback(
                    attached.event,
                    attached.closure.as_ref().unchecked_ref(),
                );
            }
            Registration::Frame(frame) => {
                if let Ok(win) = window() {
                    let _ = win.cancel_animation_frame(frame.handle.get());
                }
                frame.closure.borrow_mut().take();
            }
        }
    }

    fn geolocation(&self) -> Option<Rc<dyn NativeGeolocation>> {
        let geolocation = window().ok()?.navigator().geolocation().ok()?;
        Some(Rc::new(BrowserGeolocation::new(geolocation)))
    }
}
