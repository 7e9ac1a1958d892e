use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use crate::{Event, Lifecycle};

/// Native callback handed to an `add` function.
pub type Listener<A> = Rc<dyn Fn(A)>;

/// Attaches a native callback on `setup` and detaches it on `teardown`.
///
/// `add` receives a freshly bound listener and returns the handle `remove`
/// later needs, or `None` when the underlying API is not available (nothing
/// is recorded then, so a following teardown does nothing). While a handle is
/// recorded further `setup`s are ignored.
pub fn setup_listener<A, H>(
    add: impl Fn(Listener<A>) -> Option<H> + 'static,
    remove: impl Fn(H) + 'static,
    lifecycle: &Lifecycle,
) -> Event<A>
where
    A: 'static,
    H: 'static,
{
    let fired = Event::new();
    let handle: Rc<RefCell<Option<H>>> = Rc::new(RefCell::new(None));

    {
        let fired = fired.clone();
        let handle = handle.clone();
        let _ = lifecycle.setup.watch(move |_| {
            if handle.borrow().is_some() {
                log::debug!("setup_listener: already attached, ignoring setup");
                return;
            }
            let fired = fired.clone();
            let listener: Listener<A> = Rc::new(move |payload| fired.fire(payload));
            let attached = add(listener);
            if attached.is_none() {
                log::debug!("setup_listener: source unavailable, nothing attached");
            }
            *handle.borrow_mut() = attached;
        });
    }

    if let Some(teardown) = &lifecycle.teardown {
        let _ = teardown.watch(move |_| {
            let attached = handle.borrow_mut().take();
            if let Some(h) = attached {
                remove(h);
            }
        });
    }

    fired
}

/// [`setup_listener`], but the emitted value is read with `read_payload` each
/// time the native callback fires instead of taken from its argument.
pub fn setup_listener_with_payload<A, H, P>(
    add: impl Fn(Listener<A>) -> Option<H> + 'static,
    remove: impl Fn(H) + 'static,
    read_payload: impl Fn() -> P + 'static,
    lifecycle: &Lifecycle,
) -> Event<P>
where
    A: 'static,
    H: 'static,
    P: 'static,
{
    setup_listener(add, remove, lifecycle).map(move |_| read_payload())
}

/// Reads a value that may not be available in the current environment.
pub fn read_value<T, E: Display>(getter: impl FnOnce() -> Result<T, E>, default: T) -> T {
    match getter() {
        Ok(v) => v,
        Err(err) => {
            log::debug!("read_value: using default ({err})");
            default
        }
    }
}
