use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{DefaultKey, SlotMap};
use smallvec::SmallVec;

use crate::Dispose;

type Watcher<T> = Rc<dyn Fn(&T)>;

/// A discrete, fire-and-forget signal carrying a payload.
///
/// Watchers run synchronously, in subscription order, on the thread that
/// fires. They may fire other events, subscribe, or unsubscribe while being
/// notified: the watcher list is snapshotted before delivery.
pub struct Event<T>(Rc<EventInner<T>>);

/// A payload-less event, used for `setup`/`teardown` and other lifecycle signals.
pub type Trigger = Event<()>;

struct EventInner<T> {
    watchers: RefCell<SlotMap<DefaultKey, Watcher<T>>>,
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: 'static> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("watchers", &self.0.watchers.borrow().len())
            .finish()
    }
}

impl<T: 'static> Event<T> {
    pub fn new() -> Self {
        Self(Rc::new(EventInner {
            watchers: RefCell::new(SlotMap::new()),
        }))
    }

    pub fn fire(&self, payload: T) {
        self.fire_while(payload, || true);
    }

    /// Delivers `payload` to each watcher for as long as `keep_going` holds.
    pub(crate) fn fire_while(&self, payload: T, keep_going: impl Fn() -> bool) {
        let watchers: SmallVec<[Watcher<T>; 4]> =
            self.0.watchers.borrow().values().cloned().collect();
        for w in watchers {
            if !keep_going() {
                break;
            }
            w(&payload);
        }
    }

    pub fn watch(&self, f: impl Fn(&T) + 'static) -> Dispose {
        let key = self.0.watchers.borrow_mut().insert(Rc::new(f));
        let weak: Weak<EventInner<T>> = Rc::downgrade(&self.0);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.watchers.borrow_mut().remove(key);
            }
        })
    }

    pub fn watcher_count(&self) -> usize {
        self.0.watchers.borrow().len()
    }

    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Event<U> {
        let out = Event::new();
        let target = out.clone();
        let _ = self.watch(move |v| target.fire(f(v)));
        out
    }

    pub fn filter(&self, pred: impl Fn(&T) -> bool + 'static) -> Event<T>
    where
        T: Clone,
    {
        self.filter_map(move |v| pred(v).then(|| v.clone()))
    }

    pub fn filter_map<U: 'static>(&self, f: impl Fn(&T) -> Option<U> + 'static) -> Event<U> {
        let out = Event::new();
        let target = out.clone();
        let _ = self.watch(move |v| {
            if let Some(u) = f(v) {
                target.fire(u);
            }
        });
        out
    }

    /// Drops the payload, keeping only the fact that something happened.
    pub fn unit(&self) -> Trigger {
        self.map(|_| ())
    }
}
