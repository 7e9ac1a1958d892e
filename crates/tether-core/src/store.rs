use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::{Dispose, Event};

/// Observable value cell.
///
/// Writes equal to the current value are dropped, which is what lets two
/// stores mirror each other without looping forever.
pub struct Store<T>(Rc<StoreInner<T>>);

struct StoreInner<T> {
    value: RefCell<T>,
    initial: T,
    version: Cell<u64>,
    updates: Event<T>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Store").field(&*self.0.value.borrow()).finish()
    }
}

impl<T: Clone + PartialEq + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(StoreInner {
            initial: value.clone(),
            value: RefCell::new(value),
            version: Cell::new(0),
            updates: Event::new(),
        }))
    }

    pub fn get(&self) -> T {
        self.0.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.value.borrow())
    }

    pub fn set(&self, v: T) {
        {
            let mut cur = self.0.value.borrow_mut();
            if *cur == v {
                return;
            }
            *cur = v.clone();
        }
        let version = self.0.version.get().wrapping_add(1);
        self.0.version.set(version);

        // A watcher may write again while we are notifying. The newer write
        // notifies everyone itself, so stale deliveries stop here.
        let inner = self.0.clone();
        self.0
            .updates
            .fire_while(v, move || inner.version.get() == version);
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Restores the value the store was created with.
    pub fn reset(&self) {
        self.set(self.0.initial.clone());
    }

    /// Reduces every occurrence of `event` into this store.
    pub fn on<E: 'static>(&self, event: &Event<E>, reducer: impl Fn(&T, &E) -> T + 'static) -> &Self {
        let store = self.clone();
        let _ = event.watch(move |payload| {
            let next = store.with(|cur| reducer(cur, payload));
            store.set(next);
        });
        self
    }

    /// Fires with the new value after every effective write.
    pub fn updates(&self) -> Event<T> {
        self.0.updates.clone()
    }

    /// Calls `f` with the current value now and with every later update.
    pub fn watch(&self, f: impl Fn(&T) + 'static) -> Dispose {
        self.with(&f);
        self.0.updates.watch(f)
    }

    pub fn map<U: Clone + PartialEq + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> ReadStore<U> {
        let out = Store::new(self.with(&f));
        let target = out.clone();
        let _ = self.0.updates.watch(move |v| target.set(f(v)));
        out.read_only()
    }

    pub fn read_only(&self) -> ReadStore<T> {
        ReadStore(self.clone())
    }
}

/// Read-only view of a [`Store`]. Adapters hand these out for state they own.
pub struct ReadStore<T>(Store<T>);

impl<T> Clone for ReadStore<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadStore")
            .field(&*self.0.0.value.borrow())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadStore<T> {
    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }

    pub fn updates(&self) -> Event<T> {
        self.0.updates()
    }

    pub fn watch(&self, f: impl Fn(&T) + 'static) -> Dispose {
        self.0.watch(f)
    }

    pub fn map<U: Clone + PartialEq + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> ReadStore<U> {
        self.0.map(f)
    }
}

impl<T: Clone + PartialEq + 'static> From<Store<T>> for ReadStore<T> {
    fn from(store: Store<T>) -> Self {
        store.read_only()
    }
}

/// Anything whose changes a derived value can depend on.
pub trait Dependency {
    fn on_change(&self, f: Rc<dyn Fn()>) -> Dispose;
}

impl<T: Clone + PartialEq + 'static> Dependency for Store<T> {
    fn on_change(&self, f: Rc<dyn Fn()>) -> Dispose {
        self.updates().watch(move |_| f())
    }
}

impl<T: Clone + PartialEq + 'static> Dependency for ReadStore<T> {
    fn on_change(&self, f: Rc<dyn Fn()>) -> Dispose {
        self.0.on_change(f)
    }
}

/// Derives a store from several others.
///
/// `compute` reads whatever it needs (usually clones of `deps`) and is re-run
/// after any dependency updates.
///
/// ```rust
/// use tether_core::*;
///
/// let first = Store::new("Jane".to_string());
/// let last = Store::new("Doe".to_string());
///
/// let full = combine(&[&first, &last], {
///     let (first, last) = (first.clone(), last.clone());
///     move || format!("{} {}", first.get(), last.get())
/// });
///
/// last.set("Roe".to_string());
/// assert_eq!(full.get(), "Jane Roe");
/// ```
pub fn combine<T: Clone + PartialEq + 'static>(
    deps: &[&dyn Dependency],
    compute: impl Fn() -> T + 'static,
) -> ReadStore<T> {
    let compute = Rc::new(compute);
    let out = Store::new(compute());
    for dep in deps {
        let out = out.clone();
        let compute = compute.clone();
        let _ = dep.on_change(Rc::new(move || out.set(compute())));
    }
    out.read_only()
}
