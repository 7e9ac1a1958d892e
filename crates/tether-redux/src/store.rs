use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{DefaultKey, SlotMap};
use tether_core::Dispose;

/// Failure raised by an external store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A thunk receives `dispatch` and `get_state`, like a redux-thunk does.
pub type Thunk<S, A> = Rc<dyn Fn(&dyn Fn(A), &dyn Fn() -> S)>;

/// What can be handed to [`ReduxStore::dispatch`].
pub enum Dispatch<S, A> {
    Action(A),
    /// Passed through to the store untouched.
    Thunk(Thunk<S, A>),
}

impl<S, A> Dispatch<S, A> {
    pub fn thunk(f: impl Fn(&dyn Fn(A), &dyn Fn() -> S) + 'static) -> Self {
        Self::Thunk(Rc::new(f))
    }
}

impl<S, A> From<A> for Dispatch<S, A> {
    fn from(action: A) -> Self {
        Self::Action(action)
    }
}

impl<S, A: Clone> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        match self {
            Self::Action(action) => Self::Action(action.clone()),
            Self::Thunk(thunk) => Self::Thunk(thunk.clone()),
        }
    }
}

impl<S, A: fmt::Debug> fmt::Debug for Dispatch<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

/// The `getState`/`dispatch`/`subscribe` shape of a Redux store.
pub trait ReduxStore {
    type State: Clone + PartialEq + 'static;
    type Action: 'static;

    fn get_state(&self) -> Result<Self::State, StoreError>;
    fn dispatch(&self, action: Dispatch<Self::State, Self::Action>) -> Result<(), StoreError>;
    /// `listener` runs after every state change until the handle is run.
    fn subscribe(&self, listener: Rc<dyn Fn()>) -> Result<Dispose, StoreError>;
}

/// A shared reference to some [`ReduxStore`]. Equal when it is the same store.
pub struct StoreHandle<S, A>(Rc<dyn ReduxStore<State = S, Action = A>>);

impl<S: Clone + PartialEq + 'static, A: 'static> StoreHandle<S, A> {
    pub fn new(store: impl ReduxStore<State = S, Action = A> + 'static) -> Self {
        Self(Rc::new(store))
    }

    pub fn get_state(&self) -> Result<S, StoreError> {
        self.0.get_state()
    }

    pub fn dispatch(&self, action: Dispatch<S, A>) -> Result<(), StoreError> {
        self.0.dispatch(action)
    }

    pub fn subscribe(&self, listener: Rc<dyn Fn()>) -> Result<Dispose, StoreError> {
        self.0.subscribe(listener)
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn ReduxStore<State = S, Action = A>> {
        Rc::downgrade(&self.0)
    }
}

impl<S, A> Clone for StoreHandle<S, A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S, A> PartialEq for StoreHandle<S, A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<S, A> fmt::Debug for StoreHandle<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreHandle({:p})", Rc::as_ptr(&self.0))
    }
}

impl<T, S, A> From<Rc<T>> for StoreHandle<S, A>
where
    T: ReduxStore<State = S, Action = A> + 'static,
{
    fn from(store: Rc<T>) -> Self {
        Self(store)
    }
}

impl<S: Clone + PartialEq + 'static, A: 'static> From<LocalStore<S, A>> for StoreHandle<S, A> {
    fn from(store: LocalStore<S, A>) -> Self {
        Self::new(store)
    }
}

type Reducer<S, A> = Box<dyn Fn(&S, &A) -> S>;

struct LocalInner<S, A> {
    state: RefCell<S>,
    reducer: Reducer<S, A>,
    listeners: RefCell<SlotMap<DefaultKey, Rc<dyn Fn()>>>,
}

/// An in-process reducer store with thunk support.
///
/// Dispatching from inside a listener is allowed: the state is committed
/// before listeners run, and each listener sees the latest state.
pub struct LocalStore<S, A>(Rc<LocalInner<S, A>>);

impl<S, A> Clone for LocalStore<S, A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S: Clone + PartialEq + 'static, A: 'static> LocalStore<S, A> {
    pub fn new(initial: S, reducer: impl Fn(&S, &A) -> S + 'static) -> Self {
        Self(Rc::new(LocalInner {
            state: RefCell::new(initial),
            reducer: Box::new(reducer),
            listeners: RefCell::new(SlotMap::new()),
        }))
    }

    pub fn state(&self) -> S {
        self.0.state.borrow().clone()
    }

    fn reduce(&self, action: &A) {
        let next = (self.0.reducer)(&self.0.state.borrow(), action);
        *self.0.state.borrow_mut() = next;

        let listeners: Vec<Rc<dyn Fn()>> = self.0.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.0.listeners.borrow().len()
    }
}

impl<S: Clone + PartialEq + 'static, A: 'static> ReduxStore for LocalStore<S, A> {
    type State = S;
    type Action = A;

    fn get_state(&self) -> Result<S, StoreError> {
        Ok(self.state())
    }

    fn dispatch(&self, action: Dispatch<S, A>) -> Result<(), StoreError> {
        match action {
            Dispatch::Action(action) => self.reduce(&action),
            Dispatch::Thunk(thunk) => {
                let dispatch = |action: A| self.reduce(&action);
                let get_state = || self.state();
                thunk(&dispatch, &get_state);
            }
        }
        Ok(())
    }

    fn subscribe(&self, listener: Rc<dyn Fn()>) -> Result<Dispose, StoreError> {
        let key = self.0.listeners.borrow_mut().insert(listener);
        let weak = Rc::downgrade(&self.0);
        Ok(Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().remove(key);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_local_store_reduces_and_notifies() {
        let store = LocalStore::new(0, |count: &i32, by: &i32| count + by);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let unsubscribe = store
            .subscribe(Rc::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        store.dispatch(Dispatch::Action(2)).unwrap();
        store.dispatch(Dispatch::Action(3)).unwrap();
        assert_eq!(store.state(), 5);
        assert_eq!(calls.get(), 2);

        unsubscribe.run();
        store.dispatch(Dispatch::Action(1)).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_thunk_sees_dispatch_and_state() {
        let store = LocalStore::new(1, |count: &i32, by: &i32| count + by);

        store
            .dispatch(Dispatch::thunk(|dispatch, get_state| {
                let doubled = get_state();
                dispatch(doubled);
            }))
            .unwrap();

        assert_eq!(store.state(), 2);
    }

    #[test]
    fn test_handles_compare_by_identity() {
        let a: StoreHandle<i32, i32> = LocalStore::new(0, |s: &i32, _: &i32| *s).into();
        let b: StoreHandle<i32, i32> = LocalStore::new(0, |s: &i32, _: &i32| *s).into();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
