use std::cell::RefCell;
use std::rc::Rc;

use tether_core::{Dispose, Event, ReadStore, Store, Trigger};

use crate::store::{Dispatch, ReduxStore, StoreError, StoreHandle};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InteropError {
    #[error("setup must be a trigger")]
    MissingSetup,
    #[error("no Redux store: pass one to the builder or as the setup payload")]
    NoStore,
    #[error("Redux store failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct Reporting {
    pub failed: Event<InteropError>,
}

/// A Redux store exposed as stores and events.
///
/// `dispatch` is not batched: every action fired reaches the external store
/// on its own and in order. Failures of the external store never propagate
/// into the caller; they are logged and fired on `reporting.failed`.
pub struct ReduxInterop<S, A> {
    /// The store in use. Replace it (or pass one with `setup`) to run against
    /// a mock.
    pub store: Store<Option<StoreHandle<S, A>>>,
    /// The store's state as of its last notification. `None` until a store
    /// has been read.
    pub state: ReadStore<Option<S>>,
    pub dispatch: Event<Dispatch<S, A>>,
    pub reporting: Reporting,
    subscription: Rc<RefCell<Option<Dispose>>>,
}

impl<S, A> Clone for ReduxInterop<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            state: self.state.clone(),
            dispatch: self.dispatch.clone(),
            reporting: self.reporting.clone(),
            subscription: self.subscription.clone(),
        }
    }
}

pub struct ReduxInteropBuilder<S, A> {
    store: Option<StoreHandle<S, A>>,
    setup: Option<Event<Option<StoreHandle<S, A>>>>,
    teardown: Option<Trigger>,
}

impl<S, A> Default for ReduxInteropBuilder<S, A> {
    fn default() -> Self {
        Self {
            store: None,
            setup: None,
            teardown: None,
        }
    }
}

impl<S, A> ReduxInteropBuilder<S, A>
where
    S: Clone + PartialEq + 'static,
    A: Clone + 'static,
{
    /// The store known upfront. Without one the store must arrive with `setup`.
    pub fn store(mut self, store: impl Into<StoreHandle<S, A>>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Subscribes on every firing. A `Some` payload replaces the store first.
    pub fn setup(mut self, setup: &Event<Option<StoreHandle<S, A>>>) -> Self {
        self.setup = Some(setup.clone());
        self
    }

    /// [`ReduxInteropBuilder::setup`] for a plain trigger carrying no store.
    pub fn setup_on(self, setup: &Trigger) -> Self {
        let setup = setup.map(|_| None);
        self.setup(&setup)
    }

    pub fn teardown(mut self, teardown: &Trigger) -> Self {
        self.teardown = Some(teardown.clone());
        self
    }

    pub fn build(self) -> Result<ReduxInterop<S, A>, InteropError> {
        let setup = self.setup.ok_or(InteropError::MissingSetup)?;

        let failed = Event::<InteropError>::new();
        let report = {
            let failed = failed.clone();
            Rc::new(move |err: InteropError| {
                log::error!("redux interop: {err}");
                failed.fire(err);
            })
        };

        let initial_state = match &self.store {
            Some(handle) => match handle.get_state() {
                Ok(state) => Some(state),
                Err(err) => {
                    log::error!("redux interop: {err}");
                    None
                }
            },
            None => None,
        };

        let store = Store::new(self.store);
        let state = Store::new(initial_state);
        let dispatch = Event::<Dispatch<S, A>>::new();
        let subscription: Rc<RefCell<Option<Dispose>>> = Rc::new(RefCell::new(None));

        {
            let (store, report) = (store.clone(), report.clone());
            let _ = dispatch.watch(move |action: &Dispatch<S, A>| {
                let Some(handle) = store.get() else {
                    report(InteropError::NoStore);
                    return;
                };
                if let Err(err) = handle.dispatch(action.clone()) {
                    report(err.into());
                }
            });
        }

        {
            let (store, state, subscription, report) = (
                store.clone(),
                state.clone(),
                subscription.clone(),
                report.clone(),
            );
            let _ = setup.watch(move |payload: &Option<StoreHandle<S, A>>| {
                if let Some(handle) = payload {
                    store.set(Some(handle.clone()));
                }
                let previous = subscription.borrow_mut().take();
                if let Some(previous) = previous {
                    previous.run();
                }
                let Some(handle) = store.get() else {
                    report(InteropError::NoStore);
                    return;
                };

                match handle.get_state() {
                    Ok(current) => state.set(Some(current)),
                    Err(err) => report(err.into()),
                }

                // The store owns the listener, so only a weak reference back.
                let listener: Rc<dyn Fn()> = {
                    let weak = handle.downgrade();
                    let (state, report) = (state.clone(), report.clone());
                    Rc::new(move || {
                        let Some(external) = weak.upgrade() else {
                            return;
                        };
                        match external.get_state() {
                            Ok(next) => state.set(Some(next)),
                            Err(err) => report(err.into()),
                        }
                    })
                };
                match handle.subscribe(listener) {
                    Ok(unsubscribe) => *subscription.borrow_mut() = Some(unsubscribe),
                    Err(err) => report(err.into()),
                }
            });
        }

        if let Some(teardown) = &self.teardown {
            let subscription = subscription.clone();
            let _ = teardown.watch(move |_| {
                let current = subscription.borrow_mut().take();
                if let Some(unsubscribe) = current {
                    unsubscribe.run();
                }
            });
        }

        Ok(ReduxInterop {
            store,
            state: state.read_only(),
            dispatch,
            reporting: Reporting { failed },
            subscription,
        })
    }
}

impl<S, A> ReduxInterop<S, A>
where
    S: Clone + PartialEq + 'static,
    A: Clone + 'static,
{
    pub fn builder() -> ReduxInteropBuilder<S, A> {
        ReduxInteropBuilder::default()
    }

    /// A slice of the mirrored state.
    pub fn from_state<R: Clone + PartialEq + 'static>(
        &self,
        selector: impl Fn(&S) -> R + 'static,
    ) -> ReadStore<Option<R>> {
        self.state.map(move |state| state.as_ref().map(&selector))
    }

    /// Whether the external store is currently subscribed to.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.borrow().is_some()
    }
}
