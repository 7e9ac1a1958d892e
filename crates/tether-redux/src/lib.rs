//! # Redux interop
//!
//! Lets code move off a Redux store gradually: the store keeps owning its
//! state while new code reads it through stores and writes to it through an
//! event.
//!
//! ```rust
//! use tether_core::Trigger;
//! use tether_redux::{Dispatch, LocalStore, ReduxInterop};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Todos(Vec<String>);
//!
//! #[derive(Clone)]
//! enum Action {
//!     Add(String),
//! }
//!
//! let redux = LocalStore::new(Todos(vec![]), |todos: &Todos, action: &Action| match action {
//!     Action::Add(todo) => {
//!         let mut next = todos.0.clone();
//!         next.push(todo.clone());
//!         Todos(next)
//!     }
//! });
//!
//! let setup = Trigger::new();
//! let interop = ReduxInterop::builder()
//!     .store(redux)
//!     .setup_on(&setup)
//!     .build()
//!     .unwrap();
//! let count = interop.from_state(|todos| todos.0.len());
//!
//! setup.fire(());
//! interop.dispatch.fire(Dispatch::Action(Action::Add("write docs".into())));
//! assert_eq!(count.get(), Some(1));
//! ```

pub mod interop;
pub mod store;

pub use interop::{InteropError, ReduxInterop, ReduxInteropBuilder, Reporting};
pub use store::{Dispatch, LocalStore, ReduxStore, StoreError, StoreHandle, Thunk};
