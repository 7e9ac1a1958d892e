//! # Events, Stores, and Lifecycles
//!
//! Tether exposes browser capabilities and external libraries as reactive
//! state. This crate is the small reactive core everything else sits on:
//!
//! - `Event<T>`: a fire-and-forget signal. `Trigger` is `Event<()>`.
//! - `Store<T>` / `ReadStore<T>`: an observable value cell and its read-only view.
//! - `Dispose` / `Scope`: unsubscribe handles and bags of them.
//! - `Lifecycle`: the `setup`/`teardown` pair that gates every side effect.
//!
//! ## Events and stores
//!
//! ```rust
//! use tether_core::*;
//!
//! let increment = Event::<i32>::new();
//! let count = Store::new(0);
//! count.on(&increment, |count, by| count + by);
//!
//! increment.fire(2);
//! assert_eq!(count.get(), 2);
//!
//! let doubled = count.map(|c| c * 2);
//! increment.fire(1);
//! assert_eq!(doubled.get(), 6);
//! ```
//!
//! Stores drop writes equal to their current value, so watchers only see real
//! changes. Everything is synchronous and single-threaded.
//!
//! ## Lifecycles and listeners
//!
//! Adapters never start on their own. `setup_listener` is the shared plumbing:
//! it attaches a native callback when `setup` fires and detaches it on
//! `teardown`:
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tether_core::*;
//!
//! let lifecycle = Lifecycle::manual();
//! let attached = Rc::new(Cell::new(false));
//!
//! let changed: Event<u32> = setup_listener(
//!     {
//!         let attached = attached.clone();
//!         move |_listener| {
//!             attached.set(true);
//!             Some(1u8)
//!         }
//!     },
//!     {
//!         let attached = attached.clone();
//!         move |_handle| attached.set(false)
//!     },
//!     &lifecycle,
//! );
//!
//! lifecycle.setup.fire(());
//! assert!(attached.get());
//! if let Some(teardown) = &lifecycle.teardown {
//!     teardown.fire(());
//! }
//! assert!(!attached.get());
//! # drop(changed);
//! ```

pub mod effects;
pub mod event;
pub mod lifecycle;
pub mod listener;
pub mod prelude;
pub mod scope;
pub mod store;

pub use effects::*;
pub use event::*;
pub use lifecycle::*;
pub use listener::*;
pub use scope::*;
pub use store::*;
