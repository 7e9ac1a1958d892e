//! # Factories
//!
//! A factory is a creator of units (stores, events, whole adapters) that may
//! only run through [`invoke`]. The creator receives an [`Invocation`] token
//! that cannot be built outside this crate, so calling the creator directly
//! does not compile, and neither does invoking something that is not a
//! [`Factory`].
//!
//! ```rust
//! use tether_factories::{create_factory, invoke};
//!
//! let counter = create_factory(|_cx, start: i32| std::cell::Cell::new(start));
//! let count = invoke(&counter, 5);
//! assert_eq!(count.get(), 5);
//! ```
//!
//! Factories built from other factories call `cx.invoke`, which tracks how
//! deep the chain is:
//!
//! ```rust
//! use tether_factories::{create_factory, invoke};
//!
//! let inner = create_factory(|cx, (): ()| cx.depth());
//! let outer = create_factory(move |cx, (): ()| (cx.depth(), cx.invoke(&inner, ())));
//! assert_eq!(invoke(&outer, ()), (1, 2));
//! ```

use std::fmt;
use std::rc::Rc;


/// Proof that a creator runs inside [`invoke`].
#[derive(Debug)]
pub struct Invocation {
    depth: usize,
}

impl Invocation {
    /// 1 for a top-level [`invoke`], one more for each nested [`Invocation::invoke`].
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Runs another factory as part of this one.
    pub fn invoke<P, R>(&self, factory: &Factory<P, R>, params: P) -> R {
        factory.run(self.depth + 1, params)
    }
}

type Creator<P, R> = Rc<dyn Fn(&Invocation, P) -> R>;

pub struct Factory<P, R> {
    creator: Creator<P, R>,
    name: Option<&'static str>,
}

impl<P, R> Factory<P, R> {
    /// Names the factory in log output.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    fn run(&self, depth: usize, params: P) -> R {
        log::trace!(
            "invoking factory {} at depth {depth}",
            self.name.unwrap_or("<anonymous>")
        );
        (self.creator)(&Invocation { depth }, params)
    }
}

impl<P, R> Clone for Factory<P, R> {
    fn clone(&self) -> Self {
        Self {
            creator: self.creator.clone(),
            name: self.name,
        }
    }
}

impl<P, R> fmt::Debug for Factory<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory").field("name", &self.name).finish()
    }
}

/// Wraps `creator` so it can only run through [`invoke`].
///
/// Creators take a single `params` value; use a tuple or a struct for more.
pub fn create_factory<P, R>(creator: impl Fn(&Invocation, P) -> R + 'static) -> Factory<P, R> {
    Factory {
        creator: Rc::new(creator),
        name: None,
    }
}

/// Runs `factory` with `params` at the top level.
pub fn invoke<P, R>(factory: &Factory<P, R>, params: P) -> R {
    factory.run(1, params)
}
