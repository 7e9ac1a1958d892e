use std::cell::RefCell;
use std::rc::Rc;

use crate::Dispose;

/// A bag of cleanups released together.
///
/// Adapters keep one per attachment (an i18n instance's listeners, a store
/// subscription) and dispose it on teardown or before attaching again.
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                disposers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn add(&self, dispose: Dispose) {
        self.add_disposer(move || dispose.run());
    }

    pub fn is_empty(&self) -> bool {
        self.inner.disposers.borrow().is_empty()
    }

    /// Releases everything registered so far. The scope stays usable.
    pub fn dispose(&self) {
        let disposers = std::mem::take(&mut *self.inner.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }
}
