use crate::{Event, Trigger};

/// The setup/teardown pair every adapter is driven by.
///
/// Adapters never fire these themselves: nothing attaches before `setup`
/// fires, and everything attached is released when `teardown` fires.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    pub setup: Trigger,
    pub teardown: Option<Trigger>,
}

impl Lifecycle {
    pub fn new(setup: &Trigger) -> Self {
        Self {
            setup: setup.clone(),
            teardown: None,
        }
    }

    pub fn with_teardown(mut self, teardown: &Trigger) -> Self {
        self.teardown = Some(teardown.clone());
        self
    }

    /// A lifecycle with fresh setup and teardown triggers.
    pub fn manual() -> Self {
        Self {
            setup: Event::new(),
            teardown: Some(Event::new()),
        }
    }
}

/// What an adapter hands out when used as a generic trigger.
#[derive(Clone, Debug)]
pub struct TriggerParts {
    pub setup: Trigger,
    pub teardown: Option<Trigger>,
    pub fired: Trigger,
}

/// Lets another library use an adapter as "something happened", e.g. to
/// refetch when the network comes back, without knowing which adapter it is.
pub trait TriggerProtocol {
    fn trigger(&self) -> TriggerParts;
}
