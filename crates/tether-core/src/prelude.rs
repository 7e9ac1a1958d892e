pub use crate::effects::Dispose;
pub use crate::event::{Event, Trigger};
pub use crate::lifecycle::{Lifecycle, TriggerParts, TriggerProtocol};
pub use crate::listener::{Listener, read_value, setup_listener, setup_listener_with_payload};
pub use crate::scope::Scope;
pub use crate::store::{Dependency, ReadStore, Store, combine};
