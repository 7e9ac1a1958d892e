//! # i18n bridge
//!
//! Exposes a localization instance as stores: the translate function `t`,
//! readiness, the current language, and derived translated strings that
//! follow language switches and newly loaded resources.
//!
//! ```rust
//! use std::rc::Rc;
//! use tether_core::{Lifecycle, Trigger};
//! use tether_i18n::{MemoryI18n, create_i18n_integration};
//!
//! let i18n = Rc::new(
//!     MemoryI18n::builder()
//!         .language("en")
//!         .resource("en", "common", "greeting", "Hello")
//!         .resource("de", "common", "greeting", "Hallo")
//!         .build(),
//! );
//!
//! let setup = Trigger::new();
//! let integration = create_i18n_integration(i18n, &Lifecycle::new(&setup));
//! let greeting = integration.translated_key("common:greeting");
//! assert_eq!(greeting.get(), "common:greeting");
//!
//! setup.fire(());
//! assert_eq!(greeting.get(), "Hello");
//!
//! integration.change_language.fire("de".into());
//! assert_eq!(greeting.get(), "Hallo");
//! ```

pub mod instance;
pub mod integration;
pub mod memory;

pub use instance::{
    Deliver, Done, I18nError, I18nInstance, InstanceHandle, InstanceSource, MissingKey, Variables,
};
pub use integration::{I18nIntegration, Reporting, Translation, Translator, create_i18n_integration};
pub use memory::{MemoryI18n, MemoryI18nBuilder, interpolate};
