//! # Embench App API
//!
//! The boundary between the harness and the embedded application under
//! measurement. The controller only ever talks to the application through
//! the traits defined here, so any plugin-extensible server can be bolted
//! into the harness by implementing `ApplicationHost`.

pub mod instance;
pub mod settings;

pub use instance::{
    ApplicationHost, ApplicationInstance, BootContext, ExtensionResolver, InstalledExtension,
    ItemHandle,
};
pub use settings::{Account, AppSettings, AuthRealm};
