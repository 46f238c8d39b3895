pub mod action;
pub mod config;
pub mod control;
pub mod dispatcher;
pub mod error;
pub mod lock;

pub use action::Action;
pub use config::{Deescalation, LifecycleConfig};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::{LifecycleError, Result};
