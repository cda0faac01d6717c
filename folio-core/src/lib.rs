pub mod config;
pub mod dom;
pub mod error;
pub mod nav;
pub mod shade;
pub mod timer;

pub use config::SiteConfig;
pub use error::Error;
pub use nav::{Destination, NavController, Reconciled, Routes};
pub use shade::{ScrollFeedback, ShadePulse};
