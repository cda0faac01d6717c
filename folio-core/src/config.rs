use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{error::Error, nav::Routes};

pub const DEFAULT_DESTINATION: &str = "projects";
pub const ALTERNATE_DESTINATION: &str = "contributions";
pub const ACTIVE_CLASS: &str = "hash-active";
pub const SCROLLABLE_CLASS: &str = "content";
pub const SHADE_CLASS: &str = "shade";
pub const SHADE_DELAY_MS: u64 = 200;

/// Class names and timings shared between the page markup and the
/// controllers. Missing fields fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub default_destination: String,
    pub alternate_destination: String,
    pub active_class: String,
    pub scrollable_class: String,
    pub shade_class: String,
    pub shade_delay_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            default_destination: DEFAULT_DESTINATION.to_string(),
            alternate_destination: ALTERNATE_DESTINATION.to_string(),
            active_class: ACTIVE_CLASS.to_string(),
            scrollable_class: SCROLLABLE_CLASS.to_string(),
            shade_class: SHADE_CLASS.to_string(),
            shade_delay_ms: SHADE_DELAY_MS,
        }
    }
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.routes()?;
        for (field, class) in [
            ("active_class", &self.active_class),
            ("scrollable_class", &self.scrollable_class),
            ("shade_class", &self.shade_class),
        ] {
            if !is_class_name(class) {
                return Err(Error::InvalidConfig(format!(
                    "{} is not a usable class name: {:?}",
                    field, class
                )));
            }
        }
        Ok(())
    }

    pub fn routes(&self) -> Result<Routes, Error> {
        Routes::new(&self.default_destination, &self.alternate_destination)
    }

    pub fn shade_delay(&self) -> Duration {
        Duration::from_millis(self.shade_delay_ms)
    }
}

/// Single class token: non-empty, no whitespace.
pub(crate) fn is_class_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}
