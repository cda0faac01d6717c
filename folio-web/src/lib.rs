mod dom;
mod logger;
mod timer;

use folio_core::{Error, NavController, ScrollFeedback, SiteConfig};
use log::LevelFilter;
use wasm_bindgen::prelude::*;

pub use crate::{
    dom::{WebDocument, WebElement},
    timer::WindowScheduler,
};

/// Optional `<script type="application/json">` element holding a `SiteConfig`.
const CONFIG_ELEMENT_ID: &str = "folio-config";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;
#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    logger::init(LOG_LEVEL);
    install().map_err(|err| JsValue::from_str(&err.to_string()))
}

fn install() -> Result<(), Error> {
    let doc = WebDocument::from_window()?;
    let config = load_config(&doc);

    NavController::from_config(&config)?.install(&doc)?;
    ScrollFeedback::new(&config, WindowScheduler::new(doc.window().clone())).install(&doc)?;
    Ok(())
}

fn load_config(doc: &WebDocument) -> SiteConfig {
    let Some(json) = doc.text_by_id(CONFIG_ELEMENT_ID) else {
        return SiteConfig::default();
    };
    match SiteConfig::from_json(&json) {
        Ok(config) => {
            log::info!("loaded site config from #{}", CONFIG_ELEMENT_ID);
            config
        }
        Err(err) => {
            log::warn!("ignoring site config: {}", err);
            SiteConfig::default()
        }
    }
}
