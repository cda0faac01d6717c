use folio_core::{
    dom::{Document, Element, HashChangeHandler, Opacity, Propagation, ReadyHandler, WheelHandler},
    Error,
};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Event, HtmlElement, Window};

pub fn host_error(err: JsValue) -> Error {
    Error::HostError(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

#[derive(Clone)]
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
}

impl WebDocument {
    pub fn from_window() -> Result<Self, Error> {
        let window = web_sys::window().ok_or_else(|| Error::HostError("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| Error::HostError("no document".into()))?;
        Ok(Self { window, document })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Text of the element with the given id, used for inline JSON config.
    pub fn text_by_id(&self, id: &str) -> Option<String> {
        self.document
            .get_element_by_id(id)
            .and_then(|element| element.text_content())
    }
}

impl Document for WebDocument {
    type Element = WebElement;

    fn hash(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    fn set_hash(&self, hash: &str) -> Result<(), Error> {
        self.window.location().set_hash(hash).map_err(host_error)
    }

    fn body(&self) -> Option<WebElement> {
        self.document.body().map(|body| WebElement(body.into()))
    }

    fn query_class(&self, class: &str) -> Vec<WebElement> {
        // Live collection, copied out before any class is touched.
        let collection = self.document.get_elements_by_class_name(class);
        (0..collection.length())
            .filter_map(|index| collection.item(index))
            .map(WebElement)
            .collect()
    }

    fn on_ready(&self, handler: ReadyHandler) -> Result<(), Error> {
        if self.document.ready_state() != "loading" {
            handler();
            return Ok(());
        }
        let callback = Closure::once(move || handler());
        self.document
            .add_event_listener_with_callback("DOMContentLoaded", callback.as_ref().unchecked_ref())
            .map_err(host_error)?;
        callback.forget();
        Ok(())
    }

    fn on_hash_change(&self, handler: HashChangeHandler) -> Result<(), Error> {
        let callback = Closure::wrap(handler);
        self.window
            .add_event_listener_with_callback("hashchange", callback.as_ref().unchecked_ref())
            .map_err(host_error)?;
        callback.forget();
        Ok(())
    }

    fn on_wheel(&self, target: &WebElement, mut handler: WheelHandler) -> Result<(), Error> {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if handler() == Propagation::Stop {
                event.stop_propagation();
            }
        });
        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        target
            .0
            .add_event_listener_with_callback_and_add_event_listener_options(
                "wheel",
                callback.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(host_error)?;
        callback.forget();
        Ok(())
    }
}

#[derive(Clone)]
pub struct WebElement(web_sys::Element);

impl Element for WebElement {
    fn add_class(&self, class: &str) -> Result<(), Error> {
        self.0.class_list().add_1(class).map_err(host_error)
    }

    fn remove_class(&self, class: &str) -> Result<(), Error> {
        self.0.class_list().remove_1(class).map_err(host_error)
    }

    fn set_opacity(&self, opacity: Opacity) -> Result<(), Error> {
        let element = self
            .0
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| Error::HostError("opacity needs an HTML element".into()))?;
        element
            .style()
            .set_property("opacity", opacity.as_css())
            .map_err(host_error)
    }
}
