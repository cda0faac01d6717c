use std::time::Duration;

use folio_core::{
    timer::{Scheduler, Task},
    Error,
};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Window;

use crate::dom::host_error;

/// `setTimeout`/`clearTimeout` on the page's window.
#[derive(Clone)]
pub struct WindowScheduler {
    window: Window,
}

impl WindowScheduler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

/// Keeps the callback alive until the timeout is replaced or cancelled.
pub struct Timeout {
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Scheduler for WindowScheduler {
    type Handle = Timeout;

    fn schedule(&self, delay: Duration, task: Task) -> Result<Timeout, Error> {
        let callback = Closure::once(move || task());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis,
            )
            .map_err(host_error)?;
        Ok(Timeout {
            id,
            _callback: callback,
        })
    }

    fn cancel(&self, handle: Timeout) {
        self.window.clear_timeout_with_handle(handle.id);
    }
}
