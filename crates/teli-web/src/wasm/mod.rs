//! wasm-bindgen entry points. Everything here touches the browser; the
//! decisions it acts on live in `teli-core` and the crate root.

mod fetch;
mod page;
mod worker;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{console, ServiceWorkerGlobalScope};

/// Runs when the module is instantiated, in a page or in the service worker.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    #[cfg(feature = "console-panic")]
    console_error_panic_hook::set_once();

    if let Some(window) = web_sys::window() {
        return page::init(window);
    }

    match js_sys::global().dyn_into::<ServiceWorkerGlobalScope>() {
        Ok(scope) => worker::init(scope),
        Err(_) => {
            warn("teli: unsupported global scope, nothing wired");
            Ok(())
        }
    }
}

/// Library version, for cache-busting in templates
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn log(message: &str) {
    console::log_1(&message.into());
}

pub(crate) fn warn(message: &str) {
    console::warn_1(&message.into());
}

pub(crate) fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
