//! Browser build of the wallet session.
//!
//! Binds the session controller to the Keplr extension and exposes it to
//! the page as [`SessionHandle`]. Rendering stays on the JavaScript side.

pub mod handle;
pub mod keplr;
pub mod storage;

pub use handle::SessionHandle;

use wasm_bindgen::prelude::*;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub fn start() {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();
}
