mod api;
mod app;
mod autosave;
mod components;
mod config;
mod logging;
mod models;
mod state;
mod storage;
mod tree;
mod util;

#[cfg(test)]
mod testing;

use leptos::prelude::*;

pub use app::App;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    mount_to_body(App);
}
