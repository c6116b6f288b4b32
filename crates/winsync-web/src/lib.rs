//! Browser host for the winsync window registry
//!
//! Binds `winsync-core` to the page: `localStorage` as the shared store,
//! `Date.now()` as the clock, `setInterval` as the heartbeat and the
//! window's screen position as its shape.
//!
//! ```js
//! import init, { WindowRegistry, sharedClockSeconds } from "./winsync_web.js";
//!
//! await init();
//! const registry = new WindowRegistry(JSON.stringify({ namespace: "cubes" }));
//! registry.onWindowsChanged((windows) => rebuildScene(windows));
//! registry.onShapeChanged((shape) => resizeRenderer(shape));
//! registry.start({ color: "tomato" });
//! ```

use wasm_bindgen::prelude::*;

pub mod host;
pub mod registry;
pub mod storage;

pub use host::DateClock;
pub use registry::{WindowRegistry, STARTUP_DELAY_MS};
pub use storage::LocalStore;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

/// Install the panic hook once the module is loaded.
#[wasm_bindgen(start)]
pub fn main_js() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    log("[winsync] module loaded");
}

/// Seconds since local midnight, identical in every window at one instant.
#[wasm_bindgen(js_name = sharedClockSeconds)]
pub fn shared_clock_seconds() -> f64 {
    host::shared_clock_seconds()
}
