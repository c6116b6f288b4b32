//! Host environment probes
//!
//! Everything the registry needs from the page: where the window sits on
//! the screen, whether the page is actually visible, the wall clock, and the
//! reset flag.

use web_sys::VisibilityState;
use winsync_core::{Clock, Shape};

/// Query parameter that wipes the shared store instead of starting.
pub const RESET_PARAM: &str = "clear";

/// `Date.now()`: the wall clock shared by every window of the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateClock;

impl Clock for DateClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// Current window shape in screen coordinates.
///
/// Falls back to zeros for any value the browser refuses to report.
pub fn current_shape() -> Shape {
    let Some(window) = web_sys::window() else {
        return Shape::default();
    };

    let x = window.screen_x().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let y = window.screen_y().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);

    Shape::new(x, y, w, h)
}

/// Whether the page is being shown to the user.
///
/// Prerendered and background-opened pages report hidden; registering them
/// would put phantom windows into everyone's scene.
pub fn is_visible() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .map(|d| d.visibility_state() != VisibilityState::Hidden)
        .unwrap_or(false)
}

/// Whether the page URL asks for the shared store to be wiped.
pub fn reset_requested() -> bool {
    let value = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get(RESET_PARAM));
    is_flag_set(value.as_deref())
}

/// A flag counts as set when it carries a non-empty value (`?clear=1`).
pub(crate) fn is_flag_set(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty())
}

/// Seconds since local midnight.
///
/// Every window computes the same value at the same instant, so animations
/// driven by it stay in phase across windows.
pub fn shared_clock_seconds() -> f64 {
    let midnight = js_sys::Date::new_0();
    midnight.set_hours(0);
    midnight.set_minutes(0);
    midnight.set_seconds(0);
    midnight.set_milliseconds(0);
    (js_sys::Date::now() - midnight.get_time()) / 1000.0
}
