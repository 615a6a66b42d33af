//! Change broadcast to the rest of the page.
//!
//! Every persist fires `astro:profile-update` with the profile as `detail`,
//! then a bare `storage` event for listeners that only watch storage.

use pilot_engine::PilotProfile;
use pilot_engine::ProfileObserver;
use pilot_engine::constants::PROFILE_UPDATE_EVENT;
use wasm_bindgen::JsValue;
use web_sys::{CustomEvent, CustomEventInit, Event};

use crate::dom::{js_error_message, to_js, window};

pub const STORAGE_EVENT: &str = "storage";

/// Dispatches the update events on `window` after each persist.
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastObserver;

impl ProfileObserver for BroadcastObserver {
    fn profile_changed(&self, profile: Option<&PilotProfile>) {
        if let Err(err) = broadcast(profile) {
            log::warn!("profile broadcast failed: {}", js_error_message(&err));
        }
    }
}

/// Fire both update events. `None` announces a cleared profile.
///
/// # Errors
/// Returns an error if there is no window or an event cannot be created.
pub fn broadcast(profile: Option<&PilotProfile>) -> Result<(), JsValue> {
    let window = window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let init = CustomEventInit::new();
    init.set_detail(&to_js(&profile)?);
    let update = CustomEvent::new_with_event_init_dict(PROFILE_UPDATE_EVENT, &init)?;
    window.dispatch_event(&update)?;
    window.dispatch_event(&Event::new(STORAGE_EVENT)?)?;
    Ok(())
}
