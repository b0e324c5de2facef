use crate::tree::project::ExpansionSet;
use serde::{Deserialize, Serialize};

pub(crate) const TOKEN_KEY: &str = "notefold_token";
pub(crate) const EXPANDED_KEY: &str = "notefold_expanded_notebooks";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = local_storage()?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

/// Unreadable or missing data yields an empty set.
pub(crate) fn load_expanded() -> ExpansionSet {
    load_json_from_storage::<ExpansionSet>(EXPANDED_KEY).unwrap_or_default()
}

pub(crate) fn save_expanded(expanded: &ExpansionSet) {
    save_json_to_storage(EXPANDED_KEY, expanded);
}
