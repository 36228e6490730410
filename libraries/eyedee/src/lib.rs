//! Identifiers minted on the client.
//!
//! Records created before the server has seen them carry a temporary id with the
//! [`TEMP_PREFIX`] prefix. The server later assigns the permanent one.

use uuid::Uuid;

pub const TEMP_PREFIX: &str = "temp-";

pub fn get_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// A fresh temporary id, e.g. `temp-6f1c...`.
pub fn temp_id() -> String {
    format!("{TEMP_PREFIX}{}", Uuid::new_v4().simple())
}

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_PREFIX)
}

/// Ids for ephemeral UI notifications. Only unique within the process.
pub fn notification_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{millis}-{}", &Uuid::new_v4().simple().to_string()[..8])
}
