//! Storage-key and task-name derivation.
//!
//! Link and clip records share a uid but live under disjoint fixed
//! prefixes, so the two record types can never collide in the backend
//! keyspace. The formats here are load-bearing: existing deployments
//! have data under these exact keys.

/// Keyspace namespace shared by all records.
pub const NAMESPACE: &str = "lnk";

/// Key of the link record for a uid.
pub fn link_key(uid: &str) -> String {
    format!("{NAMESPACE}-u:{uid}")
}

/// Key of the clip record for a uid.
pub fn clip_key(uid: &str) -> String {
    format!("{NAMESPACE}-c:{uid}")
}

/// Name under which the background clip job for a uid is registered.
pub fn clip_task_name(uid: &str) -> String {
    format!("clip_{uid}")
}
