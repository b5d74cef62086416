//! Batch reference and registration id generation
//!
//! References are human-legible (date + event code) with a random suffix
//! from a v4 UUID, so concurrent submissions for the same school+event
//! cannot collide. Registration ids derive from the batch reference and
//! inherit its uniqueness.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a batch reference, e.g. `B20260823-SCI24-7F3A2C`
pub fn batch_reference(event_code: &str, now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("B{}-{}-{}", now.format("%Y%m%d"), event_code, suffix)
}

/// Generate the id for the `seq`-th registration (1-based) in a batch,
/// e.g. `B20260823-SCI24-7F3A2C-001`
pub fn registration_id(batch_reference: &str, seq: usize) -> String {
    format!("{}-{:03}", batch_reference, seq)
}
