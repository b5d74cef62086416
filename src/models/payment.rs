//! Payment: exactly one per batch, status mirrored with the batch overlay

use crate::models::batch::PaymentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The single payment attached to a batch
///
/// `status` is kept mirrored with `Batch::payment_status`; the lifecycle
/// module updates both inside one transaction. Offline verification
/// stamps (verifier, date, notes) are written identically to both records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub batch_reference: String,
    pub school_id: String,
    pub event_id: String,
    /// Amount due, in minor units; equals the batch total
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    /// Opaque references handed back by the payment gateway
    pub gateway_refs: BTreeMap<String, String>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}
