//! Batch: one bulk-registration submission, one payment, one currency

use crate::models::report::RowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Batch lifecycle status: draft → submitted → {confirmed | cancelled}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Draft,
    Submitted,
    Confirmed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(crate::Error::Internal(format!(
                "Unknown batch status: {}",
                other
            ))),
        }
    }
}

/// Payment status overlay, independent of the batch status:
/// pending → {completed | failed | pending_verification → {completed | failed}}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PendingVerification,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingVerification => "pending_verification",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pending_verification" => Ok(Self::PendingVerification),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(crate::Error::Internal(format!(
                "Unknown payment status: {}",
                other
            ))),
        }
    }
}

/// How the batch is paid; offline batches go through admin verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Online,
    Offline,
}

impl PaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            other => Err(crate::Error::Internal(format!(
                "Unknown payment mode: {}",
                other
            ))),
        }
    }
}

/// One bulk-registration submission
///
/// Monetary amounts are integer minor units of `currency`. The invariant
/// `total_amount = base_amount - discount_amount` holds because the three
/// amounts are only ever written together from one pricing computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub reference: String,
    pub school_id: String,
    pub event_id: String,
    pub registration_ids: Vec<String>,
    pub total_students: u32,
    pub base_amount: i64,
    pub discount_percent: f64,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub currency: String,
    pub status: BatchStatus,
    pub payment_status: PaymentStatus,
    pub payment_mode: PaymentMode,
    /// Row errors from the validation attempt this batch was created from
    pub validation_errors: Vec<RowError>,
    pub cancelled_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}
