use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Parses a value stored in `payments.status`.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    /// Maps the free-text status reported by the Alif gateway onto the internal enum.
    ///
    /// Matching is case-insensitive. Anything unrecognised is treated as `Failed` so an
    /// unexpected gateway vocabulary never marks an order as paid.
    pub fn from_gateway_status(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" | "completed" | "paid" | "approve" | "approved" => PaymentStatus::Completed,
            "pending" | "processing" | "wait" | "waiting" => PaymentStatus::Pending,
            "cancelled" | "canceled" | "cancel" => PaymentStatus::Cancelled,
            "failed" | "error" | "declined" | "decline" | "reject" | "rejected" => {
                PaymentStatus::Failed
            }
            _ => PaymentStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
