use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCheckpoint {
    /// A payment record was created and the customer was sent to the gateway.
    Pending,
    /// The gateway confirmed the payment and an order was synthesized.
    Confirmed,
}

impl NotificationCheckpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCheckpoint::Pending => "pending",
            NotificationCheckpoint::Confirmed => "confirmed",
        }
    }
}

impl Display for NotificationCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
