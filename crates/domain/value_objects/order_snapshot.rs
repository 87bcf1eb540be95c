use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_INVOICE_CATEGORY: &str = "products";

/// Full checkout payload captured when a payment is initiated.
///
/// Stored verbatim in `payments.order_data` and read back by the callback reconciler
/// to synthesize the confirmed order. Fields the storefront sends that are not named
/// here survive in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub delivery_info: DeliveryInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoices: Option<Vec<InvoiceLine>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryInfo {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One itemized receipt line sent to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLine {
    #[serde(default = "default_invoice_category")]
    pub category: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

fn default_invoice_category() -> String {
    DEFAULT_INVOICE_CATEGORY.to_string()
}

impl OrderSnapshot {
    /// Names of the required customer fields that are blank.
    pub fn missing_customer_fields(&self) -> Vec<&'static str> {
        let customer = &self.customer_info;
        [
            ("email", customer.email.as_str()),
            ("name", customer.name.as_str()),
            ("phone", customer.phone.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Invoice lines for the gateway: the caller's explicit list when present,
    /// otherwise one line per cart item.
    pub fn invoice_lines(&self) -> Vec<InvoiceLine> {
        match self.invoices.as_ref() {
            Some(invoices) if !invoices.is_empty() => invoices.clone(),
            _ => self
                .items
                .iter()
                .map(|item| InvoiceLine {
                    category: default_invoice_category(),
                    name: item.name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}
