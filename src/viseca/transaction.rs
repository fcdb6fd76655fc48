/// Transaction records as returned by the card transactions endpoint.
///
/// Decoding is tolerant: unknown fields are ignored and missing fields take
/// their default value, as does an explicit `null`. Only syntax errors and
/// type mismatches fail.
use serde::{Deserialize, Deserializer};

use super::errors::ExportError;

/// One page of transactions, in server order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionList {
    #[serde(rename = "list", deserialize_with = "null_as_default")]
    pub transactions: Vec<Transaction>,
}

/// A single card transaction.
///
/// The full record is kept even though only a few fields are reported.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(dead_code)]
#[serde(default, rename_all = "camelCase")]
pub struct Transaction {
    #[serde(deserialize_with = "null_as_default")]
    pub transaction_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub card_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub masked_card_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub card_name: String,
    /// Kept exactly as sent by the API.
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub show_timestamp: bool,
    /// Amount in the billed currency.
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    /// Set for foreign-currency transactions.
    pub original_amount: Option<f64>,
    pub original_currency: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub merchant_name: String,
    /// User- or bank-assigned display name for the merchant.
    pub pretty_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub merchant_place: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_online: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub pfm_category: PfmCategory,
    /// Lifecycle tag, e.g. `PENDING` or `BOOKED`.
    #[serde(deserialize_with = "null_as_default")]
    pub state_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub details: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_billed: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Links,
}

/// Personal finance management category. Only `id` and `name` are reported.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(dead_code)]
#[serde(default, rename_all = "camelCase")]
pub struct PfmCategory {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub light_color: Option<String>,
    pub medium_color: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub transparent_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
pub struct Links {
    #[serde(rename = "transactiondetails")]
    pub transaction_details: Option<String>,
}

impl Transaction {
    /// The merchant name to show: `prettyName` when set and non-empty, else `merchantName`.
    #[must_use]
    pub fn display_merchant(&self) -> &str {
        self.pretty_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.merchant_name)
    }
}

/// Parse a response body into a [`TransactionList`].
///
/// # Errors
///
/// Returns `ExportError::Decode` on malformed JSON or a field of the wrong type.
pub fn decode(body: &[u8]) -> Result<TransactionList, ExportError> {
    Ok(serde_json::from_slice(body)?)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
