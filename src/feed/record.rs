//! JSON wire record for one feed event.
//!
//! A field present in the record is `Updated`; an absent one is `Unchanged`:
//!
//! ```json
//! {"key":"A1","kind":"add","side":"buy","price":"10.00","size":"100","time":"09:30:00","date":"2024-01-02","participant":"NSDQ"}
//! {"key":"A1","kind":"update","size":"120"}
//! {"key":"A1","kind":"remove"}
//! ```

use serde::Deserialize;

use crate::types::{BookMutation, FieldUpdate, MutationKind, Price, PriceError, PriceField, Side};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MutationRecord {
    pub key: String,
    pub kind: MutationKind,
    #[serde(default)]
    pub side: Option<Side>,
    /// Numeric price as text, parsed exactly
    #[serde(default)]
    pub price: Option<String>,
    /// Overrides the display form of `price`
    #[serde(default)]
    pub price_display: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub participant: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

impl TryFrom<MutationRecord> for BookMutation {
    type Error = PriceError;

    fn try_from(record: MutationRecord) -> Result<Self, Self::Error> {
        let price = match record.price {
            Some(text) => {
                let value: Price = text.parse()?;
                let display = record.price_display.unwrap_or_else(|| text.trim().to_string());
                FieldUpdate::Updated(PriceField { value, display })
            }
            None => FieldUpdate::Unchanged,
        };

        let mut mutation = BookMutation::new(record.key, record.kind);
        mutation.side = record.side;
        mutation.price = price;
        mutation.size = record.size.into();
        mutation.time = record.time.into();
        mutation.date = record.date.into();
        mutation.participant = record.participant.into();
        mutation.exchange = record.exchange.into();
        mutation.order_id = record.order_id.into();
        Ok(mutation)
    }
}
