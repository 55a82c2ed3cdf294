use serde::{Deserialize, Serialize};
use std::fmt;

/// The columns of the order dataset that the analytics pipeline knows about.
///
/// Any other column in the source file is tolerated and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    OrderId,
    CustomerId,
    ProductId,
    SellerId,
    PaymentValue,
    OrderPurchaseTimestamp,
    ReviewScore,
    ReviewCreationDate,
}

impl Column {
    /// Columns without which no aggregation can run.
    pub const REQUIRED: [Column; 6] = [
        Column::OrderId,
        Column::CustomerId,
        Column::ProductId,
        Column::SellerId,
        Column::PaymentValue,
        Column::OrderPurchaseTimestamp,
    ];

    /// Columns whose absence is handled by exclusion or fallback.
    pub const OPTIONAL: [Column; 2] = [Column::ReviewScore, Column::ReviewCreationDate];

    /// The header name of the column in the source file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::OrderId => "order_id",
            Column::CustomerId => "customer_id",
            Column::ProductId => "product_id",
            Column::SellerId => "seller_id",
            Column::PaymentValue => "payment_value",
            Column::OrderPurchaseTimestamp => "order_purchase_timestamp",
            Column::ReviewScore => "review_score",
            Column::ReviewCreationDate => "review_creation_date",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
