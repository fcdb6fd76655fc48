/// Report rows written to stdout.
///
/// A row is a fixed projection of a [`Transaction`], decoupled from the full
/// API record so the formatter only sees the reported columns.
use crate::viseca::Transaction;

/// Column titles, in output order.
pub const REPORT_COLUMNS: [&str; 6] = [
    "TransactionID",
    "Date",
    "Merchant",
    "Amount",
    "PFMCategoryID",
    "PFMCategoryName",
];

/// One report line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow<'a> {
    pub transaction_id: &'a str,
    /// Date string exactly as returned by the API.
    pub date: &'a str,
    /// See [`Transaction::display_merchant`].
    pub merchant: &'a str,
    /// Fixed point with six fractional digits, whatever the currency.
    pub amount: String,
    pub category_id: &'a str,
    pub category_name: &'a str,
}

impl<'a> ReportRow<'a> {
    /// Project a transaction onto the report columns.
    #[must_use]
    pub fn from_transaction(transaction: &'a Transaction) -> Self {
        Self {
            transaction_id: &transaction.transaction_id,
            date: &transaction.date,
            merchant: transaction.display_merchant(),
            amount: format!("{:.6}", transaction.amount),
            category_id: &transaction.pfm_category.id,
            category_name: &transaction.pfm_category.name,
        }
    }

    /// Field values in [`REPORT_COLUMNS`] order.
    #[must_use]
    pub fn fields(&self) -> [&str; 6] {
        [
            self.transaction_id,
            self.date,
            self.merchant,
            &self.amount,
            self.category_id,
            self.category_name,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viseca::transaction::PfmCategory;

    fn transaction(amount: f64) -> Transaction {
        Transaction {
            transaction_id: "T1".to_owned(),
            date: "2021-03-14T10:22:31".to_owned(),
            amount,
            merchant_name: "ACME SARL".to_owned(),
            pretty_name: Some("Corner Store".to_owned()),
            pfm_category: PfmCategory {
                id: "cv_groceries".to_owned(),
                name: "Groceries".to_owned(),
                ..PfmCategory::default()
            },
            ..Transaction::default()
        }
    }

    #[test]
    fn test_projection() {
        let t = transaction(12.5);
        let row = ReportRow::from_transaction(&t);
        assert_eq!(
            row.fields(),
            [
                "T1",
                "2021-03-14T10:22:31",
                "Corner Store",
                "12.500000",
                "cv_groceries",
                "Groceries"
            ]
        );
    }

    #[test]
    fn test_amount_fixed_point() {
        assert_eq!(ReportRow::from_transaction(&transaction(-3.0)).amount, "-3.000000");
        assert_eq!(ReportRow::from_transaction(&transaction(1234.5678)).amount, "1234.567800");
        assert_eq!(ReportRow::from_transaction(&transaction(0.0)).amount, "0.000000");
    }
}
