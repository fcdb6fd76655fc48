/// Viseca API domain layer: fetching, decoding and the error taxonomy.
pub mod errors;
pub mod fetch;
pub mod transaction;

pub use errors::ExportError;
pub use fetch::{API_HOST, TransactionFetcher};
pub use transaction::{Transaction, TransactionList, decode};
