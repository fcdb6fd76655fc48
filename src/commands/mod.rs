/// Command implementations.
pub mod export;
