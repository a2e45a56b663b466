//! Price data: CSV loading, synthetic panels and result export.

pub mod error;
pub mod export;
pub mod loader;
pub mod synthetic;

pub use error::DataError;
pub use loader::load_price_csv;
pub use synthetic::{synthetic_panel, SyntheticConfig};
