pub mod auth;
pub mod import;
pub mod statistics;
pub mod timeframe;
pub mod valuation;

pub use auth::{AuthService, Claims};
pub use import::{ImportError, ImportRow, RowError, SpreadsheetFormat};
pub use statistics::{compute_stats, CardStats};
pub use timeframe::Timeframe;
pub use valuation::{collection_value_series, ValuePoint};
