pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "tax")]
pub mod tax;

#[cfg(feature = "lending")]
pub mod lending;

#[cfg(feature = "growth")]
pub mod growth;

#[cfg(feature = "returns")]
pub mod returns;

#[cfg(feature = "structured_products")]
pub mod structured_products;

#[cfg(feature = "planning")]
pub mod planning;

#[cfg(feature = "trading")]
pub mod trading;

#[cfg(feature = "fx")]
pub mod fx;

pub use error::FinCalcError;
pub use types::*;

pub type FinCalcResult<T> = Result<T, FinCalcError>;
