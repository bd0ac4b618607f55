pub mod brackets;
pub mod dividend;
pub mod overseas;
