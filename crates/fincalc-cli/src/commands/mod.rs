pub mod fx;
pub mod growth;
pub mod lending;
pub mod planning;
pub mod returns;
pub mod structured_products;
pub mod tax;
pub mod trading;
