pub mod costs;
