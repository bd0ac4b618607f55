pub mod housing;
pub mod inflation;
pub mod protection;
pub mod retirement;
