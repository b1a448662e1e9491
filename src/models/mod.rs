pub mod label;
pub mod product;
pub mod verification;
