pub mod domain;
pub mod market;
