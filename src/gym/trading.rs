pub mod action;
pub mod asset;
pub mod config;
pub mod env;
pub mod observation;
pub mod portfolio;
pub mod sampler;
