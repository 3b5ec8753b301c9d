pub mod domain;
pub mod error;
pub mod service;

pub use error::{FundError, FundResult};
