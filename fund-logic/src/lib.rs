pub mod audit;
pub mod bus;
pub mod events;
pub mod mappers;
pub mod money;
pub mod outbox;
pub mod projection;
pub mod services;

pub use services::*;
