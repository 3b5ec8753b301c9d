pub mod contribution;
pub mod dissolution;
pub mod fund;
pub mod loan;
pub mod membership;
pub mod outbox;
pub mod repayment;
pub mod voting;

pub use contribution::*;
pub use dissolution::*;
pub use fund::*;
pub use loan::*;
pub use membership::*;
pub use outbox::*;
pub use repayment::*;
pub use voting::*;
