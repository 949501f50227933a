pub mod contribution;
pub mod loan;
pub mod member;
pub mod money;
pub mod payment;
pub mod ports;
pub mod transaction;
