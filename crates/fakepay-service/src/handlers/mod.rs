//! API handlers.

pub mod health;
pub mod payments;
pub mod upi;
pub mod vpa;
pub mod wallets;
