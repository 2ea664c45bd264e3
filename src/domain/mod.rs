//! Domain types and the ports the application layer drives.

pub mod order;
pub mod ports;
pub mod product;
pub mod rate_limit;
