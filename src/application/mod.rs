//! Application layer containing the core business logic orchestration.
//!
//! `OrderPlacementCoordinator` commits purchases against the stock ledger as single units
//! of work, and `RateGovernor` bounds request volume per caller ahead of any routing.
//! `ProductCatalog` serves product reads, caching the full listing.

pub mod catalog;
pub mod governor;
pub mod orders;
