//! Domain Layer - Core offer and shipping types
//!
//! Pure data and logic with no I/O. External interactions happen through
//! the ports layer.

pub mod offer;
pub mod shipping;

pub use offer::{normalize_offers, ItemId, NormalizedOffer, RawOffer, SourceId};
pub use shipping::{estimate, fits, PackageInput, ShippingEstimate, ShippingRule};
