pub mod aggregator;

pub use aggregator::{Aggregator, RefreshError};
