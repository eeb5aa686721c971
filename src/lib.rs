//! Flipscout - Marketplace Offer Aggregation Engine
//!
//! Aggregates price offers for a keyword from several marketplace and search
//! backends into one schema, and ranks shipping rules against package
//! dimensions.
//!
//! # Modules
//!
//! - `domain`: Offer and shipping types, normalization, the estimator
//! - `ports`: Trait abstractions (OfferSource, OfferStore, SecretStore)
//! - `adapters`: Backend implementations and the rate-limited HTTP client
//! - `config`: Configuration loading and validation
//! - `application`: The aggregation orchestrator

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
