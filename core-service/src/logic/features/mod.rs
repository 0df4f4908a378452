//! Features Module - raw records to fixed-width model input
//!
//! ## Structure
//! - `record.rs` - Flat JSON records
//! - `derivers.rs` - Per-theme derivation strategies
//! - `builder.rs` - The one derivation path (train and predict)
//! - `schema.rs` - Ordered column layout + layout hash
//! - `vector.rs` - Reindexed vectors tagged with the layout hash

pub mod record;
pub mod derivers;
pub mod builder;
pub mod schema;
pub mod vector;

#[cfg(test)]
mod tests;

pub use record::{RawRecord, RawValue};
pub use derivers::{deriver_by_name, FeatureDeriver};
pub use builder::{FeatureBuilder, FeatureRow};
pub use schema::FeatureSchema;
pub use vector::FeatureVector;
