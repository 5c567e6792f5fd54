//! Free text → administrative region resolution.
//!
//! Tiered strategy favoring precision over recall:
//! 1. Conversational-noise guard (short first token in a long message).
//! 2. Gazetteer name match over shrinking token windows (3 → 1 words).
//! 3. External geocoder, unrestricted.
//! 4. External geocoder restricted to administrative place types.
//!
//! The chain short-circuits on the first unique hit; anything else degrades
//! to "not found" for the caller.

pub mod error;
pub mod gazetteer;
pub mod lookup;
pub mod normalize;
pub mod resolve;

pub use {
    error::{Error, Result},
    gazetteer::{InMemoryRegionIndex, RegionIndex, RegionMatch},
    lookup::PlaceLookupService,
    resolve::QueryResolver,
};
