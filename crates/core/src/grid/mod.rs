//! Grid storage: the temperature field, region shapes, and the shared store

pub mod field;
pub mod region;
pub mod store;

// Re-export main types
pub use field::{ScalarField, Temperature, MAX_TEMP};
pub use region::{ClippedRect, Rect, Region};
pub use store::GridStore;
