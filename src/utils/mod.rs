//! Utility functions shared by the decoders
//!
//! - Geometry (rounding, distances, perspective transforms)

/// Rounding, distances and perspective transforms
pub mod geometry;
