//! Scene data structures: models, textures, nodes, and transforms.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `transform` holds node transformation data and its GPU form
//! - `node` enables hierarchical scene organization
//! - `primitives` generates simple shapes like cubes

pub mod model;
pub mod node;
pub mod primitives;
pub mod texture;
pub mod transform;
