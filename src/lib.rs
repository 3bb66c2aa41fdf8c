//! vitrine
//!
//! A small cross-platform renderer for scrollable product pages, built for
//! native and WASM compatibility. Each page is an exhibit that manages its
//! own scene: a spinning cube as a smoke test and a showcase of three
//! photoscanned pieces with shadows, picking and scroll-driven animation.
//!
//! High-level modules
//! - `camera`: camera types and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `exhibit`: high level page control (event loop / update hooks)
//! - `pages`: the shipped pages, one exhibit each
//! - `pick`: object picking via an id off-screen pass
//! - `pipelines`: render pipelines (lit, unlit, shadow, pick) and the light rig
//! - `render`: render composition for efficient pipeline reuse
//! - `resources`: helpers to load textures/models and create GPU resources
//! - `scene`: scene graph, transforms, model and texture data
//! - `scroll`, `staging`, `tween`: scroll input and showcase choreography
//!

pub mod camera;
pub mod context;
pub mod exhibit;
pub mod pages;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod scroll;
pub mod staging;
pub mod tween;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Web entry point for the cube page.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_cube() {
    exhibit::run(vec![pages::cube::constructor()]).unwrap_throw();
}

/// Web entry point for the showcase page.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_showcase() {
    exhibit::run(vec![pages::showcase::constructor()]).unwrap_throw();
}
