//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum, which is used by scene nodes to specify
//! how they should be rendered. The frame loop uses `Render` to sort objects into
//! batches for the lit and unlit pipelines, and the picking pass reuses the same
//! batches to find out which exhibit owns the object under the cursor.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Batch<'a>`] contains the data for drawing one object (model + transform buffer)
//!

use std::collections::{HashMap, HashSet};

use crate::scene::{model::Model, node::SceneNode};

/// Data for drawing one object: a model, its transform buffer, and a pick id.
///
/// The transform buffer holds the world transform written by the owning scene
/// node and is bound at vertex slot 1.
pub struct Batch<'a> {
    pub transforms: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub id: u32,
    pub casts_shadow: bool,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Lit(Batch)` renders a single object with the full light rig
/// - `Lits(Vec<Batch>)` renders a batch of lit objects
/// - `Unlit(Batch)` renders a single object with flat material colour
/// - `Unlits(Vec<Batch>)` renders a batch of unlit objects
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
///
pub enum Render<'a> {
    None,
    Lit(Batch<'a>),
    Lits(Vec<Batch<'a>>),
    Unlit(Batch<'a>),
    Unlits(Vec<Batch<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Map object ids to exhibit ids for picking and selection.
    ///
    /// Walks the render tree and records which exhibit owns which object ids,
    /// so a picked pixel can be routed back to its exhibit.
    pub(crate) fn map_ids(&self, exhibit_id: usize, map: &mut HashMap<u32, HashSet<usize>>) {
        match self {
            Render::Lit(batch) | Render::Unlit(batch) => {
                map.entry(batch.id)
                    .and_modify(|exhibits| _ = exhibits.insert(exhibit_id))
                    .or_insert([exhibit_id].into());
            }
            Render::Lits(vec) | Render::Unlits(vec) => vec.iter().for_each(|batch| {
                map.entry(batch.id)
                    .and_modify(|exhibits| {
                        exhibits.insert(exhibit_id);
                    })
                    .or_insert([exhibit_id].into());
            }),
            Render::Composed(renders) => renders
                .iter()
                .for_each(|render| render.map_ids(exhibit_id, map)),
            Render::None => (),
        }
    }

    pub(crate) fn set_pipelines(self, lits: &mut Vec<Batch<'a>>, unlits: &mut Vec<Batch<'a>>) {
        match self {
            Render::Lit(batch) => lits.push(batch),
            Render::Lits(mut vec) => lits.append(&mut vec),
            Render::Unlit(batch) => unlits.push(batch),
            Render::Unlits(mut vec) => unlits.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(lits, unlits)),
            Render::None => (),
        }
    }

    /// Lit and unlit objects alike end up in one flat list, the pick pass
    /// draws them all with the same id pipeline.
    pub(crate) fn set_pick_pipelines(self, batches: &mut Vec<Batch<'a>>) {
        match self {
            Render::Lit(batch) | Render::Unlit(batch) => batches.push(batch),
            Render::Lits(mut vec) | Render::Unlits(mut vec) => batches.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pick_pipelines(batches)),
            Render::None => (),
        }
    }
}

impl<'a> From<&'a dyn SceneNode> for Render<'a> {
    fn from(sn: &'a dyn SceneNode) -> Self {
        Render::Lits(sn.get_render())
    }
}
