//! Scene graph and hierarchical scene organization.
//!
//! Provides traits and structures for building a scene graph: a hierarchical
//! representation of objects in a scene. Every node carries a local transform
//! plus the world transform derived from its parents, and model nodes own the
//! GPU buffer their world transform is written to.

use wgpu::{Device, util::DeviceExt};

use crate::{
    render::Batch,
    scene::{
        model,
        transform::Transform,
    },
};

/// A node in the scene graph.
///
/// Nodes form a tree. Mutating a local transform only takes effect once
/// [`update_world_transforms`](Self::update_world_transforms) has recomputed
/// the world transforms along the tree and
/// [`write_to_buffers`](Self::write_to_buffers) has pushed them to the GPU.
pub trait SceneNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn get_local_transform(&self) -> Transform;

    fn set_local_transform(&mut self, transform: Transform);

    fn get_world_transform(&self) -> Transform;

    /// Recompute this node's world transform under the given parent world
    /// transform and pass the result down to all children.
    fn update_world_transforms(&mut self, parent_world_transform: &Transform);

    /// Treat this node as a root and recompute the whole subtree.
    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Transform::default());
    }

    /// Mark the subtree as a shadow caster for the lit pipeline.
    fn set_casts_shadow(&mut self, casts_shadow: bool);

    fn write_to_buffers(&mut self, queue: &wgpu::Queue);

    fn get_render(&self) -> Vec<Batch<'_>>;
}

/// Convert a GLTF node and its children into scene nodes.
///
/// All model nodes of the subtree share the `id`, so a pick on any mesh of
/// the subtree reports the same object.
pub fn to_scene_node(
    id: u32,
    node: gltf::scene::Node,
    buf: &Vec<Vec<u8>>,
    device: &wgpu::Device,
    mats: &Vec<model::Material>,
) -> Box<dyn SceneNode> {
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mut meshes = Vec::new();
            let primitives = mesh.primitives();

            primitives.for_each(|primitive| {
                let reader = primitive.reader(|buffer| Some(&buf[buffer.index()]));

                let mut vertices = Vec::new();
                if let Some(vertex_attribute) = reader.read_positions() {
                    vertex_attribute.for_each(|vertex| {
                        vertices.push(model::ModelVertex {
                            position: vertex,
                            tex_coords: Default::default(),
                            normal: Default::default(),
                        })
                    });
                }
                if let Some(normal_attribute) = reader.read_normals() {
                    let mut normal_index = 0;
                    normal_attribute.for_each(|normal| {
                        vertices[normal_index].normal = normal;

                        normal_index += 1;
                    });
                }
                if let Some(tex_coord_attribute) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                    let mut tex_coord_index = 0;
                    tex_coord_attribute.for_each(|tex_coord| {
                        vertices[tex_coord_index].tex_coords = tex_coord;

                        tex_coord_index += 1;
                    });
                }

                let mut indices = Vec::new();
                if let Some(indices_raw) = reader.read_indices() {
                    indices.append(&mut indices_raw.into_u32().collect::<Vec<u32>>());
                }
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });

                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                meshes.push(model::Mesh {
                    name: mesh.name().unwrap_or("unknown_mesh").to_string(),
                    vertex_buffer,
                    index_buffer,
                    num_elements: indices.len() as u32,
                    material: primitive.material().index().unwrap_or(0),
                });
            });
            let model = model::Model {
                meshes,
                materials: mats.clone(),
            };
            Box::new(ModelNode::from_model(id, device, model))
        }
        None => Box::new(ContainerNode::new()),
    };
    let decomp_pos = node.transform().decomposed();
    let transform = Transform {
        position: decomp_pos.0.into(),
        rotation: decomp_pos.1.into(),
        scale: decomp_pos.2.into(),
    };
    scene_node.set_local_transform(transform);
    for child in node.children() {
        let child_node = to_scene_node(id, child, buf, device, mats);
        scene_node.add_child(child_node);
    }

    scene_node
}

/// A node without geometry of its own, grouping its children.
pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    local_transform: Transform,
    world_transform: Transform,
}

impl ContainerNode {
    pub fn new() -> Self {
        Self {
            children: vec![],
            local_transform: Transform::default(),
            world_transform: Transform::default(),
        }
    }
}

impl Default for ContainerNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneNode for ContainerNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self) -> Transform {
        self.local_transform
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.local_transform = transform;
    }

    fn get_world_transform(&self) -> Transform {
        self.world_transform
    }

    fn update_world_transforms(&mut self, parent_world_transform: &Transform) {
        self.world_transform = parent_world_transform * &self.local_transform;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world_transform);
        }
    }

    fn set_casts_shadow(&mut self, casts_shadow: bool) {
        for child in self.children.iter_mut() {
            child.set_casts_shadow(casts_shadow);
        }
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Vec<Batch<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .collect()
    }
}

/// A node with geometry: a [`model::Model`] plus the GPU buffer holding the
/// node's world transform.
pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    transform_buffer: wgpu::Buffer,
    local_transform: Transform,
    world_transform: Transform,
    model: model::Model,
    id: u32,
    casts_shadow: bool,
}

impl ModelNode {
    pub fn from_model(id: u32, device: &Device, model: model::Model) -> Self {
        let world_transform = Transform::default();
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform Buffer"),
            contents: bytemuck::cast_slice(&[world_transform.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            children: vec![],
            transform_buffer,
            local_transform: Transform::default(),
            world_transform,
            model,
            id,
            casts_shadow: false,
        }
    }
}

impl SceneNode for ModelNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self) -> Transform {
        self.local_transform
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.local_transform = transform;
    }

    fn get_world_transform(&self) -> Transform {
        self.world_transform
    }

    fn update_world_transforms(&mut self, parent_world_transform: &Transform) {
        self.world_transform = parent_world_transform * &self.local_transform;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world_transform);
        }
    }

    fn set_casts_shadow(&mut self, casts_shadow: bool) {
        self.casts_shadow = casts_shadow;
        for child in self.children.iter_mut() {
            child.set_casts_shadow(casts_shadow);
        }
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.transform_buffer,
            0,
            bytemuck::cast_slice(&[self.world_transform.to_raw()]),
        );
        self.get_children_mut()
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Vec<Batch<'_>> {
        let mut batches = vec![Batch {
            transforms: &self.transform_buffer,
            model: &self.model,
            id: self.id,
            casts_shadow: self.casts_shadow,
        }];
        batches.extend(self.children.iter().flat_map(|child| child.get_render()));
        batches
    }
}
