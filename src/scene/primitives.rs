//! Generated primitive shapes.
//!
//! Shapes come with outward normals and per-face texture coordinates so they
//! run through the same pipelines as loaded models.

use wgpu::util::DeviceExt;

use crate::{
    resources::diffuse_layout,
    scene::{model, texture::Texture},
};

const CUBE_POSITIONS: [[f32; 3]; 24] = [
    // Front face
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
    // Back face
    [-0.5, -0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [0.5, 0.5, -0.5],
    [0.5, -0.5, -0.5],
    // Left face
    [-0.5, -0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [-0.5, 0.5, 0.5],
    [-0.5, 0.5, -0.5],
    // Right face
    [0.5, -0.5, 0.5],
    [0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [0.5, 0.5, 0.5],
    // Top face
    [-0.5, 0.5, 0.5],
    [0.5, 0.5, 0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
    // Bottom face
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [0.5, -0.5, 0.5],
    [-0.5, -0.5, 0.5],
];

const CUBE_TEX_COORDS: [[f32; 2]; 24] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 0.0],
    [0.0, 1.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [0.0, 1.0],
    [1.0, 1.0],
    [1.0, 0.0],
    [0.0, 0.0],
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
];

const CUBE_NORMALS: [[f32; 3]; 24] = [
    [0.0, 0.0, 1.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, -1.0],
    [-1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, -1.0, 0.0],
];

// 2 counter-clockwise triangles per face
const CUBE_INDICES: [u32; 36] = [
    0, 1, 2, 2, 3, 0, // front
    4, 5, 6, 6, 7, 4, // back
    8, 9, 10, 10, 11, 8, // left
    12, 13, 14, 14, 15, 12, // right
    16, 17, 18, 18, 19, 16, // top
    20, 21, 22, 22, 23, 20, // bottom
];

/// Create a cube model with the given edge length and a solid colour
/// material.
///
/// The cube is centred at the origin. Colour bytes are taken as linear
/// values, so `[0, 255, 0, 255]` is full green.
pub fn cuboid(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    edge_length: f32,
    colour: [u8; 4],
) -> model::Model {
    let vertices = CUBE_POSITIONS
        .iter()
        .zip(CUBE_TEX_COORDS)
        .zip(CUBE_NORMALS)
        .map(|((position, tex_coords), normal)| model::ModelVertex {
            position: position.map(|p| p * edge_length),
            tex_coords,
            normal,
        })
        .collect::<Vec<_>>();

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Cuboid Vertex Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Cuboid Index Buffer"),
        contents: bytemuck::cast_slice(&CUBE_INDICES),
        usage: wgpu::BufferUsages::INDEX,
    });

    let mesh = model::Mesh {
        name: "cuboid".to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: CUBE_INDICES.len() as u32,
        material: 0,
    };
    let material = model::Material::new(
        device,
        "cuboid colour",
        Texture::from_pixel(colour, device, queue, "cuboid colour"),
        &diffuse_layout(device),
    );

    model::Model {
        meshes: vec![mesh],
        materials: vec![material],
    }
}
