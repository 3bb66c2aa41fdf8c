use std::io::{BufReader, Cursor};

use crate::{
    resources::texture::{load_binary, load_texture},
    scene::{
        model,
        node::{to_scene_node, ContainerNode, SceneNode},
        texture::Texture,
    },
};

/**
 * This module contains all logic for loading models and textures from external files.
 */
pub mod pick;
pub mod texture;

pub use texture::diffuse_layout;

/// glTF buffer and image URIs are relative to the file that references them.
fn resolve_relative(file_name: &str, uri: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, uri),
        None => uri.to_string(),
    }
}

pub async fn load_model_gltf(
    file_name: &str,
    id: u32,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf_text = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_text);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                };
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(&resolve_relative(file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load materials
    let layout = diffuse_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture() {
            Some(tex) => match tex.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => {
                    let start = view.offset();
                    let end = start + view.length();
                    Texture::from_bytes(
                        device,
                        queue,
                        &buffer_data[view.buffer().index()][start..end],
                        file_name,
                        mime_type.split('/').next_back(),
                    )?
                }
                gltf::image::Source::Uri { uri, mime_type } => {
                    let format = mime_type.and_then(|mt| mt.split('/').next_back());
                    load_texture(&resolve_relative(file_name, uri), device, queue, format).await?
                }
            },
            // Untextured materials render their base colour from a single pixel
            None => {
                let rgba = pbr.base_color_factor().map(|c| (c * 255.0) as u8);
                Texture::from_pixel(rgba, device, queue, file_name)
            }
        };
        let name = material.name().unwrap_or(file_name);
        materials.push(model::Material::new(device, name, diffuse_texture, &layout));
    }
    // Meshes index into the material list, an empty one still needs a default
    if materials.is_empty() {
        let diffuse_texture = Texture::from_pixel([255, 255, 255, 255], device, queue, file_name);
        materials.push(model::Material::new(
            device,
            file_name,
            diffuse_texture,
            &layout,
        ));
    }

    let mut models = Vec::new();

    for scene in gltf.scenes() {
        for node in scene.nodes() {
            let model = to_scene_node(id, node, &buffer_data, device, &materials);
            models.push(model);
        }
    }

    let root_node = if models.len() == 1 {
        models.into_iter().next().unwrap()
    } else {
        let mut root_node = ContainerNode::new();
        root_node.children = models;
        Box::new(root_node)
    };

    Ok(root_node)
}
