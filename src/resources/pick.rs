use wgpu::util::DeviceExt;

use crate::scene::model;

pub fn pick_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("pick_bind_group_layout"),
    })
}

/**
 * A clone of a model's meshes with a uniform id buffer standing in for the
 * material. When backtracking the id that's output from the fragment shader
 * we can do pixel-perfect picking which is essential for detecting clicks on meshes.
 */
pub fn load_pick_model(
    device: &wgpu::Device,
    id: u32,
    meshes: Vec<model::Mesh>,
) -> anyhow::Result<model::Model> {
    // Current browsers don't support downscaling Uniform Buffers so I have to provide the full 16B
    let mut buf = [0u32; 4];
    buf[0] = id;
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Pick id buffer"),
        contents: bytemuck::cast_slice(&buf),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let materials = vec![model::Material::new_pick_material(
        device,
        "Pick Material",
        buffer,
        &pick_layout(device),
    )];

    // The cloned meshes still index into the full material list, repoint them
    // all at the single id material
    let meshes = meshes
        .into_iter()
        .map(|mesh| model::Mesh {
            material: 0,
            ..mesh
        })
        .collect();

    let model = model::Model { meshes, materials };
    Ok(model)
}
