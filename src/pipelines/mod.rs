//! Render pipeline construction.
//!
//! Each submodule assembles one pipeline flavour, with its WGSL living next
//! to it as `<name>_shader.wgsl`. The colour pipelines go through the shared
//! [`mk_render_pipeline`] helper, the depth-only shadow pipeline and the
//! pick pipeline have their own descriptors.

pub mod lights;
pub mod lit;
pub mod pick;
pub mod shadow;
pub mod unlit;

/// The fixed set of pipelines every exhibit renders with.
pub struct Pipelines {
    pub lit: wgpu::RenderPipeline,
    pub unlit: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub pick: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        lights_bind_group_layout: &wgpu::BindGroupLayout,
        shadow_bind_group_layout: &wgpu::BindGroupLayout,
        shadow_pass_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            lit: lit::mk_lit_pipeline(
                device,
                config,
                camera_bind_group_layout,
                lights_bind_group_layout,
                shadow_bind_group_layout,
            ),
            unlit: unlit::mk_unlit_pipeline(device, config, camera_bind_group_layout),
            shadow: shadow::mk_shadow_pipeline(device, shadow_pass_bind_group_layout),
            pick: pick::mk_pick_pipeline(device, camera_bind_group_layout),
        }
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        // maybe useful for multiple textures on a mesh.
        multiview: None,
    })
}
