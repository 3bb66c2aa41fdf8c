//! Light rig resources shared by the lit and shadow pipelines.
//!
//! The rig consists of a hemisphere fill, one shadow-casting sun light and
//! one shadow-casting spot light. All parameters live in a single uniform,
//! the two shadow maps come with their own depth-only pass resources.

use bytemuck::Zeroable;
use cgmath::{EuclideanSpace, InnerSpace, Point3, Rad, Vector3};
use wgpu::util::DeviceExt;

use crate::{camera::OPENGL_TO_WGPU_MATRIX, scene::texture::Texture};

/// Shadow map edge length in pixels.
#[cfg(not(target_arch = "wasm32"))]
pub const SHADOW_MAP_SIZE: u32 = 4096;
/// WebGL2 guarantees much smaller texture limits, stay within them.
#[cfg(target_arch = "wasm32")]
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Split a hex colour like `0xc7c1e1` into RGB floats.
pub fn rgb(colour: u32) -> [f32; 3] {
    [
        ((colour >> 16) & 0xff) as f32 / 255.0,
        ((colour >> 8) & 0xff) as f32 / 255.0,
        (colour & 0xff) as f32 / 255.0,
    ]
}

/// Ambient light fading between a sky and a ground colour by surface
/// orientation.
#[derive(Clone, Copy, Debug)]
pub struct HemisphereLight {
    pub sky_colour: u32,
    pub ground_colour: u32,
    pub intensity: f32,
}

/// A sun-like light: parallel rays towards the origin, shadows rendered
/// through an orthographic projection.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    pub colour: u32,
    pub intensity: f32,
    pub position: Point3<f32>,
    /// Half edge length of the orthographic shadow volume.
    pub shadow_extent: f32,
}

/// A cone of light aimed at the origin with a hard edge, shadows rendered
/// through a perspective projection.
#[derive(Clone, Copy, Debug)]
pub struct SpotLight {
    pub colour: u32,
    pub intensity: f32,
    pub position: Point3<f32>,
    /// Angle between cone axis and cone edge.
    pub cone_angle: Rad<f32>,
}

/**
 * The complete light rig as the shaders see it. Matrices first, then
 * vec3/f32 pairs so every field sits on a 16 byte boundary.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    sun_view_proj: [[f32; 4]; 4],
    spot_view_proj: [[f32; 4]; 4],
    hemisphere_sky: [f32; 3],
    hemisphere_intensity: f32,
    hemisphere_ground: [f32; 3],
    exposure: f32,
    sun_direction: [f32; 3],
    sun_intensity: f32,
    sun_colour: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    spot_position: [f32; 3],
    spot_intensity: f32,
    spot_colour: [f32; 3],
    spot_cutoff: f32,
    spot_direction: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding2: u32,
}

impl LightsUniform {
    pub fn new(
        hemisphere: HemisphereLight,
        sun: DirectionalLight,
        spot: SpotLight,
        exposure: f32,
    ) -> Self {
        let sun_view_proj = directional_view_proj(&sun);
        let spot_view_proj = spot_view_proj(&spot);
        let sun_direction = (Point3::origin() - sun.position).normalize();
        let spot_direction = (Point3::origin() - spot.position).normalize();

        Self {
            sun_view_proj: sun_view_proj.into(),
            spot_view_proj: spot_view_proj.into(),
            hemisphere_sky: rgb(hemisphere.sky_colour),
            hemisphere_intensity: hemisphere.intensity,
            hemisphere_ground: rgb(hemisphere.ground_colour),
            exposure,
            sun_direction: sun_direction.into(),
            sun_intensity: sun.intensity,
            sun_colour: rgb(sun.colour),
            _padding: 0,
            spot_position: spot.position.into(),
            spot_intensity: spot.intensity,
            spot_colour: rgb(spot.colour),
            spot_cutoff: spot.cone_angle.0.cos(),
            spot_direction: spot_direction.into(),
            _padding2: 0,
        }
    }

    pub fn sun_view_proj(&self) -> [[f32; 4]; 4] {
        self.sun_view_proj
    }

    pub fn spot_view_proj(&self) -> [[f32; 4]; 4] {
        self.spot_view_proj
    }
}

fn directional_view_proj(sun: &DirectionalLight) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(sun.position, Point3::origin(), Vector3::unit_y());
    let extent = sun.shadow_extent;
    let proj = OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-extent, extent, -extent, extent, 1.0, 200.0);
    proj * view
}

fn spot_view_proj(spot: &SpotLight) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(spot.position, Point3::origin(), Vector3::unit_y());
    // The shadow frustum is the full cone, so twice the cone angle.
    let proj = OPENGL_TO_WGPU_MATRIX * cgmath::perspective(spot.cone_angle * 2.0, 1.0, 1.0, 500.0);
    proj * view
}

/// One depth-only render target from a light's point of view: the uniform
/// holding the light view-projection plus its bind group.
#[derive(Debug)]
pub struct ShadowPass {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ShadowPass {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[[[0.0f32; 4]; 4]]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self { buffer, bind_group }
    }
}

/// Shadow maps for both lights plus the resources to render and sample them.
#[derive(Debug)]
pub struct ShadowResources {
    pub sun_map: Texture,
    pub spot_map: Texture,
    /// Binds both maps and a comparison sampler for the lit pipeline.
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub sun_pass: ShadowPass,
    pub spot_pass: ShadowPass,
    pub pass_bind_group_layout: wgpu::BindGroupLayout,
}

impl ShadowResources {
    fn new(device: &wgpu::Device) -> Self {
        let sun_map = Texture::create_shadow_map(device, SHADOW_MAP_SIZE, "sun shadow map");
        let spot_map = Texture::create_shadow_map(device, SHADOW_MAP_SIZE, "spot shadow map");

        let bind_group_layout = mk_shadow_bind_group_layout(device);
        let sampler = mk_comparison_sampler(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&sun_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&spot_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("shadow_bind_group"),
        });

        let pass_bind_group_layout = mk_shadow_pass_bind_group_layout(device);
        let sun_pass = ShadowPass::new(device, &pass_bind_group_layout, "sun shadow pass");
        let spot_pass = ShadowPass::new(device, &pass_bind_group_layout, "spot shadow pass");

        Self {
            sun_map,
            spot_map,
            bind_group,
            bind_group_layout,
            sun_pass,
            spot_pass,
            pass_bind_group_layout,
        }
    }
}

/// The light rig bundled with its GPU-side resources.
#[derive(Debug)]
pub struct LightingResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub shadow: ShadowResources,
}

impl LightingResources {
    /// Create all GPU resources with a zeroed rig. Until
    /// [`update`](Self::update) sets real lights everything lit renders
    /// black.
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightsUniform::zeroed();
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        let shadow = ShadowResources::new(device);

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
            shadow,
        }
    }

    /// Replace the rig and push it to the GPU, including the view-projections
    /// of both shadow passes.
    pub fn update(&mut self, queue: &wgpu::Queue, uniform: LightsUniform) {
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        queue.write_buffer(
            &self.shadow.sun_pass.buffer,
            0,
            bytemuck::cast_slice(&[self.uniform.sun_view_proj()]),
        );
        queue.write_buffer(
            &self.shadow.spot_pass.buffer,
            0,
            bytemuck::cast_slice(&[self.uniform.spot_view_proj()]),
        );
    }
}

pub fn mk_buffer(device: &wgpu::Device, lights_uniform: LightsUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Lights Buffer"),
        contents: bytemuck::cast_slice(&[lights_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("lights_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    lights_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: lights_buffer.as_entire_binding(),
        }],
        label: Some("lights_bind_group"),
    })
}

fn mk_shadow_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("shadow_bind_group_layout"),
    })
}

fn mk_shadow_pass_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("shadow_pass_bind_group_layout"),
    })
}

fn mk_comparison_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("shadow comparison sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    })
}
