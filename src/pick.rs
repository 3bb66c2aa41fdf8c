//! Object picking and selection.
//!
//! This module implements GPU based picking: rendering scene objects with
//! unique ids to an offscreen texture, then reading the pixel under the mouse
//! cursor to determine which object was clicked.
//!
//! The picking pass works as follows:
//! 1. Render all objects to an offscreen R32Uint texture with their id as the fragment output
//! 2. Read the pixel at the mouse cursor position back to the CPU
//! 3. Map the picked id back to the exhibit that owns the object (determined by the render tree)
//! 4. Return the selected object id and owning exhibits
//!
//! Especially step 4 makes sure that only those exhibits are invoked that were
//! responsible for the selected object.

use std::{
    collections::{HashMap, HashSet},
    iter,
};

use crate::{
    context::{Context, MouseState},
    exhibit::Exhibit,
    render::Batch,
    resources::pick::load_pick_model,
    scene::model::DrawModel,
};

#[cfg(target_arch = "wasm32")]
use crate::exhibit::ExhibitEvent;

/// Render all exhibits to the pick texture and determine which object was clicked.
///
/// # Arguments
///
/// * `async_runtime` using the tokio runtime for the buffer readback if not on WASM
/// * `exhibits` represent all active exhibits with their renderable objects
/// * `ctx` is the rendering context
/// * `mouse_state` is required for getting the mouse coordinates at the time of picking
/// * `proxy` WASM futures can only resolve using the winit event loop proxy by sending events
///
/// # Returns
///
/// `Some((pick_id, exhibit_ids))` if an object was picked, or `None` when the
/// result resolves through the event loop.
pub fn draw_to_pick_buffer<State: 'static>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    exhibits: &[Box<dyn Exhibit<State>>],
    ctx: &Context,
    mouse_state: &MouseState,
    #[cfg(target_arch = "wasm32")] proxy: winit::event_loop::EventLoopProxy<
        crate::exhibit::ExhibitEvent<State>,
    >,
) -> Option<(u32, HashSet<usize>)> {
    // Rows of a texture-to-buffer copy must be padded to 256 byte multiples
    let u32_size = std::mem::size_of::<u32>() as u32;
    let width = ctx.config.width;
    let height = ctx.config.height;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = (u32_size * width).div_ceil(align) * align;

    let extent3d = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let pick_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Pick texture"),
        size: extent3d,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R32Uint,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let pick_depth_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Pick depth texture"),
        size: extent3d,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth24Plus,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let mut translation: HashMap<u32, HashSet<usize>> = HashMap::new();
    let mut batches: Vec<Batch> = Vec::new();
    /*
       Exhibits handle pick ids internally. Thus, we store the correspondance of
       the exhibit index and the model picked so that each exhibit only gets
       invoked if one of the ids it manages was picked.

       Example:
       exhibit1 at index 0 owns the pick ids [1, 2, 3, 4, 5]
       exhibit2 at index 1 owns the pick ids [5, 6, 7, 8, 9]

       Warning: Overlapping id responsibility may not be the best design choice.

       On pick result 2 we invoke exhibit1.on_click(2).
       On pick result 5 we invoke exhibit1.on_click(5) followed by exhibit2.on_click(5).
    */
    exhibits.iter().enumerate().for_each(|(idx, exhibit)| {
        let render = exhibit.on_render();
        render.map_ids(idx, &mut translation);
        render.set_pick_pipelines(&mut batches);
    });

    // The id stand-ins have to outlive the render pass below
    let mut pick_models = Vec::new();
    for batch in batches.iter() {
        match load_pick_model(&ctx.device, batch.id, batch.model.meshes.clone()) {
            Ok(pick_model) => pick_models.push((pick_model, batch.transforms)),
            Err(e) => log::error!(
                "Failed to draw object with id {} into the pick buffer: {}",
                batch.id,
                e
            ),
        }
    }

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pick Encoder"),
        });

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Pick Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &pick_texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Pick texture view"),
                    format: Some(wgpu::TextureFormat::R32Uint),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    usage: None,
                    aspect: wgpu::TextureAspect::All,
                    base_mip_level: 0,
                    mip_level_count: None,
                    base_array_layer: 0,
                    array_layer_count: None,
                }),
                resolve_target: None,
                ops: wgpu::Operations {
                    // Id 0 is reserved for "nothing there"
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &pick_depth_texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Pick depth view"),
                    format: Some(wgpu::TextureFormat::Depth24Plus),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    usage: None,
                    aspect: wgpu::TextureAspect::All,
                    base_mip_level: 0,
                    mip_level_count: None,
                    base_array_layer: 0,
                    array_layer_count: None,
                }),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&ctx.pipelines.pick);
        for (pick_model, transforms) in pick_models.iter() {
            render_pass.set_vertex_buffer(1, transforms.slice(..));
            render_pass.draw_model_flat(pick_model, 0..1, &ctx.camera.bind_group);
        }
    }

    let output_buffer_size = (padded_bytes_per_row * height) as wgpu::BufferAddress;
    let output_buffer_desc = wgpu::BufferDescriptor {
        size: output_buffer_size,
        usage: wgpu::BufferUsages::COPY_DST
                    // this tells wpgu that we want to read this buffer from the cpu
                    | wgpu::BufferUsages::MAP_READ,
        label: None,
        mapped_at_creation: false,
    };
    let output_buffer = ctx.device.create_buffer(&output_buffer_desc);

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &pick_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        extent3d,
    );

    ctx.queue.submit(iter::once(encoder.finish()));
    let device = ctx.device.clone();
    let mouse_coords = mouse_state.coords;
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(async move {
        let buffer_slice = output_buffer.slice(..);
        let future_id = read_texture_buffer(
            buffer_slice,
            &device,
            padded_bytes_per_row,
            width,
            height,
            mouse_coords,
        );
        let id = future_id.await;
        output_buffer.unmap();
        if let Some(exhibit_ids) = translation.get(&id) {
            assert!(
                proxy
                    .send_event(ExhibitEvent::Picked((id, exhibit_ids.clone())))
                    .is_ok()
            );
        };
    });
    #[cfg(target_arch = "wasm32")]
    return None;
    #[cfg(not(target_arch = "wasm32"))]
    {
        let buffer_slice = output_buffer.slice(..);
        let future_id = read_texture_buffer(
            buffer_slice,
            &device,
            padded_bytes_per_row,
            width,
            height,
            mouse_coords,
        );
        // Depending on the average timing this should not block but rather always send an event
        let id = async_runtime.block_on(future_id);
        output_buffer.unmap();
        translation.get(&id).map(|exhibit_ids| (id, exhibit_ids.clone()))
    }
}

async fn read_texture_buffer(
    buffer_slice: wgpu::BufferSlice<'_>,
    device: &wgpu::Device,
    padded_bytes_per_row: u32,
    width: u32,
    height: u32,
    mouse_coords: winit::dpi::PhysicalPosition<f64>,
) -> u32 {
    // NOTE: We have to create the mapping THEN device.poll() before await
    // the future. Otherwise the application will freeze.
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    #[cfg(target_arch = "wasm32")]
    device.poll(wgpu::PollType::Poll).unwrap();
    #[cfg(not(target_arch = "wasm32"))]
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .unwrap();
    rx.receive().await.unwrap().unwrap();

    let data = buffer_slice.get_mapped_range();
    let bytes_per_pixel = std::mem::size_of::<u32>() as u32;
    // Clicks on the very edge clamp to the last rendered pixel
    let x = (mouse_coords.x as u32).min(width.saturating_sub(1));
    let y = (mouse_coords.y as u32).min(height.saturating_sub(1));
    let pick_index = (y * padded_bytes_per_row + x * bytes_per_pixel) as usize;
    let r = data[pick_index];
    let g = data[pick_index + 1];
    let b = data[pick_index + 2];
    let a = data[pick_index + 3];

    let id = u32::from(r) | u32::from(g) << 8 | u32::from(b) << 16 | u32::from(a) << 24;

    log::info!("Selected obj with id {}", id);
    id
}
