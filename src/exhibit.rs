//! Exhibit control and application event loop.
//!
//! This module provides the main event loop and the exhibit abstraction. An
//! "exhibit" represents one self-contained page: it handles user input,
//! updates its scene, and provides renderable objects each frame. The loop
//! manages multiple active exhibits and coordinates rendering, picking, and
//! event distribution.
//!
//! # Lifecycle
//!
//! The event loop follows this pattern each frame:
//! 1. Collect window events
//! 2. Call `on_window_events` on all exhibits for event distribution
//! 3. Update exhibit state via `on_update`
//! 4. Call the exhibits' `on_render()` to collect renderable objects
//! 5. Perform picking if the mouse was clicked
//! 6. Render shadow maps, then the frame buffer, using batched pipelines
//! 7. Present the frame

use std::{collections::HashSet, fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};

#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::{MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext},
    pick::draw_to_pick_buffer,
    render::{Batch, Render},
    scene::{
        model::{DrawModel, DrawShadow},
        texture::Texture,
    },
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "integration-tests")]
pub enum RenderTestResult {
    Passed,
    Waiting,
    Failed,
}

/// Trait for implementing a renderable page.
///
/// An `Exhibit` manages a self-contained portion of the application:
/// rendering, input handling, animations, and state updates. The loop
/// coordinates the active exhibits, passes events to them, and composes
/// their renders.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once after the GPU context exists; configure camera, lights and clear colour here
/// 2. `on_window_events()` is called for each winit input event
/// 3. `on_update()` is called every frame
/// 4. `on_click()` is called when an object with one of this exhibit's ids is clicked
/// 5. `on_render()` is called each frame and specifies how to render `self`
///
pub trait Exhibit<S> {
    /// Initialize the exhibit and configure the context.
    ///
    /// This is the place to modify the Context and configure things such as
    /// the background colour, the light rig or the camera start position.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S);

    /// Handle a click on an object rendered by this exhibit.
    ///
    /// `id` is the id that correlates to a specific mesh set via `on_render`.
    /// It is advised to use a unique u32 id for each element that should be
    /// selectable.
    fn on_click(&mut self, ctx: &Context, state: &mut S, id: u32);

    /// Update state every frame.
    ///
    /// Called every frame with the elapsed time `dt`. Use for animations and
    /// other per-frame logic.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration);

    /// Handle window events (mouse wheel, keyboard, resizing, etc.).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent);

    /// Return renderable objects for this exhibit.
    ///
    /// Called each frame. Collect your objects into a [`Render`] and return
    /// it. The loop batches and renders all exhibits' renders together.
    fn on_render(&self) -> Render<'_>;

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _ctx: &Context,
        _state: &mut S,
        _texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<RenderTestResult, anyhow::Error> {
        Ok(RenderTestResult::Passed)
    }
}

// Dummy impl to make wasm work
impl<State> Debug for dyn Exhibit<State> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Exhibit")
    }
}

/// Type alias for an exhibit constructor (factory function).
///
/// An exhibit constructor takes an [`InitContext`] and asynchronously returns
/// a boxed [`Exhibit`]. This allows model loading before the first frame.
pub type ExhibitConstructor<S> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn Exhibit<S>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> Self {
        let ctx = Context::new(window).await;
        let ctx = match ctx {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        let state = State::default();
        let is_surface_configured = false;
        Self {
            ctx,
            state,
            is_surface_configured,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_texture(&self, extent3d: wgpu::Extent3d) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Output Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.ctx.config.format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_depth_texture(&self, extent3d: wgpu::Extent3d) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Depth Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn get_width_height(&self) -> (u32, u32) {
        // The img lib requires divisibility of 256...
        let width = self.ctx.config.width;
        let height = self.ctx.config.height;
        let width_offset = 256 - (width % 256);
        let height_offset = 256 - (height % 256);
        let width = width + width_offset;
        let height = height + height_offset;
        (width, height)
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_3d_extent(&self) -> wgpu::Extent3d {
        let (width, height) = self.get_width_height();
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    fn render(
        &mut self,
        exhibits: &[Box<dyn Exhibit<State>>],
        #[cfg(feature = "integration-tests")] async_runtime: &Runtime,
        #[cfg(feature = "integration-tests")] event_loop: &winit::event_loop::EventLoopProxy<
            ExhibitEvent<State>,
        >,
    ) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        #[cfg(not(feature = "integration-tests"))]
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        #[cfg(feature = "integration-tests")]
        let (tex, depth) = {
            let extent3d = self.get_test_3d_extent();
            let tex = self.get_test_texture(extent3d);
            let depth = self.get_test_depth_texture(extent3d);
            (tex, depth)
        };

        let mut lits: Vec<Batch> = Vec::new();
        let mut unlits: Vec<Batch> = Vec::new();
        exhibits.iter().for_each(|exhibit| {
            let render = exhibit.on_render();
            render.set_pipelines(&mut lits, &mut unlits);
        });

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        // The main pass samples both shadow maps whenever anything is lit, so
        // they have to be cleared even when no caster is on stage.
        if !lits.is_empty() {
            for (target, pass_bind_group) in [
                (
                    &self.ctx.lighting.shadow.sun_map.view,
                    &self.ctx.lighting.shadow.sun_pass.bind_group,
                ),
                (
                    &self.ctx.lighting.shadow.spot_map.view,
                    &self.ctx.lighting.shadow.spot_pass.bind_group,
                ),
            ] {
                let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Shadow Pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: target,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

                shadow_pass.set_pipeline(&self.ctx.pipelines.shadow);
                for batch in lits.iter().chain(unlits.iter()) {
                    if !batch.casts_shadow {
                        continue;
                    }
                    shadow_pass.set_vertex_buffer(1, batch.transforms.slice(..));
                    shadow_pass.draw_model_shadow(batch.model, 0..1, pass_bind_group);
                }
            }
        }

        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        #[cfg(feature = "integration-tests")]
                        view: &tex.create_view(&wgpu::TextureViewDescriptor::default()),
                        #[cfg(not(feature = "integration-tests"))]
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        #[cfg(feature = "integration-tests")]
                        view: &depth.create_view(&wgpu::TextureViewDescriptor::default()),
                        #[cfg(not(feature = "integration-tests"))]
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            render_pass.set_pipeline(&self.ctx.pipelines.lit);
            for batch in lits.iter() {
                render_pass.set_vertex_buffer(1, batch.transforms.slice(..));
                render_pass.draw_model_instanced(
                    batch.model,
                    0..1,
                    &self.ctx.camera.bind_group,
                    &self.ctx.lighting.bind_group,
                    &self.ctx.lighting.shadow.bind_group,
                );
            }

            render_pass.set_pipeline(&self.ctx.pipelines.unlit);
            for batch in unlits.iter() {
                render_pass.set_vertex_buffer(1, batch.transforms.slice(..));
                render_pass.draw_model_flat(batch.model, 0..1, &self.ctx.camera.bind_group);
            }
        }

        #[cfg(feature = "integration-tests")]
        let output_buffer = {
            let u32_size = std::mem::size_of::<u32>() as u32;
            let (width, height) = self.get_width_height();
            let output_buffer_size = (u32_size * width * height) as wgpu::BufferAddress;
            let output_buffer_desc = wgpu::BufferDescriptor {
                size: output_buffer_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                label: None,
                mapped_at_creation: false,
            };
            let output_buffer = self.ctx.device.create_buffer(&output_buffer_desc);
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &tex,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &output_buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(u32_size * width),
                        rows_per_image: Some(height),
                    },
                },
                self.get_test_3d_extent(),
            );
            output_buffer
        };

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        let fut_img = async {
            let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
            let buffer_slice = output_buffer.slice(..);
            buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
                tx.send(result).unwrap();
            });
            self.ctx
                .device
                .poll(wgpu::PollType::Wait {
                    submission_index: None,
                    timeout: Some(Duration::from_secs(3)),
                })
                .unwrap();
            rx.receive().await.unwrap().unwrap();
            let data = buffer_slice.get_mapped_range();
            let (width, height) = self.get_width_height();
            image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(width, height, data).unwrap()
        };
        #[cfg(feature = "integration-tests")]
        {
            use std::convert::identity;

            let mut img: image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView> =
                async_runtime.block_on(fut_img);
            let state = &mut self.state;
            let all_passed = exhibits
                .iter()
                .map(|exhibit| exhibit.render_to_texture(&self.ctx, state, &mut img))
                .map(|res| match res {
                    Err(e) => panic!("{}", e),
                    Ok(RenderTestResult::Passed) => true,
                    Ok(RenderTestResult::Failed) => panic!("Assertion failed"),
                    Ok(RenderTestResult::Waiting) => false,
                })
                .all(identity);
            if all_passed {
                event_loop
                    .send_event(ExhibitEvent::Exit)
                    .expect("All assertions passed but the winit event-loop could not safely exit")
            }
        }

        output.present();
        Ok(())
    }
}

pub struct App<State: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<ExhibitEvent<State>>,
    state: Option<AppState<State>>,
    // This will hold the fully initialized exhibits once they are ready.
    exhibits: Vec<Box<dyn Exhibit<State>>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<ExhibitConstructor<State>>>,
    last_time: Instant,
}

impl<State: 'static> App<State> {
    fn new(
        event_loop: &EventLoop<ExhibitEvent<State>>,
        constructors: Vec<ExhibitConstructor<State>>,
    ) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            exhibits: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
        }
    }
}

pub enum ExhibitEvent<State: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        exhibits: Vec<Box<dyn Exhibit<State>>>,
    },
    #[allow(dead_code)]
    Picked((u32, HashSet<usize>)),
    #[allow(dead_code)]
    Exit,
}

impl<State> Debug for ExhibitEvent<State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, exhibits } => f
                .debug_struct("Initialized")
                .field("exhibits", exhibits)
                .finish(),
            Self::Picked(arg0) => f.debug_tuple("Picked").field(arg0).finish(),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

impl<State: 'static + Default> ApplicationHandler<ExhibitEvent<State>> for App<State> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let constructors = self.constructors.take().unwrap();

        let init_future = async move {
            let app_state = AppState::new(window).await;

            let exhibit_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let exhibits: Vec<_> = futures::future::join_all(exhibit_futures).await;
            (app_state, exhibits)
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let (mut app_state, exhibits) = self.async_runtime.block_on(init_future);
            self.exhibits = exhibits;
            self.exhibits.iter_mut().for_each(|exhibit| {
                exhibit.on_init(&mut app_state.ctx, &mut app_state.state);
            });
            self.state = Some(app_state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let (app_state, exhibits) = init_future.await;
                assert!(
                    proxy
                        .send_event(ExhibitEvent::Initialized {
                            state: app_state,
                            exhibits,
                        })
                        .is_ok()
                );
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ExhibitEvent<State>) {
        match event {
            ExhibitEvent::Initialized { state, exhibits } => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(state);
                self.exhibits = exhibits;

                // Important: Trigger a resize and redraw now that we are initialized
                let app_state = self.state.as_mut().unwrap();
                let size = app_state.ctx.window.inner_size();
                app_state.resize(size.width, size.height);
                self.exhibits.iter_mut().for_each(|exhibit| {
                    exhibit.on_init(&mut app_state.ctx, &mut app_state.state);
                });
                app_state.ctx.window.request_redraw();
            }
            ExhibitEvent::Picked((pick_id, exhibit_ids)) => {
                if let Some(state) = &mut self.state {
                    exhibit_ids.into_iter().for_each(|exhibit_id| {
                        if let Some(exhibit) = self.exhibits.get_mut(exhibit_id) {
                            exhibit.on_click(&state.ctx, &mut state.state, pick_id);
                        }
                    });
                }
            }
            ExhibitEvent::Exit => {
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        if let WindowEvent::CursorMoved {
            device_id: _,
            position,
        } = event
        {
            state.ctx.mouse.coords = position;
        };

        self.exhibits.iter_mut().for_each(|exhibit| {
            exhibit.on_window_events(&state.ctx, &mut state.state, &event);
        });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(
                    &self.exhibits,
                    #[cfg(feature = "integration-tests")]
                    &self.async_runtime,
                    #[cfg(feature = "integration-tests")]
                    &self.proxy,
                ) {
                    Ok(_) => {
                        // Keep the camera uniform in sync with resizes and on_init changes
                        state
                            .ctx
                            .camera
                            .uniform
                            .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                        state.ctx.queue.write_buffer(
                            &state.ctx.camera.buffer,
                            0,
                            bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                        );
                        self.exhibits.iter_mut().for_each(|exhibit| {
                            exhibit.on_update(&state.ctx, &mut state.state, dt);
                        });
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory, cannot continue rendering");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                if let (MouseButton::Left, true) = (button, button_state.is_pressed()) {
                    if let Some((pick_id, exhibit_ids)) = draw_to_pick_buffer::<State>(
                        #[cfg(not(target_arch = "wasm32"))]
                        &self.async_runtime,
                        &self.exhibits,
                        &state.ctx,
                        &state.ctx.mouse,
                        #[cfg(target_arch = "wasm32")]
                        self.proxy.clone(),
                    ) {
                        if exhibit_ids.len() > 1 {
                            log::warn!(
                                "Multiple exhibits (indices {:?}) want to react to the render id {}.",
                                exhibit_ids,
                                pick_id
                            );
                        }
                        exhibit_ids.into_iter().for_each(|exhibit_id| {
                            if let Some(exhibit) = self.exhibits.get_mut(exhibit_id) {
                                exhibit.on_click(&state.ctx, &mut state.state, pick_id);
                            }
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run<State: 'static + Default>(
    constructors: Vec<ExhibitConstructor<State>>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<ExhibitEvent<State>> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<ExhibitEvent<State>> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };

    #[cfg(not(feature = "integration-tests"))]
    let event_loop: EventLoop<ExhibitEvent<State>> = EventLoop::with_user_event().build()?;

    let mut app: App<State> = App::new(&event_loop, constructors);

    event_loop.run_app(&mut app)?;

    Ok(())
}
