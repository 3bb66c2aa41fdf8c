#[cfg(feature = "integration-tests")]
use vitrine::exhibit::RenderTestResult;
#[cfg(feature = "integration-tests")]
use vitrine::{context::Context, exhibit::Exhibit, render::Render, scene::node::SceneNode};

pub(crate) struct State {
    frame_counter: u32,
    init_invocations: u32,
    click_invocations: u32,
    update_invocations: u32,
}
impl State {
    pub fn new() -> Self {
        Self {
            frame_counter: 0,
            init_invocations: 0,
            click_invocations: 0,
            update_invocations: 0,
        }
    }

    pub fn frame(&mut self) {
        self.frame_counter += 1;
    }

    pub fn init(&mut self) {
        self.init_invocations += 1;
    }

    pub fn click(&mut self) {
        self.click_invocations += 1;
    }

    pub fn update(&mut self) {
        self.update_invocations += 1;
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn init_invocations(&self) -> u32 {
        self.init_invocations
    }

    pub fn update_invocations(&self) -> u32 {
        self.update_invocations
    }

    pub fn click_invocations(&self) -> u32 {
        self.click_invocations
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct FrameCounter(pub(crate) u32);
impl Default for FrameCounter {
    fn default() -> Self {
        Self(0)
    }
}
impl FrameCounter {
    pub(crate) fn frame(&self) -> u32 {
        self.0
    }

    pub(crate) fn progress(&mut self) {
        self.0 += 1;
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) type Validate = fn(
    &Context,
    &mut FrameCounter,
    &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
) -> Result<RenderTestResult, anyhow::Error>;

/// A scripted exhibit: one optional scene node, a setup hook and a per-frame
/// validation of the rendered image.
#[cfg(feature = "integration-tests")]
pub(crate) struct TestRender {
    pub(crate) node: Option<Box<dyn SceneNode>>,
    pub(crate) lit: bool,
    pub(crate) setup: fn(&mut Context, &mut FrameCounter),
    pub(crate) validate: Validate,
}

#[cfg(feature = "integration-tests")]
impl Exhibit<FrameCounter> for TestRender {
    fn on_init(&mut self, ctx: &mut Context, state: &mut FrameCounter) {
        (self.setup)(ctx, state);
        if let Some(node) = &mut self.node {
            node.update_world_transform_all();
            node.write_to_buffers(&ctx.queue);
        }
    }

    fn on_click(&mut self, _: &Context, _: &mut FrameCounter, _: u32) {}

    fn on_update(&mut self, _: &Context, state: &mut FrameCounter, _: std::time::Duration) {
        state.progress();
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &vitrine::WindowEvent,
    ) {
    }

    fn on_render(&self) -> Render<'_> {
        match &self.node {
            Some(node) if self.lit => Render::Lits(node.get_render()),
            Some(node) => Render::Unlits(node.get_render()),
            None => Render::None,
        }
    }

    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut FrameCounter,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<RenderTestResult, anyhow::Error> {
        (self.validate)(ctx, state, texture)
    }
}

#[macro_export]
macro_rules! render_test {
    ($build:expr) => {{
        use crate::common::test_utils::FrameCounter;
        use vitrine::exhibit::{Exhibit, ExhibitConstructor};

        let constructor: ExhibitConstructor<FrameCounter> = Box::new(|ctx| {
            let build = $build;
            Box::pin(async move { Box::new(build(ctx).await) as Box<dyn Exhibit<FrameCounter>> })
        });

        vitrine::exhibit::run(vec![constructor]).expect("Failed to run the render test.");
    }};
}
