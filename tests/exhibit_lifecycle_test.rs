#[cfg(feature = "integration-tests")]
use vitrine::exhibit::RenderTestResult;
#[cfg(feature = "integration-tests")]
use vitrine::{
    context::Context,
    exhibit::{Exhibit, ExhibitConstructor},
    render::Render,
};
#[cfg(feature = "integration-tests")]
use wgpu::Color;

#[cfg(feature = "integration-tests")]
use crate::common::test_utils::State;

mod common;

#[cfg(feature = "integration-tests")]
struct GraphicsElement;

#[cfg(feature = "integration-tests")]
impl Exhibit<State> for GraphicsElement {
    fn on_init(&mut self, ctx: &mut Context, state: &mut State) {
        ctx.clear_colour = Color::TRANSPARENT;
        assert_eq!(state.frame_counter(), 0);
        assert_eq!(state.init_invocations(), 0);
        assert_eq!(state.click_invocations(), 0);
        assert_eq!(state.update_invocations(), 0);

        state.init();
    }

    fn on_click(&mut self, _: &Context, state: &mut State, _: u32) {
        state.click();
    }

    fn on_update(&mut self, _: &Context, state: &mut State, _: std::time::Duration) {
        // Exactly one init and one update per rendered frame
        assert_eq!(state.frame_counter(), state.update_invocations());
        assert_eq!(state.init_invocations(), 1);
        assert_eq!(state.click_invocations(), 0);
        state.frame();
        state.update();
    }

    fn on_window_events(&mut self, _: &Context, _: &mut State, _: &vitrine::WindowEvent) {}

    fn on_render(&self) -> Render<'_> {
        Render::None
    }

    fn render_to_texture(
        &self,
        _: &Context,
        state: &mut State,
        _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<RenderTestResult, anyhow::Error> {
        // Let a few update cycles run before the loop is allowed to end
        if state.frame_counter() >= 3 {
            Ok(RenderTestResult::Passed)
        } else {
            Ok(RenderTestResult::Waiting)
        }
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_run_hooks_in_order() {
    let constructor: ExhibitConstructor<State> =
        Box::new(|_| Box::pin(async move { Box::new(GraphicsElement) as Box<dyn Exhibit<_>> }));

    match vitrine::exhibit::run(vec![constructor]) {
        Ok(_) => (),
        Err(e) => {
            println!("{}", e);
            panic!("{}", e);
        }
    }
}
