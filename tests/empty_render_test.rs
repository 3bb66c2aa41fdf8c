#[cfg(feature = "integration-tests")]
use wgpu::Color;

#[cfg(feature = "integration-tests")]
use crate::common::test_utils::TestRender;
#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use vitrine::{
        context::{Context, InitContext},
        exhibit::RenderTestResult,
    };

    render_test!(async move |_: InitContext| {
        TestRender {
            node: None,
            lit: false,
            setup: |ctx: &mut Context, _: &mut FrameCounter| {
                ctx.clear_colour = Color::WHITE;
            },
            validate: |_, state: &mut FrameCounter, texture| {
                if state.frame() > 0 {
                    let desired_pixel = image::Rgba([255u8, 255, 255, 255]);
                    for pixel in texture.pixels() {
                        assert_eq!(*pixel, desired_pixel);
                    }
                    Ok(RenderTestResult::Passed)
                } else {
                    Ok(RenderTestResult::Waiting)
                }
            },
        }
    });
}
