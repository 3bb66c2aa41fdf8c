#[cfg(feature = "integration-tests")]
use wgpu::Color;

#[cfg(feature = "integration-tests")]
use crate::common::test_utils::TestRender;
#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_a_green_face_in_the_centre() {
    use cgmath::Deg;
    use vitrine::{
        camera::Camera,
        context::{Context, InitContext},
        exhibit::RenderTestResult,
        scene::{node::ModelNode, primitives::cuboid},
    };

    render_test!(async move |ctx: InitContext| {
        let model = cuboid(&ctx.device, &ctx.queue, 2.0, [0, 255, 0, 255]);
        let cube = ModelNode::from_model(1, &ctx.device, model);
        TestRender {
            node: Some(Box::new(cube)),
            lit: false,
            setup: |ctx: &mut Context, _: &mut FrameCounter| {
                ctx.clear_colour = Color::WHITE;
                ctx.camera.camera = Camera::new((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
                ctx.projection.set_fovy(Deg(75.0));
            },
            validate: |_, state: &mut FrameCounter, texture| {
                if state.frame() > 0 {
                    // The cube face fills the middle of the frame, the
                    // corners show the backdrop
                    let (width, height) = texture.dimensions();
                    let centre = texture.get_pixel(width / 2, height / 2);
                    assert_eq!(*centre, image::Rgba([0u8, 255, 0, 255]));
                    let corner = texture.get_pixel(0, 0);
                    assert_eq!(*corner, image::Rgba([255u8, 255, 255, 255]));
                    Ok(RenderTestResult::Passed)
                } else {
                    Ok(RenderTestResult::Waiting)
                }
            },
        }
    });
}
