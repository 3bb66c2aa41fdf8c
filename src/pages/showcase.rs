//! The product showcase: a vintage camera, a microphone and an old TV set
//! under a studio light rig.
//!
//! Clicking a piece sends it to centre stage and parks the other two far
//! behind the lights. Scrolling spins the staged piece, and deep in the page
//! a scroll band slides it out of the frame.

use std::f32::consts::FRAC_PI_3;

use anyhow::Result;
use cgmath::{Deg, Point3, Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use winit::event::{MouseScrollDelta, WindowEvent};

use crate::{
    camera::Camera,
    context::{Context, InitContext, hex_colour},
    exhibit::{Exhibit, ExhibitConstructor},
    pipelines::lights::{DirectionalLight, HemisphereLight, LightsUniform, SpotLight},
    render::Render,
    resources::load_model_gltf,
    scene::{
        node::{ContainerNode, SceneNode},
        transform::Transform,
    },
    scroll::{PIXELS_PER_LINE, ScrollFeed, Spin},
    staging::{self, Staging},
};

pub const CAMERA_ID: u32 = 1;
pub const MICROPHONE_ID: u32 = 2;
pub const TELEVISION_ID: u32 = 3;

const BACKDROP: u32 = 0xdddddd;
const EXPOSURE: f32 = 2.3;

/// Scroll speed in pixels per sample maps to radians per frame.
const SCROLL_TO_SPIN: f64 = 1000.0;

/// One showcased object: the loaded model wrapped in a container that
/// carries its placement on the stage.
struct Piece {
    node: Box<dyn SceneNode>,
    id: u32,
}

async fn load_piece(
    ctx: &InitContext,
    id: u32,
    path: &str,
    scale: f32,
    position: Vector3<f32>,
    yaw: Rad<f32>,
    lift: Option<f32>,
) -> Result<Piece> {
    let mut loaded = load_model_gltf(path, id, &ctx.device, &ctx.queue).await?;
    // Some assets sit off-centre, the lift raises the first scene node in
    // its parent's (unscaled) units
    if let Some(lift) = lift {
        let mut transform = loaded.get_local_transform();
        transform.position.y = lift;
        loaded.set_local_transform(transform);
    }

    let mut container = ContainerNode::new();
    container.set_local_transform(Transform {
        position,
        rotation: Quaternion::from_angle_y(yaw),
        scale: Vector3::new(scale, scale, scale),
    });
    container.add_child(loaded);

    let mut node: Box<dyn SceneNode> = Box::new(container);
    node.set_casts_shadow(true);
    node.update_world_transform_all();
    Ok(Piece { node, id })
}

pub struct ShowcasePage {
    pieces: Vec<Piece>,
    staging: Staging,
    scroll: ScrollFeed,
    spin: Spin,
}

/// Build the page and load all three models.
///
/// A piece that fails to load is dropped from the showcase rather than
/// taking the whole page down with it.
pub fn constructor() -> ExhibitConstructor<()> {
    Box::new(|ctx: InitContext| {
        Box::pin(async move {
            let loads = [
                load_piece(
                    &ctx,
                    CAMERA_ID,
                    "models/vintage_camera/scene.gltf",
                    0.07,
                    Vector3::new(0.0, 0.0, 0.0),
                    Rad(0.0),
                    Some(75.0),
                ),
                load_piece(
                    &ctx,
                    MICROPHONE_ID,
                    "models/microphone/scene.gltf",
                    10.0,
                    Vector3::new(-22.0, 0.0, 0.0),
                    Rad(0.785398),
                    None,
                ),
                load_piece(
                    &ctx,
                    TELEVISION_ID,
                    "models/1980_tv/scene.gltf",
                    10.0,
                    Vector3::new(22.0, 0.0, 0.0),
                    Rad(-0.2),
                    None,
                ),
            ];
            let pieces = futures::future::join_all(loads)
                .await
                .into_iter()
                .filter_map(|piece| match piece {
                    Ok(piece) => Some(piece),
                    Err(e) => {
                        log::error!("Dropping a showcase piece: {}", e);
                        None
                    }
                })
                .collect();

            Box::new(ShowcasePage {
                pieces,
                staging: Staging::new(),
                scroll: ScrollFeed::new(),
                spin: Spin::new(),
            }) as Box<dyn Exhibit<()>>
        })
    })
}

/// Convert a wheel delta to page pixels. Wheel down scrolls the page down,
/// so the page offset grows.
fn wheel_to_pixels(delta: &MouseScrollDelta) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -f64::from(*y) * PIXELS_PER_LINE,
        MouseScrollDelta::PixelDelta(position) => -position.y,
    }
}

impl Exhibit<()> for ShowcasePage {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) {
        ctx.clear_colour = hex_colour(BACKDROP);
        ctx.camera.camera = Camera::new((0.0, 20.0, 60.0), (0.0, 0.0, 0.0));
        ctx.projection.set_fovy(Deg(45.0));

        let rig = LightsUniform::new(
            HemisphereLight {
                sky_colour: 0xc7c1e1,
                ground_colour: 0x724d4d,
                intensity: 1.0,
            },
            DirectionalLight {
                colour: 0xe2f3ff,
                intensity: 2.0,
                position: Point3::new(-50.0, 50.0, 30.0),
                shadow_extent: 60.0,
            },
            SpotLight {
                colour: 0xffffff,
                intensity: 1.0,
                position: Point3::new(80.0, 15.0, 30.0),
                cone_angle: Rad(FRAC_PI_3),
            },
            EXPOSURE,
        );
        ctx.lighting.update(&ctx.queue, rig);

        for piece in self.pieces.iter_mut() {
            piece.node.update_world_transform_all();
            piece.node.write_to_buffers(&ctx.queue);
        }
    }

    fn on_click(&mut self, _: &Context, _: &mut (), id: u32) {
        let Some(index) = self.pieces.iter().position(|piece| piece.id == id) else {
            return;
        };
        let positions: Vec<Vector3<f32>> = self
            .pieces
            .iter()
            .map(|piece| piece.node.get_local_transform().position)
            .collect();
        self.staging.focus(index, &positions);
        // Selecting a piece jumps the page back to the top
        self.scroll.reset();
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), dt: Duration) {
        for (index, position) in self.staging.advance(dt) {
            if let Some(piece) = self.pieces.get_mut(index) {
                let mut transform = piece.node.get_local_transform();
                transform.position = position;
                piece.node.set_local_transform(transform);
            }
        }

        if let Some(piece) = self
            .staging
            .focused()
            .and_then(|index| self.pieces.get_mut(index))
        {
            let mut transform = piece.node.get_local_transform();
            transform.yaw_by(Rad(self.spin.velocity() as f32));
            piece.node.set_local_transform(transform);
        }
        self.spin.decay();

        for piece in self.pieces.iter_mut() {
            piece.node.update_world_transform_all();
            piece.node.write_to_buffers(&ctx.queue);
        }
    }

    fn on_window_events(&mut self, _: &Context, _: &mut (), event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            let speed = self.scroll.apply_wheel(wheel_to_pixels(delta));
            self.spin.set(speed / SCROLL_TO_SPIN);

            if let Some(piece) = self
                .staging
                .focused()
                .and_then(|index| self.pieces.get_mut(index))
            {
                if let Some(x) = staging::slide_offset(self.scroll.offset()) {
                    let mut transform = piece.node.get_local_transform();
                    transform.position.x = x as f32;
                    piece.node.set_local_transform(transform);
                }
            }
        }
    }

    fn on_render(&self) -> Render<'_> {
        Render::Lits(
            self.pieces
                .iter()
                .flat_map(|piece| piece.node.get_render())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    #[test]
    fn wheel_down_scrolls_the_page_down() {
        let lines = MouseScrollDelta::LineDelta(0.0, -3.0);
        assert_eq!(wheel_to_pixels(&lines), 300.0);

        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -120.0));
        assert_eq!(wheel_to_pixels(&pixels), 120.0);
    }

    #[test]
    fn wheel_up_scrolls_back_towards_the_top() {
        let lines = MouseScrollDelta::LineDelta(0.0, 2.0);
        assert_eq!(wheel_to_pixels(&lines), -200.0);
    }
}
