//! A spinning green cube on a slate backdrop. The smallest possible page,
//! useful as a smoke test for the render loop.

use cgmath::{Deg, Rad};
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    camera::Camera,
    context::{Context, InitContext, hex_colour},
    exhibit::{Exhibit, ExhibitConstructor},
    render::Render,
    scene::{
        node::{ModelNode, SceneNode},
        primitives::cuboid,
    },
};

const BACKDROP: u32 = 0x949db0;
const CUBE_COLOUR: [u8; 4] = [0, 255, 0, 255];
const CUBE_EDGE: f32 = 2.0;
const CUBE_ID: u32 = 1;
const TURN_PER_FRAME: f32 = 0.01;

pub struct CubePage {
    cube: ModelNode,
}

/// Build the page. The cube is generated, so there is nothing to load.
pub fn constructor() -> ExhibitConstructor<()> {
    Box::new(|ctx: InitContext| {
        Box::pin(async move {
            let model = cuboid(&ctx.device, &ctx.queue, CUBE_EDGE, CUBE_COLOUR);
            let cube = ModelNode::from_model(CUBE_ID, &ctx.device, model);
            Box::new(CubePage { cube }) as Box<dyn Exhibit<()>>
        })
    })
}

impl Exhibit<()> for CubePage {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) {
        ctx.clear_colour = hex_colour(BACKDROP);
        ctx.camera.camera = Camera::new((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        ctx.projection.set_fovy(Deg(75.0));
        self.cube.update_world_transform_all();
        self.cube.write_to_buffers(&ctx.queue);
    }

    fn on_click(&mut self, _: &Context, _: &mut (), _: u32) {}

    fn on_update(&mut self, ctx: &Context, _: &mut (), _: Duration) {
        let mut transform = self.cube.get_local_transform();
        transform.yaw_by(Rad(TURN_PER_FRAME));
        self.cube.set_local_transform(transform);
        self.cube.update_world_transform_all();
        self.cube.write_to_buffers(&ctx.queue);
    }

    fn on_window_events(&mut self, _: &Context, _: &mut (), _: &WindowEvent) {}

    fn on_render(&self) -> Render<'_> {
        Render::Unlits(self.cube.get_render())
    }
}
