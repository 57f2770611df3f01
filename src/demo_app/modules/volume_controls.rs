use rand::Rng;
use strum::IntoEnumIterator;
use winit::event::VirtualKeyCode;

use sdf_volume::{
    framework::{
        math::Transform,
        updater::{InputUpdateResult, UpdateContext, UpdateResultAction, UpdaterModule},
    },
    sdf::{AmbientOcclusionMode, Primitive, PrimitiveId, SceneDescription},
    SdfError, error, info, warn,
};

use crate::demo_app::scene::Scene;

use super::ContinuousRotation;

const SMOOTHING_STEP: f32 = 0.01;

/// Keyboard controls changing the population and configuration of the volume.
///
/// | key          | action                                      |
/// |--------------|---------------------------------------------|
/// | `N`          | spawn a random primitive                    |
/// | `Tab`        | select next primitive                       |
/// | `E`          | enable / disable selected primitive         |
/// | `C`          | recolor selected primitive                  |
/// | `R`          | resize selected primitive                   |
/// | `Delete`     | destroy selected primitive                  |
/// | `A`          | cycle ambient occlusion mode                |
/// | `S`          | toggle shadows                              |
/// | `Up`, `Down` | change smoothing                            |
/// | `P`          | print the scene description                 |
#[derive(Debug, Default)]
pub struct VolumeControls;

impl UpdaterModule<Scene> for VolumeControls {
    #[profiling::function]
    fn input(&mut self, context: &mut UpdateContext<Scene>) -> InputUpdateResult {
        let input = context.input;
        let scene = &mut *context.scene;

        let result = if input.key_pressed(VirtualKeyCode::N) {
            spawn_random(scene).map(|_| true)
        } else if input.key_pressed(VirtualKeyCode::Tab) {
            select_next(scene);
            Ok(false)
        } else if input.key_pressed(VirtualKeyCode::E) {
            toggle_selected(scene)
        } else if input.key_pressed(VirtualKeyCode::C) {
            with_selected(scene, |primitive| primitive.set_color(random_color()));
            Ok(true)
        } else if input.key_pressed(VirtualKeyCode::R) {
            with_selected(scene, |primitive| {
                let params = primitive.params() * rand::thread_rng().gen_range(0.7_f32..1.3);
                primitive.set_params(params);
            });
            Ok(true)
        } else if input.key_pressed(VirtualKeyCode::Delete) {
            destroy_selected(scene)
        } else if input.key_pressed(VirtualKeyCode::A) {
            let current = scene.volume.config().ambient_occlusion;
            let next = AmbientOcclusionMode::iter()
                .cycle()
                .skip_while(|mode| *mode != current)
                .nth(1)
                .unwrap_or_default();
            info!("Ambient occlusion: {}", next.as_ref());
            scene.volume.set_ambient_occlusion(next).map(|_| true)
        } else if input.key_pressed(VirtualKeyCode::S) {
            let shadows = !scene.volume.config().shadows;
            info!("Shadows: {}", shadows);
            scene.volume.set_shadows(shadows).map(|_| true)
        } else if input.key_pressed(VirtualKeyCode::Up) {
            let smoothing = scene.volume.config().smoothing() + SMOOTHING_STEP;
            scene.volume.set_smoothing(smoothing).map(|_| true)
        } else if input.key_pressed(VirtualKeyCode::Down) {
            let smoothing = scene.volume.config().smoothing() - SMOOTHING_STEP;
            scene.volume.set_smoothing(smoothing).map(|_| true)
        } else if input.key_pressed(VirtualKeyCode::P) {
            print_scene(scene);
            Ok(false)
        } else {
            Ok(false)
        };

        match result {
            Ok(true) => InputUpdateResult { handled: false, result: UpdateResultAction::Redraw },
            Ok(false) => InputUpdateResult::default(),
            Err(volume_error @ SdfError::ResourceExhausted { .. }) => {
                error!("Volume cannot grow any further, exiting: {}", volume_error);
                InputUpdateResult { handled: true, result: UpdateResultAction::Exit }
            },
            Err(volume_error) => {
                warn!("Volume change failed: {}", volume_error);
                InputUpdateResult::default()
            },
        }
    }
}

fn random_color() -> glam::Vec4 {
    let mut rng = rand::thread_rng();
    glam::vec4(rng.gen_range(0.1..1.0), rng.gen_range(0.1..1.0), rng.gen_range(0.1..1.0), 1.0)
}

fn spawn_random(scene: &mut Scene) -> sdf_volume::Result<PrimitiveId> {
    let mut rng = rand::thread_rng();
    let size = rng.gen_range(0.2..0.7);
    let primitive = match rng.gen_range(0..3) {
        0 => Primitive::sphere(size),
        1 => Primitive::torus(size, size * 0.3),
        _ => Primitive::cuboid(glam::Vec3::splat(size)),
    };
    let position = glam::vec3(rng.gen_range(-3.0..3.0), rng.gen_range(0.0..2.0), rng.gen_range(-3.0..3.0));
    let id = scene.volume.spawn(
        primitive
            .with_color(random_color())
            .with_transform(Transform::from_position(position))
    )?;
    scene.rotations.insert(id, ContinuousRotation::random());
    scene.selected = Some(id);
    info!("Spawned primitive {:?}, {} registered", id, scene.volume.len());
    Ok(id)
}

/// Cycles through all primitives, including disabled ones.
fn select_next(scene: &mut Scene) {
    let keys = scene.volume.primitives().keys().collect::<Vec<_>>();
    let next = match scene.selected.and_then(|selected| keys.iter().position(|id| *id == selected)) {
        Some(position) => keys.get((position + 1) % keys.len()).copied(),
        None           => keys.first().copied(),
    };
    scene.selected = next;
    if let Some((id, primitive)) = next.and_then(|id| Some((id, scene.volume.primitive(id)?))) {
        let state = if scene.volume.is_registered(id) { "enabled" } else { "disabled" };
        info!("Selected {} ({})", primitive.kind().as_ref(), state);
    }
}

fn toggle_selected(scene: &mut Scene) -> sdf_volume::Result<bool> {
    let Some(id) = scene.selected else {
        return Ok(false);
    };
    let enabled = !scene.volume.is_registered(id);
    scene.volume.set_enabled(id, enabled)
}

fn with_selected(scene: &mut Scene, change: impl FnOnce(&mut Primitive)) {
    if let Some(primitive) = scene.selected.and_then(|id| scene.volume.primitive_mut(id)) {
        change(primitive);
    }
}

fn destroy_selected(scene: &mut Scene) -> sdf_volume::Result<bool> {
    let Some(id) = scene.selected.take() else {
        return Ok(false);
    };
    let destroyed = scene.volume.destroy(id)?;
    scene.rotations.remove(id);
    if let Some(primitive) = destroyed {
        info!("Destroyed {}, {} registered", primitive.kind().as_ref(), scene.volume.len());
    }
    select_next(scene);
    Ok(true)
}

fn print_scene(scene: &Scene) {
    let description = SceneDescription::capture(&scene.volume);
    match description.to_json() {
        Ok(json) => info!("Scene description:\n{}", json),
        Err(json_error) => warn!("Cannot serialize scene: {}", json_error),
    }
}
