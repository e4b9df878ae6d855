//! Per-frame game logic: camera integration, entity animation, draw list.

use crate::camera::{Camera, Look};
use crate::input::InputState;
use crate::linalg::{mat4_mul_n, rad};
use crate::scene::{ModelId, Scene};
use crate::{Mat4, vec3};

/// Tunables for the fly camera and the scene animation.
#[derive(Clone, Copy, Debug)]
pub struct GameSettings {
    pub eye_height: f32,
    /// World units per second.
    pub move_speed: f32,
    /// Degrees per unit of mouse motion.
    pub look_sensitivity: f32,
    /// Degrees per second for spinning entities.
    pub rotation_speed_deg: f32,
    pub fov_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Linear RGBA.
    pub clear_color: [f64; 4],
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            eye_height: 1.0,
            move_speed: 5.0,
            look_sensitivity: 0.3,
            rotation_speed_deg: 90.0,
            fov_deg: 60.0,
            z_near: 0.01,
            z_far: 1000.0,
            clear_color: [0.01098, 0.01098, 0.01385, 1.0],
        }
    }
}

/// One indexed draw: which model, and its combined projection*view*model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub model: ModelId,
    pub mvp: Mat4,
}

pub struct Game {
    pub camera: Camera,
    pub look: Look,
    pub scene: Scene,
    /// Global switch for entity spin.
    pub rotate: bool,
    pub settings: GameSettings,
}

impl Game {
    /// Camera starts at eye height, three units back, looking at the origin column.
    pub fn new(scene: Scene, settings: GameSettings) -> Self {
        let h = settings.eye_height;
        let camera = Camera::new_perspective(
            vec3(0.0, h, 3.0),
            vec3(0.0, h, 0.0),
            rad(settings.fov_deg),
            settings.z_near,
            settings.z_far,
        );
        Self {
            camera,
            look: Look::default(),
            scene,
            rotate: true,
            settings,
        }
    }

    /// Advance one frame: spin entities, then integrate the camera.
    /// Consumes the accumulated mouse motion in `input`.
    pub fn update(&mut self, input: &mut InputState, dt: f32) {
        if self.rotate {
            self.scene.system_spin(dt, rad(self.settings.rotation_speed_deg));
        }
        self.update_camera(input, dt);
    }

    pub fn update_camera(&mut self, input: &mut InputState, dt: f32) {
        self.look
            .apply_mouse(input.take_mouse_delta(), self.settings.look_sensitivity);
        self.camera
            .fly(&self.look, input.move_axis(), self.settings.move_speed, dt);
    }

    /// Draw list for a viewport of the given aspect ratio (width / height).
    pub fn draw_calls(&self, aspect: f32) -> impl Iterator<Item = DrawCall> + '_ {
        let proj = self.camera.proj(aspect);
        let view = self.camera.view();
        self.scene.iter().map(move |e| DrawCall {
            model: e.model,
            mvp: mat4_mul_n(&[proj, view, e.transform.matrix()]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MoveKey;
    use crate::scene::Entity;
    use crate::transform::Transform;
    use crate::{Vec2, Vec3, Vec4};

    fn demo_game() -> Game {
        let mut scene = Scene::new(1);
        let placed = |x: f32, y: f32, yaw: f32| {
            let transform = Transform::from_position_yaw(vec3(x, y, 0.0), yaw);
            Entity::new(ModelId(0), transform)
        };
        scene.spawn(placed(2.5, 0.0, 15.0)).unwrap();
        scene.spawn(placed(0.0, 0.8, 0.0).spinning()).unwrap();
        Game::new(scene, GameSettings::default())
    }

    #[test]
    fn update_consumes_mouse_motion() {
        let mut game = demo_game();
        let mut input = InputState::new();
        input.add_mouse_delta(10.0, 0.0);
        game.update(&mut input, 1.0 / 60.0);
        assert!((game.look.yaw - 3.0).abs() < 1e-5);
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn walking_forward_moves_towards_origin() {
        let mut game = demo_game();
        let mut input = InputState::new();
        input.set_key(MoveKey::Forward, true);
        game.update(&mut input, 0.1);
        assert!(game.camera.position.abs_diff_eq(vec3(0.0, 1.0, 2.5), 1e-5));
        assert!(game.camera.target.abs_diff_eq(vec3(0.0, 1.0, 1.5), 1e-5));
    }

    #[test]
    fn rotation_switch_freezes_entities() {
        let mut game = demo_game();
        game.rotate = false;
        let before = game.scene.entity(1).unwrap().transform;
        game.update(&mut InputState::new(), 1.0);
        assert_eq!(game.scene.entity(1).unwrap().transform, before);
    }

    #[test]
    fn draw_calls_compose_projection_view_model() {
        let game = demo_game();
        let aspect = 1280.0 / 780.0;
        let calls: Vec<DrawCall> = game.draw_calls(aspect).collect();
        assert_eq!(calls.len(), 2);

        let expected = game.camera.proj(aspect)
            * game.camera.view()
            * game.scene.entity(0).unwrap().transform.matrix();
        assert!(calls[0].mvp.abs_diff_eq(expected, 1e-5));
        assert_eq!(calls[0].model, ModelId(0));
    }

    #[test]
    fn entity_in_front_of_camera_lands_inside_clip_volume() {
        let game = demo_game();
        let call = game.draw_calls(1.0).nth(1).unwrap();
        let clip = call.mvp * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = Vec3::new(clip.x, clip.y, clip.z) / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
