//! Core types: math re-exports, linear algebra, camera, scene and game logic.
//! Renderer-agnostic; nothing here touches the GPU or the window system.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4, vec3};

pub mod camera;
pub mod game;
pub mod input;
pub mod linalg;
pub mod scene;
pub mod table;
pub mod time;
pub mod transform;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("too many {what}: capacity is {capacity}")]
    CapacityExceeded { what: &'static str, capacity: usize },
    #[error("model id {model} out of range ({models} models loaded)")]
    UnknownModel { model: usize, models: usize },
}

pub type SceneResult<T> = Result<T, SceneError>;
