//! Scene: a fixed table of entities, each placing one model in the world.

use crate::linalg::{Y_UP, quat_angle_axis};
use crate::table::FixedTable;
use crate::transform::Transform;
use crate::{SceneError, SceneResult};

pub const MAX_MODELS: usize = 4;
pub const MAX_ENTITIES: usize = 8;

/// Index into the renderer's model table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelId(pub usize);

/// Entity id (dense, index into the entity table).
pub type EntityId = usize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity {
    pub model: ModelId,
    pub transform: Transform,
    /// Spins about +Y while the scene rotation is enabled.
    pub spin: bool,
}

impl Entity {
    pub fn new(model: ModelId, transform: Transform) -> Self {
        Self {
            model,
            transform,
            spin: false,
        }
    }

    pub fn spinning(mut self) -> Self {
        self.spin = true;
        self
    }
}

/// Entities plus the number of live models they may reference.
#[derive(Clone, Debug)]
pub struct Scene {
    entities: FixedTable<Entity>,
    model_count: usize,
}

impl Scene {
    pub fn new(model_count: usize) -> Self {
        Self {
            entities: FixedTable::new("entities", MAX_ENTITIES),
            model_count,
        }
    }

    /// Add an entity. Fails if its model is not loaded or the table is full.
    pub fn spawn(&mut self, entity: Entity) -> SceneResult<EntityId> {
        if entity.model.0 >= self.model_count {
            return Err(SceneError::UnknownModel {
                model: entity.model.0,
                models: self.model_count,
            });
        }
        let id = self.entities.push(entity)?;
        log::debug!("spawned entity {id} with model {}", entity.model.0);
        Ok(id)
    }

    #[inline]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable access to a transform (for animation).
    #[inline]
    pub fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform> {
        self.entities.get_mut(id).map(|e| &mut e.transform)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn model_count(&self) -> usize {
        self.model_count
    }

    /// Rotate spinning entities about +Y by `speed_rad * dt`.
    pub fn system_spin(&mut self, dt: f32, speed_rad: f32) {
        let delta = quat_angle_axis(speed_rad * dt, Y_UP);
        for e in self.entities.iter_mut().filter(|e| e.spin) {
            e.transform.rotate_local(delta);
        }
    }
}
