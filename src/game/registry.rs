//! Entity registry
//!
//! Single owner of every live entity. Keeps the typed views (moving, players,
//! grenades) and the spatial grid consistent with the master map: every
//! mutation that can move or resize an entity goes through [`EntityRegistry::update`]
//! or [`EntityRegistry::advance`], which re-bucket the grid from the stored
//! footprint.

use hashbrown::HashMap;
use rayon::prelude::*;
use rustc_hash::FxBuildHasher;

use crate::config::{ConfigError, WorldConfig};
use crate::game::entity::{Entity, EntityId, EntityTag, PlayerId};
use crate::game::spatial::{EntitySet, Footprint, Rect, SpatialGrid};
use crate::game::systems::physics::{self, Bounds, DampedStep};

const TAG_SLOTS: usize = 5;

#[inline]
fn tag_slot(tag: EntityTag) -> usize {
    match tag {
        EntityTag::Food => 0,
        EntityTag::Amoeba => 1,
        EntityTag::Player => 2,
        EntityTag::GravityGrenade => 3,
        EntityTag::Powerup => 4,
    }
}

#[derive(Debug)]
pub struct EntityRegistry {
    grid: SpatialGrid,
    entities: HashMap<EntityId, Entity, FxBuildHasher>,
    /// All entities in insertion order (render order)
    objects: Vec<EntityId>,
    moving: Vec<EntityId>,
    players: Vec<EntityId>,
    grenades: Vec<EntityId>,
    tag_counts: [usize; TAG_SLOTS],
    next_id: EntityId,
    bounds: Bounds,
}

impl EntityRegistry {
    pub fn new(world: &WorldConfig) -> Result<Self, ConfigError> {
        let grid = SpatialGrid::from_config(world)?;
        Ok(Self {
            grid,
            entities: HashMap::with_hasher(FxBuildHasher),
            objects: Vec::new(),
            moving: Vec::new(),
            players: Vec::new(),
            grenades: Vec::new(),
            tag_counts: [0; TAG_SLOTS],
            next_id: 1,
            bounds: Bounds::new(world.width, world.height),
        })
    }

    /// Register an entity, assigning it a fresh id
    pub fn append(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;

        let tag = entity.tag();
        let caps = tag.capabilities();

        self.grid.add(id, entity.footprint());
        self.objects.push(id);
        if caps.moving {
            self.moving.push(id);
        }
        if caps.player {
            self.players.push(id);
        }
        if caps.emitter {
            self.grenades.push(id);
        }
        self.tag_counts[tag_slot(tag)] += 1;
        self.entities.insert(id, entity);

        tracing::trace!("Appended {:?} entity {}", tag, id);
        id
    }

    /// Unregister an entity from the grid (using its stored footprint) and every view.
    /// Unknown ids are a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        self.grid.remove(id, entity.footprint());

        let caps = entity.capabilities();
        self.objects.retain(|&other| other != id);
        if caps.moving {
            self.moving.retain(|&other| other != id);
        }
        if caps.player {
            self.players.retain(|&other| other != id);
        }
        if caps.emitter {
            self.grenades.retain(|&other| other != id);
        }
        self.tag_counts[tag_slot(entity.tag())] -= 1;

        Some(entity)
    }

    /// Remove a batch of entities with one pass over each view.
    /// Returns the removed entities in insertion order.
    pub fn remove_all(&mut self, ids: &EntitySet) -> Vec<Entity> {
        if ids.is_empty() {
            return Vec::new();
        }

        let mut removed = Vec::with_capacity(ids.len());
        let entities = &mut self.entities;
        let grid = &mut self.grid;
        let tag_counts = &mut self.tag_counts;
        self.objects.retain(|id| {
            if !ids.contains(id) {
                return true;
            }
            if let Some(entity) = entities.remove(id) {
                grid.remove(*id, entity.footprint());
                tag_counts[tag_slot(entity.tag())] -= 1;
                removed.push(entity);
            }
            false
        });

        self.moving.retain(|id| !ids.contains(id));
        self.players.retain(|id| !ids.contains(id));
        self.grenades.retain(|id| !ids.contains(id));

        removed
    }

    #[inline]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Mutate an entity in place and re-bucket it if its footprint changed.
    ///
    /// The closure must not change the entity's variant; typed views are keyed
    /// on the tag it was appended with.
    pub fn update<R>(&mut self, id: EntityId, f: impl FnOnce(&mut Entity) -> R) -> Option<R> {
        let entity = self.entities.get_mut(&id)?;
        let old = entity.footprint();
        let result = f(entity);
        entity.position = entity.position.clamp(self.bounds.min, self.bounds.max);
        let new = entity.footprint();
        debug_assert_eq!(entity.id, id);
        if old != new {
            self.grid.relocate(id, old, new);
        }
        Some(result)
    }

    /// Integrate every moving entity over `dt` and re-bucket those that moved.
    pub fn advance(&mut self, dt: f32, damping_rate: f32) {
        if dt <= 0.0 {
            return;
        }
        let step = DampedStep::new(damping_rate, dt);
        let bounds = self.bounds;

        // Integration is independent per entity; grid writes stay sequential
        let moved: Vec<(EntityId, Footprint, Footprint)> = self
            .entities
            .par_values_mut()
            .filter(|entity| entity.capabilities().moving)
            .filter_map(|entity| {
                let old = entity.footprint();
                physics::integrate(entity, &step, &bounds).then(|| (entity.id, old, entity.footprint()))
            })
            .collect();

        for (id, old, new) in moved {
            self.grid.relocate(id, old, new);
        }
    }

    /// Broad-phase lookup; the result is a superset of the true overlaps
    #[inline]
    pub fn query(&self, rect: &Rect) -> EntitySet {
        self.grid.query(rect)
    }

    #[inline]
    pub fn query_into(&self, rect: &Rect, out: &mut EntitySet) {
        self.grid.query_into(rect, out)
    }

    /// Entities in insertion order
    pub fn objects(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.objects.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn object_ids(&self) -> &[EntityId] {
        &self.objects
    }

    pub fn moving_ids(&self) -> &[EntityId] {
        &self.moving
    }

    pub fn player_ids(&self) -> &[EntityId] {
        &self.players
    }

    pub fn grenade_ids(&self) -> &[EntityId] {
        &self.grenades
    }

    pub fn players(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.players.iter().filter_map(|id| self.entities.get(id))
    }

    /// Entity currently embodying `player_id`, if the player is alive
    pub fn player_entity(&self, player_id: PlayerId) -> Option<&Entity> {
        self.players()
            .find(|e| e.as_player().is_some_and(|p| p.player_id == player_id))
    }

    #[inline]
    pub fn count(&self, tag: EntityTag) -> usize {
        self.tag_counts[tag_slot(tag)]
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
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[inline]
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }
}
