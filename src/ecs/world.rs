//! Agent world
//!
//! The world is the scene container: it constructs agents, owns their
//! components and tears them down. Each agent's controller is a component, so
//! no agent can reach into another agent's state.

use hecs::Entity;

use super::components::{Locomotion, Name, Transform};

/// Owns every agent and its components
pub struct World {
    pub inner: hecs::World,
}

impl World {
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn a named agent with a pose and a locomotion flag, then attach the
    /// caller's controller components.
    pub fn spawn_agent(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        controller: impl hecs::DynamicBundle,
    ) -> Entity {
        let mut builder = hecs::EntityBuilder::new();
        builder
            .add(Name::new(name))
            .add(transform)
            .add(Locomotion::default())
            .add_bundle(controller);
        self.inner.spawn(builder.build())
    }

    /// Borrow one component of an entity
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Find the first entity carrying the given name
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.inner
            .query::<&Name>()
            .iter()
            .find(|(_, n)| n.0 == name)
            .map(|(entity, _)| entity)
    }

    /// Name of an entity, or a placeholder for unnamed ones
    pub fn display_name(&self, entity: Entity) -> String {
        self.get::<Name>(entity)
            .map(|n| n.0.clone())
            .unwrap_or_else(|_| format!("{entity:?}"))
    }

    /// Iterate agents carrying the queried components
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
