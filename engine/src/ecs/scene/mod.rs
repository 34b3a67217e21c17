//! The scene: the authoritative collection of live entities.
//!
//! ## Lifecycle
//!
//! ```text
//! add_entity ──► CommandBuffer ──(update: commit)──► live ──► destroy ──► (update or sweep) dropped
//! ```
//!
//! Every tick [`Scene::update`] first commits the pending commands (adds, then removals), then makes
//! a single pass over the live entities: inactive ones are dropped in place and active ones are
//! advanced by `dt`. An entity added during a tick is therefore not updated until the tick after.
//!
//! ## Component index
//!
//! [`Scene::find_by_component`] answers "which live entities have a component of this kind". The
//! answer is built on first use and cached per kind. The cache is dropped on every structural
//! change (commit, sweep, clear), so a query never returns membership from before an add or a
//! removal. Attaching a component to an entity that is already live is not a structural change;
//! callers doing that call [`Scene::invalidate_index`].

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use crate::{
    ecs::{
        component::{Kind, Typed},
        entity,
    },
    render::Renderer,
};

mod command;

pub use command::{Command, CommandBuffer};

/// What a commit changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub added: usize,
    pub removed: usize,
}

pub struct Scene {
    name: String,
    entities: Vec<entity::Ref>,
    commands: CommandBuffer,
    initialized: bool,
    index: DashMap<Kind, Arc<[entity::Ref]>>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            commands: CommandBuffer::new(),
            initialized: false,
            index: DashMap::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an entity to become live at the next [`update`](Scene::update).
    pub fn add_entity(&self, entity: entity::Ref) {
        self.commands.push(Command::Add(entity));
    }

    /// Queue the removal of a live entity at the next [`update`](Scene::update). The entity is not
    /// destroyed, it only leaves the scene.
    pub fn remove_entity(&self, id: entity::Id) {
        self.commands.push(Command::Remove(id));
    }

    /// Initialize every live entity and mark the scene initialized. Entities committed afterwards
    /// are initialized as they go live.
    pub fn initialize(&mut self) {
        for entity in &self.entities {
            entity.initialize();
        }
        self.initialized = true;
        debug!("scene `{}` initialized with {} entities", self.name, self.entities.len());
    }

    /// Commit pending commands, drop inactive entities and update the rest.
    pub fn update(&mut self, dt: f32) -> Commit {
        let commit = self.commit();

        let before = self.entities.len();
        self.entities.retain(|entity| {
            if entity.is_active() {
                entity.update(dt);
                true
            } else {
                false
            }
        });

        if commit != Commit::default() || self.entities.len() != before {
            self.invalidate_index();
        }
        commit
    }

    /// Apply the commands queued so far without updating anything.
    fn commit(&mut self) -> Commit {
        let mut commit = Commit::default();
        let mut removals = Vec::new();

        for command in self.commands.drain() {
            match command {
                Command::Add(entity) => {
                    if self.initialized {
                        entity.initialize();
                    }
                    self.entities.push(entity);
                    commit.added += 1;
                }
                Command::Remove(id) => removals.push(id),
            }
        }

        if !removals.is_empty() {
            let before = self.entities.len();
            self.entities.retain(|entity| !removals.contains(&entity.id()));
            commit.removed = before - self.entities.len();
        }

        if commit != Commit::default() {
            debug!(
                "scene `{}` committed {} adds, {} removals",
                self.name, commit.added, commit.removed
            );
        }
        commit
    }

    /// Draw every active live entity in order.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        for entity in &self.entities {
            if entity.is_active() {
                entity.render(renderer);
            }
        }
    }

    /// Drop inactive entities from the live collection now. Returns how many were dropped.
    pub fn sweep(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|entity| entity.is_active());
        let swept = before - self.entities.len();
        if swept > 0 {
            self.invalidate_index();
        }
        swept
    }

    /// Live entities with a component of the given kind, in live order.
    pub fn find_by_component(&self, kind: Kind) -> Arc<[entity::Ref]> {
        if let Some(cached) = self.index.get(&kind) {
            return Arc::clone(cached.value());
        }

        let matches: Arc<[entity::Ref]> = self
            .entities
            .iter()
            .filter(|entity| entity.has(kind))
            .cloned()
            .collect();
        self.index.insert(kind, Arc::clone(&matches));
        matches
    }

    /// Copies of every live component of type `T`, in live order.
    pub fn get_components<T: Typed + Clone>(&self) -> Vec<T> {
        self.find_by_component(T::KIND)
            .iter()
            .filter_map(|entity| entity.get::<T>())
            .collect()
    }

    /// Drop the cached component index.
    pub fn invalidate_index(&self) {
        self.index.clear();
    }

    /// Drop every live and pending entity without destroying them.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.commands.clear();
        self.invalidate_index();
    }

    /// The live collection.
    pub fn entities(&self) -> &[entity::Ref] {
        &self.entities
    }

    /// The live entity with the given id.
    pub fn find(&self, id: entity::Id) -> Option<&entity::Ref> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Commands waiting for the next commit.
    pub fn pending(&self) -> usize {
        self.commands.len()
    }
}
