//! Entities: named, role-tagged owners of a component set.
//!
//! An [`Entity`] is shared as a [`Ref`] (`Arc<Entity>`) between the scene's live collection and the
//! group buffers used by the dispatcher. The component set sits behind a per-entity reader/writer
//! lock so a worker can update the entities of its own batch while other workers read theirs.
//!
//! # Lifecycle
//!
//! ```text
//! new ──► Scene::add_entity ──► (next update) live ──► destroy ──► swept from scene and groups
//! ```
//!
//! [`Entity::destroy`] atomically flips the `active` flag. Only the call that performs the
//! transition tears the components down and returns `true`, which is what gives removal its
//! exactly-once guarantee when several phases race to retire the same entity. Destroying does not
//! remove the entity from any collection, the owning scene or group does that.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use log::debug;
use parking_lot::RwLock;

use crate::{
    ecs::component::{self, Kind, Transform, Typed},
    math::Vector,
    render::Renderer,
};

/// A shared handle to an entity.
pub type Ref = Arc<Entity>;

/// Process-wide unique entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    /// Allocate the next unused id.
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// The behavior variant of an entity. Game rules select per-tick behavior by role rather than by
/// per-instance overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Driven by input.
    Player,
    /// Flies in a straight line and retires when it leaves the arena.
    Projectile,
    /// Steers toward the player.
    Pursuer,
    /// Static scenery.
    Decoration,
    /// No behavior beyond its components.
    Prop,
}

/// A simulated object.
pub struct Entity {
    id: Id,
    name: String,
    role: Role,
    active: AtomicBool,
    initialized: AtomicBool,
    components: RwLock<component::Set>,
}

impl Entity {
    /// Construct an active entity with no components.
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        let id = Id::next();
        Self {
            id,
            name: name.into(),
            role,
            active: AtomicBool::new(true),
            initialized: AtomicBool::new(false),
            components: RwLock::new(component::Set::new(id)),
        }
    }

    /// Builder form of [`attach`](Entity::attach).
    pub fn with<T: Typed>(self, component: T) -> Self {
        self.attach(component);
        self
    }

    /// Wrap into a shared [`Ref`].
    pub fn into_ref(self) -> Ref {
        Arc::new(self)
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Attach a component. Returns false if a component of the same kind is already attached.
    pub fn attach<T: Typed>(&self, component: T) -> bool {
        self.components.write().attach(component)
    }

    /// Whether a component of the given kind is attached.
    pub fn has(&self, kind: Kind) -> bool {
        self.components.read().contains(kind)
    }

    /// Attached kinds in attach order.
    pub fn kinds(&self) -> Vec<Kind> {
        self.components.read().kinds().collect()
    }

    /// A copy of the component of type `T`.
    pub fn get<T: Typed + Clone>(&self) -> Option<T> {
        self.components.read().get::<T>().cloned()
    }

    /// Read the component of type `T`. Returns `None` without calling `f` when it is missing.
    pub fn read<T: Typed, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.components.read().get::<T>().map(f)
    }

    /// Mutate the component of type `T`. Returns `None` without calling `f` when it is missing.
    pub fn write<T: Typed, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.components.write().get_mut::<T>().map(f)
    }

    /// Mutate the whole component set at once, e.g. to touch two sibling components together.
    pub fn write_components<R>(&self, f: impl FnOnce(&mut component::Set) -> R) -> R {
        f(&mut self.components.write())
    }

    /// The transform position, if the entity has a transform.
    pub fn position(&self) -> Option<Vector> {
        self.read::<Transform, _>(|transform| transform.position())
    }

    /// Enable or disable one component. Returns false if none of that kind is attached.
    pub fn set_enabled(&self, kind: Kind, enabled: bool) -> bool {
        self.components.write().set_enabled(kind, enabled)
    }

    /// Mark the entity initialized. Only the first call has an effect.
    pub fn initialize(&self) {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            debug!("initialized {} ({})", self.name, self.id);
        }
    }

    /// Advance every enabled component. Inactive entities do nothing.
    pub fn update(&self, dt: f32) {
        if !self.is_active() {
            return;
        }
        self.components.write().update(dt);
    }

    /// Draw every enabled component. Inactive entities draw nothing.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        if !self.is_active() {
            return;
        }
        self.components.read().render(renderer);
    }

    /// Deactivate the entity and destroy its components.
    ///
    /// Returns true only for the call that performed the transition. Repeated or concurrent calls
    /// after that are no-ops returning false.
    pub fn destroy(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.components.write().destroy();
        debug!("destroyed {} ({})", self.name, self.id);
        true
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("active", &self.is_active())
            .finish()
    }
}
