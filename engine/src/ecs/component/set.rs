use log::warn;

use crate::{
    ecs::{
        component::{Component, Kind, Render, Transform, Typed},
        entity,
    },
    render::Renderer,
};

/// A component held by a [`Set`] along with its enabled flag.
#[derive(Debug, Clone)]
struct Slot {
    component: Component,
    enabled: bool,
}

/// The components owned by a single entity.
///
/// A set holds at most one component of each [`Kind`]. Components are stored in a fixed slot per
/// kind, which lets a physics update borrow the sibling transform mutably, while `order` remembers
/// attach order for update and render iteration.
///
/// The owner is fixed when the set is created. There is no way to detach a component or move it
/// into another set, so a component belongs to exactly one entity for its whole life.
#[derive(Debug, Clone)]
pub struct Set {
    owner: entity::Id,
    slots: [Option<Slot>; Kind::COUNT],
    order: Vec<Kind>,
}

impl Set {
    /// Construct an empty set owned by the given entity.
    pub fn new(owner: entity::Id) -> Self {
        Self {
            owner,
            slots: [None, None, None],
            order: Vec::with_capacity(Kind::COUNT),
        }
    }

    /// The entity that owns this set.
    #[inline]
    pub fn owner(&self) -> entity::Id {
        self.owner
    }

    /// Attach a component. Returns false, keeping the existing component, if one of the same kind
    /// is already attached.
    pub fn attach<T: Typed>(&mut self, component: T) -> bool {
        self.attach_component(component.into_component())
    }

    /// Attach a type-erased component. See [`attach`](Set::attach).
    pub fn attach_component(&mut self, component: Component) -> bool {
        let kind = component.kind();
        let slot = &mut self.slots[kind.index()];
        if slot.is_some() {
            warn!("{} already has a {kind} component, ignoring duplicate", self.owner);
            return false;
        }
        *slot = Some(Slot {
            component,
            enabled: true,
        });
        self.order.push(kind);
        true
    }

    /// Whether a component of the given kind is attached.
    #[inline]
    pub fn contains(&self, kind: Kind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Attached kinds in attach order.
    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.order.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get<T: Typed>(&self) -> Option<&T> {
        self.slots[T::KIND.index()]
            .as_ref()
            .and_then(|slot| T::from_component(&slot.component))
    }

    pub fn get_mut<T: Typed>(&mut self) -> Option<&mut T> {
        self.slots[T::KIND.index()]
            .as_mut()
            .and_then(|slot| T::from_component_mut(&mut slot.component))
    }

    /// Whether the component of the given kind is attached and enabled.
    pub fn is_enabled(&self, kind: Kind) -> bool {
        self.slots[kind.index()]
            .as_ref()
            .is_some_and(|slot| slot.enabled)
    }

    /// Enable or disable the component of the given kind. Returns false if none is attached.
    pub fn set_enabled(&mut self, kind: Kind, enabled: bool) -> bool {
        match self.slots[kind.index()].as_mut() {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Advance every enabled component by `dt`, in attach order.
    ///
    /// Only physics has per-tick work. A physics component without a sibling transform is left
    /// untouched.
    pub fn update(&mut self, dt: f32) {
        for index in 0..self.order.len() {
            match self.order[index] {
                Kind::Physics => {
                    let [transform, physics, _] = &mut self.slots;
                    let Some(Slot {
                        component: Component::Physics(physics),
                        enabled: true,
                    }) = physics
                    else {
                        continue;
                    };
                    let transform = transform
                        .as_mut()
                        .and_then(|slot| Transform::from_component_mut(&mut slot.component));
                    physics.integrate(dt, transform);
                }
                Kind::Transform | Kind::Render => {}
            }
        }
    }

    /// Draw every enabled component, in attach order.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        for kind in self.kinds() {
            if kind != Kind::Render || !self.is_enabled(kind) {
                continue;
            }
            if let Some(render) = self.get::<Render>() {
                render.draw(self.get::<Transform>(), renderer);
            }
        }
    }

    /// Disable and drop every component.
    pub fn destroy(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.enabled = false;
        }
        self.slots = [None, None, None];
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ecs::component::Physics,
        math::Vector,
        render::{Color, Recorder},
    };

    fn owner() -> entity::Id {
        entity::Id::from(7)
    }

    #[test]
    fn test_at_most_one_per_kind() {
        let mut set = Set::new(owner());
        assert!(set.attach(Transform::at(Vector::new(1.0, 1.0))));
        assert!(!set.attach(Transform::at(Vector::new(2.0, 2.0))));

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get::<Transform>().map(|t| t.position()),
            Some(Vector::new(1.0, 1.0))
        );
        assert_eq!(set.owner(), owner());
    }

    #[test]
    fn test_attach_order_is_kept() {
        let mut set = Set::new(owner());
        set.attach(Render::default());
        set.attach(Physics::default());
        set.attach(Transform::default());

        assert_eq!(
            set.kinds().collect::<Vec<_>>(),
            vec![Kind::Render, Kind::Physics, Kind::Transform]
        );
    }

    #[test]
    fn test_update_moves_transform() {
        let mut set = Set::new(owner());
        set.attach(Physics::new(1.0).with_friction(1.0).with_velocity(Vector::new(10.0, 0.0)));
        set.attach(Transform::default());

        set.update(0.5);

        assert_eq!(
            set.get::<Transform>().map(|t| t.position()),
            Some(Vector::new(5.0, 0.0))
        );
    }

    #[test]
    fn test_physics_without_transform_is_silent() {
        let mut set = Set::new(owner());
        set.attach(Physics::new(1.0).with_velocity(Vector::new(10.0, 0.0)));

        set.update(1.0);

        // Untouched: no friction applied either
        assert_eq!(
            set.get::<Physics>().map(|p| p.velocity()),
            Some(Vector::new(10.0, 0.0))
        );
    }

    #[test]
    fn test_disabled_components_do_not_update_or_render() {
        let mut set = Set::new(owner());
        set.attach(Transform::default());
        set.attach(Physics::new(1.0).with_velocity(Vector::new(10.0, 0.0)));
        set.attach(Render::rect(Vector::new(1.0, 1.0), Color::WHITE));

        assert!(set.set_enabled(Kind::Physics, false));
        assert!(set.set_enabled(Kind::Render, false));
        set.update(1.0);

        let mut recorder = Recorder::new();
        recorder.begin_frame();
        set.render(&mut recorder);
        recorder.end_frame();

        assert_eq!(set.get::<Transform>().map(|t| t.position()), Some(Vector::ZERO));
        assert!(recorder.last_frame().is_empty());
    }

    #[test]
    fn test_destroy_clears() {
        let mut set = Set::new(owner());
        set.attach(Transform::default());
        set.attach(Render::default());

        set.destroy();

        assert!(set.is_empty());
        assert!(!set.contains(Kind::Transform));
        assert!(!set.is_enabled(Kind::Render));
        assert!(!set.set_enabled(Kind::Render, true));
    }
}
