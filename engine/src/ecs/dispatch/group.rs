use std::ops::Index;

use crate::ecs::entity;

/// An ordered buffer of entities that share a behavior, e.g. every live projectile.
///
/// Order is insertion order and is what makes collision tie-breaks deterministic. Members are
/// retired by [`Entity::destroy`](crate::ecs::entity::Entity::destroy) during a phase and leave the
/// group in the [`compact`](Group::compact) that closes the phase.
#[derive(Debug)]
pub struct Group {
    name: String,
    members: Vec<entity::Ref>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, entity: entity::Ref) {
        self.members.push(entity);
    }

    #[inline]
    pub fn members(&self) -> &[entity::Ref] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &entity::Ref> {
        self.members.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: entity::Id) -> bool {
        self.members.iter().any(|member| member.id() == id)
    }

    /// Drop inactive members, keeping the order of the rest. Returns how many were dropped.
    pub fn compact(&mut self) -> usize {
        let before = self.members.len();
        self.members.retain(|member| member.is_active());
        before - self.members.len()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

impl Index<usize> for Group {
    type Output = entity::Ref;

    fn index(&self, index: usize) -> &Self::Output {
        &self.members[index]
    }
}

impl Extend<entity::Ref> for Group {
    fn extend<I: IntoIterator<Item = entity::Ref>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}
