//! Projectile against pursuer collision.
//!
//! Resolution runs in two steps. Detection is pure and runs through the dispatcher on the
//! collision pool: for each projectile it lists, in pursuer order, every pursuer closer than the
//! hit radius. Claiming is sequential: projectiles are walked in group order and each takes the
//! first candidate nobody claimed before it. The pairing therefore only depends on group order,
//! never on which worker finished first.

use fixedbitset::FixedBitSet;

use crate::{
    ecs::{
        dispatch::{BatchError, Dispatcher, Group, Pool},
        entity,
    },
    math::Vector,
};

/// A projectile and the pursuer it took out.
#[derive(Debug, Clone)]
pub struct Hit {
    pub projectile: entity::Ref,
    pub pursuer: entity::Ref,
}

/// The result of one collision pass.
#[derive(Debug, Default)]
pub struct Resolution {
    pub hits: Vec<Hit>,
    pub failures: Vec<BatchError>,
}

/// Detect and resolve collisions between two groups, destroying both members of every hit and
/// compacting both groups afterwards.
///
/// Projectiles whose detection failed take no part in this pass.
pub fn resolve(
    dispatcher: &Dispatcher,
    projectiles: &mut Group,
    pursuers: &mut Group,
    radius: f32,
) -> Resolution {
    if projectiles.is_empty() || pursuers.is_empty() {
        return Resolution::default();
    }

    let targets = snapshot(pursuers);
    let outcome = dispatcher.run(
        Pool::Collision,
        "collision",
        projectiles.members(),
        |projectile| candidates(projectile, &targets, radius),
    );

    let mut claimed = FixedBitSet::with_capacity(targets.len());
    let mut hits = Vec::new();
    for (index, candidates) in outcome.completed() {
        let Some(target) = candidates.iter().copied().find(|&c| !claimed.contains(c)) else {
            continue;
        };
        claimed.insert(target);

        let projectile = &projectiles[index];
        let pursuer = &pursuers[target];
        let retired = projectile.destroy();
        if pursuer.destroy() && retired {
            hits.push(Hit {
                projectile: entity::Ref::clone(projectile),
                pursuer: entity::Ref::clone(pursuer),
            });
        }
    }

    projectiles.compact();
    pursuers.compact();

    Resolution {
        hits,
        failures: outcome.failures,
    }
}

/// Positions of the group's active members, by index. Inactive or unplaced members are `None`.
pub fn snapshot(group: &Group) -> Vec<Option<Vector>> {
    group
        .iter()
        .map(|member| member.is_active().then(|| member.position()).flatten())
        .collect()
}

/// Indexes of the targets strictly closer than `radius` to the entity, in target order.
pub fn candidates(entity: &entity::Ref, targets: &[Option<Vector>], radius: f32) -> Vec<usize> {
    if !entity.is_active() {
        return Vec::new();
    }
    let Some(position) = entity.position() else {
        return Vec::new();
    };
    targets
        .iter()
        .enumerate()
        .filter_map(|(index, target)| {
            target
                .filter(|target| target.distance(position) < radius)
                .map(|_| index)
        })
        .collect()
}

/// The first active member of the group strictly closer than `radius` to `position`.
pub fn first_within(position: Vector, group: &Group, radius: f32) -> Option<&entity::Ref> {
    group.iter().find(|member| {
        member.is_active()
            && member
                .position()
                .is_some_and(|other| other.distance(position) < radius)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{
        component::Transform,
        dispatch::DispatchConfig,
        entity::{Entity, Role},
    };

    fn at(role: Role, x: f32, y: f32) -> entity::Ref {
        Entity::new(format!("{role:?}"), role)
            .with(Transform::at(Vector::new(x, y)))
            .into_ref()
    }

    fn group(name: &str, members: impl IntoIterator<Item = entity::Ref>) -> Group {
        let mut group = Group::new(name);
        group.extend(members);
        group
    }

    fn dispatcher(threshold: usize) -> Dispatcher {
        Dispatcher::new(DispatchConfig {
            threshold,
            workers: 4,
        })
    }

    #[test]
    fn test_single_hit() {
        // Given a projectile 10 units from a pursuer
        let dispatcher = dispatcher(10);
        let projectile = at(Role::Projectile, 100.0, 100.0);
        let pursuer = at(Role::Pursuer, 110.0, 100.0);
        let mut projectiles = group("projectiles", [entity::Ref::clone(&projectile)]);
        let mut pursuers = group("pursuers", [entity::Ref::clone(&pursuer)]);

        // When
        let resolution = resolve(&dispatcher, &mut projectiles, &mut pursuers, 25.0);

        // Then both are gone, exactly once
        assert_eq!(resolution.hits.len(), 1);
        assert!(!projectile.is_active() && !pursuer.is_active());
        assert!(projectiles.is_empty() && pursuers.is_empty());

        let again = resolve(&dispatcher, &mut projectiles, &mut pursuers, 25.0);
        assert!(again.hits.is_empty());
    }

    #[test]
    fn test_radius_is_strict() {
        let dispatcher = dispatcher(10);
        let mut projectiles = group("projectiles", [at(Role::Projectile, 0.0, 0.0)]);
        let mut pursuers = group("pursuers", [at(Role::Pursuer, 25.0, 0.0)]);

        let resolution = resolve(&dispatcher, &mut projectiles, &mut pursuers, 25.0);

        assert!(resolution.hits.is_empty());
        assert_eq!((projectiles.len(), pursuers.len()), (1, 1));
    }

    #[test]
    fn test_two_projectiles_one_pursuer_scores_once() {
        let dispatcher = dispatcher(10);
        let first = at(Role::Projectile, 100.0, 100.0);
        let second = at(Role::Projectile, 105.0, 100.0);
        let mut projectiles = group(
            "projectiles",
            [entity::Ref::clone(&first), entity::Ref::clone(&second)],
        );
        let mut pursuers = group("pursuers", [at(Role::Pursuer, 110.0, 100.0)]);

        let resolution = resolve(&dispatcher, &mut projectiles, &mut pursuers, 25.0);

        // The first projectile in group order wins, the second flies on
        assert_eq!(resolution.hits.len(), 1);
        assert_eq!(resolution.hits[0].projectile.id(), first.id());
        assert!(second.is_active());
        assert_eq!(projectiles.len(), 1);
    }

    #[test]
    fn test_first_candidate_in_group_order_wins() {
        let dispatcher = dispatcher(10);
        let near = at(Role::Pursuer, 101.0, 100.0);
        let far = at(Role::Pursuer, 120.0, 100.0);
        let mut projectiles = group("projectiles", [at(Role::Projectile, 100.0, 100.0)]);
        // The farther pursuer comes first in the group, so it is the one matched
        let mut pursuers = group(
            "pursuers",
            [entity::Ref::clone(&far), entity::Ref::clone(&near)],
        );

        let resolution = resolve(&dispatcher, &mut projectiles, &mut pursuers, 25.0);

        assert_eq!(resolution.hits[0].pursuer.id(), far.id());
        assert!(near.is_active());
    }

    #[test]
    fn test_parallel_resolution_matches_sequential() {
        // Pairs along a line: projectile i sits between pursuers i and i + 1
        let build = || {
            let projectiles = group(
                "projectiles",
                (0..40).map(|i| at(Role::Projectile, i as f32 * 30.0 + 12.0, 0.0)),
            );
            let pursuers = group(
                "pursuers",
                (0..41).map(|i| at(Role::Pursuer, i as f32 * 30.0, 0.0)),
            );
            (projectiles, pursuers)
        };
        let pairing = |resolution: &Resolution, projectiles: &[entity::Ref], pursuers: &[entity::Ref]| {
            resolution
                .hits
                .iter()
                .map(|hit| {
                    let p = projectiles.iter().position(|e| e.id() == hit.projectile.id());
                    let t = pursuers.iter().position(|e| e.id() == hit.pursuer.id());
                    (p, t)
                })
                .collect::<Vec<_>>()
        };

        let (mut seq_projectiles, mut seq_pursuers) = build();
        let seq_all = (seq_projectiles.members().to_vec(), seq_pursuers.members().to_vec());
        let sequential = resolve(&dispatcher(1000), &mut seq_projectiles, &mut seq_pursuers, 25.0);

        let (mut par_projectiles, mut par_pursuers) = build();
        let par_all = (par_projectiles.members().to_vec(), par_pursuers.members().to_vec());
        let parallel = resolve(&dispatcher(10), &mut par_projectiles, &mut par_pursuers, 25.0);

        assert_eq!(sequential.hits.len(), 40);
        assert_eq!(
            pairing(&sequential, &seq_all.0, &seq_all.1),
            pairing(&parallel, &par_all.0, &par_all.1)
        );
        // Every pursuer is matched at most once
        assert_eq!(seq_pursuers.len(), 1);
        assert_eq!(par_pursuers.len(), 1);
    }

    #[test]
    fn test_first_within() {
        let pursuers = group(
            "pursuers",
            [at(Role::Pursuer, 50.0, 0.0), at(Role::Pursuer, 10.0, 0.0)],
        );

        let found = first_within(Vector::ZERO, &pursuers, 20.0);
        assert_eq!(found.map(|e| e.id()), Some(pursuers[1].id()));

        pursuers[1].destroy();
        assert!(first_within(Vector::ZERO, &pursuers, 20.0).is_none());
    }
}
