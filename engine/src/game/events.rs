use std::{collections::VecDeque, fmt};

use log::{Level, log};

use crate::{ecs::entity, math::Vector};

/// Something that happened during a tick that the outside world may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ProjectileFired {
        projectile: entity::Id,
        direction: Vector,
    },
    PursuerSpawned {
        pursuer: entity::Id,
        position: Vector,
    },
    /// A projectile hit a pursuer. `score` is the total after the hit.
    PursuerDestroyed {
        pursuer: entity::Id,
        projectile: entity::Id,
        score: u32,
    },
    /// A projectile left the arena.
    ProjectileExpired { projectile: entity::Id },
    PlayerDefeated { by: entity::Id, score: u32 },
}

impl GameEvent {
    /// The level the event is logged at.
    pub fn level(&self) -> Level {
        match self {
            GameEvent::ProjectileFired { .. } | GameEvent::ProjectileExpired { .. } => Level::Debug,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameEvent::ProjectileFired {
                projectile,
                direction,
            } => write!(f, "{projectile} fired towards {direction}"),
            GameEvent::PursuerSpawned { pursuer, position } => {
                write!(f, "{pursuer} spawned at {position}")
            }
            GameEvent::PursuerDestroyed {
                pursuer,
                projectile,
                score,
            } => write!(f, "{projectile} destroyed {pursuer}, score {score}"),
            GameEvent::ProjectileExpired { projectile } => write!(f, "{projectile} left the arena"),
            GameEvent::PlayerDefeated { by, score } => {
                write!(f, "player defeated by {by} with score {score}")
            }
        }
    }
}

/// Events kept between drains. Older events are dropped once a run goes this long undrained.
pub const EVENT_CAPACITY: usize = 1024;

/// Events raised since the last drain, oldest first.
#[derive(Debug, Default)]
pub struct Events {
    queue: VecDeque<GameEvent>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and queue an event.
    pub fn push(&mut self, event: GameEvent) {
        log!(event.level(), "{event}");
        if self.queue.len() == EVENT_CAPACITY {
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_in_order() {
        let mut events = Events::new();
        events.push(GameEvent::ProjectileExpired {
            projectile: entity::Id::from(1),
        });
        events.push(GameEvent::PlayerDefeated {
            by: entity::Id::from(2),
            score: 30,
        });

        let drained = events.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[1], GameEvent::PlayerDefeated { score: 30, .. }));
        assert!(events.is_empty());
    }

    #[test]
    fn test_oldest_events_are_dropped_when_full() {
        let mut events = Events::new();
        for id in 0..EVENT_CAPACITY as u64 + 3 {
            events.push(GameEvent::ProjectileExpired {
                projectile: entity::Id::from(id),
            });
        }

        let drained = events.drain();
        assert_eq!(drained.len(), EVENT_CAPACITY);
        assert!(matches!(
            drained[0],
            GameEvent::ProjectileExpired { projectile } if projectile == entity::Id::from(3)
        ));
    }

    #[test]
    fn test_display() {
        let event = GameEvent::PursuerDestroyed {
            pursuer: entity::Id::from(4),
            projectile: entity::Id::from(9),
            score: 10,
        };
        assert_eq!(event.to_string(), "Entity(9) destroyed Entity(4), score 10");
        assert_eq!(event.level(), Level::Info);
    }
}
