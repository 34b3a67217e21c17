//! Deferred structural changes to a [`Scene`](super::Scene).
//!
//! Adding or removing an entity never touches the live collection directly. The request is pushed
//! onto a [`CommandBuffer`] through a shared reference and applied when the scene next commits, at
//! the start of [`Scene::update`](super::Scene::update). Iteration over the live collection can
//! therefore never observe a half-applied change.
//!
//! # Thread Safety
//!
//! - [`CommandBuffer::push`] is lock-free and can be called from multiple threads
//! - [`CommandBuffer::drain`] should be called from a single thread, the one that owns the scene

use crossbeam::queue::SegQueue;

use crate::ecs::entity;

/// A deferred scene command.
#[derive(Debug)]
pub enum Command {
    /// Make the entity live.
    Add(entity::Ref),
    /// Drop the entity with this id from the live collection.
    Remove(entity::Id),
}

/// Thread-safe FIFO of pending scene commands.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: SegQueue<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            commands: SegQueue::new(),
        }
    }

    /// Push a command to the buffer.
    pub fn push(&self, command: Command) {
        self.commands.push(command);
    }

    /// Drain the commands that were queued when the call started, in FIFO order. Commands pushed
    /// concurrently with the drain stay queued for the next one.
    pub fn drain(&self) -> Vec<Command> {
        let count = self.commands.len();
        let mut commands = Vec::with_capacity(count);
        for _ in 0..count {
            match self.commands.pop() {
                Some(command) => commands.push(command),
                None => break,
            }
        }
        commands
    }

    /// Drop every queued command.
    pub fn clear(&self) {
        while self.commands.pop().is_some() {}
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
