use volley_engine::{
    config::ArenaConfig,
    input::{InputSource, InputState, keys},
    math::Vector,
};

/// Polls spent strafing in one direction before turning around.
const STRAFE_POLLS: u64 = 90;
/// Radians the aim point turns per poll.
const SWEEP: f32 = 0.05;

/// A scripted [`InputSource`] for unattended runs. It holds fire, sweeps the aim point around the
/// arena and strafes left and right.
#[derive(Debug, Clone)]
pub struct Autopilot {
    arena: ArenaConfig,
    polls: u64,
    state: InputState,
}

impl Autopilot {
    pub fn new(arena: ArenaConfig) -> Self {
        Self {
            arena,
            polls: 0,
            state: InputState::new(),
        }
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl InputSource for Autopilot {
    fn poll(&mut self) -> InputState {
        let state = &mut self.state;
        state.begin_tick();
        state.press(keys::SPACE);

        let (hold, drop) = if (self.polls / STRAFE_POLLS) % 2 == 0 {
            (keys::D, keys::A)
        } else {
            (keys::A, keys::D)
        };
        state.release(drop);
        state.press(hold);

        let angle = self.polls as f32 * SWEEP;
        let center = self.arena.center();
        let reach = self.arena.width.min(self.arena.height) / 2.0;
        state.set_mouse_position(center + Vector::new(angle.cos(), angle.sin()) * reach);

        self.polls += 1;
        state.clone()
    }
}
