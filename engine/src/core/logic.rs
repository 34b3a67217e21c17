use crate::{input::InputState, render::Renderer};

/// The behavior driven by a [`SimLoop`](crate::core::SimLoop).
///
/// `on_fixed_update` is called on a fixed interval with the frozen input snapshot for the frame.
/// Depending on how long a frame takes there may be several fixed updates per render or none at
/// all. There is no strong correlation between the two.
pub trait Logic {
    /// Called once before the first update.
    fn on_init(&mut self);

    /// Called on a fixed frame based on the loop's fixed update interval. `dt` is in seconds.
    fn on_fixed_update(&mut self, input: &InputState, dt: f32);

    /// Called once per frame between `begin_frame` and `end_frame`.
    fn on_render(&self, renderer: &mut dyn Renderer);

    /// Whether the loop should stop after the current frame.
    fn is_finished(&self) -> bool {
        false
    }
}
