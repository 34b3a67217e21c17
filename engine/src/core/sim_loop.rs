use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use log::{debug, info};

use crate::{
    core::{
        logic::Logic,
        time::{MAX_FIXED_STEPS, SIXTY_FPS, Time},
    },
    input::{InputSource, InputState, keys},
    render::Renderer,
};

/// Why a loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Escape was held in the polled input.
    Escape,
    /// The renderer asked to close.
    RendererClosed,
    /// The logic reported it is finished.
    Finished,
    /// The external stop handle was set.
    Stopped,
    /// `run_ticks` ran every requested tick.
    TicksExhausted,
}

/// The result of running a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Fixed updates performed.
    pub ticks: u64,
    /// Frames rendered.
    pub frames: u64,
    pub reason: StopReason,
}

/// The driving loop. Each frame it polls the input source once, runs the fixed updates the
/// elapsed time allows (capped per frame), then renders once.
pub struct SimLoop<I, R> {
    input: I,
    renderer: R,
    fixed_time_step: u64,
    stop: Arc<AtomicBool>,
}

impl<I: InputSource, R: Renderer> SimLoop<I, R> {
    pub fn new(input: I, renderer: R) -> Self {
        Self {
            input,
            renderer,
            fixed_time_step: SIXTY_FPS,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the fixed time step in nanoseconds.
    pub fn with_fixed_time_step(mut self, fixed_time_step: u64) -> Self {
        self.fixed_time_step = fixed_time_step;
        self
    }

    /// A handle that stops the loop at the end of the current frame when set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Take the collaborators back.
    pub fn into_parts(self) -> (I, R) {
        (self.input, self.renderer)
    }

    /// Run on wall clock time until one of the stop conditions holds.
    pub fn run<L: Logic>(&mut self, logic: &mut L) -> RunSummary {
        logic.on_init();

        let mut time = Time::new(self.fixed_time_step);
        let dt = time.fixed_delta_seconds();
        let mut ticks = 0;
        let mut frames = 0;

        loop {
            time = time.next();
            let input = self.input.poll();
            if input.is_key_pressed(keys::ESCAPE) {
                return self.finish(ticks, frames, StopReason::Escape);
            }

            let mut steps = 0;
            while time.has_fixed() {
                if steps == MAX_FIXED_STEPS {
                    debug!("frame fell behind by more than {MAX_FIXED_STEPS} steps, skipping");
                    time.discard_backlog();
                    break;
                }
                time.increment_fixed();
                logic.on_fixed_update(&input, dt);
                steps += 1;
                ticks += 1;
            }

            self.render(logic);
            frames += 1;

            if let Some(reason) = self.stop_reason(logic) {
                return self.finish(ticks, frames, reason);
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Run exactly `ticks` fixed updates (fewer if a stop condition holds first), rendering after
    /// each one, without consulting the wall clock.
    pub fn run_ticks<L: Logic>(&mut self, logic: &mut L, ticks: u64) -> RunSummary {
        logic.on_init();

        let dt = Time::new(self.fixed_time_step).fixed_delta_seconds();
        let mut frames = 0;

        for tick in 0..ticks {
            let input = self.input.poll();
            if input.is_key_pressed(keys::ESCAPE) {
                return self.finish(tick, frames, StopReason::Escape);
            }

            logic.on_fixed_update(&input, dt);
            self.render(logic);
            frames += 1;

            if let Some(reason) = self.stop_reason(logic) {
                return self.finish(tick + 1, frames, reason);
            }
        }

        self.finish(ticks, frames, StopReason::TicksExhausted)
    }

    fn render<L: Logic>(&mut self, logic: &L) {
        self.renderer.begin_frame();
        logic.on_render(&mut self.renderer);
        self.renderer.end_frame();
    }

    fn stop_reason<L: Logic>(&self, logic: &L) -> Option<StopReason> {
        if self.renderer.should_close() {
            Some(StopReason::RendererClosed)
        } else if logic.is_finished() {
            Some(StopReason::Finished)
        } else if self.stop.load(Ordering::Relaxed) {
            Some(StopReason::Stopped)
        } else {
            None
        }
    }

    fn finish(&self, ticks: u64, frames: u64, reason: StopReason) -> RunSummary {
        info!("ending simulation after {ticks} ticks: {reason:?}");
        RunSummary {
            ticks,
            frames,
            reason,
        }
    }
}

/// Convenience for loops that never see input.
impl<R: Renderer> SimLoop<crate::input::Fixed, R> {
    pub fn headless(renderer: R) -> Self {
        Self::new(crate::input::Fixed(InputState::new()), renderer)
    }
}
