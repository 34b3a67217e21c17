use volley_engine::{
    config::Config,
    core::{SimLoop, log::ChannelLogger},
    game::{GameEvent, Simulation},
    input::{Fixed, InputState, keys},
    math::Vector,
    render::Recorder,
};

const TICKS: u64 = 600;

fn main() {
    let (logger, logs) = ChannelLogger::with_receiver(log::LevelFilter::Info);
    if let Err(e) = logger.install() {
        eprintln!("logger already installed: {e}");
    }

    // Hold fire while aiming at the top left corner
    let mut input = InputState::new();
    input.press(keys::SPACE);
    input.set_mouse_position(Vector::ZERO);

    let mut simulation = Simulation::new(Config::default()).finish_on_defeat(true);
    let mut sim_loop = SimLoop::new(Fixed(input), Recorder::new());
    let summary = sim_loop.run_ticks(&mut simulation, TICKS);

    let destroyed = simulation
        .drain_events()
        .iter()
        .filter(|event| matches!(event, GameEvent::PursuerDestroyed { .. }))
        .count();

    for message in logs.try_iter() {
        println!("[{}] {}", message.level, message.message);
    }
    println!(
        "{} ticks, {:?}: score {}, {} pursuers destroyed, {} batch failures",
        summary.ticks,
        summary.reason,
        simulation.score(),
        destroyed,
        simulation.failures()
    );

    simulation.shutdown();
}
