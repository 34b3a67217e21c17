use std::{
    process::ExitCode,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use crossbeam::channel::Receiver;
use log::{error, info};
use volley_cli::{
    Autopilot, Options, USAGE,
    terminal::{TerminalInput, TerminalRenderer},
};
use volley_engine::{
    config::Config,
    core::{RunSummary, SimLoop, log::{ChannelLogger, LogMessage}},
    game::Simulation,
    render::Recorder,
};

/// How long the headless log printer waits for a message before checking whether the run ended.
const LOG_POLL: Duration = Duration::from_millis(20);

fn main() -> ExitCode {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let (logger, logs) = ChannelLogger::with_receiver(options.log_level);
    if let Err(e) = logger.install() {
        eprintln!("logger already installed: {e}");
    }

    let config = options.configure(Config::default());
    info!(
        "seed {}, {} workers, parallel above {} entities",
        config.seed, config.dispatch.workers, config.dispatch.threshold
    );

    let result = match options.headless {
        Some(ticks) => Ok(headless(config, ticks, &logs)),
        None => interactive(config, &logs),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("terminal unavailable: {e}");
            print_logs(&logs);
            ExitCode::FAILURE
        }
    }
}

fn headless(config: Config, ticks: u64, logs: &Receiver<LogMessage>) {
    let arena = config.arena;
    let mut simulation = Simulation::new(config).finish_on_defeat(true);
    let mut sim_loop = SimLoop::new(Autopilot::new(arena), Recorder::new());

    let summary = printing_logs(logs, print_log, || sim_loop.run_ticks(&mut simulation, ticks));
    print_logs(logs);
    report(&summary, &simulation);
    simulation.shutdown();
}

/// Run `work` while a helper thread hands every log message to `print` as it arrives.
fn printing_logs<T>(
    logs: &Receiver<LogMessage>,
    print: impl Fn(&LogMessage) + Sync,
    work: impl FnOnce() -> T,
) -> T {
    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        scope.spawn(|| {
            while !done.load(Ordering::Acquire) {
                if let Ok(message) = logs.recv_timeout(LOG_POLL) {
                    print(&message);
                }
            }
        });
        let result = work();
        done.store(true, Ordering::Release);
        result
    })
}

fn interactive(config: Config, logs: &Receiver<LogMessage>) -> std::io::Result<()> {
    let arena = config.arena;
    let input = TerminalInput::from_terminal(arena)?;
    let renderer = TerminalRenderer::new(arena)?.with_logs(logs.clone());

    let mut simulation = Simulation::new(config);
    let mut sim_loop = SimLoop::new(input, renderer);
    let summary = sim_loop.run(&mut simulation);

    // Leave the alternate screen before printing anything
    drop(sim_loop);
    report(&summary, &simulation);
    simulation.shutdown();
    Ok(())
}

fn print_logs(logs: &Receiver<LogMessage>) {
    logs.try_iter().for_each(|message| print_log(&message));
}

fn print_log(message: &LogMessage) {
    eprintln!("[{}] {}: {}", message.level, message.target, message.message);
}

fn report(summary: &RunSummary, simulation: &Simulation) {
    println!(
        "{} ticks, {} frames, {:?}: score {}, {} pursuers left, {} batch failures",
        summary.ticks,
        summary.frames,
        summary.reason,
        simulation.score(),
        simulation.pursuers().len(),
        simulation.failures()
    );
}
