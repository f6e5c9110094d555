//! Plays a scripted scenario against headless windows and prints every
//! broadcast event as a JSON line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use palette_dock::actor::broadcast::EventReceiver;
use palette_dock::actor::reactor::{Reactor, Request, Response};
use palette_dock::actor::{self};
use palette_dock::common::config::Config;
use palette_dock::common::log;
use palette_dock::model::WindowId;
use palette_dock::sys::geometry::{Point, Rect};
use palette_dock::sys::headless::{HeadlessPointer, HeadlessWindow};
use palette_dock::sys::input::InputEvent;
use palette_dock::sys::screen::Screen;
use palette_dock::sys::window::WindowFlags;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Parser)]
struct Cli {
    /// Scenario file, in RON.
    scenario: PathBuf,

    /// Config file to use instead of the one in the home directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the snap bindings once the scenario is done.
    #[arg(long)]
    dump: bool,

    /// Check that the config and scenario load, then exit.
    #[arg(long)]
    validate: bool,

    /// Only print events about this window. May be repeated.
    #[arg(long = "window")]
    windows: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default)]
    screens: Vec<Screen>,
    windows: Vec<ScenarioWindow>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ScenarioWindow {
    id: WindowId,
    frame: Rect,
    #[serde(default)]
    hidden: bool,
    #[serde(default = "yes")]
    draggable: bool,
}

fn yes() -> bool { true }

#[derive(Deserialize, Debug)]
enum Step {
    Command(Request),
    /// Moves the pointer without generating input.
    Pointer(Point),
    Input(InputEvent),
    /// Advances the clock by this many milliseconds, ticking as it goes.
    Advance(u64),
    Destroy(WindowId),
}

fn main() -> anyhow::Result<()> {
    let opt: Cli = Parser::parse();
    log::init_logging();

    let mut config = match &opt.config {
        Some(path) => Config::read(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::load()?,
    };
    for issue in config.validate() {
        warn!("config: {issue}");
    }
    config.auto_fix_values();

    let text = std::fs::read_to_string(&opt.scenario)
        .with_context(|| format!("reading scenario {}", opt.scenario.display()))?;
    let scenario: Scenario = ron::from_str(&text)
        .with_context(|| format!("parsing scenario {}", opt.scenario.display()))?;
    if opt.validate {
        return Ok(());
    }

    let tick = config.animation.tick_interval();
    let pointer = HeadlessPointer::new();
    let (events_tx, mut events) = actor::channel();
    let mut reactor = Reactor::new(config, Arc::default(), Arc::new(pointer.clone()), events_tx);
    reactor.screens_changed(scenario.screens);
    for window in scenario.windows {
        let native = if window.hidden {
            HeadlessWindow::hidden(window.frame)
        } else {
            HeadlessWindow::new(window.frame)
        };
        let flags = WindowFlags { draggable: window.draggable };
        reactor.register_window(window.id, Box::new(native), flags);
    }

    let input = reactor.input_queue();
    let mut now = Instant::now();
    for (i, step) in scenario.steps.into_iter().enumerate() {
        match step {
            Step::Command(request) => {
                let response = reactor.handle_command_at(request, now);
                println!("{}", response_json(i, &response));
            }
            Step::Pointer(position) => pointer.set_position(position),
            Step::Input(event) => {
                input.push(event);
            }
            Step::Advance(ms) => {
                let end = now + Duration::from_millis(ms);
                while now < end {
                    now = (now + tick).min(end);
                    reactor.tick(now);
                    print_events(&mut events, &opt.windows)?;
                }
            }
            Step::Destroy(id) => reactor.destroy_window(&id),
        }
        print_events(&mut events, &opt.windows)?;
    }
    // Anything still queued is handled as one last tick.
    if reactor.needs_tick() {
        reactor.tick(now);
        print_events(&mut events, &opt.windows)?;
    }

    info!(windows = reactor.directory().len(), "scenario finished");
    if opt.dump {
        print!("{}", reactor.snap_engine().debug_tree());
    }
    Ok(())
}

fn response_json(step: usize, response: &Response) -> serde_json::Value {
    match response {
        Ok(value) => json!({ "step": step, "result": value }),
        Err(err) => json!({ "step": step, "error": err.code(), "message": err.to_string() }),
    }
}

fn print_events(events: &mut EventReceiver, windows: &[String]) -> anyhow::Result<()> {
    while let Ok((_, event)) = events.try_recv() {
        if !windows.is_empty() && !windows.iter().any(|w| w == event.window_id().as_str()) {
            continue;
        }
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
