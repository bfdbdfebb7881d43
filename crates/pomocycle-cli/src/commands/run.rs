//! Interactive timer driven by line commands on stdin.
//!
//! One task owns the [`TimerService`] and selects between ticker ticks and
//! parsed commands, so every mutation goes through a single writer. Events
//! are written to stdout as JSON lines, diagnostics go to stderr.

use std::error::Error;
use std::io::BufRead;
use std::str::FromStr;
use std::thread;

use pomocycle_core::{
    Config, Database, Event, IntervalTicker, LogNotifier, TimerService, TimerStateView,
};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, warn};

type CliService = TimerService<IntervalTicker, LogNotifier, Database>;

const HELP: &str =
    "commands: start [minutes] | pause | resume | reset | stop | status | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start(Option<i32>),
    Pause,
    Resume,
    Reset,
    Stop,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or("empty command")?.to_ascii_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments: {line}"));
        }

        let command = match (name.as_str(), arg) {
            ("start", None) => Command::Start(None),
            ("start", Some(minutes)) => Command::Start(Some(
                minutes
                    .parse()
                    .map_err(|_| format!("invalid minutes: {minutes}"))?,
            )),
            ("pause", None) => Command::Pause,
            ("resume", None) => Command::Resume,
            ("reset", None) => Command::Reset,
            ("stop", None) => Command::Stop,
            ("status", None) => Command::Status,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            _ => return Err(format!("unrecognized input: {line}")),
        };
        Ok(command)
    }
}

#[derive(Serialize)]
struct Status {
    #[serde(flatten)]
    view: TimerStateView,
    clock: String,
}

fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(drive())
}

async fn drive() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let history = Database::open_at(&config.database_path()?)?;
    let notifier = LogNotifier::new(config.notifications);
    let mut service = TimerService::new(IntervalTicker::default(), notifier, history);
    let mut events = service.subscribe();

    let (tx, mut commands) = mpsc::unbounded_channel();
    spawn_reader(tx);
    eprintln!("{HELP}");

    loop {
        let input = tokio::select! {
            _ = service.ticker_mut().next_tick() => None,
            command = commands.recv() => Some(command.unwrap_or(Command::Quit)),
        };

        let keep_going = match input {
            None => {
                if let Err(err) = service.on_tick() {
                    error!(%err, "tick failed");
                }
                true
            }
            Some(command) => {
                debug!(?command, "command received");
                apply(&mut service, command)?
            }
        };
        flush_events(&mut events)?;

        if !keep_going {
            break;
        }
    }

    service.shutdown();
    Ok(())
}

/// Blocking stdin reader on its own thread; a tokio stdin read would keep
/// the runtime from shutting down while a line is pending.
fn spawn_reader(tx: UnboundedSender<Command>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(%err, "failed to read stdin");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                Err(message) => eprintln!("{message}"),
            }
        }
        let _ = tx.send(Command::Quit);
    });
}

/// Returns `false` when the loop should end.
fn apply(service: &mut CliService, command: Command) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Start(minutes) => {
            let started = match minutes {
                Some(minutes) => service.start_custom(minutes),
                None => service.start_normal(),
            };
            match started {
                Ok(true) => {}
                Ok(false) => eprintln!("timer already running"),
                Err(err) => eprintln!("error: {err}"),
            }
        }
        Command::Pause => {
            if !service.pause() {
                eprintln!("timer is not running");
            }
        }
        Command::Resume => {
            if !service.resume() {
                eprintln!("timer is not paused");
            }
        }
        Command::Reset => service.reset(),
        Command::Stop => service.stop(),
        Command::Status => {
            let view = service.current_state();
            let status = Status {
                view,
                clock: format_clock(view.remaining_seconds),
            };
            println!("{}", serde_json::to_string(&status)?);
        }
        Command::Help => eprintln!("{HELP}"),
        Command::Quit => {
            // An unfinished countdown is kept in history as stopped.
            let session = service.session();
            if session.is_timer_running() || session.is_timer_paused() {
                service.stop();
            }
            return Ok(false);
        }
    }
    Ok(true)
}

fn flush_events(events: &mut UnboundedReceiver<Event>) -> Result<(), Box<dyn Error>> {
    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
