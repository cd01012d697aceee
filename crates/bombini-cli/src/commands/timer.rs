use std::rc::Rc;

use bombini_core::display::TerminalTitle;
use bombini_core::driver::{self, DriverConfig};
use bombini_core::events::timestamp;
use bombini_core::storage::{Database, NewSession, Persistence};
use bombini_core::{
    Clock, Command, Config, Event, FocusKind, PomodoroMode, RestoreOutcome, TimerKind,
    TimerService, TimerStatus, TimerView,
};
use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or restart) the current Pomodoro phase
    StartPomodoro,
    /// Start a fresh focus session
    StartFocus,
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Stop the session and record it in the history
    Stop,
    /// Reset to idle with the configured duration
    Reset,
    /// Switch the Pomodoro phase (not while running)
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Count a distraction (deep focus only)
    Distraction,
    /// Change timer settings (rejected while the affected timer is in flight)
    Configure {
        /// Work phase minutes (15-90)
        #[arg(long)]
        work: Option<u64>,
        /// Break phase minutes (5-20)
        #[arg(long = "break")]
        break_minutes: Option<u64>,
        /// Start the next phase automatically
        #[arg(long)]
        auto_advance: Option<bool>,
        /// Focus session kind
        #[arg(long, value_enum)]
        focus_kind: Option<KindArg>,
        /// Focus session minutes (15-180)
        #[arg(long)]
        focus_minutes: Option<u64>,
    },
    /// Print current timer state as JSON
    Status,
    /// Run the timer in the foreground, updating the terminal title.
    ///
    /// Reads one command per line from stdin: p pause, r resume, s stop,
    /// x reset, d distraction, w/b switch phase, q quit.
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Work,
    Break,
}

impl From<ModeArg> for PomodoroMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Work => PomodoroMode::Work,
            ModeArg::Break => PomodoroMode::Break,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Deep,
    Shallow,
}

impl From<KindArg> for FocusKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Deep => FocusKind::Deep,
            KindArg::Shallow => FocusKind::Shallow,
        }
    }
}

/// One line of `timer watch` input.
#[derive(Debug, PartialEq, Eq)]
enum WatchInput {
    Command(Command),
    Quit,
}

fn parse_watch_input(line: &str) -> Option<WatchInput> {
    let input = match line.trim() {
        "p" => WatchInput::Command(Command::Pause),
        "r" => WatchInput::Command(Command::Resume),
        "s" => WatchInput::Command(Command::Stop),
        "x" => WatchInput::Command(Command::Reset),
        "d" => WatchInput::Command(Command::Distraction),
        "w" => WatchInput::Command(Command::SwitchMode(PomodoroMode::Work)),
        "b" => WatchInput::Command(Command::SwitchMode(PomodoroMode::Break)),
        "q" => WatchInput::Quit,
        _ => return None,
    };
    Some(input)
}

fn open_service(db: &Rc<Database>, config: &Config) -> TimerService {
    TimerService::restore(
        Persistence::new(Rc::clone(db)),
        bombini_core::SystemClock,
        config.pomodoro_config(),
        config.focus_config(),
    )
}

/// Session to add to the history when `event` ends one, if any.
fn ended_session<'a>(event: &Event, view: &TimerView, label: &'a str) -> Option<NewSession<'a>> {
    let (timer, duration_ms, distractions) = match event {
        Event::FocusFinished {
            elapsed_ms,
            distractions,
            ..
        } => (TimerKind::Focus, *elapsed_ms, *distractions),
        Event::TimerStopped {
            timer: Some(timer),
            previous: TimerStatus::Running | TimerStatus::Paused,
            ..
        } => match timer {
            TimerKind::Pomodoro => (TimerKind::Pomodoro, view.total_work_ms, 0),
            TimerKind::Focus => (TimerKind::Focus, view.time_elapsed_ms, view.distraction_count),
        },
        _ => return None,
    };
    new_session(timer, duration_ms, distractions, event.at(), view, label)
}

/// Session that ran out at `ended_ms` while no process was driving it.
fn expired_session<'a>(view: &TimerView, ended_ms: u64, label: &'a str) -> Option<NewSession<'a>> {
    let timer = view.active_timer?;
    let (duration_ms, distractions) = match timer {
        TimerKind::Pomodoro => (view.total_work_ms, 0),
        TimerKind::Focus => (view.time_elapsed_ms, view.distraction_count),
    };
    new_session(timer, duration_ms, distractions, timestamp(ended_ms), view, label)
}

fn new_session<'a>(
    timer: TimerKind,
    duration_ms: u64,
    distractions: u32,
    completed_at: DateTime<Utc>,
    view: &TimerView,
    label: &'a str,
) -> Option<NewSession<'a>> {
    if duration_ms == 0 {
        return None;
    }
    let started_at = view
        .session_start_ms
        .map(timestamp)
        .unwrap_or(completed_at);
    Some(NewSession {
        timer,
        label,
        duration_ms,
        distractions,
        started_at,
        completed_at,
    })
}

fn history_label(view: &TimerView) -> &str {
    match view.active_timer {
        Some(TimerKind::Pomodoro) => "Pomodoro",
        _ => view.label.as_str(),
    }
}

fn record(db: &Database, session: Option<NewSession<'_>>) {
    if let Some(session) = session {
        if let Err(e) = db.record_session(&session) {
            warn!("failed to record session: {e}");
        }
    }
}

fn record_if_ended(db: &Database, event: &Event, view: &TimerView) {
    record(db, ended_session(event, view, history_label(view)));
}

fn record_if_expired(db: &Database, service: &TimerService) {
    if let RestoreOutcome::Expired { overdue_ms } = service.restore_outcome() {
        let ended_ms = service.clock().now_ms().saturating_sub(overdue_ms);
        let view = service.view();
        record(db, expired_session(&view, ended_ms, history_label(&view)));
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Rc::new(Database::open()?);
    let mut service = open_service(&db, &config);
    record_if_expired(&db, &service);

    // Catch up with whatever happened since the last invocation.
    if let Some(event) = service.tick() {
        record_if_ended(&db, &event, &service.view());
        print_json(&event)?;
    }

    let command = match action {
        TimerAction::StartPomodoro => Command::StartPomodoro,
        TimerAction::StartFocus => Command::StartFocus,
        TimerAction::Pause => Command::Pause,
        TimerAction::Resume => Command::Resume,
        TimerAction::Stop => Command::Stop,
        TimerAction::Reset => Command::Reset,
        TimerAction::Mode { mode } => Command::SwitchMode(mode.into()),
        TimerAction::Distraction => Command::Distraction,
        TimerAction::Configure {
            work,
            break_minutes,
            auto_advance,
            focus_kind,
            focus_minutes,
        } => {
            let commands = [
                work.map(Command::SetWorkMinutes),
                break_minutes.map(Command::SetBreakMinutes),
                auto_advance.map(Command::SetAutoAdvance),
                focus_kind.map(|kind| Command::SetFocusKind(kind.into())),
                focus_minutes.map(Command::SetFocusMinutes),
            ];
            let mut changed = None;
            for command in commands.into_iter().flatten() {
                changed = service.apply(command).or(changed);
            }
            match changed {
                Some(event) => print_json(&event)?,
                None => print_json(&service.view())?,
            }
            return Ok(());
        }
        TimerAction::Status => return print_json(&service.view()),
        TimerAction::Watch => return watch(service, &db, &config),
    };

    match service.apply(command) {
        Some(event) => {
            record_if_ended(&db, &event, &service.view());
            print_json(&event)?;
        }
        None => print_json(&service.view())?,
    }
    Ok(())
}

fn watch(
    mut service: TimerService,
    db: &Database,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (tx, rx) = mpsc::channel(16);

        let input = async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_watch_input(&line) {
                        Some(WatchInput::Command(command)) => {
                            if tx.send(command).await.is_err() {
                                break;
                            }
                        }
                        Some(WatchInput::Quit) => break,
                        None => eprintln!("unknown command: {}", line.trim()),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        };

        let surface = TerminalTitle::stdout(config.notifications.bell);
        let driver_config = DriverConfig::from_display(&config.display);
        let drive = driver::run(&mut service, surface, driver_config, rx, |event, view| {
            record_if_ended(db, event, view);
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("failed to serialize event: {e}"),
            }
        });

        tokio::join!(drive, input);
    });
    Ok(())
}
