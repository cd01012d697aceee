//! The periodic drivers.
//!
//! [`run`] owns both periodic tasks for the process: the engine tick
//! (re-evaluates the countdown against the wall clock, 100 ms by default) and
//! the title tick (refreshes the title surface, 1 s by default). Both live in
//! one `select!` loop on the caller's task, so ticks never overlap and no
//! second driver can exist for the same service. The loop ends when every
//! command sender is dropped; the title is restored on the way out.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::display::{TitleSurface, TitleUpdater};
use crate::events::Event;
use crate::service::{Command, TimerService};
use crate::storage::DisplayConfig;
use crate::timer::{Clock, TimerView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub engine_tick: Duration,
    pub title_tick: Duration,
    /// Title restored while idle and on shutdown.
    pub title: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from_display(&DisplayConfig::default())
    }
}

impl DriverConfig {
    pub fn from_display(display: &DisplayConfig) -> Self {
        Self {
            engine_tick: display.engine_tick(),
            title_tick: display.title_tick(),
            title: display.title.clone(),
        }
    }
}

/// Drive `service` until the command channel closes.
///
/// `on_event` sees every event together with the view right after it,
/// whether the event came from a command or from the countdown running out.
pub async fn run<C, S, F>(
    service: &mut TimerService<C>,
    surface: S,
    config: DriverConfig,
    mut commands: mpsc::Receiver<Command>,
    mut on_event: F,
) where
    C: Clock,
    S: TitleSurface,
    F: FnMut(&Event, &TimerView),
{
    let mut title = TitleUpdater::new(surface, config.title);

    let mut engine_tick = time::interval(config.engine_tick);
    engine_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut title_tick = time::interval(config.title_tick);
    title_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(
        engine_tick_ms = config.engine_tick.as_millis() as u64,
        title_tick_ms = config.title_tick.as_millis() as u64,
        "driver started"
    );

    loop {
        let event = tokio::select! {
            _ = engine_tick.tick() => service.tick(),
            _ = title_tick.tick() => {
                title.tick(&service.view());
                None
            }
            command = commands.recv() => match command {
                Some(command) => {
                    debug!(?command, "command received");
                    service.apply(command)
                }
                None => break,
            },
        };

        if let Some(event) = event {
            let view = service.view();
            if event.is_completion() {
                title.alert();
            }
            title.sync(&view);
            on_event(&event, &view);
        }
    }

    info!("driver stopped");
}
