//! Title updater.
//!
//! Mirrors the countdown into an external title surface (a terminal window
//! title here). The updater owns the surface for its lifetime and puts the
//! original title back when dropped, whichever way the owner exits.

use std::io::Write;

use tracing::debug;

use super::format::title_text;
use crate::timer::{TimerKind, TimerStatus, TimerView};

/// Something that displays a single line of title text.
pub trait TitleSurface {
    fn set_title(&mut self, title: &str);

    /// Signal the end of a countdown. No-op by default.
    fn alert(&mut self) {}
}

impl<T: TitleSurface + ?Sized> TitleSurface for &mut T {
    fn set_title(&mut self, title: &str) {
        (**self).set_title(title);
    }

    fn alert(&mut self) {
        (**self).alert();
    }
}

/// Writes the title with the OSC 0 escape sequence.
pub struct TerminalTitle<W: Write> {
    out: W,
    bell: bool,
}

impl<W: Write> TerminalTitle<W> {
    pub fn new(out: W, bell: bool) -> Self {
        Self { out, bell }
    }

    fn emit(&mut self, bytes: &[u8]) {
        if let Err(e) = self.out.write_all(bytes).and_then(|_| self.out.flush()) {
            debug!("title write failed: {e}");
        }
    }
}

impl TerminalTitle<std::io::Stdout> {
    pub fn stdout(bell: bool) -> Self {
        Self::new(std::io::stdout(), bell)
    }
}

impl<W: Write> TitleSurface for TerminalTitle<W> {
    fn set_title(&mut self, title: &str) {
        let sequence = format!("\x1b]0;{title}\x07");
        self.emit(sequence.as_bytes());
    }

    fn alert(&mut self) {
        if self.bell {
            self.emit(b"\x07");
        }
    }
}

type StateKey = (TimerStatus, Option<TimerKind>, String);

/// Keeps a [`TitleSurface`] in step with the timer.
///
/// `tick` is meant to be called once per second; `sync` after any state
/// change. Identical titles are never written twice in a row, so a paused
/// or idle timer costs a single write.
pub struct TitleUpdater<S: TitleSurface> {
    surface: S,
    original: String,
    last_title: Option<String>,
    last_key: Option<StateKey>,
}

impl<S: TitleSurface> TitleUpdater<S> {
    pub fn new(surface: S, original: impl Into<String>) -> Self {
        Self {
            surface,
            original: original.into(),
            last_title: None,
            last_key: None,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Periodic refresh.
    pub fn tick(&mut self, view: &TimerView) {
        self.write(view);
    }

    /// Refresh only if the status, timer or label changed since the last write.
    pub fn sync(&mut self, view: &TimerView) {
        if self.last_key.as_ref() != Some(&state_key(view)) {
            self.write(view);
        }
    }

    pub fn alert(&mut self) {
        self.surface.alert();
    }

    fn write(&mut self, view: &TimerView) {
        let title = title_text(view, &self.original);
        self.last_key = Some(state_key(view));
        if self.last_title.as_deref() == Some(title.as_str()) {
            return;
        }
        self.surface.set_title(&title);
        self.last_title = Some(title);
    }
}

impl<S: TitleSurface> Drop for TitleUpdater<S> {
    fn drop(&mut self) {
        if let Some(last) = self.last_title.as_deref() {
            if last != self.original {
                self.surface.set_title(&self.original);
            }
        }
    }
}

fn state_key(view: &TimerView) -> StateKey {
    (view.status, view.active_timer, view.label.clone())
}
