//! Presentation adapters: pure formatting helpers and the title updater.
//!
//! Nothing here owns timer state; everything is derived from a [`TimerView`].
//!
//! [`TimerView`]: crate::timer::TimerView

pub mod format;
pub mod title;

pub use format::{format_countdown, progress_pct, timer_label, title_text, PAUSED_LABEL};
pub use title::{TerminalTitle, TitleSurface, TitleUpdater};
