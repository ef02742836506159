//! One module per operator workflow. Each prints its own progress report and
//! returns a summary the CLI (and tests) can inspect.

pub mod add_to_review;
pub mod generate_images;
pub mod setup;
pub mod submit_for_review;
pub mod upload_images;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Result, bail};
use indicatif::{ProgressBar, ProgressStyle};

use crate::asc::AppStoreConnectClient;
use crate::gamecenter::ItemKind;

/// Pauses between requests; App Store Connect throttles bursts of writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub create: Duration,
    pub upload: Duration,
    pub release_scan: Duration,
    pub review_item: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            create: Duration::from_millis(300),
            upload: Duration::from_millis(500),
            release_scan: Duration::from_millis(100),
            review_item: Duration::from_millis(150),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            create: Duration::ZERO,
            upload: Duration::ZERO,
            release_scan: Duration::ZERO,
            review_item: Duration::ZERO,
        }
    }
}

pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Which item kinds a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub achievements: bool,
    pub leaderboards: bool,
}

impl Selection {
    pub fn both() -> Self {
        Self {
            achievements: true,
            leaderboards: true,
        }
    }

    /// Neither flag means both kinds.
    pub fn from_flags(achievements_only: bool, leaderboards_only: bool) -> Self {
        if !achievements_only && !leaderboards_only {
            return Self::both();
        }
        Self {
            achievements: achievements_only,
            leaderboards: leaderboards_only,
        }
    }

    pub fn includes(self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Achievement => self.achievements,
            ItemKind::Leaderboard => self.leaderboards,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::both()
    }
}

/// Per-item outcome counts for one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub ok: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Long batches only echo the first few results and then every `every`th.
pub(crate) fn should_echo(count: usize, every: usize) -> bool {
    count <= 3 || count % every == 0
}

/// Looks up the app's Game Center detail; the run cannot continue without it.
pub(crate) async fn require_detail(client: &AppStoreConnectClient, app_id: &str) -> Result<String> {
    match client.game_center_detail_id(app_id).await {
        Ok(Some(id)) => Ok(id),
        Ok(None) => bail!("No Game Center Detail found for app {app_id}"),
        Err(e) => bail!("No Game Center Detail found for app {app_id}: {}", e.summary()),
    }
}

/// Prints a line head such as `Creating: X... ` and flushes it, so it shows
/// while the request it announces is in flight.
pub(crate) fn progress(label: &str) {
    let _ = progress_to(&mut io::stdout().lock(), label);
}

fn progress_to(out: &mut impl Write, label: &str) -> io::Result<()> {
    write!(out, "{label}")?;
    out.flush()
}

pub(crate) fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_defaults_to_both_kinds() {
        let s = Selection::from_flags(false, false);
        assert!(s.includes(ItemKind::Achievement) && s.includes(ItemKind::Leaderboard));
        let s = Selection::from_flags(true, false);
        assert!(s.includes(ItemKind::Achievement));
        assert!(!s.includes(ItemKind::Leaderboard));
    }

    #[derive(Default)]
    struct Terminal {
        shown: Vec<u8>,
        pending: Vec<u8>,
    }

    impl Write for Terminal {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.pending.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.shown.append(&mut self.pending);
            Ok(())
        }
    }

    #[test]
    fn progress_line_is_visible_before_the_result() {
        let mut term = Terminal::default();
        progress_to(&mut term, "  Creating: Level 1 - Best Score... ").unwrap();
        assert_eq!(term.shown, b"  Creating: Level 1 - Best Score... ");
        assert!(term.pending.is_empty());
    }

    #[test]
    fn echo_first_three_then_every_tenth() {
        let echoed: Vec<usize> = (1..=25).filter(|n| should_echo(*n, 10)).collect();
        assert_eq!(echoed, [1, 2, 3, 10, 20]);
    }
}
