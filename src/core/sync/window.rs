//! Sync window resolution
//!
//! A run covers the half-open `create_date` range `[start, end)`. `end` is
//! captured once per run so the window stays stable across batches.

use crate::config::SyncMode;
use crate::core::state::Checkpoint;
use chrono::{DateTime, Duration, Utc};

/// Half-open `create_date` window, `start == None` meaning unbounded past
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    /// Inclusive lower bound
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub end: DateTime<Utc>,
}

/// Settings that shape the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSettings {
    /// Days of history, -1 for all
    pub lookback_days: i64,
    /// Extra minutes subtracted from a bounded start
    pub buffer_minutes: i64,
    /// Whether the checkpoint raises the start
    pub mode: SyncMode,
}

impl SyncWindow {
    /// Resolves the window for a run
    ///
    /// - `lookback_days == -1`: unbounded start;
    /// - otherwise `start = now - lookback_days - buffer_minutes`;
    /// - incremental mode with a checkpoint: start is raised to the
    ///   checkpoint timestamp when that is later.
    ///
    /// The buffer only widens the start; `end` is always `now`. A lookback
    /// reaching past the representable range is treated as unbounded.
    pub fn resolve(settings: &WindowSettings, checkpoint: &Checkpoint, now: DateTime<Utc>) -> Self {
        let lookback_start = if settings.lookback_days < 0 {
            None
        } else {
            bounded_start(now, settings.lookback_days, settings.buffer_minutes.max(0))
        };

        let start = match (settings.mode, checkpoint.last_sync_timestamp) {
            (SyncMode::Incremental, Some(resume_from)) => match lookback_start {
                Some(lookback) if lookback > resume_from => Some(lookback),
                _ => Some(resume_from),
            },
            _ => lookback_start,
        };

        Self { start, end: now }
    }

    /// Whether the window can contain no records
    pub fn is_empty(&self) -> bool {
        self.start.map(|s| s >= self.end).unwrap_or(false)
    }

    /// Whether the window has a lower bound
    pub fn is_bounded(&self) -> bool {
        self.start.is_some()
    }

    /// Whether a timestamp falls inside the window
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start.map(|s| *ts >= s).unwrap_or(true) && *ts < self.end
    }
}

fn bounded_start(now: DateTime<Utc>, days: i64, buffer_minutes: i64) -> Option<DateTime<Utc>> {
    let start = Duration::try_days(days)
        .zip(Duration::try_minutes(buffer_minutes))
        .and_then(|(days, buffer)| now.checked_sub_signed(days)?.checked_sub_signed(buffer));
    if start.is_none() {
        tracing::warn!(
            lookback_days = days,
            buffer_minutes,
            "Lookback reaches past the earliest representable date, syncing all history"
        );
    }
    start
}

impl std::fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.start {
            Some(start) => write!(f, "[{}, {})", start.to_rfc3339(), self.end.to_rfc3339()),
            None => write!(f, "[-inf, {})", self.end.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::CheckpointBuilder;
    use crate::domain::ids::ModelName;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn settings(lookback_days: i64, mode: SyncMode) -> WindowSettings {
        WindowSettings {
            lookback_days,
            buffer_minutes: 2,
            mode,
        }
    }

    fn checkpoint_at(ts: DateTime<Utc>) -> Checkpoint {
        CheckpointBuilder::new(ModelName::new("sale.order").unwrap())
            .last_sync_timestamp(ts)
            .build()
    }

    #[test]
    fn test_unbounded_lookback() {
        let window =
            SyncWindow::resolve(&settings(-1, SyncMode::Incremental), &Checkpoint::default(), now());
        assert_eq!(window.start, None);
        assert_eq!(window.end, now());
        assert!(!window.is_empty());
        assert!(!window.is_bounded());
    }

    #[test]
    fn test_lookback_with_buffer() {
        let window = SyncWindow::resolve(&settings(3, SyncMode::Full), &Checkpoint::default(), now());
        assert_eq!(
            window.start,
            Some(Utc.with_ymd_and_hms(2025, 6, 12, 11, 58, 0).unwrap())
        );
    }

    #[test]
    fn test_zero_lookback_covers_only_buffer() {
        let window = SyncWindow::resolve(&settings(0, SyncMode::Full), &Checkpoint::default(), now());
        let yesterday = now() - Duration::days(1);
        assert!(!window.contains(&yesterday));
        assert!(window.contains(&(now() - Duration::minutes(1))));
        assert!(!window.contains(&now()));
    }

    #[test]
    fn test_incremental_checkpoint_raises_start() {
        let resume = Utc.with_ymd_and_hms(2025, 6, 14, 8, 0, 0).unwrap();
        let window =
            SyncWindow::resolve(&settings(-1, SyncMode::Incremental), &checkpoint_at(resume), now());
        assert_eq!(window.start, Some(resume));

        let window =
            SyncWindow::resolve(&settings(30, SyncMode::Incremental), &checkpoint_at(resume), now());
        assert_eq!(window.start, Some(resume));
    }

    #[test]
    fn test_incremental_old_checkpoint_keeps_lookback() {
        let resume = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window =
            SyncWindow::resolve(&settings(1, SyncMode::Incremental), &checkpoint_at(resume), now());
        assert_eq!(
            window.start,
            Some(Utc.with_ymd_and_hms(2025, 6, 14, 11, 58, 0).unwrap())
        );
    }

    #[test]
    fn test_full_mode_ignores_checkpoint() {
        let resume = Utc.with_ymd_and_hms(2025, 6, 14, 8, 0, 0).unwrap();
        let window = SyncWindow::resolve(&settings(-1, SyncMode::Full), &checkpoint_at(resume), now());
        assert_eq!(window.start, None);
    }

    #[test]
    fn test_checkpoint_in_future_gives_empty_window() {
        let resume = now() + Duration::hours(1);
        let window =
            SyncWindow::resolve(&settings(-1, SyncMode::Incremental), &checkpoint_at(resume), now());
        assert!(window.is_empty());
    }

    #[test]
    fn test_huge_lookback_is_unbounded() {
        let mut huge = settings(200_000_000, SyncMode::Full);
        let window = SyncWindow::resolve(&huge, &Checkpoint::default(), now());
        assert_eq!(window.start, None);

        huge.lookback_days = 36_500;
        huge.buffer_minutes = i64::MAX;
        let window = SyncWindow::resolve(&huge, &Checkpoint::default(), now());
        assert_eq!(window.start, None);
        assert!(!window.is_empty());
    }

    #[test]
    fn test_display() {
        let window = SyncWindow {
            start: None,
            end: now(),
        };
        assert!(window.to_string().starts_with("[-inf, 2025-06-15T12:00:00"));
    }
}
