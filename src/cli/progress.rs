//! Console Progress Rendering
//!
//! Drains the analyzer's progress channel and redraws a single status line.
//! The renderer keeps draining until the channel closes, even when output is
//! disabled, so workers never block on a full channel.

use std::time::Instant;

use console::{Term, style};

use crate::analysis::progress::{ProgressEvent, ProgressReceiver, ProgressUpdate};

/// Console progress renderer
pub struct ConsoleRenderer {
    term: Term,
    enabled: bool,
    started: Instant,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        let term = Term::stderr();
        Self {
            enabled: term.is_term(),
            term,
            started: Instant::now(),
        }
    }

    /// Draw nothing; still drains
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Consume updates until the producer closes the channel.
    /// Returns the last completed count seen.
    pub async fn drain(self, mut rx: ProgressReceiver) -> usize {
        let mut completed = 0;
        while let Some(update) = rx.recv().await {
            completed = completed.max(update.completed);
            if self.enabled {
                let elapsed = self.started.elapsed().as_secs();
                let _ = self.term.clear_line();
                let _ = self.term.write_str(&render_line(&update, elapsed));
            }
        }
        if self.enabled {
            let _ = self.term.clear_line();
        }
        completed
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// One status line: bar, counts, elapsed time and the file in flight
pub fn render_line(update: &ProgressUpdate, elapsed_secs: u64) -> String {
    let marker = match update.event {
        ProgressEvent::Started => style("→").cyan(),
        ProgressEvent::Finished => style("✓").green(),
    };
    format!(
        "{} {}/{} {} {} {}",
        render_progress_bar(update.completed, update.total, 30),
        update.completed,
        update.total,
        style(format_duration(elapsed_secs)).dim(),
        marker,
        update.current
    )
}

/// Render a simple progress bar
pub fn render_progress_bar(completed: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return format!("[{}]", " ".repeat(width));
    }

    let progress = (completed as f32 / total as f32).min(1.0);
    let filled = (progress * width as f32) as usize;
    let empty = width.saturating_sub(filled);

    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format duration as human-readable string
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::progress::ProgressReporter;

    #[test]
    fn test_progress_bar_render() {
        assert_eq!(render_progress_bar(0, 10, 10), "[░░░░░░░░░░]");
        assert_eq!(render_progress_bar(5, 10, 10), "[█████░░░░░]");
        assert_eq!(render_progress_bar(10, 10, 10), "[██████████]");
        assert_eq!(render_progress_bar(0, 0, 3), "[   ]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3700), "1h 1m");
    }

    #[test]
    fn test_render_line_mentions_file() {
        let update = ProgressUpdate {
            total: 4,
            completed: 2,
            current: "src/lib.rs".to_string(),
            event: ProgressEvent::Finished,
        };
        let line = render_line(&update, 5);
        assert!(line.contains("2/4"));
        assert!(line.ends_with("src/lib.rs"));
    }

    #[tokio::test]
    async fn test_drain_until_closed() {
        let (reporter, rx) = ProgressReporter::with_capacity(1);
        let producer = tokio::spawn(async move {
            let tracker = reporter.track(3, 0);
            for path in ["a", "b", "c"] {
                tracker.started(path).await;
                tracker.finished(path).await;
            }
        });

        let completed = ConsoleRenderer::hidden().drain(rx).await;
        producer.await.unwrap();
        assert_eq!(completed, 3);
    }
}
