//! Aggregate counters for one reconciliation run

use std::time::Duration;

use comfy_table::{Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use filmroll_core::fmt_num;

/// What a run did, returned by the reconciler once it finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Posters fetched from the network
    pub downloaded: usize,
    /// Posters already valid on disk
    pub reused: usize,
    /// Records for titles not persisted before
    pub added: usize,
    /// Records for titles already persisted
    pub updated: usize,
    /// Subset of `updated` whose file was left byte-identical
    pub unchanged: usize,
    /// Records pruned because the film left the list
    pub removed: usize,
    /// Films whose poster failed under the skip policy
    pub skipped: usize,
    pub total: usize,
    pub added_titles: Vec<String>,
    pub skipped_titles: Vec<String>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Format summary table as a string.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Collection sync")
                    .fg(Color::Cyan)
                    .add_attribute(Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
            ]);

        let rows = [
            ("Films", self.total),
            ("Posters downloaded", self.downloaded),
            ("Posters reused", self.reused),
            ("Added", self.added),
            ("Updated", self.updated),
            ("Unchanged", self.unchanged),
            ("Removed", self.removed),
        ];
        for (label, value) in rows {
            table.add_row(vec![Cell::new(label), Cell::new(fmt_num(value))]);
        }
        if self.skipped > 0 {
            table.add_row(vec![
                Cell::new("Skipped").fg(Color::Yellow),
                Cell::new(fmt_num(self.skipped)).fg(Color::Yellow),
            ]);
        }
        table.add_row(vec![
            Cell::new("Elapsed"),
            Cell::new(format!("{:.1}s", self.elapsed.as_secs_f64())),
        ]);

        format!("\n{table}")
    }

    /// Log the summary (non-TTY mode).
    pub fn log(&self) {
        log::info!("Downloaded {} new posters", fmt_num(self.downloaded));
        log::info!("Reused {} cached posters", fmt_num(self.reused));
        log::info!("Added {} new movies", fmt_num(self.added));
        log::info!(
            "Updated {} existing movies ({} unchanged)",
            fmt_num(self.updated),
            fmt_num(self.unchanged)
        );
        if self.removed > 0 {
            log::info!("Removed {} movies no longer in list", fmt_num(self.removed));
        }
        if self.skipped > 0 {
            log::warn!(
                "Skipped {} movies without a poster: {}",
                fmt_num(self.skipped),
                self.skipped_titles.join(", ")
            );
        }
        log::info!(
            "Total {} movies in collection [{:.1}s]",
            fmt_num(self.total),
            self.elapsed.as_secs_f64()
        );
    }

    /// Newly added titles, at most `limit`, plus how many were left out
    pub fn recent_additions(&self, limit: usize) -> (&[String], usize) {
        let shown = self.added_titles.len().min(limit);
        (&self.added_titles[..shown], self.added_titles.len() - shown)
    }
}
