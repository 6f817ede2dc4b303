//! Fixed-width table rendering.
//!
//! ```text
//! Лінія │ З       │ До
//! ──────┼─────────┼─────────
//! 1.1   │ 19:00   │ 20:30
//! 5.2   │ не вимикається
//! ```

use chrono::Local;
use regex::Regex;

use crate::error::Result;
use crate::models::{Config, OutageRecord, RenderConfig, ScheduleSnapshot};

/// Width of the line-id column; fits `NN.NN`.
const LINE_WIDTH: usize = 5;
/// Width of a time column; fits `HH:MM` plus padding.
const TIME_WIDTH: usize = 7;

/// Renders snapshots into plain monospace tables and message titles.
#[derive(Debug, Clone)]
pub struct TableRenderer {
    settings: RenderConfig,
    marker: String,
    time: Regex,
}

impl TableRenderer {
    pub fn new(settings: RenderConfig, always_on_marker: &str) -> Result<Self> {
        Ok(Self {
            settings,
            marker: always_on_marker.trim().to_lowercase(),
            time: Regex::new(r"\b\d{1,2}:\d{2}\b")?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.render.clone(), &config.source.always_on_marker)
    }

    /// Header, separator and one row per record.
    pub fn render(&self, snapshot: &ScheduleSnapshot) -> String {
        let mut lines = Vec::with_capacity(snapshot.len() + 2);
        lines.push(format!(
            "{:<lw$} │ {:<tw$} │ {}",
            self.settings.line_header,
            self.settings.from_header,
            self.settings.to_header,
            lw = LINE_WIDTH,
            tw = TIME_WIDTH,
        ));
        lines.push(format!(
            "{}┼{}┼{}",
            "─".repeat(LINE_WIDTH + 1),
            "─".repeat(TIME_WIDTH + 2),
            "─".repeat(TIME_WIDTH + 2),
        ));
        lines.extend(snapshot.records.iter().map(|r| self.render_row(r)));
        lines.join("\n")
    }

    fn render_row(&self, record: &OutageRecord) -> String {
        let description = record.description.trim();

        if description.to_lowercase().contains(&self.marker) {
            return format!("{:<lw$} │ {}", record.line_id, description, lw = LINE_WIDTH);
        }

        let times: Vec<&str> = self.time.find_iter(description).map(|m| m.as_str()).collect();
        if let [from, to] = times.as_slice() {
            return format!(
                "{:<lw$} │ {:<tw$} │ {}",
                record.line_id,
                from,
                to,
                lw = LINE_WIDTH,
                tw = TIME_WIDTH,
            );
        }

        // Unexpected shape: keep the record, show it as-is.
        format!("{:<lw$} │ {}", record.line_id, description, lw = LINE_WIDTH)
    }

    /// Message title: configured text, then the article heading and check time if any.
    pub fn title(&self, snapshot: &ScheduleSnapshot) -> String {
        let mut title = self.settings.title.clone();
        if let Some(heading) = &snapshot.heading {
            title.push('\n');
            title.push_str(heading);
        }
        if self.settings.show_checked_at {
            title.push('\n');
            title.push_str(&Local::now().format("%d.%m.%Y %H:%M").to_string());
        }
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(marker: &str) -> TableRenderer {
        TableRenderer::new(RenderConfig::default(), marker).unwrap()
    }

    fn rows(table: &str) -> Vec<&str> {
        table.lines().skip(2).collect()
    }

    #[test]
    fn test_header_and_separator() {
        let table = renderer("не вимикається").render(&ScheduleSnapshot::default());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Лінія │ З       │ До");
        assert_eq!(lines[1], "──────┼─────────┼─────────");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_time_range_splits_into_columns() {
        let snapshot = ScheduleSnapshot::new(vec![OutageRecord::new("1.1", "19:00-20:30")]);
        let table = renderer("does not switch off").render(&snapshot);
        assert_eq!(rows(&table), vec!["1.1   │ 19:00   │ 20:30"]);
    }

    #[test]
    fn test_marker_rendered_verbatim() {
        let snapshot =
            ScheduleSnapshot::new(vec![OutageRecord::new("5.2", "does not switch off")]);
        let table = renderer("does not switch off").render(&snapshot);
        assert_eq!(rows(&table), vec!["5.2   │ does not switch off"]);
    }

    #[test]
    fn test_marker_wins_over_times() {
        let snapshot = ScheduleSnapshot::new(vec![OutageRecord::new(
            "4.1",
            "не вимикається 00:00 - 24:00",
        )]);
        let table = renderer("не вимикається").render(&snapshot);
        assert_eq!(rows(&table), vec!["4.1   │ не вимикається 00:00 - 24:00"]);
    }

    #[test]
    fn test_unexpected_shapes_fall_back_to_raw() {
        let snapshot = ScheduleSnapshot::new(vec![
            OutageRecord::new("3.1", "08:00"),
            OutageRecord::new("2.2", "00:00–04:00, 12:00–16:00"),
        ]);
        let table = renderer("не вимикається").render(&snapshot);
        assert_eq!(
            rows(&table),
            vec!["3.1   │ 08:00", "2.2   │ 00:00–04:00, 12:00–16:00"]
        );
    }

    #[test]
    fn test_every_record_gets_a_row() {
        let snapshot = ScheduleSnapshot::new(vec![
            OutageRecord::new("1.1", "19:00-20:30"),
            OutageRecord::new("5.2", "не вимикається"),
            OutageRecord::new("6.1", "08:00"),
        ]);
        let table = renderer("не вимикається").render(&snapshot);
        assert_eq!(rows(&table).len(), 3);
    }

    #[test]
    fn test_title_includes_heading() {
        let mut snapshot = ScheduleSnapshot::default();
        snapshot.heading = Some("Графік на 16 жовтня".to_string());
        let title = renderer("не вимикається").title(&snapshot);
        assert_eq!(title, "⚡ Нове оновлення розкладу:\nГрафік на 16 жовтня");
    }

    #[test]
    fn test_title_with_checked_at() {
        let settings = RenderConfig {
            show_checked_at: true,
            ..RenderConfig::default()
        };
        let title = TableRenderer::new(settings, "x")
            .unwrap()
            .title(&ScheduleSnapshot::default());
        let lines: Vec<&str> = title.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].len(), "16.10.2026 19:00".len());
    }
}
