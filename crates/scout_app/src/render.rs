//! Plain-text rendering of the view model for the terminal.

use std::io::{self, Write};

use scout_core::{
    AppViewModel, CompanyTile, Deal, Heat, Notification, ScoreBand, Source, TileSize,
    AVAILABLE_MODELS, PROMPT_TEMPLATES,
};
use scout_engine::Notifier;

const BAR_WIDTH: usize = 24;
const CELL_WIDTH: usize = 28;
const SEPARATOR: &str = " | ";

pub fn progress_line(view: &AppViewModel) -> String {
    let percent = view.progress.percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)));
    let mut line = format!("[{bar}] {percent:5.1}% {}", view.status_message);
    if let Some(status) = view.job_status {
        line.push_str(&format!(" ({status:?})"));
    }
    line
}

/// Redraws the progress line in place.
pub fn draw_progress(view: &AppViewModel) {
    let mut err = io::stderr().lock();
    let _ = write!(err, "\r{:<100}", progress_line(view));
    let _ = err.flush();
}

pub fn deal_table(view: &AppViewModel) -> String {
    if view.deals.is_empty() {
        if view.total_deals > 0 {
            return format!(
                "No deal matches filter {:?} ({} hidden).\n",
                view.filter.label(),
                view.total_deals
            );
        }
        return String::new();
    }
    let mut out = deals_table(view.columns, &view.deals);
    if view.deals.len() != view.total_deals {
        out.push_str(&format!(
            "{} of {} deals shown (filter {:?}).\n",
            view.deals.len(),
            view.total_deals,
            view.filter.label()
        ));
    }
    out
}

pub fn deals_table(columns: &[&str], deals: &[Deal]) -> String {
    let header: Vec<String> = columns.iter().map(|c| cell(&column_title(c))).collect();
    let mut out = header.join(SEPARATOR);
    out.push('\n');
    out.push_str(&"=".repeat(header.len() * (CELL_WIDTH + SEPARATOR.len())));
    out.push('\n');
    for deal in deals {
        let row: Vec<String> = columns.iter().map(|c| cell(&deal_cell(deal, c))).collect();
        out.push_str(row.join(SEPARATOR).trim_end());
        out.push('\n');
    }
    out
}

fn deal_cell(deal: &Deal, column: &str) -> String {
    let value = deal.display_field(column);
    if column != "relevance_score" {
        return value;
    }
    match deal.score_band() {
        Some(ScoreBand::High) => format!("{value} ***"),
        Some(ScoreBand::Medium) => format!("{value} **"),
        Some(ScoreBand::Low) => format!("{value} *"),
        None => value,
    }
}

fn column_title(column: &str) -> String {
    column.replace('_', " ").to_uppercase()
}

/// Pads or truncates to exactly `CELL_WIDTH` characters.
fn cell(text: &str) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    let count = single_line.chars().count();
    if count <= CELL_WIDTH {
        return format!("{single_line:<CELL_WIDTH$}");
    }
    let mut cut: String = single_line.chars().take(CELL_WIDTH - 3).collect();
    cut.push_str("...");
    cut
}

pub fn tile_table(tiles: &[CompanyTile]) -> String {
    if tiles.is_empty() {
        return "No companies in the heatmap.\n".to_string();
    }
    let mut out = String::new();
    for tile in tiles {
        let heat = match tile.heat() {
            Heat::High => "high",
            Heat::Medium => "medium",
            Heat::Low => "low",
        };
        let size = match tile.tile_size() {
            TileSize::Large => "L",
            TileSize::Medium => "M",
            TileSize::Small => "S",
        };
        out.push_str(&format!("{:<24} {:>6.1}  {:<6} {}\n", tile.name, tile.score, heat, size));
    }
    out
}

pub fn template_list() -> String {
    let mut out = String::new();
    for template in PROMPT_TEMPLATES.iter() {
        out.push_str(&format!(
            "{:<22} {} - {}\n",
            template.id, template.name, template.description
        ));
    }
    out.push_str("\nModels:\n");
    for (id, label) in AVAILABLE_MODELS {
        out.push_str(&format!("  {id:<32} {label}\n"));
    }
    out
}

pub fn source_list() -> String {
    Source::ALL
        .iter()
        .map(|source| format!("{:<16} {}\n", source.wire_name(), source.label()))
        .collect()
}

/// Prints each notification on its own line below the progress line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "\n{notification}");
    }
}
