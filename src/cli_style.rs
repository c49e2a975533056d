/*!
 * rmbridge CLI Style System
 *
 * Themed text, status lines and the tables used to print legacy records.
 */

use chrono::{DateTime, Utc};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};

use crate::legacy::{JobState, JobStatus, LegacyClusterMetrics, LegacyQueueInfo, TaskTrackerInfo};

// ============================================================================
// THEME COLORS
// ============================================================================

/// Brand colors for consistent styling
pub struct Theme;

impl Theme {
    /// Primary accent color (cyan/blue)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    /// Success color (green)
    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    /// Warning color (yellow)
    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    /// Error color (red)
    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    /// Muted/secondary text (dim)
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }
}

/// Unicode icons for visual feedback
pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const ARROW_RIGHT: &'static str = "→";
}

/// Draw a section header with a line
pub fn section_header(title: &str) {
    let line_len = 50 - title.len().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a minimal table (no outer borders)
pub fn create_minimal_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| {
            Cell::new(title)
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

/// Create a key-value table for stats
pub fn stats_table(items: &[(&str, String)]) -> Table {
    let mut table = create_minimal_table();

    for (key, value) in items {
        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(value)
                .fg(Color::White)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table
}

fn state_cell(state: JobState) -> Cell {
    let color = match state {
        JobState::Prep => Color::Yellow,
        JobState::Running => Color::Cyan,
        JobState::Succeeded => Color::Green,
        JobState::Failed | JobState::Killed => Color::Red,
    };
    Cell::new(state.as_str()).fg(color)
}

/// Number of (active, complete) jobs
pub fn job_counts(jobs: &[JobStatus]) -> (usize, usize) {
    let complete = jobs.iter().filter(|j| j.state.is_complete()).count();
    (jobs.len() - complete, complete)
}

/// Jobs as listed by the resource manager
pub fn jobs_table(jobs: &[JobStatus]) -> Table {
    let mut table = create_table();
    table.set_header(header_cells(&["Job", "Name", "User", "Queue", "State", "Started"]));

    for job in jobs {
        table.add_row(vec![
            Cell::new(job.job_id.to_string()).add_attribute(Attribute::Bold),
            Cell::new(&job.job_name),
            Cell::new(&job.user),
            Cell::new(&job.queue),
            state_cell(job.state),
            Cell::new(format_start_time(job.start_time)).fg(Color::DarkGrey),
        ]);
    }

    table
}

pub fn trackers_table(trackers: &[TaskTrackerInfo]) -> Table {
    let mut table = create_table();
    table.set_header(header_cells(&["Tracker"]));

    for tracker in trackers {
        table.add_row(vec![Cell::new(&tracker.tracker_name)]);
    }

    table
}

/// Queues in the order given; flattened lists print as siblings
pub fn queues_table(queues: &[LegacyQueueInfo]) -> Table {
    let mut table = create_table();
    table.set_header(header_cells(&["Queue", "State", "Scheduling Info"]));

    for queue in queues {
        let state = Cell::new(queue.state.to_string()).fg(match queue.state {
            crate::legacy::LegacyQueueState::Running => Color::Green,
            crate::legacy::LegacyQueueState::Stopped => Color::Red,
        });
        table.add_row(vec![
            Cell::new(&queue.queue_name).add_attribute(Attribute::Bold),
            state,
            Cell::new(&queue.scheduling_info).fg(Color::DarkGrey),
        ]);
    }

    table
}

pub fn metrics_table(metrics: &LegacyClusterMetrics) -> Table {
    stats_table(&[
        ("Task trackers", metrics.task_trackers.to_string()),
        ("Map slot capacity", metrics.map_slot_capacity.to_string()),
        ("Reduce slot capacity", metrics.reduce_slot_capacity.to_string()),
        ("Running maps", metrics.running_maps.to_string()),
        ("Running reduces", metrics.running_reduces.to_string()),
        ("Occupied map slots", metrics.occupied_map_slots.to_string()),
        ("Occupied reduce slots", metrics.occupied_reduce_slots.to_string()),
        ("Reserved map slots", metrics.reserved_map_slots.to_string()),
        ("Reserved reduce slots", metrics.reserved_reduce_slots.to_string()),
        ("Total submissions", metrics.total_job_submissions.to_string()),
        ("Blacklisted trackers", metrics.blacklisted_trackers.to_string()),
        (
            "Decommissioned trackers",
            metrics.decommissioned_trackers.to_string(),
        ),
    ])
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Format epoch milliseconds as a UTC timestamp, `-` when unset
pub fn format_start_time(epoch_millis: i64) -> String {
    if epoch_millis <= 0 {
        return "-".to_string();
    }
    DateTime::<Utc>::from_timestamp_millis(epoch_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "\n{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
    eprintln!();
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

/// Print a styled success message
pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

/// Print a styled info message
pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}
