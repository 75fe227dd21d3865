use crate::model::{BoardSnapshot, Column, Label, Priority, Task, TaskId};
use chrono::{TimeZone, Utc};

/// A small board used across unit tests:
///
/// - `backlog`: "Fix SQL injection" (High, security), "Write onboarding docs" (Low, docs)
/// - `todo`: "Tune sql queries" (High, perf), "Refresh sql dashboard" (Medium, no labels)
/// - `done`: empty
pub fn sample_snapshot() -> BoardSnapshot {
    let mut snapshot = BoardSnapshot {
        columns: vec![
            column("backlog", "Backlog", 0),
            column("todo", "To Do", 1),
            column("done", "Done", 2),
        ],
        labels: vec![
            label("lbl-security", "security", "#d73a4a"),
            label("lbl-docs", "docs", "#0075ca"),
            label("lbl-perf", "perf", "#a2eeef"),
        ],
        ..Default::default()
    };

    snapshot.tasks.insert(
        "backlog".into(),
        vec![
            task("t-sql", "Fix SQL injection", Priority::High, 1, &["lbl-security"])
                .with_details("Parameterize the search endpoint"),
            task("t-docs", "Write onboarding docs", Priority::Low, 2, &["lbl-docs"]),
        ],
    );
    snapshot.tasks.insert(
        "todo".into(),
        vec![
            task("t-perf", "Tune sql queries", Priority::High, 3, &["lbl-perf"]),
            task("t-dash", "Refresh sql dashboard", Priority::Medium, 4, &[]),
        ],
    );
    snapshot.tasks.insert("done".into(), Vec::new());
    snapshot
}

pub fn column(id: &str, title: &str, order: u32) -> Column {
    Column {
        id: id.to_string(),
        title: title.to_string(),
        order,
    }
}

pub fn label(id: &str, name: &str, color: &str) -> Label {
    Label {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
    }
}

/// A task with a fixed id, created `day` days into 2024.
pub fn task(id: &str, title: &str, priority: Priority, day: u32, labels: &[&str]) -> Task {
    let mut task = Task::new(title);
    task.id = TaskId::from(id);
    task.priority = priority;
    task.labels = labels.iter().map(|l| l.to_string()).collect();
    task.created_at = Utc
        .with_ymd_and_hms(2024, 1, day, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    task
}

pub trait TaskExt {
    fn with_details(self, details: &str) -> Self;
    fn with_rating(self, rating: Option<f64>) -> Self;
}

impl TaskExt for Task {
    fn with_details(mut self, details: &str) -> Self {
        self.details = details.to_string();
        self
    }

    fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating;
        self
    }
}
