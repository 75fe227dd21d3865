use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use taskboard::model::Priority;
use taskboard::view::SortKey;

#[derive(Parser, Debug)]
#[command(name = "taskboard", version)]
#[command(about = "Kanban board for the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Whose board to open (a name or an email address)
    #[arg(short, long, global = true, env = "TASKBOARD_USER", default_value = "local")]
    pub user: String,

    /// Directory holding boards and config.json
    #[arg(long, global = true, env = "TASKBOARD_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the board (default)
    #[command(alias = "ls")]
    Show {
        /// Only tasks whose title or details contain this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only tasks carrying one of these labels (id or name, repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Only tasks with this priority
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Sort order: date, date-asc, priority, priority-asc, title, title-desc, rating,
        /// rating-asc
        #[arg(long)]
        sort: Option<SortKey>,
    },

    /// Manage columns
    #[command(alias = "col")]
    Column {
        #[command(subcommand)]
        action: ColumnCommand,
    },

    /// Manage tasks
    #[command(alias = "t")]
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },

    /// Manage labels
    #[command(alias = "l")]
    Label {
        #[command(subcommand)]
        action: LabelCommand,
    },

    /// Print the board as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the board with a JSON export
    Import { file: PathBuf },

    /// Restore the default columns, deleting every task and label
    Reset,

    /// Get or set configuration
    Config {
        /// Configuration key (default-columns, label-cap, default-sort)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ColumnCommand {
    /// Add a column at the end of the board
    Add { title: String },

    /// Rename or reposition a column
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        /// New position, starting at 0
        #[arg(short, long)]
        order: Option<u32>,
    },

    /// Delete a column, either moving its tasks elsewhere or deleting them too
    #[command(alias = "delete")]
    #[command(group(ArgGroup::new("disposal").required(true).args(["move_to", "cascade"])))]
    Rm {
        id: String,

        /// Move the column's tasks to this column first
        #[arg(long)]
        move_to: Option<String>,

        /// Delete the column's tasks as well
        #[arg(long)]
        cascade: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task to the end of a column
    Add {
        column: String,
        title: String,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Change fields of a task
    Edit {
        /// Task id or unique id prefix
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        /// Task id or unique id prefix
        id: String,
    },

    /// Move a task to a column, optionally at a position
    Mv {
        /// Task id or unique id prefix
        id: String,
        column: String,

        /// Position in the target column, starting at 0 (default: end)
        #[arg(short, long)]
        index: Option<usize>,
    },

    /// Toggle the starred flag
    Star {
        /// Task id or unique id prefix
        id: String,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct TaskFields {
    #[arg(short, long)]
    pub details: Option<String>,

    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// 0 to 10
    #[arg(short, long)]
    pub rating: Option<f64>,

    /// Label id or name (repeatable; replaces the task's labels)
    #[arg(short, long = "label")]
    pub labels: Vec<String>,

    #[arg(long)]
    pub status: Option<String>,

    /// Due date as YYYY-MM-DD ("" clears it)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    /// Create a label
    Add {
        name: String,

        /// Hex color, #RGB or #RRGGBB
        #[arg(short, long)]
        color: String,
    },

    /// Rename or recolor a label
    Edit {
        /// Label id or name
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        color: Option<String>,
    },

    /// Delete a label and remove it from every task
    #[command(alias = "delete")]
    Rm {
        /// Label id or name
        id: String,
    },

    /// Attach a label to a task
    Attach { task: String, label: String },

    /// Detach a label from a task
    Detach { task: String, label: String },
}
