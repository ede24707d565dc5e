//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::Priority;

/// mt - projects, tasks and model-assisted prioritization
#[derive(Parser)]
#[command(
    name = "mt",
    about = "Projects-and-tasks to-do list with LLM-assisted prioritization",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Store directory, overrides storage.dir from the config
    #[arg(short, long, global = true, help = "Store directory (overrides config)")]
    pub store: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Ask the model to prioritize a project's open tasks
    Prioritize {
        /// Project id, id prefix or name fragment
        project: String,
    },
}

/// Project subcommands
#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Add {
        /// Project name
        name: String,

        /// Goal the project works toward
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List projects with their open task counts
    List,

    /// Rename a project or change its goal
    Edit {
        /// Project id, id prefix or name fragment
        project: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a project and all of its tasks
    Delete {
        /// Project id, id prefix or name fragment
        project: String,
    },
}

/// Task subcommands
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Create a task
    Add {
        /// Task title
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Project reference (defaults to Uncategorized)
        #[arg(short, long)]
        project: Option<String>,

        /// Deadline as YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
    },

    /// List tasks, open ones by default
    List {
        /// Only tasks of this project
        #[arg(short, long)]
        project: Option<String>,

        /// Include completed tasks
        #[arg(short, long, conflicts_with = "done")]
        all: bool,

        /// Only completed tasks
        #[arg(long)]
        done: bool,
    },

    /// Toggle a task between open and completed
    Done {
        /// Task id or id prefix
        task: String,
    },

    /// Edit task fields
    Edit {
        /// Task id or id prefix
        task: String,

        #[arg(long)]
        title: Option<String>,

        /// Empty string clears the description
        #[arg(short, long)]
        description: Option<String>,

        /// YYYY-MM-DD, empty string clears the deadline
        #[arg(long)]
        deadline: Option<String>,

        /// High, Medium, Low, or "none" to clear
        #[arg(long, value_parser = parse_priority_arg)]
        priority: Option<PriorityArg>,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Move a task to another project
    Move {
        /// Task id or id prefix
        task: String,

        /// Target project reference
        project: String,
    },

    /// Delete a task
    Delete {
        /// Task id or id prefix
        task: String,
    },
}

/// Priority given on the command line; `Clear` removes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityArg {
    Set(Priority),
    Clear,
}

impl PriorityArg {
    pub fn into_priority(self) -> Option<Priority> {
        match self {
            Self::Set(priority) => Some(priority),
            Self::Clear => None,
        }
    }
}

/// Parse a --priority value, accepting "none" to clear
pub fn parse_priority_arg(s: &str) -> Result<PriorityArg, String> {
    if s.trim().eq_ignore_ascii_case("none") {
        return Ok(PriorityArg::Clear);
    }
    s.parse::<Priority>().map(PriorityArg::Set)
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matetodo")
        .join("logs")
        .join("mt.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_project_add() {
        let cli = Cli::try_parse_from(["mt", "project", "add", "Launch", "-d", "Ship the beta"]).unwrap();
        match cli.command {
            Command::Project {
                command: ProjectCommand::Add { name, description },
            } => {
                assert_eq!(name, "Launch");
                assert_eq!(description.as_deref(), Some("Ship the beta"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_project_list() {
        let cli = Cli::try_parse_from(["mt", "project", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Project {
                command: ProjectCommand::List
            }
        ));
    }

    #[test]
    fn test_cli_parse_task_add_with_options() {
        let cli = Cli::try_parse_from([
            "mt",
            "task",
            "add",
            "Write docs",
            "-p",
            "launch",
            "--deadline",
            "2026-11-01",
        ])
        .unwrap();
        match cli.command {
            Command::Task {
                command:
                    TaskCommand::Add {
                        title,
                        description,
                        project,
                        deadline,
                    },
            } => {
                assert_eq!(title, "Write docs");
                assert!(description.is_none());
                assert_eq!(project.as_deref(), Some("launch"));
                assert_eq!(deadline.as_deref(), Some("2026-11-01"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_task_list_flags() {
        let cli = Cli::try_parse_from(["mt", "task", "list", "--all"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Task {
                command: TaskCommand::List {
                    all: true,
                    done: false,
                    ..
                }
            }
        ));

        assert!(Cli::try_parse_from(["mt", "task", "list", "--all", "--done"]).is_err());
    }

    #[test]
    fn test_cli_parse_task_edit_priority() {
        let cli = Cli::try_parse_from(["mt", "task", "edit", "abc", "--priority", "high"]).unwrap();
        match cli.command {
            Command::Task {
                command: TaskCommand::Edit { task, priority, .. },
            } => {
                assert_eq!(task, "abc");
                assert_eq!(priority, Some(PriorityArg::Set(Priority::High)));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["mt", "task", "edit", "abc", "--priority", "none"]).unwrap();
        match cli.command {
            Command::Task {
                command: TaskCommand::Edit { priority, .. },
            } => assert_eq!(priority, Some(PriorityArg::Clear)),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["mt", "task", "edit", "abc", "--priority", "urgent"]).is_err());
    }

    #[test]
    fn test_cli_parse_prioritize() {
        let cli = Cli::try_parse_from(["mt", "prioritize", "launch"]).unwrap();
        assert!(matches!(cli.command, Command::Prioritize { project } if project == "launch"));
    }

    #[test]
    fn test_cli_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["mt", "project", "list", "--store", "/tmp/s", "-l", "debug"]).unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["mt"]).is_err());
    }

    #[test]
    fn test_parse_priority_arg() {
        assert_eq!(parse_priority_arg("Low"), Ok(PriorityArg::Set(Priority::Low)));
        assert_eq!(parse_priority_arg("NONE"), Ok(PriorityArg::Clear));
        assert!(parse_priority_arg("later").is_err());
        assert_eq!(PriorityArg::Clear.into_priority(), None);
    }

    #[test]
    fn test_log_path_in_after_help() {
        assert!(generate_after_help().contains("mt.log"));
    }
}
