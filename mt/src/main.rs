use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use matetodo::board::{Board, NewTask, TaskPatch};
use matetodo::cli::{Cli, Command, ProjectCommand, TaskCommand, generate_after_help};
use matetodo::config::Config;
use matetodo::domain::{Project, Task};
use matetodo::llm::create_client;
use matetodo::prioritize::{LlmPriorityModel, PrioritizationReport, Prioritizer};
use matetodo::prompts::PromptLoader;
use matetodo::state::StateManager;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matetodo")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("mt.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let store_dir = cli.store.clone().unwrap_or_else(|| config.storage.dir.clone());
    info!(store_dir = %store_dir.display(), "matetodo starting");
    let manager = StateManager::spawn(&store_dir)
        .context(format!("Failed to open store at {}", store_dir.display()))?;
    let board = Board::open(Arc::new(manager.clone()))
        .await
        .context("Failed to open board")?;

    debug!(command = ?cli.command, "main: dispatching command");
    let result = match cli.command {
        Command::Project { command } => cmd_project(&board, command).await,
        Command::Task { command } => cmd_task(&board, command).await,
        Command::Prioritize { project } => cmd_prioritize(&config, &board, &project).await,
    };

    if let Err(e) = manager.shutdown().await {
        debug!(error = %e, "main: store shutdown failed");
    }
    result
}

async fn cmd_project(board: &Board, command: ProjectCommand) -> Result<()> {
    debug!(?command, "cmd_project: called");
    match command {
        ProjectCommand::Add { name, description } => {
            let project = board.add_project(&name, description).await?;
            println!("{} project {} ({})", "Added".green(), project.name.bold(), project.id.dimmed());
        }
        ProjectCommand::List => {
            let projects = board.projects().await?;
            if projects.is_empty() {
                println!("No projects");
            }
            for project in projects {
                let open = board.open_tasks(&project.id).await.len();
                print_project(&project, open);
            }
        }
        ProjectCommand::Edit {
            project,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                return Err(eyre::eyre!("Nothing to update: pass --name or --description"));
            }
            let project = board.update_project(&project, name, description).await?;
            println!("{} project {} ({})", "Updated".green(), project.name.bold(), project.id.dimmed());
        }
        ProjectCommand::Delete { project } => {
            let name = board.project(&project).await?.name;
            let removed = board.delete_project(&project).await?;
            println!("{} project {} and {} task(s)", "Deleted".red(), name.bold(), removed);
        }
    }
    Ok(())
}

async fn cmd_task(board: &Board, command: TaskCommand) -> Result<()> {
    debug!(?command, "cmd_task: called");
    match command {
        TaskCommand::Add {
            title,
            description,
            project,
            deadline,
        } => {
            let task = board
                .add_task(NewTask {
                    title,
                    description,
                    project,
                    deadline,
                })
                .await?;
            println!("{} task {} ({})", "Added".green(), task.title.bold(), task.id.dimmed());
        }
        TaskCommand::List { project, all, done } => {
            let mut tasks = if done {
                board.completed_tasks().await
            } else if all {
                let mut tasks = board.all_open_tasks().await;
                tasks.extend(board.completed_tasks().await);
                tasks
            } else {
                board.all_open_tasks().await
            };
            if let Some(reference) = project {
                let project_id = board.project(&reference).await?.id;
                tasks.retain(|t| t.project_id == project_id);
            }
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in &tasks {
                print_task(task);
            }
        }
        TaskCommand::Done { task } => {
            let task = board.toggle_task(&task).await?;
            let verb = if task.completed { "Completed" } else { "Reopened" };
            println!("{} task {}", verb.green(), task.title.bold());
        }
        TaskCommand::Edit {
            task,
            title,
            description,
            deadline,
            priority,
            reason,
        } => {
            let patch = TaskPatch {
                title,
                description,
                deadline,
                priority: priority.map(|p| p.into_priority()),
                reason,
            };
            let task = board.update_task(&task, patch).await?;
            println!("{} task {}", "Updated".green(), task.title.bold());
        }
        TaskCommand::Move { task, project } => {
            let target = board.project(&project).await?;
            let task = board.move_task(&task, &target.id).await?;
            println!("{} task {} to {}", "Moved".green(), task.title.bold(), target.name.bold());
        }
        TaskCommand::Delete { task } => {
            let task = board.delete_task(&task).await?;
            println!("{} task {}", "Deleted".red(), task.title.bold());
        }
    }
    Ok(())
}

async fn cmd_prioritize(config: &Config, board: &Board, reference: &str) -> Result<()> {
    debug!(%reference, "cmd_prioritize: called");
    let project = board.project(reference).await?;

    config.validate()?;
    let client = create_client(&config.llm)?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let model = LlmPriorityModel::new(client, PromptLoader::new(cwd), config.prioritize.max_tokens);
    let prioritizer = Prioritizer::new(
        board.store(),
        Arc::new(model),
        board.tasks(),
        config.prioritize.model_timeout(),
    );

    println!("Prioritizing {}...", project.name.bold());
    match prioritizer.prioritize(&project.id).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(failure) if failure.is_no_op() => {
            println!("{}", "No open tasks to prioritize".yellow());
            Ok(())
        }
        Err(failure) => Err(failure.into()),
    }
}

fn print_project(project: &Project, open: usize) {
    println!(
        "{}  {}  {} open",
        project.id.dimmed(),
        project.name.bold(),
        open
    );
    if let Some(description) = &project.description {
        println!("    {}", description);
    }
}

fn print_task(task: &Task) {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let priority = match task.priority {
        Some(p) => format!(" ({})", p).cyan().to_string(),
        None => String::new(),
    };
    let deadline = match &task.deadline {
        Some(d) => format!(" due {}", d),
        None => String::new(),
    };
    println!("{} {} {}{}{}", check, task.id.dimmed(), task.title, priority, deadline);
    if let Some(reason) = &task.reason {
        println!("      {}", reason.dimmed());
    }
}

fn print_report(report: &PrioritizationReport) {
    println!(
        "{} {} task(s), {} matched",
        "Updated".green(),
        report.updated,
        report.matched
    );
    for title in &report.ignored {
        println!("{} unknown task in answer: {}", "Ignored".yellow(), title);
    }
    for task in &report.open_tasks {
        print_task(task);
    }
}
