//! matetodo - projects, tasks and LLM-assisted prioritization
//!
//! Tasks live in projects. A project's description is its goal, and a
//! prioritization cycle asks a language model to rank the project's open
//! tasks against that goal, writing back a priority and a one-line reason
//! per task.
//!
//! # Modules
//!
//! - [`domain`] - Task, Project and Priority records
//! - [`state`] - Actor-owned document store and the in-memory task collection
//! - [`board`] - Project and task CRUD
//! - [`prioritize`] - The prioritization cycle
//! - [`llm`] - LLM client trait with Anthropic and OpenAI implementations
//! - [`prompts`] - Prompt templates and override loading
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod board;
pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod prioritize;
pub mod prompts;
pub mod state;
