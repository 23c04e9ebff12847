//! # Engine Module
//!
//! Scheduler building blocks, leaves first:
//! - Identifiers and access signatures (`types`, `component`)
//! - System metadata and the `System` trait (`metadata`, `systems`)
//! - The unified registry (`registry`)
//! - Conflict detection and stage planning (`planner`)
//! - The execution plan and its validity flag (`plan`)
//! - The orchestrating scheduler (`scheduler`, `config`)
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod component;
pub mod metadata;
pub mod systems;
pub mod registry;
pub mod planner;
pub mod plan;
pub mod config;
pub mod scheduler;
