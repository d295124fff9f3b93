//! Core kernel modules
//!
//! Kernel state, slot tables, task management and time management.

pub mod config;
pub mod critical;
pub mod error;
pub mod kernel;
pub mod obj;
pub mod table;
pub mod types;
pub mod task;
pub mod time;
pub mod cs_cell;
#[cfg(feature = "mem")]
pub mod mem;
