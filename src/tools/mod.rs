//! Tools module - external side effects available to participants
//!
//! Contains the Python code executor offered to tool-invoking participants.

pub mod executor;

pub use executor::{PythonExecutor, RUN_PYTHON_TOOL};
