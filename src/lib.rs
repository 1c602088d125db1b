//! Describe external-process pipelines as values and run them.
//!
//! A [`Command`] is one program; [`Compose::pipe`] joins two statements into a
//! [`PipeStatement`]; [`Compose::with_input`] and friends redirect the three
//! standard streams. [`execute`] runs the result and collects its output.

#[macro_use]
extern crate tracing;

pub mod cmd;
pub mod config;
pub mod error;
pub mod prelude;
pub mod process;
pub mod stream;

pub use cmd::{
    execute::{call, check_call, check_output, execute, Captured, ExecutionResult, StageResult},
    lookup::{lookup, Program, Registry},
    Command, Compose, PipeStatement, Statement, Stmt,
};
pub use error::{Result, ShellfishError};
pub use stream::{Endpoint, FileMode, Literal};
