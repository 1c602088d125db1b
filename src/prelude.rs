pub use crate::{
    cmd::{
        execute::{call, check_call, check_output, execute, Captured, ExecutionResult},
        lookup::{lookup, Registry},
        Command, Compose, PipeStatement, Statement, Stmt,
    },
    error::{Result, ShellfishError},
    stream::{Endpoint, FileMode, Literal},
};
