//! Environment switch tasks
//!
//! `env:dev` and `env:prod` do no work of their own. They hand the new mode
//! back to the sequencer, which passes it to every later step.

use crate::error::ExecutionResult;
use crate::runner::{Mode, Outcome, TaskContext};

pub fn set_development(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    switch(ctx, Mode::Development)
}

pub fn set_production(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    switch(ctx, Mode::Production)
}

fn switch(ctx: &TaskContext, mode: Mode) -> ExecutionResult<Outcome> {
    match ctx.mode {
        Some(current) if current != mode => {
            ctx.print_info(&format!("NODE_ENV {} -> {}", current, mode))
        }
        Some(_) => {}
        None => ctx.print_info(&format!("NODE_ENV={}", mode)),
    }
    Ok(Outcome::SetMode(mode))
}
