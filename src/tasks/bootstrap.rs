//! Local project bootstrap: environment config and upload directory

use crate::assets::{self, CopyOutcome, MkdirOutcome};
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{Outcome, TaskContext};

pub const LOCAL_ENV_EXAMPLE: &str = "local.example.js";
pub const LOCAL_ENV_CONFIG: &str = "local-development.js";

/// Copy the example local config unless a local config already exists
pub fn copy_local_env_config(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let env_dir = ctx.path(&ctx.config.output.env);
    let src = env_dir.join(LOCAL_ENV_EXAMPLE);
    let dest = env_dir.join(LOCAL_ENV_CONFIG);

    match assets::copy_if_absent(&src, &dest)? {
        CopyOutcome::Copied => ctx.print_info(&format!("created {}", dest.display())),
        CopyOutcome::DestinationExists => {
            ctx.print_debug(&format!("{} exists, left as is", dest.display()))
        }
        CopyOutcome::SourceMissing => {
            ctx.print_warn(&format!("{} not found, nothing copied", src.display()))
        }
    }

    Ok(Outcome::Done)
}

/// Make sure the upload directory exists
pub fn make_uploads_dir(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let dir = ctx.path(&ctx.config.output.uploads);

    match assets::make_dir(&dir) {
        MkdirOutcome::Created => ctx.print_info(&format!("created {}", dir.display())),
        MkdirOutcome::AlreadyPresent => ctx.print_debug("upload directory present"),
        MkdirOutcome::Failed(e) => return Err(ExecutionError::io(dir, e)),
    }

    Ok(Outcome::Done)
}
