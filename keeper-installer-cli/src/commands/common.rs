//! Common utilities shared across CLI commands.

use console::{style, StyledObject};

use crate::error::CliError;

/// Fail unless a user can answer prompts.
pub fn ensure_interactive() -> Result<(), CliError> {
    if console::user_attended() {
        Ok(())
    } else {
        Err(CliError::Config(
            "not running in a terminal; pass --yes to skip confirmation".to_string(),
        ))
    }
}

/// Marker for a path that exists or not.
pub fn presence(exists: bool) -> StyledObject<&'static str> {
    if exists {
        style("present").green()
    } else {
        style("missing").dim()
    }
}
