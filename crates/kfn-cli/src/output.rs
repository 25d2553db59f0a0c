//! JSON output for CLI commands.

use std::io::Write;

use serde::Serialize;

use crate::error::{CliError, Result};

/// Writes `value` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut *writer, value).map_err(CliError::Format)?;
    writeln!(writer)?;
    Ok(())
}
