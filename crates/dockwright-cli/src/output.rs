//! Formatted output helpers for CLI commands.

use std::time::Duration;

use dockwright_common::types::ProcessResult;
use serde::Serialize;

/// Formats a duration as seconds with one decimal, or milliseconds below
/// one second.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// Prints a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints ids one per line, or as a JSON array.
///
/// # Errors
///
/// Returns an error if JSON output fails.
pub fn print_ids(ids: &[String], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(ids);
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

#[derive(Serialize)]
struct CleanupLine<'a> {
    targets: &'a [String],
    exit_code: i32,
    stderr: &'a str,
}

/// Reports a best-effort cleanup command.
///
/// # Errors
///
/// Returns an error if JSON output fails.
pub fn print_cleanup(targets: &[String], result: &ProcessResult, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&CleanupLine {
            targets,
            exit_code: result.exit_code,
            stderr: result.stderr.trim(),
        });
    }
    if result.succeeded() {
        for target in targets {
            println!("{target}");
        }
    } else {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("warning: {}", result.stderr.trim());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_sub_second() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn format_duration_seconds() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
    }
}
