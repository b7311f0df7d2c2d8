use std::env;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::errors::RipioError;

/// Format a size in bytes as (decimal) kilobytes.
pub fn to_kb(bytes: u64) -> String {
    format!("{:.0} KB", bytes as f64 / 1000.0)
}

/// Show a path with the home directory abbreviated as `~`.
pub fn pretty_path(path: &Path) -> String {
    let shown = path.display().to_string();

    let home = match env::var("HOME") {
        Ok(home) => home.trim_end_matches('/').to_string(),
        Err(_) => return shown,
    };

    let abbreviated = match shown.strip_prefix(home.as_str()) {
        Some(rest) if !home.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
            Some(format!("~{}", rest))
        }
        _ => None,
    };

    abbreviated.unwrap_or(shown)
}

/// Ask the user to type `YES` before doing something that can't be undone.
///
/// Returns `false` for any other answer, including end of input.
pub fn confirm_irrecoverable_operation(
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<bool, RipioError> {
    let io_error = |e: std::io::Error| RipioError::Aborted(e.to_string());

    write!(
        output,
        "This is an IRRECOVERABLE operation!!\nAre you sure? (write uppercase 'yes'): "
    )
    .map_err(io_error)?;
    output.flush().map_err(io_error)?;

    let mut answer = String::new();
    input.read_line(&mut answer).map_err(io_error)?;

    Ok(answer.trim_end_matches(|c| c == '\n' || c == '\r') == "YES")
}
