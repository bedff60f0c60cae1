use crate::util::error::ControlError;
use std::{fs, io, path::Path};

/// Split an attribute file's contents on ASCII whitespace, dropping empty
/// tokens. A trailing newline therefore never yields a spurious final entry.
pub fn split_tokens(content: &str) -> Vec<String> {
    content
        .split_ascii_whitespace()
        .map(ToString::to_string)
        .collect()
}

/// Write a value to a sysfs attribute, replacing prior contents.
///
/// Attribute files are interpreted on write, so the value goes out in a
/// single unbuffered write with a trailing newline.
///
/// # Errors
///
/// - `ControlError::PermissionDenied` if permission is denied
/// - `ControlError::PathMissing` if the path doesn't exist
/// - `ControlError::WriteError` for other I/O errors
pub fn write_sysfs_value(path: impl AsRef<Path>, value: &str) -> Result<(), ControlError> {
    let p = path.as_ref();

    fs::write(p, format!("{value}\n")).map_err(|e| {
        let error_msg = format!("Path: {:?}, Value: '{}', Error: {}", p.display(), value, e);
        match e.kind() {
            io::ErrorKind::PermissionDenied => ControlError::PermissionDenied(error_msg),
            io::ErrorKind::NotFound => {
                ControlError::PathMissing(format!("Path '{}' does not exist", p.display()))
            }
            _ => ControlError::WriteError(error_msg),
        }
    })
}

/// Read a sysfs attribute with consistent error handling, trimming whitespace.
pub fn read_sysfs_value(path: impl AsRef<Path>) -> Result<String, ControlError> {
    let p = path.as_ref();
    fs::read_to_string(p)
        .map_err(|e| read_error(p, &e))
        .map(|s| s.trim().to_string())
}

/// Read the first line of an optional attribute.
///
/// Returns `Ok(None)` when the path does not exist: absence of an attribute
/// is a capability gap, not an error. I/O failures on a file that does exist
/// still surface.
pub fn read_first_line(path: impl AsRef<Path>) -> Result<Option<String>, ControlError> {
    let p = path.as_ref();
    if !p.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(p).map_err(|e| read_error(p, &e))?;
    Ok(Some(
        content.lines().next().unwrap_or_default().trim().to_string(),
    ))
}

/// Read and tokenize an optional whitespace-separated list attribute.
///
/// Same absence semantics as [`read_first_line`].
pub fn read_token_list(path: impl AsRef<Path>) -> Result<Option<Vec<String>>, ControlError> {
    let p = path.as_ref();
    if !p.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(p).map_err(|e| read_error(p, &e))?;
    Ok(Some(split_tokens(&content)))
}

fn read_error(p: &Path, e: &io::Error) -> ControlError {
    let error_msg = format!("Path: {:?}, Error: {}", p.display(), e);
    match e.kind() {
        io::ErrorKind::PermissionDenied => ControlError::PermissionDenied(error_msg),
        io::ErrorKind::NotFound => {
            ControlError::PathMissing(format!("Path '{}' does not exist", p.display()))
        }
        _ => ControlError::ReadError(error_msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn split_tokens_drops_trailing_newline() {
        assert_eq!(
            split_tokens("performance powersave\n"),
            vec!["performance".to_string(), "powersave".to_string()]
        );
    }

    #[test]
    fn split_tokens_collapses_mixed_whitespace() {
        assert_eq!(
            split_tokens("  default\tperformance  power \n"),
            vec!["default", "performance", "power"]
        );
    }

    #[test]
    fn split_tokens_of_empty_input_is_empty() {
        assert!(split_tokens("").is_empty());
        assert!(split_tokens("\n").is_empty());
    }

    #[test]
    fn write_appends_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaling_governor");
        write_sysfs_value(&path, "performance").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "performance\n");
    }

    #[test]
    fn write_to_missing_directory_reports_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("attr");
        assert!(matches!(
            write_sysfs_value(&path, "x"),
            Err(ControlError::PathMissing(_))
        ));
    }

    #[test]
    fn read_first_line_takes_only_the_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attr");
        fs::write(&path, "powersave\nleftover\n").unwrap();
        assert_eq!(
            read_first_line(&path).unwrap(),
            Some("powersave".to_string())
        );
    }

    #[test]
    fn optional_reads_of_missing_paths_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        assert_eq!(read_first_line(&path).unwrap(), None);
        assert_eq!(read_token_list(&path).unwrap(), None);
    }
}
