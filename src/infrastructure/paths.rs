//! Path manipulation utilities.
//!
//! This module resolves the data directory used for log files and expands
//! tilde-prefixed paths from configuration.

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ACTIONHOOKS_DATA_DIR";

const LOG_FILE_NAME: &str = "actionhooks.log";

fn home_dir() -> Option<String> {
    std::env::var("HOME").ok().filter(|home| !home.is_empty())
}

/// Returns the data directory for log files.
///
/// Resolution order:
/// 1. `$ACTIONHOOKS_DATA_DIR`
/// 2. `$HOME/.local/share/actionhooks`
/// 3. `./.actionhooks` when no home directory is known
///
/// The directory is not created.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }

    home_dir().map_or_else(
        || PathBuf::from(".actionhooks"),
        |home| PathBuf::from(home).join(".local").join("share").join("actionhooks"),
    )
}

/// Default log file location inside [`data_dir`].
#[must_use]
pub fn default_log_file() -> PathBuf {
    data_dir().join(LOG_FILE_NAME)
}

/// Expands a leading `~` to the home directory.
///
/// Paths without a leading `~`, and all paths when `$HOME` is unset, are
/// returned unchanged. `~user` forms are not expanded.
///
/// # Examples
///
/// ```
/// use actionhooks::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
/// assert_eq!(expand_tilde("relative/path"), "relative/path");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    let Some(home) = home_dir() else {
        return path.to_string();
    };

    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        format!("{}/{rest}", home.trim_end_matches('/'))
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let Some(home) = home_dir() else {
            return;
        };
        let home = home.trim_end_matches('/').to_string();

        assert_eq!(expand_tilde("~/hooks.toml"), format!("{home}/hooks.toml"));
        assert_eq!(expand_tilde("~user/hooks.toml"), "~user/hooks.toml");
        assert_eq!(expand_tilde("/etc/hooks.toml"), "/etc/hooks.toml");
    }

    #[test]
    fn test_default_log_file_is_inside_data_dir() {
        let log_file = default_log_file();
        assert_eq!(log_file.parent(), Some(data_dir().as_path()));
        assert_eq!(log_file.file_name().and_then(|n| n.to_str()), Some(LOG_FILE_NAME));
    }
}
