use chrono::Local;
use colored::Colorize;
use log::Level;

/// Line written to the audit file.
pub(crate) fn format_log(message: &str, level: Level, name: Option<&str>) -> String {
    let time = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
    if let Some(name) = name {
        format!("[{time} {name} {level}] {message}")
    } else {
        format!("[{time} {level}] {message}")
    }
}

/// Line printed to stderr for the writer's own diagnostics.
pub(crate) fn format_console(message: &str, level: Level, target: &str) -> String {
    let time = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
    let level = match level {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".purple(),
    };
    format!("[{time} {target} {level}] {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_log() {
        let line = format_log("user=alice action=login", Level::Info, Some("audit"));
        assert!(line.starts_with('['));
        assert!(line.ends_with(" audit INFO] user=alice action=login"));

        let line = format_log("denied", Level::Warn, None);
        assert!(line.ends_with(" WARN] denied"));
        // [2024-03-01T09:05:07.123 WARN] denied
        assert_eq!(line.find(" WARN]"), Some(24));
    }

    #[test]
    fn test_format_console() {
        colored::control::set_override(false);
        let line = format_console("unable to roll", Level::Warn, "filelog_core");
        assert!(line.ends_with(" filelog_core WARN] unable to roll"));
    }
}
