use crate::severity::LogSeverity;
use crate::systime::now;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable holding the minimum severity that gets printed.
pub const LOG_ENV: &str = "ELYTRA_LOG";

static MIN_SEVERITY: Lazy<AtomicU8> = Lazy::new(|| {
    let severity = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LogSeverity>().ok())
        .unwrap_or(LogSeverity::Info);
    AtomicU8::new(severity as u8)
});

fn severity_from_u8(value: u8) -> LogSeverity {
    match value {
        0 => LogSeverity::Debug,
        1 => LogSeverity::Info,
        2 => LogSeverity::Warning,
        3 => LogSeverity::Error,
        _ => LogSeverity::Fatal,
    }
}

pub fn min_severity() -> LogSeverity {
    severity_from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
}

/// Overrides the severity read from `ELYTRA_LOG`.
pub fn set_min_severity(severity: LogSeverity) {
    MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
}

pub fn enabled(severity: LogSeverity) -> bool {
    severity >= min_severity()
}

pub fn log(msg: String, log_severity: LogSeverity) {
    if enabled(log_severity) {
        eprintln!("[{}] {} {}", log_severity, now(), msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_round_trips_through_u8() {
        for severity in [
            LogSeverity::Debug,
            LogSeverity::Info,
            LogSeverity::Warning,
            LogSeverity::Error,
            LogSeverity::Fatal,
        ] {
            assert_eq!(severity_from_u8(severity as u8), severity);
        }
    }

    #[test]
    fn test_min_severity_filters() {
        set_min_severity(LogSeverity::Warning);
        assert!(!enabled(LogSeverity::Info));
        assert!(enabled(LogSeverity::Warning));
        assert!(enabled(LogSeverity::Fatal));
    }
}
