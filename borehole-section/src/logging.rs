//! Initialisation du logging (tracing-subscriber)

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

fn level(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    }
}

/// Filtre `RUST_LOG` s'il est défini et valide, sinon le niveau `-v`/`-q`
fn filter(verbose: u8, quiet: bool, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level(verbose, quiet).into()))
}

/// Installe le subscriber global
///
/// `RUST_LOG` reste prioritaire : les options `-v`/`-q` ne s'appliquent que
/// s'il est absent. Un second appel est sans effet (le subscriber déjà
/// installé est conservé).
pub fn init(verbose: u8, quiet: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let _ = fmt()
        .with_env_filter(filter(verbose, quiet, rust_log.as_deref()))
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_init_twice_is_harmless() {
        init(0, true);
        init(2, false);
        tracing::warn!("still logging");
    }

    #[test]
    fn test_verbosity_without_rust_log() {
        assert_eq!(filter(0, false, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(filter(2, false, None).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(filter(3, true, Some("  ")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_rust_log_wins_over_verbosity() {
        assert_eq!(filter(2, false, Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(filter(0, true, Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
