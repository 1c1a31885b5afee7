//! Helper utilities.

use std::io::Write;
use std::sync::Once;

/// Env var holding the max log level (`error`, `warn`, `info`, `debug`, `trace`).
pub const LOG_LEVEL_VAR: &str = "RANKHARVEST_LOG";

/// Initialize [`log`] logging to stderr, if not already initialized.
pub fn init_logging() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        {
            fn hook(info: &std::panic::PanicInfo) {
                log::error!("{}", info);
            }
            std::panic::set_hook(Box::new(hook));
        }
        {
            struct StderrLog;
            static LOG: StderrLog = StderrLog;
            impl log::Log for StderrLog {
                fn enabled(&self, metadata: &log::Metadata) -> bool {
                    metadata.level() <= log::max_level()
                }

                fn log(&self, record: &log::Record) {
                    if !self.enabled(record.metadata()) {
                        return;
                    }
                    let _ = writeln!(
                        std::io::stderr().lock(),
                        "[{} {}] {}",
                        record.level(),
                        record.module_path().unwrap_or("?"),
                        record.args()
                    );
                }

                fn flush(&self) {
                    let _ = std::io::stderr().flush();
                }
            }
            if log::set_logger(&LOG).is_err() {
                // Another logger won (e.g. a test harness); keep it.
                return;
            }
            log::set_max_level(max_level_from_env());

            log::debug!("logger set");
        }
    });
}

fn max_level_from_env() -> log::LevelFilter {
    std::env::var(LOG_LEVEL_VAR)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(log::LevelFilter::Info)
}
