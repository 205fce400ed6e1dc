//! Нормализованное логирование для fsvigil Core.
//!
//! ## Уровни логов
//! - `ERROR`: критические ошибки, требующие внимания
//! - `WARN`:  предупреждения, некритичные проблемы (например, пропуск одного события)
//! - `INFO`:  важные события жизненного цикла (startup, shutdown, key operations)
//! - `DEBUG`: детальная информация для отладки
//! - `TRACE`: максимально детальный вывод (включая данные)
//!
//! ## Использование
//! ```ignore
//! use fsvigil::logging::init_logging;
//!
//! init_logging(); // вызывается один раз при старте
//!
//! log::info!(target: "fsvigil::watcher", "Starting watcher");
//! ```

use std::sync::Once;

use log::{Level, LevelFilter};
use std::io::Write;

static INIT: Once = Once::new();

/// Инициализировать логирование (idempotent).
///
/// Управление уровнем логов: переменная окружения `RUST_LOG`.
/// Примеры:
/// - `RUST_LOG=info` — только INFO и выше
/// - `RUST_LOG=fsvigil=debug` — DEBUG для нашего crate
/// - `RUST_LOG=trace` — максимально детальный вывод
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env("RUST_LOG")
            .format(|buf, record| {
                let level = match record.level() {
                    Level::Error => "E",
                    Level::Warn => "W",
                    Level::Info => "I",
                    Level::Debug => "D",
                    Level::Trace => "T",
                };

                let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
                let target = record.target();

                // Формат: [timestamp] [LEVEL] [target] message
                writeln!(
                    buf,
                    "[{}] [{}] [{}] {}",
                    timestamp,
                    level,
                    target,
                    record.args()
                )
            })
            .filter_module("fsvigil", LevelFilter::Info)
            .filter_module("notify", LevelFilter::Warn)
            .try_init();
    });
}
