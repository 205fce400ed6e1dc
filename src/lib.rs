//! fsvigil Core
//!
//! Этот crate реализует мониторинг поддерева файловой системы:
//! нормализация нативных событий в [`FileEvent`], фильтрация по расширению,
//! запись истории в SQLite и выборки по критериям. GUI/экспорт/почта —
//! внешние потребители; они подключаются через [`EventSink`].

pub mod controller;
pub mod error;
pub mod logging;
pub mod query;
pub mod sink;
pub mod store;
pub mod watcher;

pub use controller::WatcherController;
pub use error::VigilError;
pub use query::QueryManager;
pub use sink::{EventSink, FnSink, StoreSink};
pub use store::EventStore;
pub use watcher::events::{extension_of, EventType, FileEvent, TIMESTAMP_FORMAT};
pub use watcher::{start_watcher, WatcherHandle};
