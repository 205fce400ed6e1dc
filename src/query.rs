//! Фасад выборок над хранилищем событий.
//!
//! Тонкий stateless слой: одиночные критерии делегируются в
//! [`EventStore`], композиция «расширение ∧ вид ∧ подстрока имени»
//! собирается здесь дозафильтровкой в памяти, чтобы хранилищу не
//! требовалась произвольная композиция предикатов.

use chrono::NaiveDateTime;

use crate::error::VigilError;
use crate::store::EventStore;
use crate::watcher::events::{EventType, FileEvent};

pub struct QueryManager {
    store: EventStore,
}

impl QueryManager {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }

    pub fn query_all(&self) -> Result<Vec<FileEvent>, VigilError> {
        self.store.query_all()
    }

    /// Пустая строка — «все файлы» (см. [`EventStore::query_by_extension`]).
    pub fn query_by_extension(&self, extension: &str) -> Result<Vec<FileEvent>, VigilError> {
        self.store.query_by_extension(extension)
    }

    pub fn query_by_event_type(&self, event_type: EventType) -> Result<Vec<FileEvent>, VigilError> {
        self.store.query_by_event_type(event_type)
    }

    /// Обе границы включительно.
    pub fn query_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<FileEvent>, VigilError> {
        self.store.query_by_date_range(start, end)
    }

    /// Буквальный префикс пути, не glob.
    pub fn query_by_directory(&self, prefix: &str) -> Result<Vec<FileEvent>, VigilError> {
        self.store.query_by_directory(prefix)
    }

    pub fn clear(&self) -> Result<(), VigilError> {
        self.store.clear()
    }

    /// Композитный поиск: логическое AND из заданных критериев.
    ///
    /// Начинает с выборки по расширению (`None` эквивалентен «все»),
    /// затем сужает в памяти по виду события и по регистронезависимой
    /// подстроке имени файла. Фильтрация стабильная: относительный
    /// порядок результатов хранилища сохраняется.
    pub fn search(
        &self,
        extension: Option<&str>,
        event_type: Option<EventType>,
        name_contains: Option<&str>,
    ) -> Result<Vec<FileEvent>, VigilError> {
        let mut events = self.store.query_by_extension(extension.unwrap_or(""))?;

        if let Some(wanted) = event_type {
            events.retain(|e| e.event_type() == wanted);
        }
        if let Some(needle) = name_contains {
            let needle = needle.to_lowercase();
            events.retain(|e| e.file_name().to_lowercase().contains(&needle));
        }
        Ok(events)
    }
}
