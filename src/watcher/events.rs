//! Типы нормализованных событий файловой системы.
//!
//! [`FileEvent`] — единица истории: одно обнаруженное изменение.
//! Формат timestamp фиксирован ([`TIMESTAMP_FORMAT`]) и является контрактом
//! хранения: сравнение диапазонов дат в SQLite — лексикографическое по
//! отформатированной строке, что совпадает с хронологией только потому,
//! что формат фиксированной ширины с нулевым дополнением.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, Timelike};

use crate::error::VigilError;

/// Формат сериализации timestamp (секундная точность, локальное время).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Вид события файловой системы.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Файл или директория созданы.
    Created,
    /// Содержимое изменено.
    Modified,
    /// Файл или директория удалены.
    Deleted,
    /// Переименование, если backend отдаёт его одним событием.
    /// Backend'ы, отдающие rename как пару delete+create, дают два события —
    /// мы их не склеиваем.
    Renamed,
}

impl EventType {
    /// Имя варианта в хранимом формате (контракт таблицы `file_events`).
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Created => "ENTRY_CREATE",
            EventType::Modified => "ENTRY_MODIFY",
            EventType::Deleted => "ENTRY_DELETE",
            EventType::Renamed => "ENTRY_RENAME",
        }
    }
}

impl FromStr for EventType {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRY_CREATE" => Ok(EventType::Created),
            "ENTRY_MODIFY" => Ok(EventType::Modified),
            "ENTRY_DELETE" => Ok(EventType::Deleted),
            "ENTRY_RENAME" => Ok(EventType::Renamed),
            other => Err(VigilError::UnknownEventType(other.to_string())),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Выделить расширение из имени файла.
///
/// Правило: последняя точка и всё после неё (включительно). Нет точки —
/// пустая строка. Точка в нулевой позиции тоже считается (`.gitignore` →
/// `.gitignore`). Единственная реализация на весь crate: engine, store и
/// фасад запросов обязаны пользоваться именно ей.
pub fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) => file_name[idx..].to_string(),
        None => String::new(),
    }
}

/// Текущее локальное время, усечённое до секунд.
pub fn now_second_precision() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Нормализованное событие: одно обнаруженное изменение.
///
/// Immutable после конструирования: `file_extension` выводится из
/// `file_name` в конструкторе и не может разойтись с ним. Идентичности
/// сверх значений полей нет, дубликаты допустимы.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEvent {
    file_name: String,
    file_extension: String,
    path: String,
    event_type: EventType,
    timestamp: NaiveDateTime,
}

impl FileEvent {
    /// Создать событие; расширение выводится из `file_name`.
    pub fn new(
        file_name: impl Into<String>,
        path: impl Into<String>,
        event_type: EventType,
        timestamp: NaiveDateTime,
    ) -> Self {
        let file_name = file_name.into();
        let file_extension = extension_of(&file_name);
        Self {
            file_name,
            file_extension,
            path: path.into(),
            event_type,
            timestamp,
        }
    }

    /// Восстановить событие из строк хранилища (расширение берётся как есть).
    pub(crate) fn from_stored(
        file_name: String,
        file_extension: String,
        path: String,
        event_type: EventType,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            file_name,
            file_extension,
            path,
            event_type,
            timestamp,
        }
    }

    /// Имя файла (без директории).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Расширение, включая точку; пустая строка, если точки нет.
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    /// Абсолютный путь к затронутому файлу на момент обнаружения.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Timestamp в хранимом формате `YYYY-MM-DD HH:MM:SS`.
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FileEvent[file={}, ext={}, path={}, type={}, time={}]",
            self.file_name,
            self.file_extension,
            self.path,
            self.event_type,
            self.formatted_timestamp()
        )
    }
}
