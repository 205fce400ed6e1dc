//! Хранилище истории событий (SQLite).
//!
//! Append-only таблица `file_events`; формат колонок — стабильный
//! контракт, совместимый с ранее накопленными данными:
//! `file_name`, `file_extension`, `path`, `event_type`
//! (`ENTRY_CREATE|ENTRY_MODIFY|ENTRY_DELETE|ENTRY_RENAME`),
//! `timestamp` (`YYYY-MM-DD HH:MM:SS`).
//!
//! Соединение не считается персистентным: каждая операция открывает его
//! заново и идемпотентно создаёт схему. Соединение между вызовами может
//! быть инвалидировано (другой процесс, перезапуск), поэтому один
//! reconnect на вызов, а не долгоживущий коннект.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row, ToSql};

use crate::error::VigilError;
use crate::watcher::events::{EventType, FileEvent, TIMESTAMP_FORMAT};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS file_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT,
    file_extension TEXT,
    path TEXT,
    event_type TEXT,
    timestamp TEXT
);";

const SELECT_EVENTS: &str =
    "SELECT file_name, file_extension, path, event_type, timestamp FROM file_events";

/// Хранилище событий. Держит только путь к файлу БД, поэтому дёшево
/// клонируется; подразумевается один writer (см. [`crate::sink::StoreSink`]).
#[derive(Clone, Debug)]
pub struct EventStore {
    db_path: PathBuf,
}

impl EventStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Дефолтное расположение БД: `<data_local>/fsvigil/file_events.db`.
    /// Директория создаётся при отсутствии.
    pub fn default_path() -> Result<PathBuf, VigilError> {
        let base = dirs::data_local_dir().ok_or(VigilError::DataDirNotFound)?;
        let dir = base.join("fsvigil");
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join("file_events.db"))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Открыть соединение и идемпотентно создать схему.
    fn connect(&self) -> Result<Connection, VigilError> {
        let conn = Connection::open(&self.db_path).map_err(VigilError::StoreUnavailable)?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(VigilError::StoreUnavailable)?;
        Ok(conn)
    }

    /// Дописать одну строку. Никаких update и дедупликации.
    pub fn save(&self, event: &FileEvent) -> Result<(), VigilError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO file_events (file_name, file_extension, path, event_type, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.file_name(),
                event.file_extension(),
                event.path(),
                event.event_type().as_str(),
                event.formatted_timestamp(),
            ],
        )
        .map_err(VigilError::StoreUnavailable)?;
        Ok(())
    }

    /// Все события в порядке вставки. Каждый вызов перечитывает таблицу
    /// заново, курсор между вызовами не хранится.
    pub fn query_all(&self) -> Result<Vec<FileEvent>, VigilError> {
        self.select_events(&format!("{SELECT_EVENTS} ORDER BY id"), params![])
    }

    /// Точное совпадение по `file_extension`. Пустая строка — явная
    /// форма «все файлы», эквивалент [`EventStore::query_all`], а не
    /// поиск пустого расширения.
    pub fn query_by_extension(&self, extension: &str) -> Result<Vec<FileEvent>, VigilError> {
        if extension.is_empty() {
            return self.query_all();
        }
        self.select_events(
            &format!("{SELECT_EVENTS} WHERE file_extension = ?1 ORDER BY id"),
            params![extension],
        )
    }

    /// Точное совпадение по виду события.
    pub fn query_by_event_type(&self, event_type: EventType) -> Result<Vec<FileEvent>, VigilError> {
        self.select_events(
            &format!("{SELECT_EVENTS} WHERE event_type = ?1 ORDER BY id"),
            params![event_type.as_str()],
        )
    }

    /// События в диапазоне `[start, end]` (обе границы включительно).
    ///
    /// Границы форматируются в [`TIMESTAMP_FORMAT`] и сравниваются как
    /// строки: хронологический порядок совпадает с лексикографическим
    /// только благодаря фиксированной ширине формата.
    pub fn query_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<FileEvent>, VigilError> {
        self.select_events(
            &format!("{SELECT_EVENTS} WHERE timestamp BETWEEN ?1 AND ?2 ORDER BY id"),
            params![
                start.format(TIMESTAMP_FORMAT).to_string(),
                end.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )
    }

    /// События, чей `path` начинается с `prefix`.
    ///
    /// Буквальное сравнение префикса через `substr`, а не `LIKE`:
    /// метасимволы `%`/`_` в префиксе остаются обычными символами.
    pub fn query_by_directory(&self, prefix: &str) -> Result<Vec<FileEvent>, VigilError> {
        self.select_events(
            &format!("{SELECT_EVENTS} WHERE substr(path, 1, length(?1)) = ?1 ORDER BY id"),
            params![prefix],
        )
    }

    /// Удалить все строки. Идемпотентно; схема остаётся.
    pub fn clear(&self) -> Result<(), VigilError> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM file_events", [])
            .map_err(VigilError::StoreUnavailable)?;
        Ok(())
    }

    fn select_events(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<FileEvent>, VigilError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql).map_err(query_failed)?;
        let mut rows = stmt.query(params).map_err(query_failed)?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().map_err(query_failed)? {
            events.push(parse_row(row)?);
        }
        Ok(events)
    }
}

fn parse_row(row: &Row<'_>) -> Result<FileEvent, VigilError> {
    let file_name: String = row.get(0).map_err(query_failed)?;
    let file_extension: String = row.get(1).map_err(query_failed)?;
    let path: String = row.get(2).map_err(query_failed)?;
    let type_str: String = row.get(3).map_err(query_failed)?;
    let ts_str: String = row.get(4).map_err(query_failed)?;

    let event_type: EventType = type_str.parse()?;
    let timestamp = NaiveDateTime::parse_from_str(&ts_str, TIMESTAMP_FORMAT)
        .map_err(|e| VigilError::QueryFailed(format!("malformed stored timestamp {ts_str:?}: {e}")))?;

    Ok(FileEvent::from_stored(
        file_name,
        file_extension,
        path,
        event_type,
        timestamp,
    ))
}

fn query_failed(err: rusqlite::Error) -> VigilError {
    VigilError::QueryFailed(err.to_string())
}
