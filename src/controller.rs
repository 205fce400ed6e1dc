//! Жизненный цикл сессии наблюдения.
//!
//! Контроллер — точка входа для управляющего UI: владеет handle'ом
//! запущенной сессии, подключает персистентный sink и навязывает
//! машину состояний `Idle → Watching → Stopped` (повторный `Start`
//! без `Stop` отклоняется, `Stop` идемпотентен). Зависимости
//! (хранилище) инжектируются, глобального состояния нет; сериализация
//! конкурентных lifecycle-вызовов обеспечивается `&mut self`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::VigilError;
use crate::sink::{EventSink, StoreSink};
use crate::store::EventStore;
use crate::watcher::{start_watcher, WatcherHandle};

pub struct WatcherController {
    store: EventStore,
    watcher: Option<WatcherHandle>,
}

impl WatcherController {
    pub fn new(store: EventStore) -> Self {
        Self {
            store,
            watcher: None,
        }
    }

    /// Запустить наблюдение за поддеревом `root`.
    ///
    /// Первым sink'ом подключается персистентный [`StoreSink`], затем
    /// `extra_sinks` в порядке следования (live-отображение и т.п.).
    /// Возвращает канонический путь наблюдаемой директории (для UI).
    ///
    /// Если сессия уже идёт — [`VigilError::AlreadyWatching`], без
    /// побочных эффектов: текущая сессия остаётся нетронутой.
    pub fn start_watching(
        &mut self,
        root: impl AsRef<Path>,
        extensions: HashSet<String>,
        extra_sinks: Vec<Box<dyn EventSink>>,
    ) -> Result<PathBuf, VigilError> {
        if self.watcher.is_some() {
            return Err(VigilError::AlreadyWatching);
        }

        let mut sinks: Vec<Box<dyn EventSink>> =
            vec![Box::new(StoreSink::new(self.store.clone()))];
        sinks.extend(extra_sinks);

        let handle = start_watcher(root, extensions, sinks)?;
        let watch_dir = handle.watch_dir().to_path_buf();
        self.watcher = Some(handle);
        Ok(watch_dir)
    }

    /// Остановить наблюдение (graceful shutdown). Идемпотентно: без
    /// активной сессии — no-op без ошибки.
    ///
    /// После join worker-потока дропаются его sink'и; очередь
    /// [`StoreSink`] при этом закрывается, writer дописывает хвост и
    /// завершается сам.
    pub fn stop_watching(&mut self) -> Result<(), VigilError> {
        if let Some(handle) = self.watcher.take() {
            handle.stop()?;
            info!("Watch session stopped");
        }
        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Хранилище, в которое пишет текущая конфигурация (для выборок).
    pub fn store(&self) -> &EventStore {
        &self.store
    }
}
