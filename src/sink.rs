//! Потребители нормализованных событий (sink'и).
//!
//! Sink вызывается синхронно на worker-потоке watcher'а, поэтому обязан
//! быть быстрым: медленный sink тормозит разбор нативных уведомлений и
//! повышает риск переполнения нативного backlog'а на «горячих»
//! директориях. Персистентный sink ([`StoreSink`]) поэтому развязан
//! ограниченной очередью и собственным writer-потоком.

use std::sync::mpsc;
use std::thread;

use log::{error, warn};

use crate::store::EventStore;
use crate::watcher::events::FileEvent;

/// Ёмкость внутренней очереди персистентного sink'а.
const QUEUE_CAPACITY: usize = 1024;

/// Способность «принять одно событие».
///
/// Реализуется хранилищем, live-отображением, экспортом и т.п.
/// Вызов не должен блокироваться надолго.
pub trait EventSink: Send {
    fn accept(&self, event: &FileEvent);
}

/// Обёртка, превращающая замыкание в sink (удобно для live-отображения
/// и тестов).
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(&FileEvent) + Send,
{
    fn accept(&self, event: &FileEvent) {
        (self.0)(event);
    }
}

/// Персистентный sink: кладёт события в ограниченную очередь, которую
/// разбирает отдельный writer-поток, владеющий [`EventStore`].
///
/// Запись в SQLite тем самым не выполняется на worker-потоке watcher'а,
/// а единственный writer сериализует доступ к соединению. При
/// переполненной очереди событие отбрасывается с предупреждением —
/// блокировать разбор уведомлений нельзя.
pub struct StoreSink {
    tx: mpsc::SyncSender<FileEvent>,
    join: Option<thread::JoinHandle<()>>,
}

impl StoreSink {
    pub fn new(store: EventStore) -> Self {
        let (tx, rx) = mpsc::sync_channel::<FileEvent>(QUEUE_CAPACITY);

        let join = thread::spawn(move || {
            // Выходим, когда все sender'ы дропнуты и очередь дочитана.
            for event in rx {
                if let Err(err) = store.save(&event) {
                    error!("Failed to persist event {}: {err}", event);
                }
            }
        });

        Self {
            tx,
            join: Some(join),
        }
    }

    /// Закрыть очередь, дождаться записи накопленного и завершения
    /// writer-потока. Для детерминированных проверок в тестах и
    /// аккуратного завершения приложения.
    pub fn shutdown(self) {
        let StoreSink { tx, join } = self;
        drop(tx);
        if let Some(join) = join {
            let _ = join.join();
        }
    }
}

impl EventSink for StoreSink {
    fn accept(&self, event: &FileEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::TrySendError::Full(dropped)) => {
                warn!("Persistence queue is full; dropping event {dropped}");
            }
            Err(mpsc::TrySendError::Disconnected(dropped)) => {
                warn!("Persistence writer is gone; dropping event {dropped}");
            }
        }
    }
}
