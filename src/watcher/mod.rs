//! Модуль мониторинга файловой системы (watch engine).
//!
//! Отвечает за:
//! - рекурсивную регистрацию поддерева директорий в `notify`
//! - нормализацию нативных событий в [`FileEvent`]
//! - фильтрацию по расширению (пустой фильтр = принимать всё)
//! - дорегистрацию поддиректорий, созданных уже после старта
//! - graceful shutdown
//!
//! На сессию ровно один фоновый worker-поток; sink'и вызываются на нём
//! синхронно и в порядке регистрации, поэтому медленный sink обязан сам
//! развязываться очередью (см. [`crate::sink::StoreSink`]).

pub mod events;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use notify::{event::ModifyKind, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use walkdir::WalkDir;

use crate::error::VigilError;
use crate::sink::EventSink;
use crate::watcher::events::{now_second_precision, EventType, FileEvent};

/// Handle запущенного watcher'а.
pub struct WatcherHandle {
  stop_tx: mpsc::Sender<()>,
  join: Option<thread::JoinHandle<()>>,
  watch_dir: PathBuf,
}

impl WatcherHandle {
  /// Канонический корень наблюдаемого поддерева.
  pub fn watch_dir(&self) -> &Path {
    &self.watch_dir
  }

  /// Остановить наблюдение и дождаться завершения worker-потока.
  ///
  /// События, уже отправленные в sink'и до остановки, доставляются;
  /// ничего не дожидается и не сбрасывается сверх этого.
  pub fn stop(mut self) -> Result<(), VigilError> {
    let _ = self.stop_tx.send(());
    if let Some(join) = self.join.take() {
      let _ = join.join();
    }
    Ok(())
  }
}

/// Запустить watcher для поддерева `root`.
///
/// `extensions`: allow-set расширений (с точкой, например `".txt"`);
/// пустой set означает «принимать все».
/// `sinks`: потребители нормализованных событий, вызываются в порядке
/// следования в векторе.
///
/// Регистрация всего поддерева выполняется синхронно до запуска цикла:
/// ошибка регистрации любой директории прерывает старт целиком
/// ([`VigilError::RegistrationFailed`]), уже открытые нативные watch'и
/// освобождаются.
pub fn start_watcher(
  root: impl AsRef<Path>,
  extensions: HashSet<String>,
  sinks: Vec<Box<dyn EventSink>>,
) -> Result<WatcherHandle, VigilError> {
  let root = root.as_ref();
  let meta = fs::metadata(root).map_err(|_| VigilError::InvalidRoot(root.to_path_buf()))?;
  if !meta.is_dir() {
    return Err(VigilError::InvalidRoot(root.to_path_buf()));
  }
  // Каноникализация: все пути в событиях абсолютные.
  let watch_dir = root
    .canonicalize()
    .map_err(|_| VigilError::InvalidRoot(root.to_path_buf()))?;

  info!("Starting watcher for: {}", watch_dir.display());

  let (stop_tx, stop_rx) = mpsc::channel::<()>();
  let (event_tx, event_rx) = mpsc::channel::<Result<notify::Event, notify::Error>>();

  let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
    // best-effort send; если receiver уже закрыт — просто игнорируем.
    let _ = event_tx.send(res);
  })?;

  // Таблица регистраций: какие директории держат живой нативный watch.
  // Заполняется синхронно до запуска цикла и принадлежит worker-потоку.
  let mut registered: HashSet<PathBuf> = HashSet::new();
  register_tree(&mut watcher, &mut registered, &watch_dir)?;
  info!(
    "Registered {} directories under {}",
    registered.len(),
    watch_dir.display()
  );

  let join = thread::spawn(move || {
    run_watch_loop(watcher, registered, &stop_rx, &event_rx, &extensions, &sinks);
    info!("Watcher thread finished");
  });

  Ok(WatcherHandle {
    stop_tx,
    join: Some(join),
    watch_dir,
  })
}

fn run_watch_loop(
  mut watcher: RecommendedWatcher,
  mut registered: HashSet<PathBuf>,
  stop_rx: &mpsc::Receiver<()>,
  event_rx: &mpsc::Receiver<Result<notify::Event, notify::Error>>,
  extensions: &HashSet<String>,
  sinks: &[Box<dyn EventSink>],
) {
  loop {
    // 1) graceful shutdown
    if stop_rx.try_recv().is_ok() {
      info!("Watcher shutdown requested");
      break;
    }

    // 2) обработка событий notify
    match event_rx.recv_timeout(Duration::from_millis(250)) {
      Ok(Ok(event)) => {
        debug!("notify event: {:?}", event.kind);
        handle_native_event(&mut watcher, &mut registered, extensions, sinks, &event);
      }
      Ok(Err(err)) => {
        warn!("notify error: {err}");
      }
      Err(mpsc::RecvTimeoutError::Timeout) => {
        // тик
      }
      Err(mpsc::RecvTimeoutError::Disconnected) => {
        warn!("notify channel disconnected");
        break;
      }
    }
  }
  // Таблица регистраций и нативные watch'и освобождаются здесь вместе
  // с watcher'ом.
}

fn handle_native_event(
  watcher: &mut RecommendedWatcher,
  registered: &mut HashSet<PathBuf>,
  extensions: &HashSet<String>,
  sinks: &[Box<dyn EventSink>],
  event: &notify::Event,
) {
  let Some(event_type) = map_event_type(&event.kind) else {
    return;
  };

  for path in &event.paths {
    // Созданную поддиректорию регистрируем до продолжения цикла, иначе
    // файлы, появившиеся в ней, останутся вне наблюдения. Ошибка здесь
    // не валит сессию: частичное покрытие полезнее полного отказа.
    if event_type == EventType::Created && path.is_dir() {
      register_tree_lenient(watcher, registered, path);
    }
    if event_type == EventType::Deleted && registered.remove(path.as_path()) {
      let _ = watcher.unwatch(path);
      debug!("unregistered removed directory: {}", path.display());
    }

    match make_file_event(path, event_type) {
      Ok(file_event) => {
        if !extensions.is_empty() && !extensions.contains(file_event.file_extension()) {
          continue;
        }
        for sink in sinks {
          sink.accept(&file_event);
        }
      }
      // Одно плохое событие не должно завершать здоровую сессию.
      Err(err) => warn!("Cannot build FileEvent: {err}"),
    }
  }
}

/// Строгая рекурсивная регистрация: используется на старте.
fn register_tree(
  watcher: &mut RecommendedWatcher,
  registered: &mut HashSet<PathBuf>,
  root: &Path,
) -> Result<(), VigilError> {
  for entry in WalkDir::new(root) {
    let entry = entry.map_err(|e| {
      VigilError::RegistrationFailed(format!("cannot walk {}: {e}", root.display()))
    })?;
    if !entry.file_type().is_dir() {
      continue;
    }
    let dir = entry.path();
    watcher
      .watch(dir, RecursiveMode::NonRecursive)
      .map_err(|e| {
        VigilError::RegistrationFailed(format!("cannot watch {}: {e}", dir.display()))
      })?;
    registered.insert(dir.to_path_buf());
  }
  Ok(())
}

/// Мягкая рекурсивная регистрация: используется во время наблюдения
/// для поддиректорий, созданных после старта. Ошибки логируются и
/// пропускаются.
fn register_tree_lenient(
  watcher: &mut RecommendedWatcher,
  registered: &mut HashSet<PathBuf>,
  root: &Path,
) {
  for entry in WalkDir::new(root) {
    match entry {
      Ok(e) if e.file_type().is_dir() => {
        match watcher.watch(e.path(), RecursiveMode::NonRecursive) {
          Ok(()) => {
            registered.insert(e.path().to_path_buf());
            debug!("registered new directory: {}", e.path().display());
          }
          Err(err) => warn!("cannot watch new directory {}: {err}", e.path().display()),
        }
      }
      Ok(_) => {}
      Err(err) => warn!("cannot walk new directory under {}: {err}", root.display()),
    }
  }
}

fn map_event_type(kind: &EventKind) -> Option<EventType> {
  match kind {
    EventKind::Create(_) => Some(EventType::Created),
    EventKind::Remove(_) => Some(EventType::Deleted),
    // Backend отдаёт rename отдельным видом события — сохраняем его.
    // Backend'ы, отдающие rename как delete+create, дадут два события
    // выше; мы их не синтезируем в Renamed.
    EventKind::Modify(ModifyKind::Name(_)) => Some(EventType::Renamed),
    EventKind::Modify(_) => Some(EventType::Modified),
    EventKind::Access(_) | EventKind::Other | EventKind::Any => None,
  }
}

fn make_file_event(path: &Path, event_type: EventType) -> Result<FileEvent, VigilError> {
  let file_name = path
    .file_name()
    .and_then(|s| s.to_str())
    .ok_or_else(|| VigilError::FileNameMissing(path.to_path_buf()))?
    .to_string();

  let full_path = path.to_string_lossy().to_string();
  Ok(FileEvent::new(
    file_name,
    full_path,
    event_type,
    now_second_precision(),
  ))
}
