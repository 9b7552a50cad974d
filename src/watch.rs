use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::AppConfig;

/// Watches the config file and hands back a fresh `AppConfig` whenever it
/// changes on disk and still parses.
pub struct ConfigWatcher {
    path: PathBuf,
    events: Receiver<()>,
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel::<()>();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Modify(_)
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                        | EventKind::Any => {
                            let _ = tx.send(());
                        }
                        _ => {}
                    }
                }
            })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        log::info!("watching {} for changes", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            events: rx,
            _watcher: watcher,
        })
    }

    /// Collapses pending events into at most one reload.
    pub fn poll(&self) -> Option<AppConfig> {
        if self.events.try_iter().count() == 0 {
            return None;
        }
        match AppConfig::load(&self.path) {
            Ok(cfg) => {
                log::info!("reloaded {}", self.path.display());
                Some(cfg)
            }
            Err(e) => {
                log::warn!("keeping previous config: {e}");
                None
            }
        }
    }
}
