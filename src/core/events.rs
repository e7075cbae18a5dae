use std::sync::{Mutex, PoisonError};

/// The installed game version as seen by observers: `(tag, digest)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameVersion {
    pub tag: Option<String>,
    pub digest: Option<String>,
}

type Observer = Box<dyn Fn(&GameVersion) + Send + Sync>;

/// Registry of observers interested in installed-version changes.
///
/// Built once at startup and shared (`Arc<VersionEvents>`) with every
/// component that publishes or reads the current version. Observers run
/// synchronously on the publishing thread.
#[derive(Default)]
pub struct VersionEvents {
    current: Mutex<GameVersion>,
    observers: Mutex<Vec<Observer>>,
}

impl VersionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> GameVersion {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register `observer`; it is called immediately with the current value.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&GameVersion) + Send + Sync + 'static,
    {
        let snapshot = self.current();
        observer(&snapshot);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    /// Record a new current version and notify every observer.
    pub fn publish(&self, version: GameVersion) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = version.clone();
        let observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer(&version);
        }
    }
}

impl std::fmt::Debug for VersionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let observers = self
            .observers
            .lock()
            .map(|list| list.len())
            .unwrap_or_default();
        f.debug_struct("VersionEvents")
            .field("current", &self.current())
            .field("observers", &observers)
            .finish()
    }
}
