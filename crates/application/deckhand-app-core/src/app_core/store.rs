use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::AppState;

use super::commands::{AppCommand, IntentKind};
use super::events::DomainEvent;
use super::reducer::{begin, reduce};

#[derive(Clone, Default)]
pub struct AppStore {
    inner: Arc<Mutex<AppState>>,
}

impl AppStore {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> AppState {
        self.lock().clone()
    }

    pub fn apply(&self, ev: DomainEvent) {
        let mut guard = self.lock();
        let next = reduce(guard.clone(), ev);
        *guard = next;
    }

    pub fn begin(&self, cmd: &AppCommand) {
        let mut guard = self.lock();
        let next = begin(guard.clone(), cmd);
        *guard = next;
    }

    pub fn is_pending(&self, kind: IntentKind) -> bool {
        self.lock().is_pending(kind)
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
