use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{
    Appointment, ClientProfile, ConversationFlowState, IntakeSession, Reminder, TaxProfessional,
};

/// In-memory keyed store. Every mutation runs inside one closure under the
/// write lock, so an `update` is atomic with respect to concurrent callers.
/// Flow advancement and load reservation rely on this for race safety.
pub struct MemStore<T: Clone> {
    inner: RwLock<HashMap<String, T>>,
}

impl<T: Clone> MemStore<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.inner.read().unwrap().get(id).cloned()
    }

    pub fn put(&self, id: &str, value: T) {
        self.inner.write().unwrap().insert(id.to_string(), value);
    }

    /// Mutate the record under the write lock; returns None if absent.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.inner.write().unwrap().get_mut(id).map(f)
    }

    pub fn all(&self) -> Vec<T> {
        self.inner.read().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

impl<T: Clone> Default for MemStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All registries the engine and flow machine work against.
pub struct Stores {
    pub clients: MemStore<ClientProfile>,
    pub sessions: MemStore<IntakeSession>,
    pub tax_pros: MemStore<TaxProfessional>,
    pub flows: MemStore<ConversationFlowState>,
    pub appointments: MemStore<Appointment>,
    pub reminders: MemStore<Reminder>,
}

impl Stores {
    pub fn new() -> Self {
        Self {
            clients: MemStore::new(),
            sessions: MemStore::new(),
            tax_pros: MemStore::new(),
            flows: MemStore::new(),
            appointments: MemStore::new(),
            reminders: MemStore::new(),
        }
    }

    /// Compare-and-increment on a professional's load. Returns false when
    /// the professional is unknown or already at capacity, without changing
    /// anything, so two racing callers can never overbook the last slot.
    pub fn try_reserve_tax_pro(&self, id: &str) -> bool {
        self.tax_pros
            .update(id, |p| {
                if p.available && p.current_load < p.max_daily_appointments {
                    p.current_load += 1;
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false)
    }

    /// Counterpart of `try_reserve_tax_pro` for cancellations.
    pub fn release_tax_pro(&self, id: &str) {
        self.tax_pros.update(id, |p| {
            p.current_load = p.current_load.saturating_sub(1);
        });
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::new()
    }
}
