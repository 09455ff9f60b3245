use chrono::{DateTime, Utc};
use std::sync::RwLock;
use uuid::Uuid;

use crate::errors::{LoanError, Result};

/// record that can live in a document store
pub trait StoredRecord {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Persistence contract for one document collection.
///
/// Implementations are constructed once per process and passed by reference
/// into [`crate::servicing::BackOffice`]; there is no module-level mutable
/// state. `list` returns records newest-first.
pub trait Repository<T>: Send + Sync {
    fn create(&self, record: T) -> Result<T>;
    fn list(&self) -> Result<Vec<T>>;
    fn find(&self, id: Uuid) -> Result<Option<T>>;
    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut T)) -> Result<T>;

    fn count(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }
}

/// In-memory collection, also used as the degraded-mode stand-in when a
/// primary store is unreachable.
#[derive(Debug, Default)]
pub struct InMemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

fn poisoned() -> LoanError {
    LoanError::StoreUnavailable {
        message: "in-memory store lock poisoned".to_string(),
    }
}

impl<T: StoredRecord + Clone + Send + Sync> Repository<T> for InMemoryRepository<T> {
    fn create(&self, record: T) -> Result<T> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<T>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut out: Vec<T> = records.clone();
        out.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        Ok(out)
    }

    fn find(&self, id: Uuid) -> Result<Option<T>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.iter().find(|r| r.id() == id).cloned())
    }

    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut T)) -> Result<T> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(LoanError::RecordNotFound { id })?;
        apply(record);
        Ok(record.clone())
    }

    fn count(&self) -> Result<usize> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.len())
    }
}

/// Wraps a primary store and degrades to an in-memory mock whenever the
/// primary reports `StoreUnavailable`. Any other error propagates unchanged.
pub struct FallbackRepository<T> {
    primary: Box<dyn Repository<T>>,
    fallback: InMemoryRepository<T>,
    collection: &'static str,
}

impl<T: StoredRecord + Clone + Send + Sync> FallbackRepository<T> {
    pub fn new(primary: Box<dyn Repository<T>>, collection: &'static str) -> Self {
        Self {
            primary,
            fallback: InMemoryRepository::new(),
            collection,
        }
    }

    fn degrade<R>(
        &self,
        outcome: Result<R>,
        retry: impl FnOnce(&InMemoryRepository<T>) -> Result<R>,
    ) -> Result<R> {
        match outcome {
            Err(LoanError::StoreUnavailable { message }) => {
                tracing::warn!(
                    collection = self.collection,
                    %message,
                    "primary store unavailable, using in-memory fallback"
                );
                retry(&self.fallback)
            }
            other => other,
        }
    }
}

impl<T: StoredRecord + Clone + Send + Sync> Repository<T> for FallbackRepository<T> {
    fn create(&self, record: T) -> Result<T> {
        let outcome = self.primary.create(record.clone());
        self.degrade(outcome, |fallback| fallback.create(record))
    }

    fn list(&self) -> Result<Vec<T>> {
        let outcome = self.primary.list();
        self.degrade(outcome, |fallback| fallback.list())
    }

    fn find(&self, id: Uuid) -> Result<Option<T>> {
        let outcome = self.primary.find(id);
        self.degrade(outcome, |fallback| fallback.find(id))
    }

    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut T)) -> Result<T> {
        let outcome = self.primary.update(id, &mut *apply);
        self.degrade(outcome, |fallback| fallback.update(id, apply))
    }

    fn count(&self) -> Result<usize> {
        let outcome = self.primary.count();
        self.degrade(outcome, |fallback| fallback.count())
    }
}
