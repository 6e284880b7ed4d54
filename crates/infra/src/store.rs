//! In-memory stores.
//!
//! [`WorkflowStore`] keeps workflow entities together with their append-only
//! transition log behind one `RwLock`, so a committed transition (state write
//! + log append + audit stamps) is observed all-or-nothing. Freshness is
//! re-checked inside the lock: the edge is re-validated against the *current*
//! state and the caller's expected version must still match. Slow work,
//! notably certificate verification, happens before the lock is taken.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use civica_auth::Role;
use civica_core::{DomainError, DomainResult, EntityId, ExpectedVersion, SubjectId};
use civica_workflow::{workflow, Status, TransitionRecord, WorkflowEntity};

#[derive(Debug)]
struct WorkflowInner<T> {
    entities: HashMap<EntityId, T>,
    log: Vec<TransitionRecord>,
}

/// Versioned store for one workflow entity kind.
#[derive(Debug)]
pub struct WorkflowStore<T> {
    inner: RwLock<WorkflowInner<T>>,
}

impl<T> Default for WorkflowStore<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(WorkflowInner {
                entities: HashMap::new(),
                log: Vec::new(),
            }),
        }
    }
}

impl<T: WorkflowEntity + Clone> WorkflowStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, entity: T) -> DomainResult<T> {
        let mut inner = self.lock_write()?;
        let id = entity.entity_id();
        if inner.entities.contains_key(&id) {
            return Err(DomainError::conflict(format!("entity {id} already exists")));
        }
        inner.entities.insert(id, entity.clone());
        Ok(entity)
    }

    pub fn get(&self, id: EntityId) -> DomainResult<Option<T>> {
        Ok(self.lock_read()?.entities.get(&id).cloned())
    }

    /// Entity clone plus its version, for read-verify-commit flows.
    pub fn snapshot(&self, id: EntityId) -> DomainResult<Option<(T, u64)>> {
        Ok(self
            .lock_read()?
            .entities
            .get(&id)
            .map(|e| (e.clone(), e.lifecycle().version())))
    }

    pub fn list(&self) -> DomainResult<Vec<T>> {
        let mut items: Vec<T> = self.lock_read()?.entities.values().cloned().collect();
        items.sort_by_key(|e| std::cmp::Reverse(e.lifecycle().created_at()));
        Ok(items)
    }

    pub fn list_owned_by(&self, owner: SubjectId) -> DomainResult<Vec<T>> {
        let mut items: Vec<T> = self
            .lock_read()?
            .entities
            .values()
            .filter(|e| e.owner() == owner)
            .cloned()
            .collect();
        items.sort_by_key(|e| std::cmp::Reverse(e.lifecycle().created_at()));
        Ok(items)
    }

    /// Commit a transition atomically.
    ///
    /// Inside the lock the edge is re-validated from the entity's *current*
    /// state (of two racing attempts, the loser sees the post-hoc
    /// `InvalidTransition`) and the caller's `expected` version must still
    /// hold, so nothing decided against a stale read (e.g. across a
    /// verification round-trip) can commit. `mutate` runs only when both
    /// checks pass, in the same critical section as the lifecycle advance and
    /// the log append.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_transition(
        &self,
        id: EntityId,
        expected: ExpectedVersion,
        to: Status,
        actor: SubjectId,
        actor_role: Role,
        at: DateTime<Utc>,
        mutate: impl FnOnce(&mut T),
    ) -> DomainResult<T> {
        let mut inner = self.lock_write()?;
        let entity = inner
            .entities
            .get_mut(&id)
            .ok_or(DomainError::NotFound)?;

        let from = entity.lifecycle().current();
        let kind = entity.kind();
        workflow(kind).check(from, to)?;
        expected.check(entity.lifecycle().version())?;

        mutate(entity);
        entity.lifecycle_mut().advance(to, actor, at);
        let committed = entity.clone();

        inner.log.push(TransitionRecord {
            entity_id: id,
            kind,
            from,
            to,
            actor,
            actor_role,
            occurred_at: at,
        });

        tracing::info!(
            entity_id = %id,
            kind = %kind,
            from = %from,
            to = %to,
            actor_role = %actor_role,
            "transition committed"
        );

        Ok(committed)
    }

    /// Version-checked mutation without a status change and without a log
    /// entry (e.g. recording a failed verification for audit).
    pub fn amend(
        &self,
        id: EntityId,
        expected: ExpectedVersion,
        mutate: impl FnOnce(&mut T),
    ) -> DomainResult<T> {
        let mut inner = self.lock_write()?;
        let entity = inner
            .entities
            .get_mut(&id)
            .ok_or(DomainError::NotFound)?;
        expected.check(entity.lifecycle().version())?;

        mutate(entity);
        entity.lifecycle_mut().touch();
        Ok(entity.clone())
    }

    /// The audit trail for one entity, oldest first.
    pub fn transitions(&self, id: EntityId) -> DomainResult<Vec<TransitionRecord>> {
        Ok(self
            .lock_read()?
            .log
            .iter()
            .filter(|r| r.entity_id == id)
            .cloned()
            .collect())
    }

    fn lock_read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, WorkflowInner<T>>> {
        self.inner
            .read()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }

    fn lock_write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, WorkflowInner<T>>> {
        self.inner
            .write()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }
}

/// Plain keyed store for reference data (classes, grades, patients, ...).
#[derive(Debug)]
pub struct DirectoryStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for DirectoryStore<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> DirectoryStore<K, V>
where
    K: Eq + core::hash::Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: K, value: V) -> DomainResult<()> {
        self.lock_write()?.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &K) -> DomainResult<Option<V>> {
        Ok(self.lock_read()?.get(key).cloned())
    }

    pub fn remove(&self, key: &K) -> DomainResult<Option<V>> {
        Ok(self.lock_write()?.remove(key))
    }

    pub fn list(&self) -> DomainResult<Vec<V>> {
        Ok(self.lock_read()?.values().cloned().collect())
    }

    pub fn find(&self, pred: impl Fn(&V) -> bool) -> DomainResult<Option<V>> {
        Ok(self.lock_read()?.values().find(|v| pred(v)).cloned())
    }

    pub fn filter(&self, pred: impl Fn(&V) -> bool) -> DomainResult<Vec<V>> {
        Ok(self
            .lock_read()?
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect())
    }

    pub fn update(&self, key: &K, mutate: impl FnOnce(&mut V)) -> DomainResult<V> {
        let mut inner = self.lock_write()?;
        let value = inner.get_mut(key).ok_or(DomainError::NotFound)?;
        mutate(value);
        Ok(value.clone())
    }

    fn lock_read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, HashMap<K, V>>> {
        self.inner
            .read()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }

    fn lock_write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<K, V>>> {
        self.inner
            .write()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }
}
