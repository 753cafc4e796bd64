//! In-memory user and daily task stores sharing one state.
//!
//! A single [`InMemoryStore`] implements both [`UserStore`] and
//! [`DailyTaskStore`] so `assign` can create the assignment and write the
//! owner's streak under one lock, mirroring the database transaction. Each
//! store call yields once while counted as active, which lets tests observe
//! how many per-user units overlap.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use futures_util::StreamExt as _;
use futures_util::stream;
use uuid::Uuid;

use crate::domain::ports::{
    DailyTaskStore, DailyTaskStoreError, UserIdStream, UserStore, UserStoreError,
};
use crate::domain::{
    AssignmentId, AssignmentWithCompletion, DailyTaskAssignment, NewDailyTaskAssignment, PostId,
    TaskType, UserId,
};

/// Store operation a test can force to fail for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// Previous-assignment lookups fail with a query error.
    Lookup,
    /// Streak writes outside `assign` fail with a query error.
    StreakWrite,
    /// Assignment creation fails with a query error.
    Assign,
    /// Every operation for the user reports the store as unreachable.
    Unavailable,
}

#[derive(Default)]
struct StoreState {
    users: BTreeMap<UserId, u32>,
    assignments: Vec<DailyTaskAssignment>,
    posts: HashMap<AssignmentId, PostId>,
    failures: HashMap<UserId, FailurePoint>,
    listing_fails_after: Option<usize>,
    listed_twice: Vec<UserId>,
}

impl StoreState {
    fn failure(&self, user_id: &UserId) -> Option<FailurePoint> {
        self.failures.get(user_id).copied()
    }

    fn resolve(&self, assignment: &DailyTaskAssignment) -> AssignmentWithCompletion {
        AssignmentWithCompletion {
            assignment: assignment.clone(),
            completion_post: self.posts.get(&assignment.id).copied(),
            owner_streak: self
                .users
                .get(&assignment.user_id)
                .copied()
                .unwrap_or_default(),
        }
    }
}

#[derive(Default)]
struct ConcurrencyProbe {
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// Shared in-memory backing for scheduler tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    probe: Arc<ConcurrencyProbe>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user with the given streak and return its identifier.
    pub fn add_user(&self, streak: u32) -> UserId {
        let user_id = UserId::random();
        self.lock_state().users.insert(user_id, streak);
        user_id
    }

    /// Record an assignment directly, bypassing the scheduler.
    pub fn seed_assignment(
        &self,
        user_id: UserId,
        target_date: NaiveDate,
        task_type: TaskType,
    ) -> AssignmentId {
        let id = AssignmentId::random();
        self.lock_state().assignments.push(DailyTaskAssignment {
            id,
            user_id,
            target_date,
            task_type,
            created_at: target_date.and_time(NaiveTime::MIN).and_utc(),
        });
        id
    }

    /// Link a post to the assignment, marking it completed.
    pub fn complete(&self, assignment_id: AssignmentId) -> PostId {
        let post_id = PostId::from_uuid(Uuid::new_v4());
        self.lock_state().posts.insert(assignment_id, post_id);
        post_id
    }

    /// Stored streak for `user_id`.
    pub fn streak(&self, user_id: &UserId) -> Option<u32> {
        self.lock_state().users.get(user_id).copied()
    }

    /// Assignments held by `user_id`, oldest first.
    pub fn assignments_for(&self, user_id: &UserId) -> Vec<DailyTaskAssignment> {
        let mut found: Vec<_> = self
            .lock_state()
            .assignments
            .iter()
            .filter(|assignment| assignment.user_id == *user_id)
            .cloned()
            .collect();
        found.sort_by_key(|assignment| (assignment.target_date, assignment.created_at));
        found
    }

    /// Assignment `user_id` holds for `date`, read without failure injection.
    pub fn assignment_on(&self, user_id: &UserId, date: NaiveDate) -> Option<DailyTaskAssignment> {
        self.lock_state()
            .assignments
            .iter()
            .find(|assignment| assignment.user_id == *user_id && assignment.target_date == date)
            .cloned()
    }

    /// Assignments stored across all users.
    pub fn assignment_count(&self) -> usize {
        self.lock_state().assignments.len()
    }

    /// Make `point` fail for `user_id` until cleared.
    pub fn fail(&self, user_id: UserId, point: FailurePoint) {
        self.lock_state().failures.insert(user_id, point);
    }

    /// Remove every injected failure.
    pub fn clear_failures(&self) {
        self.lock_state().failures.clear();
    }

    /// Make the user listing fail after yielding `count` identifiers.
    pub fn fail_listing_after(&self, count: usize) {
        self.lock_state().listing_fails_after = Some(count);
    }

    /// List `user_id` a second time, immediately after its first listing.
    pub fn list_user_twice(&self, user_id: UserId) {
        self.lock_state().listed_twice.push(user_id);
    }

    /// Highest number of store calls observed in flight at once.
    pub fn max_active(&self) -> usize {
        self.probe.max_active.load(Ordering::SeqCst)
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("store mutex")
    }

    async fn observe<T>(&self, operation: impl FnOnce(&mut StoreState) -> T) -> T {
        let active_now = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_active.fetch_max(active_now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let output = operation(&mut self.lock_state());
        self.probe.active.fetch_sub(1, Ordering::SeqCst);
        output
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    fn list_all(&self) -> UserIdStream<'_> {
        let state = self.lock_state();
        let mut items: Vec<Result<UserId, UserStoreError>> = Vec::new();
        for user_id in state.users.keys() {
            items.push(Ok(*user_id));
            if state.listed_twice.contains(user_id) {
                items.push(Ok(*user_id));
            }
        }
        if let Some(count) = state.listing_fails_after {
            items.truncate(count);
            items.push(Err(UserStoreError::connection("listing interrupted")));
        }
        stream::iter(items).boxed()
    }

    async fn set_streak(&self, user_id: &UserId, streak: u32) -> Result<(), UserStoreError> {
        self.observe(|state| {
            match state.failure(user_id) {
                Some(FailurePoint::Unavailable) => {
                    return Err(UserStoreError::connection("store offline"));
                }
                Some(FailurePoint::StreakWrite) => {
                    return Err(UserStoreError::query("injected streak write failure"));
                }
                _ => {}
            }
            let stored = state
                .users
                .get_mut(user_id)
                .ok_or_else(|| UserStoreError::unknown_user(user_id.to_string()))?;
            *stored = streak;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl DailyTaskStore for InMemoryStore {
    async fn assign(
        &self,
        assignment: &NewDailyTaskAssignment,
        streak: u32,
    ) -> Result<DailyTaskAssignment, DailyTaskStoreError> {
        self.observe(|state| {
            match state.failure(&assignment.user_id) {
                Some(FailurePoint::Unavailable) => {
                    return Err(DailyTaskStoreError::connection("store offline"));
                }
                Some(FailurePoint::Assign) => {
                    return Err(DailyTaskStoreError::query("injected assign failure"));
                }
                _ => {}
            }
            let duplicate = state.assignments.iter().any(|existing| {
                existing.user_id == assignment.user_id
                    && existing.target_date == assignment.target_date
            });
            if duplicate {
                return Err(DailyTaskStoreError::duplicate(
                    &assignment.user_id,
                    assignment.target_date,
                ));
            }
            let Some(owner_streak) = state.users.get_mut(&assignment.user_id) else {
                return Err(DailyTaskStoreError::query("owning user not found"));
            };
            *owner_streak = streak;
            let sequence = i64::try_from(state.assignments.len()).unwrap_or(i64::MAX);
            let created = DailyTaskAssignment {
                id: assignment.id,
                user_id: assignment.user_id,
                target_date: assignment.target_date,
                task_type: assignment.task_type,
                created_at: assignment.target_date.and_time(NaiveTime::MIN).and_utc()
                    + TimeDelta::milliseconds(sequence),
            };
            state.assignments.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn most_recent_before(
        &self,
        user_id: &UserId,
        before: NaiveDate,
    ) -> Result<Option<AssignmentWithCompletion>, DailyTaskStoreError> {
        self.observe(|state| {
            match state.failure(user_id) {
                Some(FailurePoint::Unavailable) => {
                    return Err(DailyTaskStoreError::connection("store offline"));
                }
                Some(FailurePoint::Lookup) => {
                    return Err(DailyTaskStoreError::query("injected lookup failure"));
                }
                _ => {}
            }
            Ok(state
                .assignments
                .iter()
                .filter(|assignment| {
                    assignment.user_id == *user_id && assignment.target_date < before
                })
                .max_by_key(|assignment| (assignment.target_date, assignment.created_at))
                .map(|assignment| state.resolve(assignment)))
        })
        .await
    }

    async fn assignment_on(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<AssignmentWithCompletion>, DailyTaskStoreError> {
        self.observe(|state| {
            if state.failure(user_id) == Some(FailurePoint::Unavailable) {
                return Err(DailyTaskStoreError::connection("store offline"));
            }
            Ok(state
                .assignments
                .iter()
                .find(|assignment| assignment.user_id == *user_id && assignment.target_date == date)
                .map(|assignment| state.resolve(assignment)))
        })
        .await
    }
}
