//! In-memory office-hours store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use learnhub_core::types::{AdmissionOutcome, Capacity};
use learnhub_core::{AppError, AppResult};
use learnhub_entity::office_hours::{OfficeHoursSchedule, QueueEntry, QueueEntryStatus};

use crate::admission::{AdmissionScope, KeyedGuard, KeyedLocks, ParentState, try_admit};
use crate::store::{NewQueueEntry, OfficeHoursStore};

/// Schedules and queue entries. Joins serialize per instructor.
#[derive(Debug, Default)]
pub struct MemoryOfficeHoursStore {
    schedules: DashMap<Uuid, OfficeHoursSchedule>,
    entries: DashMap<Uuid, QueueEntry>,
    locks: KeyedLocks,
}

impl MemoryOfficeHoursStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn active_entries(&self, predicate: impl Fn(&QueueEntry) -> bool) -> Vec<QueueEntry> {
        let mut entries: Vec<QueueEntry> = self
            .entries
            .iter()
            .filter(|e| QueueEntryStatus::ACTIVE.contains(&e.status) && predicate(e))
            .map(|e| e.clone())
            .collect();
        entries.sort_by_key(|e| e.joined_at);
        entries
    }
}

struct QueueJoinScope<'a> {
    store: &'a MemoryOfficeHoursStore,
    entry: NewQueueEntry,
    instructor_id: Option<Uuid>,
    staged: Option<QueueEntry>,
    _guard: Option<KeyedGuard>,
}

impl QueueJoinScope<'_> {
    fn instructor_id(&self) -> AppResult<Uuid> {
        self.instructor_id
            .ok_or_else(|| AppError::internal("Queue scope used before locking its schedule"))
    }
}

#[async_trait]
impl<'a> AdmissionScope for QueueJoinScope<'a> {
    type Occupant = QueueEntry;

    async fn lock_parent(&mut self) -> AppResult<Option<ParentState>> {
        let schedule_id = self.entry.schedule_id;
        let Some(instructor_id) = self.store.schedules.get(&schedule_id).map(|s| s.instructor_id)
        else {
            return Ok(None);
        };
        self._guard = Some(self.store.locks.lock(instructor_id).await);
        self.instructor_id = Some(instructor_id);

        // Read again under the lock: the schedule may have closed meanwhile.
        Ok(self.store.schedules.get(&schedule_id).map(|s| ParentState {
            admitting: s.is_open,
            capacity: Capacity::Unbounded,
        }))
    }

    async fn find_occupant(&mut self) -> AppResult<Option<QueueEntry>> {
        let instructor_id = self.instructor_id()?;
        let student_id = self.entry.student_id;
        Ok(self
            .store
            .active_entries(|e| e.instructor_id == instructor_id && e.student_id == student_id)
            .into_iter()
            .next())
    }

    async fn count_occupants(&mut self) -> AppResult<u32> {
        let instructor_id = self.instructor_id()?;
        let count = self
            .store
            .active_entries(|e| e.instructor_id == instructor_id)
            .len();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn occupy(&mut self) -> AppResult<QueueEntry> {
        let instructor_id = self.instructor_id()?;
        // Stamped under the instructor lock, strictly after every earlier join.
        let now = Utc::now();
        let joined_at = self
            .store
            .entries
            .iter()
            .filter(|e| e.instructor_id == instructor_id)
            .map(|e| e.joined_at)
            .max()
            .map_or(now, |last| now.max(last + Duration::microseconds(1)));

        let entry = QueueEntry {
            id: Uuid::new_v4(),
            schedule_id: self.entry.schedule_id,
            instructor_id,
            student_id: self.entry.student_id,
            status: QueueEntryStatus::Waiting,
            question: self.entry.question.clone(),
            joined_at,
            admitted_at: None,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
        };
        self.staged = Some(entry.clone());
        Ok(entry)
    }

    async fn commit(self) -> AppResult<()> {
        if let Some(entry) = self.staged {
            self.store.entries.insert(entry.id, entry);
        }
        Ok(())
    }
}

#[async_trait]
impl OfficeHoursStore for MemoryOfficeHoursStore {
    async fn create_schedule(
        &self,
        schedule: &OfficeHoursSchedule,
    ) -> AppResult<OfficeHoursSchedule> {
        self.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule.clone())
    }

    async fn find_schedule(&self, id: Uuid) -> AppResult<Option<OfficeHoursSchedule>> {
        Ok(self.schedules.get(&id).map(|s| s.clone()))
    }

    async fn set_schedule_open(
        &self,
        id: Uuid,
        is_open: bool,
    ) -> AppResult<Option<OfficeHoursSchedule>> {
        let Some(instructor_id) = self.schedules.get(&id).map(|s| s.instructor_id) else {
            return Ok(None);
        };
        let _guard = self.locks.lock(instructor_id).await;
        Ok(self.schedules.get_mut(&id).map(|mut s| {
            s.is_open = is_open;
            s.clone()
        }))
    }

    async fn join(&self, entry: NewQueueEntry) -> AppResult<AdmissionOutcome<QueueEntry>> {
        let scope = QueueJoinScope {
            store: self,
            entry,
            instructor_id: None,
            staged: None,
            _guard: None,
        };
        try_admit(scope, Capacity::Unbounded).await
    }

    async fn find_entry(&self, id: Uuid) -> AppResult<Option<QueueEntry>> {
        Ok(self.entries.get(&id).map(|e| e.clone()))
    }

    async fn transition(
        &self,
        id: Uuid,
        next: QueueEntryStatus,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<QueueEntry>> {
        Ok(self.entries.get_mut(&id).and_then(|mut entry| {
            entry
                .apply_transition(next, actor_id, now)
                .then(|| entry.clone())
        }))
    }

    async fn count_waiting_before(
        &self,
        instructor_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> AppResult<u32> {
        let count = self
            .entries
            .iter()
            .filter(|e| {
                e.instructor_id == instructor_id
                    && e.status == QueueEntryStatus::Waiting
                    && e.joined_at < joined_at
            })
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn count_waiting(&self, instructor_id: Uuid) -> AppResult<u32> {
        let count = self
            .entries
            .iter()
            .filter(|e| e.instructor_id == instructor_id && e.status == QueueEntryStatus::Waiting)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn list_active(&self, instructor_id: Uuid) -> AppResult<Vec<QueueEntry>> {
        Ok(self.active_entries(|e| e.instructor_id == instructor_id))
    }

    async fn list_for_student(&self, student_id: Uuid) -> AppResult<Vec<QueueEntry>> {
        Ok(self.active_entries(|e| e.student_id == student_id))
    }
}
