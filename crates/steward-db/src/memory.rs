//! In-memory repositories.
//!
//! Used when no `DATABASE_URL` is configured and by the API tests. Each
//! repository keeps its records behind a `tokio::sync::RwLock`; writes that
//! read-modify-write hold the lock for the whole update.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use steward_core::{
    Error, Meeting, MeetingRepository, Message, NewMeeting, NewTask, NewThread, PendingMeeting,
    PendingMeetingRepository, Result, Task, TaskRepository, Thread, ThreadRepository, User,
    UserRepository,
};

use crate::threads::open_thread;

#[derive(Clone, Default)]
pub struct MemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn insert(&self, task: NewTask) -> Result<Task> {
        let task = task.into_task(Uuid::now_v7());
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        // None sorts after every date.
        tasks.sort_by(|a, b| {
            (a.due_date.is_none(), a.due_date, a.created_at, a.id)
                .cmp(&(b.due_date.is_none(), b.due_date, b.created_at, b.id))
        });
        Ok(tasks)
    }

    async fn toggle(&self, id: Uuid) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Task {} not found", id)))?;
        task.completed = !task.completed;
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.tasks
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("Task {} not found", id)))
    }
}

#[derive(Clone, Default)]
pub struct MemoryMeetingRepository {
    meetings: Arc<RwLock<HashMap<Uuid, Meeting>>>,
}

#[async_trait]
impl MeetingRepository for MemoryMeetingRepository {
    async fn insert(&self, meeting: NewMeeting) -> Result<Meeting> {
        let meeting = meeting.into_meeting(Uuid::now_v7());
        self.meetings
            .write()
            .await
            .insert(meeting.id, meeting.clone());
        Ok(meeting)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Meeting>> {
        Ok(self.meetings.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, meeting: NewMeeting) -> Result<Meeting> {
        let mut meetings = self.meetings.write().await;
        let existing = meetings
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Meeting {} not found", id)))?;
        let created_at = existing.created_at;
        *existing = meeting.into_meeting(id);
        existing.created_at = created_at;
        Ok(existing.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.meetings
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("Meeting {} not found", id)))
    }

    async fn list_upcoming(&self, identity: &str, from: NaiveDateTime) -> Result<Vec<Meeting>> {
        let mut meetings: Vec<Meeting> = self
            .meetings
            .read()
            .await
            .values()
            .filter(|m| m.time >= from && m.involves(identity))
            .cloned()
            .collect();
        meetings.sort_by(|a, b| (a.time, a.created_at, a.id).cmp(&(b.time, b.created_at, b.id)));
        Ok(meetings)
    }
}

#[derive(Clone, Default)]
pub struct MemoryPendingMeetingRepository {
    pending: Arc<RwLock<HashMap<Uuid, PendingMeeting>>>,
}

#[async_trait]
impl PendingMeetingRepository for MemoryPendingMeetingRepository {
    async fn insert(&self, pending: PendingMeeting) -> Result<PendingMeeting> {
        self.pending
            .write()
            .await
            .insert(pending.id, pending.clone());
        Ok(pending)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PendingMeeting>> {
        Ok(self.pending.read().await.get(&id).cloned())
    }

    async fn save(&self, pending: &PendingMeeting, expected_pending: u32) -> Result<()> {
        let mut all = self.pending.write().await;
        let stored = all
            .get_mut(&pending.id)
            .ok_or_else(|| Error::NotFound(format!("Pending meeting {} not found", pending.id)))?;
        if stored.pending_response != expected_pending {
            return Err(Error::Conflict(
                "The invitation changed while you were responding; please retry".to_string(),
            ));
        }
        *stored = pending.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.pending.write().await.remove(&id);
        Ok(())
    }

    async fn list_awaiting(&self, identity: &str) -> Result<Vec<PendingMeeting>> {
        let mut awaiting: Vec<PendingMeeting> = self
            .pending
            .read()
            .await
            .values()
            .filter(|p| p.awaits(identity))
            .cloned()
            .collect();
        awaiting.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(awaiting)
    }
}

#[derive(Default)]
struct ThreadStore {
    threads: HashMap<Uuid, Thread>,
    messages: HashMap<Uuid, Vec<Message>>,
}

#[derive(Clone, Default)]
pub struct MemoryThreadRepository {
    store: Arc<RwLock<ThreadStore>>,
}

#[async_trait]
impl ThreadRepository for MemoryThreadRepository {
    async fn create(&self, thread: NewThread) -> Result<(Thread, Message)> {
        let (record, message) = open_thread(thread);
        let mut store = self.store.write().await;
        store.threads.insert(record.id, record.clone());
        store.messages.insert(record.id, vec![message.clone()]);
        Ok((record, message))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Thread>> {
        Ok(self.store.read().await.threads.get(&id).cloned())
    }

    async fn list_for(&self, identity: &str) -> Result<Vec<Thread>> {
        let mut threads: Vec<Thread> = self
            .store
            .read()
            .await
            .threads
            .values()
            .filter(|t| t.includes(identity))
            .cloned()
            .collect();
        threads.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(threads)
    }

    async fn post_message(&self, thread_id: Uuid, sender: &str, text: &str) -> Result<Message> {
        let mut store = self.store.write().await;
        let thread = store
            .threads
            .get_mut(&thread_id)
            .ok_or_else(|| Error::NotFound(format!("Thread {} not found", thread_id)))?;

        let message = Message {
            id: Uuid::now_v7(),
            thread_id,
            sender: sender.to_string(),
            text: text.to_string(),
            sent_at: Utc::now(),
        };
        thread.last_message_at = message.sent_at;
        store
            .messages
            .entry(thread_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn messages(&self, thread_id: Uuid) -> Result<Vec<Message>> {
        let mut messages = self
            .store
            .read()
            .await
            .messages
            .get(&thread_id)
            .cloned()
            .unwrap_or_default();
        // Stable: equal timestamps keep posting order.
        messages.sort_by_key(|m| m.sent_at);
        Ok(messages)
    }
}

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn upsert(&self, email: &str, name: &str) -> Result<User> {
        let user = User {
            email: email.to_string(),
            name: name.to_string(),
            updated_at: Utc::now(),
        };
        self.users
            .write()
            .await
            .insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn search_by_email_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<User>> {
        let prefix = prefix.to_lowercase();
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.email.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        users.truncate(limit);
        Ok(users)
    }
}
