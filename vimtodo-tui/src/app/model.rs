use std::collections::{HashMap, HashSet, VecDeque};

use time::OffsetDateTime;

use super::text_input::TextInput;
use crate::api::{ClientError, TaskChanges, TaskRequest, TaskResponse};
use crate::types::{Task, PROVISIONAL_ID_PREFIX};

/// Soft cap on the new-task draft, in characters.
pub const DRAFT_LIMIT: usize = 200;
/// Past this many characters the input shows how many are left.
pub const DRAFT_WARNING_THRESHOLD: usize = 180;

pub type Ticket = u64;

/// A network call the runtime has to issue on behalf of the model. Its outcome
/// goes back through [`TaskModel::settle`] with the same ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub ticket: Ticket,
    pub request: TaskRequest,
}

#[derive(Debug, Clone, PartialEq)]
enum Mutation {
    Create { provisional_id: String, text: String },
    Toggle,
    Remove,
    UpdateText,
}

#[derive(Debug, Clone)]
struct QueuedCall {
    mutation: Mutation,
    task_id: String,
    request: TaskRequest,
    /// The list right before this call's optimistic change.
    snapshot: Vec<Task>,
    /// List revision right after this call's optimistic change.
    revision: u64,
}

/// Client-side copy of the caller's tasks plus the new-task draft.
///
/// Every mutation applies its change locally first and hands back the call to
/// make. Calls against the same task are serialized: only the head of a task's
/// queue is ever in flight, the rest wait for it to settle. A failed call rolls
/// its task back and drops whatever was queued behind it on that task.
#[derive(Debug, Default)]
pub struct TaskModel {
    tasks: Vec<Task>,
    draft: TextInput,
    error: Option<String>,
    revision: u64,
    next_ticket: Ticket,
    next_provisional: u64,
    list_calls: HashSet<Ticket>,
    calls: HashMap<Ticket, QueuedCall>,
    queues: HashMap<String, VecDeque<Ticket>>,
    resolved_ids: HashMap<String, String>,
}

impl TaskModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        let id = self.resolve(id);
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn draft(&self) -> &TextInput {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut TextInput {
        &mut self.draft
    }

    /// Type into the draft, ignoring input past [`DRAFT_LIMIT`].
    pub fn push_draft_char(&mut self, c: char) -> bool {
        self.draft.insert_limited(c, DRAFT_LIMIT)
    }

    /// Characters left before the cap, once past the warning threshold.
    pub fn draft_remaining_warning(&self) -> Option<usize> {
        let count = self.draft.char_count();
        (count > DRAFT_WARNING_THRESHOLD).then(|| DRAFT_LIMIT.saturating_sub(count))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_loading(&self) -> bool {
        !self.list_calls.is_empty()
    }

    pub fn has_pending_calls(&self) -> bool {
        !self.calls.is_empty() || !self.list_calls.is_empty()
    }

    /// Fetch the whole list. The response replaces the local collection.
    pub fn list(&mut self) -> PendingCall {
        let ticket = self.take_ticket();
        self.list_calls.insert(ticket);
        PendingCall {
            ticket,
            request: TaskRequest::List,
        }
    }

    /// Add the current draft as a new task.
    pub fn submit_draft(&mut self) -> Option<PendingCall> {
        let text = self.draft.value.clone();
        self.add(&text)
    }

    pub fn add(&mut self, text: &str) -> Option<PendingCall> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let snapshot = self.tasks.clone();
        self.next_provisional += 1;
        let provisional_id = format!("{}{}", PROVISIONAL_ID_PREFIX, self.next_provisional);
        let now = OffsetDateTime::now_utc();
        self.tasks.insert(
            0,
            Task {
                id: provisional_id.clone(),
                task: text.to_string(),
                completed: false,
                created_at: now,
                updated_at: now,
            },
        );
        self.draft.clear();
        self.touch();

        self.enqueue(
            provisional_id.clone(),
            Mutation::Create {
                provisional_id,
                text: text.to_string(),
            },
            TaskRequest::Create {
                text: text.to_string(),
            },
            snapshot,
        )
    }

    pub fn toggle_complete(&mut self, id: &str) -> Option<PendingCall> {
        let id = self.resolve(id).to_string();
        let index = self.position(&id)?;

        let snapshot = self.tasks.clone();
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        let completed = task.completed;
        self.touch();

        self.enqueue(
            id.clone(),
            Mutation::Toggle,
            TaskRequest::Update {
                id,
                changes: TaskChanges {
                    task: None,
                    completed: Some(completed),
                },
            },
            snapshot,
        )
    }

    pub fn remove(&mut self, id: &str) -> Option<PendingCall> {
        let id = self.resolve(id).to_string();
        let index = self.position(&id)?;

        let snapshot = self.tasks.clone();
        self.tasks.remove(index);
        self.touch();

        self.enqueue(
            id.clone(),
            Mutation::Remove,
            TaskRequest::Delete { id },
            snapshot,
        )
    }

    pub fn update_text(&mut self, id: &str, text: &str) -> Option<PendingCall> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let id = self.resolve(id).to_string();
        let index = self.position(&id)?;

        let snapshot = self.tasks.clone();
        self.tasks[index].task = text.to_string();
        self.touch();

        self.enqueue(
            id.clone(),
            Mutation::UpdateText,
            TaskRequest::Update {
                id,
                changes: TaskChanges {
                    task: Some(text.to_string()),
                    completed: None,
                },
            },
            snapshot,
        )
    }

    /// Forget provisional ids whose task has no calls left in flight. Anything
    /// still holding one should have been moved to [`Self::resolve`]'s answer.
    pub fn prune_resolved_ids(&mut self) {
        let queues = &self.queues;
        self.resolved_ids
            .retain(|_, server_id| queues.contains_key(server_id.as_str()));
    }

    /// Reconcile the outcome of a call. Returns the next call to issue when
    /// this one was blocking a queued call on the same task.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        result: Result<TaskResponse, ClientError>,
    ) -> Option<PendingCall> {
        if self.list_calls.remove(&ticket) {
            match result {
                Ok(TaskResponse::Listed(tasks)) => {
                    self.tasks = tasks;
                    self.touch();
                }
                Ok(other) => {
                    self.record_error(ClientError::Decode(format!("unexpected {other:?}")))
                }
                Err(e) => self.record_error(e),
            }
            return None;
        }

        let Some(QueuedCall {
            mutation,
            task_id,
            snapshot,
            revision,
            ..
        }) = self.calls.remove(&ticket)
        else {
            tracing::debug!(ticket, "settled a call that is no longer tracked");
            return None;
        };

        if let Some(queue) = self.queues.get_mut(&task_id) {
            if queue.front() == Some(&ticket) {
                queue.pop_front();
            }
        }

        let next_key = match (mutation, result) {
            (Mutation::Create { provisional_id, .. }, Ok(TaskResponse::Created(task))) => {
                self.confirm_create(&provisional_id, task)
            }
            (Mutation::Create { provisional_id, text }, outcome) => {
                let error = match outcome {
                    Err(e) => e,
                    Ok(other) => ClientError::Decode(format!("unexpected {other:?}")),
                };
                self.reject_create(&provisional_id, &text);
                self.record_error(error);
                provisional_id
            }
            (_, Ok(_)) => task_id,
            (_, Err(e)) => {
                self.roll_back(&task_id, snapshot, revision);
                self.record_error(e);
                task_id
            }
        };

        self.next_in_queue(&next_key)
    }

    fn take_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Follow a provisional id to the server id it was replaced by.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.resolved_ids.get(id).map(String::as_str).unwrap_or(id)
    }

    fn record_error(&mut self, error: ClientError) {
        tracing::warn!(%error, "task call failed");
        self.error = Some(error.to_string());
    }

    fn enqueue(
        &mut self,
        task_id: String,
        mutation: Mutation,
        request: TaskRequest,
        snapshot: Vec<Task>,
    ) -> Option<PendingCall> {
        let ticket = self.take_ticket();
        self.calls.insert(
            ticket,
            QueuedCall {
                mutation,
                task_id: task_id.clone(),
                request: request.clone(),
                snapshot,
                revision: self.revision,
            },
        );

        let queue = self.queues.entry(task_id).or_default();
        queue.push_back(ticket);
        (queue.len() == 1).then_some(PendingCall { ticket, request })
    }

    fn next_in_queue(&mut self, task_id: &str) -> Option<PendingCall> {
        let queue = self.queues.get(task_id)?;
        let Some(&ticket) = queue.front() else {
            self.queues.remove(task_id);
            return None;
        };
        let call = self.calls.get(&ticket)?;
        Some(PendingCall {
            ticket,
            request: call.request.clone(),
        })
    }

    fn drop_queue(&mut self, task_id: &str) {
        if let Some(queue) = self.queues.remove(task_id) {
            for ticket in queue {
                self.calls.remove(&ticket);
            }
        }
    }

    /// Swap the provisional entry for the server's task and point everything
    /// that still refers to the provisional id at the server id.
    fn confirm_create(&mut self, provisional_id: &str, created: Task) -> String {
        let server_id = created.id.clone();
        self.resolved_ids
            .insert(provisional_id.to_string(), server_id.clone());

        let queued = self.queues.remove(provisional_id).unwrap_or_default();
        let remove_queued = queued.iter().any(|ticket| {
            self.calls
                .get(ticket)
                .is_some_and(|call| call.mutation == Mutation::Remove)
        });

        match self.position(provisional_id) {
            // Queued edits already changed the local copy; keep their values.
            Some(index) if !queued.is_empty() => {
                let local = &mut self.tasks[index];
                local.id = server_id.clone();
                local.created_at = created.created_at;
                local.updated_at = created.updated_at;
            }
            Some(index) => self.tasks[index] = created.clone(),
            None if remove_queued => {}
            // A list refresh dropped the provisional entry. Bring the task back
            // with the changes still queued for it, as the user last saw it.
            None => {
                let index = match self.position(&server_id) {
                    Some(index) => index,
                    None => {
                        self.tasks.insert(0, created.clone());
                        0
                    }
                };
                for ticket in &queued {
                    if let Some(QueuedCall {
                        request: TaskRequest::Update { changes, .. },
                        ..
                    }) = self.calls.get(ticket)
                    {
                        changes.apply_to(&mut self.tasks[index]);
                    }
                }
            }
        }
        self.touch();

        for call in self.calls.values_mut() {
            for task in call.snapshot.iter_mut() {
                if task.id == provisional_id {
                    task.id = server_id.clone();
                    task.created_at = created.created_at;
                    task.updated_at = created.updated_at;
                }
            }
        }
        for ticket in &queued {
            if let Some(call) = self.calls.get_mut(ticket) {
                call.task_id = server_id.clone();
                call.request.retarget(&server_id);
            }
        }
        if !queued.is_empty() {
            self.queues.insert(server_id.clone(), queued);
        }

        server_id
    }

    fn reject_create(&mut self, provisional_id: &str, text: &str) {
        if let Some(index) = self.position(provisional_id) {
            self.tasks.remove(index);
            self.touch();
        }
        self.draft.set(text);
        self.drop_queue(provisional_id);
    }

    /// Undo a failed call. When nothing touched the list since the call's own
    /// change the whole snapshot comes back; otherwise only the affected task
    /// is put back, record and position, so unrelated changes survive.
    fn roll_back(&mut self, task_id: &str, snapshot: Vec<Task>, revision: u64) {
        self.drop_queue(task_id);

        if self.revision == revision {
            self.tasks = snapshot;
            self.touch();
            return;
        }

        if let Some(current) = self.position(task_id) {
            self.tasks.remove(current);
        }
        if let Some(index) = snapshot.iter().position(|task| task.id == task_id) {
            let at = index.min(self.tasks.len());
            self.tasks.insert(at, snapshot[index].clone());
        }
        self.touch();
    }
}
