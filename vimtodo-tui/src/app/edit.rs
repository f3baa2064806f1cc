use super::model::{PendingCall, TaskModel};
use super::text_input::TextInput;
use crate::types::Task;

/// The one task currently being text-edited.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    pub task_id: String,
    pub buffer: TextInput,
}

/// Holds at most one [`EditBuffer`]. Starting a new edit replaces the old one
/// without saving it.
#[derive(Debug, Default)]
pub struct EditSession {
    active: Option<EditBuffer>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_editing(&mut self, task: &Task) {
        if let Some(previous) = &self.active {
            if previous.task_id != task.id {
                tracing::debug!(task_id = %previous.task_id, "discarding unsaved edit");
            }
        }
        self.active = Some(EditBuffer {
            task_id: task.id.clone(),
            buffer: TextInput::from_str(&task.task),
        });
    }

    /// Replace the buffer text. Does nothing without an active edit.
    pub fn set_buffer(&mut self, text: &str) {
        if let Some(edit) = &mut self.active {
            edit.buffer.set(text);
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut TextInput> {
        self.active.as_mut().map(|edit| &mut edit.buffer)
    }

    pub fn cancel_editing(&mut self) {
        self.active = None;
    }

    /// Hand the buffer to [`TaskModel::update_text`] and close the edit,
    /// whether or not the call later succeeds.
    pub fn save(&mut self, model: &mut TaskModel) -> Option<PendingCall> {
        let edit = self.active.take()?;
        model.update_text(&edit.task_id, &edit.buffer.value)
    }

    /// Point the edit at the server id once its provisional task is created.
    pub fn follow_resolved_id(&mut self, model: &TaskModel) {
        if let Some(edit) = &mut self.active {
            let resolved = model.resolve(&edit.task_id).to_string();
            if resolved != edit.task_id {
                edit.task_id = resolved;
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&EditBuffer> {
        self.active.as_ref()
    }

    pub fn target_id(&self) -> Option<&str> {
        self.active.as_ref().map(|edit| edit.task_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ClientError, TaskChanges, TaskRequest, TaskResponse};
    use time::OffsetDateTime;

    fn task(id: &str, text: &str) -> Task {
        Task {
            id: id.to_string(),
            task: text.to_string(),
            completed: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn model_with(tasks: Vec<Task>) -> TaskModel {
        let mut model = TaskModel::new();
        let call = model.list();
        model.settle(call.ticket, Ok(TaskResponse::Listed(tasks)));
        model
    }

    #[test]
    fn start_editing_copies_the_task_text() {
        let mut session = EditSession::new();
        session.start_editing(&task("1", "buy milk"));

        let edit = session.active().unwrap();
        assert_eq!(edit.task_id, "1");
        assert_eq!(edit.buffer.value, "buy milk");
        assert_eq!(edit.buffer.cursor, "buy milk".len());
    }

    #[test]
    fn starting_another_edit_replaces_the_first() {
        let mut session = EditSession::new();
        session.start_editing(&task("1", "one"));
        session.set_buffer("unsaved");
        session.start_editing(&task("2", "two"));

        assert_eq!(session.target_id(), Some("2"));
        assert_eq!(session.active().unwrap().buffer.value, "two");
    }

    #[test]
    fn cancel_leaves_the_task_untouched() {
        let mut model = model_with(vec![task("1", "buy milk")]);
        let mut session = EditSession::new();
        session.start_editing(&model.tasks()[0].clone());
        session.set_buffer("buy bread");
        session.cancel_editing();

        assert!(!session.is_active());
        assert!(session.save(&mut model).is_none());
        assert_eq!(model.tasks()[0].task, "buy milk");
    }

    #[test]
    fn save_updates_the_task_and_closes_the_edit() {
        let mut model = model_with(vec![task("1", "buy milk")]);
        let mut session = EditSession::new();
        session.start_editing(&model.tasks()[0].clone());
        session.set_buffer(" buy bread ");

        let call = session.save(&mut model).unwrap();
        assert!(!session.is_active());
        assert_eq!(model.tasks()[0].task, "buy bread");
        assert_eq!(
            call.request,
            TaskRequest::Update {
                id: "1".to_string(),
                changes: TaskChanges {
                    task: Some("buy bread".to_string()),
                    completed: None,
                },
            }
        );

        model.settle(call.ticket, Err(ClientError::Status(500)));
        assert_eq!(model.tasks()[0].task, "buy milk");
        assert!(!session.is_active());
    }

    #[test]
    fn saving_blank_text_closes_the_edit_without_a_call() {
        let mut model = model_with(vec![task("1", "buy milk")]);
        let mut session = EditSession::new();
        session.start_editing(&model.tasks()[0].clone());
        session.set_buffer("   ");

        assert!(session.save(&mut model).is_none());
        assert!(!session.is_active());
        assert_eq!(model.tasks()[0].task, "buy milk");
    }
}
