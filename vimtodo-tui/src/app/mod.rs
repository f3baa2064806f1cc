use crate::api::{ClientError, TaskResponse};
use crate::types::Task;
use crate::vim::{InputOwner, Mode, VimController};

mod edit;
mod model;
mod text_input;
pub use edit::{EditBuffer, EditSession};
pub use model::{PendingCall, TaskModel, Ticket, DRAFT_LIMIT};
pub use text_input::TextInput;

pub struct App {
    pub running: bool,
    pub user_name: String,
    pub dev_mode: bool,
    pub show_help: bool,
    pub model: TaskModel,
    pub edit: EditSession,
    pub vim: VimController,

    // Loading indicator
    pub throbber_state: throbber_widgets_tui::ThrobberState,
}

impl App {
    pub fn new(user_name: String, dev_mode: bool) -> Self {
        Self {
            running: true,
            user_name,
            dev_mode,
            show_help: false,
            model: TaskModel::new(),
            edit: EditSession::new(),
            vim: VimController::new(),
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn tasks(&self) -> &[Task] {
        self.model.tasks()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.model.tasks().get(self.vim.selected())
    }

    /// Feed a call's outcome to the model and bring the edit and cursor along.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        result: Result<TaskResponse, ClientError>,
    ) -> Option<PendingCall> {
        let next = self.model.settle(ticket, result);
        self.edit.follow_resolved_id(&self.model);
        self.model.prune_resolved_ids();
        self.sync_selection();
        next
    }

    /// Re-clamp the cursor after the list changed size.
    pub fn sync_selection(&mut self) {
        self.vim.clamp_selection(self.model.tasks().len());
    }

    pub fn focus_new_task_input(&mut self) {
        self.vim.capture_input(InputOwner::NewTaskInput);
    }

    pub fn start_editing(&mut self, task_id: &str) {
        let Some(task) = self.model.find(task_id).cloned() else {
            return;
        };
        self.edit.start_editing(&task);
        self.vim.capture_input(InputOwner::EditBuffer);
    }

    pub fn cancel_editing(&mut self) {
        self.edit.cancel_editing();
        self.vim.release_input();
    }

    pub fn save_edit(&mut self) -> Option<PendingCall> {
        let call = self.edit.save(&mut self.model);
        self.vim.release_input();
        call
    }

    /// Submit the draft from the new-task input and leave Insert mode.
    pub fn submit_draft(&mut self) -> Option<PendingCall> {
        let call = self.model.submit_draft();
        self.vim.set_mode(Mode::Normal);
        self.vim.release_input();
        call
    }

    /// Leave the new-task input, dropping what was typed.
    pub fn abandon_draft(&mut self) {
        self.model.draft_mut().clear();
        self.vim.set_mode(Mode::Normal);
        self.vim.release_input();
    }

    pub fn blur_input(&mut self) {
        self.vim.release_input();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn created(id: &str, text: &str) -> Result<TaskResponse, ClientError> {
        Ok(TaskResponse::Created(Task {
            id: id.to_string(),
            task: text.to_string(),
            completed: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }))
    }

    #[test]
    fn edit_opened_on_a_provisional_task_follows_its_server_id() {
        let mut app = App::new("Dev User".to_string(), true);
        let create = app.model.add("buy milk").unwrap();
        let provisional_id = app.tasks()[0].id.clone();
        app.start_editing(&provisional_id);
        app.edit.set_buffer("buy oat milk");

        assert!(app.settle(create.ticket, created("srv-1", "buy milk")).is_none());
        assert_eq!(app.edit.target_id(), Some("srv-1"));
        assert_eq!(app.model.resolve(&provisional_id), provisional_id);

        let call = app.save_edit().expect("update call");
        assert_eq!(call.request.task_id(), Some("srv-1"));
        assert_eq!(app.tasks()[0].task, "buy oat milk");
    }
}
