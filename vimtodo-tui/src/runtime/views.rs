use crate::app::App;
use crate::vim::{Command, InputOwner, Key, KeyInput};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::action_queue::ActionTx;
use super::actions::enqueue_call;

/// Terminals deliver composed text as finished chars, so `composing` is never
/// set from crossterm input.
pub(super) fn key_input(key: &KeyEvent) -> KeyInput {
    let code = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => Key::Other,
    };
    KeyInput {
        key: code,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        composing: false,
    }
}

pub(super) fn handle_key_event(key: KeyEvent, app: &mut App, action_tx: &ActionTx) {
    // Windows reports releases too.
    if key.kind == KeyEventKind::Release {
        return;
    }
    handle_key(&key_input(&key), app, action_tx);
}

pub(super) fn handle_key(input: &KeyInput, app: &mut App, action_tx: &ActionTx) {
    if app.vim.owner() == InputOwner::EditBuffer {
        handle_edit_buffer_key(input, app, action_tx);
        return;
    }

    if app.show_help {
        if matches!(input.key, Key::Esc | Key::Char('?') | Key::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    // Only an input that already had focus gets the key; `i` itself is not text.
    let had_input = app.vim.owner() == InputOwner::NewTaskInput;
    let dispatch = app.vim.handle_key(input, app.model.tasks());
    if let Some(command) = dispatch.command {
        run_command(command, app, action_tx);
    }

    if had_input && app.vim.owner() == InputOwner::NewTaskInput {
        handle_new_task_input_key(input, app, action_tx);
    }
}

fn run_command(command: Command, app: &mut App, action_tx: &ActionTx) {
    match command {
        Command::ToggleComplete(id) => enqueue_call(action_tx, app.model.toggle_complete(&id)),
        Command::StartEditing(id) => app.start_editing(&id),
        Command::Delete(id) => {
            enqueue_call(action_tx, app.model.remove(&id));
            app.sync_selection();
        }
        Command::FocusNewTaskInput => app.focus_new_task_input(),
        Command::BlurInput => app.blur_input(),
        Command::ToggleHelp => app.toggle_help(),
        Command::Reload => enqueue_call(action_tx, Some(app.model.list())),
        Command::DismissError => app.model.clear_error(),
        Command::Quit => app.quit(),
    }
}

fn handle_new_task_input_key(input: &KeyInput, app: &mut App, action_tx: &ActionTx) {
    if input.ctrl {
        return;
    }
    match input.key {
        Key::Char(c) => {
            app.model.push_draft_char(c);
        }
        Key::Enter if input.is_confirm() => enqueue_call(action_tx, app.submit_draft()),
        Key::Esc => app.abandon_draft(),
        _ => {
            let draft = app.model.draft_mut();
            match input.key {
                Key::Backspace => draft.backspace(),
                Key::Delete => draft.delete(),
                Key::Left => draft.move_left(),
                Key::Right => draft.move_right(),
                Key::Home => draft.home(),
                Key::End => draft.end(),
                _ => {}
            }
        }
    }
}

fn handle_edit_buffer_key(input: &KeyInput, app: &mut App, action_tx: &ActionTx) {
    match input.key {
        Key::Enter if input.is_confirm() => {
            enqueue_call(action_tx, app.save_edit());
            return;
        }
        Key::Esc => {
            app.cancel_editing();
            return;
        }
        _ => {}
    }

    let Some(buffer) = app.edit.buffer_mut() else {
        app.vim.release_input();
        return;
    };
    match input.key {
        Key::Char(c) if !input.ctrl => buffer.insert(c),
        Key::Backspace => buffer.backspace(),
        Key::Delete => buffer.delete(),
        Key::Left => buffer.move_left(),
        Key::Right => buffer.move_right(),
        Key::Home => buffer.home(),
        Key::End => buffer.end(),
        _ => {}
    }
}
