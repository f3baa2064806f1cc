//! Vim-style modal key handling for the task list.
//!
//! [`VimController`] knows nothing about terminals or widgets: it is fed
//! [`KeyInput`]s and answers with a [`Dispatch`] saying whether the key was
//! consumed and which [`Command`] (if any) the caller should carry out.

use std::fmt;

use crate::types::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => write!(f, "NORMAL"),
            Mode::Insert => write!(f, "INSERT"),
        }
    }
}

/// Which input, if any, currently takes raw keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputOwner {
    #[default]
    None,
    NewTaskInput,
    EditBuffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    /// An IME composition is in progress; `Enter` only confirms the conversion.
    pub composing: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            composing: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::new(key)
        }
    }

    pub fn is_char(&self, c: char) -> bool {
        !self.ctrl && self.key == Key::Char(c)
    }

    /// `Enter` that actually confirms, as opposed to finishing an IME conversion.
    pub fn is_confirm(&self) -> bool {
        self.key == Key::Enter && !self.composing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleComplete(String),
    StartEditing(String),
    Delete(String),
    FocusNewTaskInput,
    BlurInput,
    ToggleHelp,
    Reload,
    DismissError,
    Quit,
}

/// Outcome of one key. `handled` means the key was a command key and must not
/// fall through to anything else.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dispatch {
    pub handled: bool,
    pub command: Option<Command>,
}

impl Dispatch {
    fn ignored() -> Self {
        Self::default()
    }

    fn handled() -> Self {
        Self {
            handled: true,
            command: None,
        }
    }

    fn command(command: Command) -> Self {
        Self {
            handled: true,
            command: Some(command),
        }
    }
}

#[derive(Debug, Default)]
pub struct VimController {
    mode: Mode,
    selected: usize,
    command_buffer: Option<char>,
    owner: InputOwner,
}

impl VimController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn command_buffer(&self) -> Option<char> {
        self.command_buffer
    }

    pub fn owner(&self) -> InputOwner {
        self.owner
    }

    pub fn capture_input(&mut self, owner: InputOwner) {
        self.owner = owner;
    }

    pub fn release_input(&mut self) {
        self.owner = InputOwner::None;
    }

    /// Keep the cursor inside a list that changed underneath it.
    pub fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, input: &KeyInput, tasks: &[Task]) -> Dispatch {
        if self.owner == InputOwner::EditBuffer {
            return Dispatch::ignored();
        }

        match self.mode {
            Mode::Insert => self.handle_insert(input),
            // Typing into an input while in Normal mode is left alone.
            Mode::Normal if self.owner == InputOwner::NewTaskInput => Dispatch::ignored(),
            Mode::Normal => self.handle_normal(input, tasks),
        }
    }

    fn handle_insert(&mut self, input: &KeyInput) -> Dispatch {
        match input.key {
            Key::Esc => {
                self.mode = Mode::Normal;
                Dispatch::handled()
            }
            Key::Char('c') if input.ctrl => {
                self.mode = Mode::Normal;
                Dispatch::command(Command::BlurInput)
            }
            _ => Dispatch::ignored(),
        }
    }

    fn handle_normal(&mut self, input: &KeyInput, tasks: &[Task]) -> Dispatch {
        if input.ctrl {
            self.command_buffer = None;
            return match input.key {
                Key::Char('c') => Dispatch::command(Command::Quit),
                _ => Dispatch::ignored(),
            };
        }

        if let Some(pending) = self.command_buffer {
            return match input.key {
                Key::Char(c) if c == pending => {
                    self.command_buffer = None;
                    self.complete_sequence(pending, tasks)
                }
                Key::Esc => {
                    self.command_buffer = None;
                    Dispatch::handled()
                }
                // Anything else, including the other sequence's first key,
                // only cancels the pending one.
                _ => {
                    self.command_buffer = None;
                    Dispatch::ignored()
                }
            };
        }

        let current = tasks.get(self.selected);
        match input.key {
            Key::Char('j') | Key::Down => {
                self.selected = (self.selected + 1).min(tasks.len().saturating_sub(1));
                Dispatch::handled()
            }
            Key::Char('k') | Key::Up => {
                self.selected = self.selected.saturating_sub(1);
                Dispatch::handled()
            }
            Key::Char('G') => {
                self.selected = tasks.len().saturating_sub(1);
                Dispatch::handled()
            }
            Key::Char(c @ ('g' | 'd')) => {
                self.command_buffer = Some(c);
                Dispatch::handled()
            }
            Key::Char('i' | 'o') => {
                self.mode = Mode::Insert;
                Dispatch::command(Command::FocusNewTaskInput)
            }
            Key::Enter => match current {
                Some(task) => Dispatch::command(Command::ToggleComplete(task.id.clone())),
                None => Dispatch::handled(),
            },
            Key::Char('e') => match current {
                Some(task) => Dispatch::command(Command::StartEditing(task.id.clone())),
                None => Dispatch::handled(),
            },
            Key::Char('?') => Dispatch::command(Command::ToggleHelp),
            Key::Char('r') => Dispatch::command(Command::Reload),
            Key::Char('x') => Dispatch::command(Command::DismissError),
            Key::Char('q') => Dispatch::command(Command::Quit),
            Key::Esc => Dispatch::handled(),
            _ => Dispatch::ignored(),
        }
    }

    fn complete_sequence(&mut self, key: char, tasks: &[Task]) -> Dispatch {
        match key {
            'g' => {
                self.selected = 0;
                Dispatch::handled()
            }
            'd' => {
                let Some(task) = tasks.get(self.selected) else {
                    return Dispatch::handled();
                };
                // `tasks` is still the list from before the delete.
                if self.selected + 1 >= tasks.len() {
                    self.selected = tasks.len().saturating_sub(2);
                }
                Dispatch::command(Command::Delete(task.id.clone()))
            }
            _ => Dispatch::ignored(),
        }
    }
}
