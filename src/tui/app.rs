use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{
    self, Event, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::RemoteStore;
use crate::model::{AppConfig, Collection, CollectionRef, SectionKind, Workspace};
use crate::sync::{IdTable, Outbox, Reconciled, SyncWorker, WriteOutcome, reconcile};

use super::input;
use super::position::Position;
use super::render;
use super::session::{Cursor, Session};
use super::theme::Theme;

/// Interaction mode, derived from `App` state on every key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No section focused
    Idle,
    /// A section is highlighted but not entered
    SectionFocused,
    /// Moving through items and insert slots
    ItemLevel,
    /// Wizard name entry
    Typing,
    Grabbing,
    Editing,
    /// A collector popup owns the keyboard
    PopupOpen,
}

/// Short note shown in the status row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct App {
    pub workspace: Workspace,
    pub outbox: Outbox,
    pub focus: Option<SectionKind>,
    /// Cursor inside the focused section, once entered
    pub cursor: Option<Cursor>,
    /// Cursor inside a project's or routine's task list
    pub child: Option<Cursor>,
    pub should_quit: bool,
    pub theme: Theme,
    pub status: Option<StatusMessage>,
    pub show_key_hints: bool,
}

impl App {
    pub fn new(workspace: Workspace, theme: Theme) -> Self {
        App {
            workspace,
            outbox: Outbox::new(),
            focus: None,
            cursor: None,
            child: None,
            should_quit: false,
            theme,
            status: None,
            show_key_hints: true,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.focus.is_none() {
            return Mode::Idle;
        }
        let Some(cursor) = self.active_cursor() else {
            return Mode::SectionFocused;
        };
        match &cursor.session {
            None => Mode::ItemLevel,
            Some(session) if session.popup().is_some() => Mode::PopupOpen,
            Some(Session::Wizard(_)) => Mode::Typing,
            Some(Session::Grab(_)) => Mode::Grabbing,
            Some(Session::Edit(_)) => Mode::Editing,
        }
    }

    /// The cursor keys act on: the task level when open, else the section
    pub fn active_cursor(&self) -> Option<&Cursor> {
        self.child.as_ref().or(self.cursor.as_ref())
    }

    pub fn active_cursor_mut(&mut self) -> Option<&mut Cursor> {
        match self.child {
            Some(ref mut child) => Some(child),
            None => self.cursor.as_mut(),
        }
    }

    /// Borrow the active cursor alongside the data it edits
    pub fn split_mut(&mut self) -> Option<(&mut Cursor, &mut Workspace, &mut Outbox)> {
        let cursor = match self.child {
            Some(ref mut child) => child,
            None => self.cursor.as_mut()?,
        };
        Some((cursor, &mut self.workspace, &mut self.outbox))
    }

    pub fn collection(&self, target: CollectionRef) -> Option<&Collection> {
        self.workspace.collection(target)
    }

    /// Visible length of the collection a cursor points into
    pub fn visible_len(&self, target: CollectionRef) -> usize {
        self.collection(target).map_or(0, Collection::visible_len)
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    /// Enter the focused section's item level
    pub fn enter_section(&mut self) {
        let Some(section) = self.focus else {
            return;
        };
        let target = CollectionRef::section(section);
        let position = Position::enter(self.visible_len(target));
        self.cursor = Some(Cursor::new(target, position));
        self.child = None;
    }

    pub fn leave_section(&mut self) {
        self.cursor = None;
        self.child = None;
    }

    /// Open the task level of the project or routine under the section cursor
    pub fn enter_children(&mut self) -> bool {
        let Some(cursor) = &self.cursor else {
            return false;
        };
        let Some(index) = cursor.position.item_index() else {
            return false;
        };
        let Some(parent) = self
            .collection(cursor.target)
            .and_then(|c| c.visible_item(index))
        else {
            return false;
        };
        let Some(child_kind) = parent.kind.child_kind() else {
            return false;
        };
        let target = CollectionRef::children(child_kind, parent.local);
        let position = Position::enter(self.visible_len(target));
        self.child = Some(Cursor::new(target, position));
        true
    }

    pub fn leave_children(&mut self) {
        self.child = None;
    }

    /// Fold a settled write into local state and fix up cursors
    pub fn apply_outcome(&mut self, outcome: WriteOutcome) {
        let result = reconcile(&mut self.workspace, &mut self.outbox, outcome);
        match result {
            Reconciled::Confirmed | Reconciled::Unknown => {}
            Reconciled::CreateRolledBack { target, .. } => {
                self.set_error(format!("Could not save new {}", target.kind.label()));
            }
            Reconciled::UpdateKept { .. } => {
                self.set_error("Could not save changes");
            }
            Reconciled::DeleteRestored { target, .. } => {
                self.set_error(format!("Could not delete {}", target.kind.label()));
            }
            Reconciled::DeleteLost { .. } => {
                self.set_error("Could not delete item");
            }
            Reconciled::ReorderReverted {
                target,
                original_index,
            } => {
                self.set_error("Could not save new order");
                for cursor in [self.cursor.as_mut(), self.child.as_mut()].into_iter().flatten() {
                    if cursor.target == target && cursor.session.is_none() {
                        cursor.position = Position::item(original_index);
                    }
                }
            }
        }
        self.resync_cursors();
    }

    /// Keep cursors valid after the workspace changed underneath them
    pub fn resync_cursors(&mut self) {
        if let Some(child) = &self.child
            && let Some(parent) = child.target.parent
            && self.workspace.find(parent).is_none()
        {
            self.child = None;
        }
        let workspace = &self.workspace;
        for cursor in [self.cursor.as_mut(), self.child.as_mut()].into_iter().flatten() {
            // A task list that was never written to does not exist yet
            let collection = workspace.collection(cursor.target);
            let len = collection.map_or(0, Collection::visible_len);
            match &mut cursor.session {
                None => cursor.position = cursor.position.clamp(len),
                Some(Session::Grab(grab)) => match collection.and_then(|c| c.visible_index_of(grab.item)) {
                    Some(index) => {
                        grab.current_index = index;
                        cursor.position = Position::item(index);
                    }
                    None => {
                        tracing::warn!(target: "planner::session", item = %grab.item, "grabbed item vanished");
                        cursor.session = None;
                        cursor.position = cursor.position.clamp(len);
                    }
                },
                Some(Session::Edit(edit)) => {
                    if collection.and_then(|c| c.get(edit.item)).is_none() {
                        tracing::warn!(target: "planner::session", item = %edit.item, "edited item vanished");
                        cursor.session = None;
                        cursor.position = cursor.position.clamp(len);
                    }
                }
                Some(Session::Wizard(wizard)) => wizard.prior = wizard.prior.clamp(len),
            }
        }
    }
}

/// Run the TUI against a loaded backend
pub fn run(
    config: &AppConfig,
    mut store: Box<dyn RemoteStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let today = Local::now().date_naive();
    let snapshot = store.load()?;
    let workspace = Workspace::from_snapshot(&snapshot, today);
    tracing::info!(
        items = workspace.all_items().count(),
        "loaded workspace"
    );

    let worker = SyncWorker::spawn(store, IdTable::from_workspace(&workspace));
    let mut app = App::new(workspace, Theme::from_config(&config.ui));
    app.show_key_hints = config.ui.show_key_hints;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let enhanced = config.ui.kitty_keyboard.unwrap_or(true)
        && supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if enhanced {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, &worker);

    // Restore terminal
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Let queued writes land before exiting
    worker.submit(app.outbox.drain());
    for outcome in worker.finish() {
        app.apply_outcome(outcome);
    }
    if app.outbox.in_flight() > 0 {
        tracing::warn!(pending = app.outbox.in_flight(), "exiting with unsettled writes");
    }

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    worker: &SyncWorker,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        worker.submit(app.outbox.drain());
        for outcome in worker.poll() {
            app.apply_outcome(outcome);
        }

        let today = Local::now().date_naive();
        if today != app.workspace.today() {
            app.workspace.set_today(today);
            app.resync_cursors();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
