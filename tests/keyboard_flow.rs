use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use planner::io::file_store::FileStore;
use planner::io::{RemoteStore, StoreError};
use planner::model::{
    CollectionRef, Field, Fields, InsertSlot, Item, ItemKind, LocalId, SectionKind, Value,
    ViewFilter, Workspace,
};
use planner::sync::{IdTable, SyncWorker, WriteOutcome, WriteRequest};
use planner::tui::input::handle_key;
use planner::tui::position::Position;
use planner::tui::session::Session;
use planner::tui::theme::Theme;
use planner::tui::{App, Mode};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn press(app: &mut App, code: KeyCode) {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
}

fn commit(app: &mut App) {
    handle_key(app, KeyEvent::new(KeyCode::Enter, KeyModifiers::CONTROL));
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn app_with_projects(names: &[&str]) -> App {
    let mut workspace = Workspace::new(today());
    for (i, name) in names.iter().enumerate() {
        let mut fields = Fields::new();
        fields.insert(Field::Name, Value::Text(name.to_string()));
        fields.insert(Field::Goal, Value::Null);
        fields.insert(Field::Deadline, Value::Null);
        let mut item = Item::new(workspace.alloc_local(), ItemKind::Project, fields);
        item.remote = Some(format!("projects-{}", i + 1));
        workspace
            .section_mut(SectionKind::Projects)
            .insert(InsertSlot::Bottom, item);
    }
    App::new(workspace, Theme::default())
}

/// Idle → Goals → Projects → entered
fn enter_projects(app: &mut App) {
    press(app, KeyCode::Tab);
    press(app, KeyCode::Down);
    assert_eq!(app.focus, Some(SectionKind::Projects));
    press(app, KeyCode::Tab);
    assert_eq!(app.mode(), Mode::ItemLevel);
}

fn project_names(app: &App) -> Vec<String> {
    app.workspace
        .section(SectionKind::Projects)
        .items()
        .iter()
        .map(|i| i.name().to_string())
        .collect()
}

fn position(app: &App) -> Position {
    app.active_cursor().unwrap().position
}

fn project(app: &App, index: usize) -> &Item {
    &app.workspace.section(SectionKind::Projects).items()[index]
}

fn failure(op: planner::sync::OpId) -> WriteOutcome {
    WriteOutcome::Failed {
        op,
        error: StoreError::Status {
            status: 500,
            method: "PUT",
            url: "http://localhost/projects".into(),
        },
    }
}

fn status_text(app: &App) -> &str {
    let status = app.status.as_ref().unwrap();
    assert!(status.is_error);
    &status.text
}

#[test]
fn wizard_creates_project_with_every_step_field() {
    let mut app = app_with_projects(&[]);
    enter_projects(&mut app);
    assert_eq!(position(&app), Position::BOTTOM);

    type_text(&mut app, "Ship v1");
    assert_eq!(app.mode(), Mode::Typing);
    press(&mut app, KeyCode::Enter);
    // Goal picker: "None" is first
    assert_eq!(app.mode(), Mode::PopupOpen);
    press(&mut app, KeyCode::Enter);
    // Deadline entry left empty
    assert_eq!(app.mode(), Mode::PopupOpen);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(project_names(&app), vec!["Ship v1"]);
    let item = &app.workspace.section(SectionKind::Projects).items()[0];
    assert!(item.is_temporary());
    assert_eq!(item.field(Field::Goal), &Value::Null);
    assert_eq!(item.field(Field::Deadline), &Value::Null);
    assert_eq!(position(&app), Position::BOTTOM);

    let queued = app.outbox.queued();
    assert_eq!(queued.len(), 1);
    match &queued[0] {
        WriteRequest::Create { kind, record, .. } => {
            assert_eq!(*kind, ItemKind::Project);
            let keys: Vec<Field> = record.fields.keys().copied().collect();
            assert_eq!(keys, vec![Field::Name, Field::Goal, Field::Deadline]);
        }
        other => panic!("expected create, got {:?}", other),
    }
}

#[test]
fn cancelling_the_wizard_leaves_no_trace() {
    let mut app = app_with_projects(&["A", "B"]);
    enter_projects(&mut app);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode(), Mode::Typing);
    assert_eq!(position(&app), Position::after(1));

    type_text(&mut app, "Draft");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode(), Mode::PopupOpen);
    // Popup back to the name, then out of the wizard
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode(), Mode::Typing);
    press(&mut app, KeyCode::Esc);

    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(position(&app), Position::item(1));
    assert_eq!(project_names(&app), vec!["A", "B"]);
    assert!(app.outbox.queued().is_empty());
}

#[test]
fn escape_after_enter_stays_on_the_item() {
    let mut app = app_with_projects(&["A"]);
    enter_projects(&mut app);
    assert_eq!(position(&app), Position::item(0));

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode(), Mode::Typing);
    press(&mut app, KeyCode::Esc);

    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(app.focus, Some(SectionKind::Projects));
    assert_eq!(position(&app), Position::item(0));
}

#[test]
fn enter_on_an_item_creates_right_below_it() {
    let mut app = app_with_projects(&["A", "B", "C"]);
    enter_projects(&mut app);
    press(&mut app, KeyCode::Enter);
    type_text(&mut app, "New");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(project_names(&app), vec!["A", "New", "B", "C"]);
    assert_eq!(position(&app), Position::item(1));
    assert_eq!(app.outbox.queued().len(), 1);
}

#[test]
fn grab_moves_item_and_sends_full_order() {
    let mut app = app_with_projects(&["A", "B", "C"]);
    enter_projects(&mut app);
    press(&mut app, KeyCode::Down);
    assert_eq!(position(&app), Position::item(1));

    press(&mut app, KeyCode::Char('g'));
    assert_eq!(app.mode(), Mode::Grabbing);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char('g'));

    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(project_names(&app), vec!["A", "C", "B"]);
    assert_eq!(position(&app), Position::item(2));

    let expected = app.workspace.section(SectionKind::Projects).order();
    match app.outbox.queued() {
        [WriteRequest::Reorder { order, parent, .. }] => {
            assert_eq!(order, &expected);
            assert_eq!(*parent, None);
        }
        other => panic!("expected one reorder, got {:?}", other),
    }
}

#[test]
fn grab_stops_at_the_last_item() {
    let mut app = app_with_projects(&["A", "B", "C", "D"]);
    enter_projects(&mut app);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char('g'));
    for _ in 0..5 {
        press(&mut app, KeyCode::Char('j'));
    }
    assert_eq!(position(&app), Position::item(3));
    press(&mut app, KeyCode::Esc);
    // Cancel restores the original order and position
    assert_eq!(project_names(&app), vec!["A", "B", "C", "D"]);
    assert_eq!(position(&app), Position::item(1));
    assert!(app.outbox.queued().is_empty());
}

#[test]
fn failed_create_rolls_back_and_reports() {
    let mut app = app_with_projects(&["A"]);
    enter_projects(&mut app);
    press(&mut app, KeyCode::Down);
    assert_eq!(position(&app), Position::BOTTOM);
    type_text(&mut app, "Doomed");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    assert_eq!(project_names(&app), vec!["A", "Doomed"]);

    let op = app.outbox.drain()[0].op();
    app.apply_outcome(WriteOutcome::Failed {
        op,
        error: StoreError::Status {
            status: 500,
            method: "POST",
            url: "http://localhost/projects".into(),
        },
    });

    assert_eq!(project_names(&app), vec!["A"]);
    assert_eq!(app.outbox.in_flight(), 0);
    let status = app.status.as_ref().unwrap();
    assert!(status.is_error);
    assert_eq!(status.text, "Could not save new project");
}

#[test]
fn writes_reach_the_file_store() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("planner.json");
    let mut store = FileStore::open(&path).unwrap();
    let workspace = Workspace::from_snapshot(&store.load().unwrap(), today());
    let worker = SyncWorker::spawn(Box::new(store), IdTable::from_workspace(&workspace));
    let mut app = App::new(workspace, Theme::default());

    enter_projects(&mut app);
    for name in ["First", "Second"] {
        type_text(&mut app, name);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
    }
    worker.submit(app.outbox.drain());
    for outcome in worker.finish() {
        app.apply_outcome(outcome);
    }
    assert!(
        app.workspace
            .section(SectionKind::Projects)
            .items()
            .iter()
            .all(|i| !i.is_temporary())
    );

    let snapshot = FileStore::open(&path).unwrap().load().unwrap();
    let names: Vec<&str> = snapshot
        .records(ItemKind::Project)
        .iter()
        .filter_map(|r| r.fields.get(&Field::Name).and_then(Value::as_text))
        .collect();
    assert_eq!(names, vec!["First", "Second"]);
}

#[test]
fn edit_commits_every_changed_field_in_one_update() {
    let mut app = app_with_projects(&["A"]);
    enter_projects(&mut app);
    let local = project(&app, 0).local;

    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.mode(), Mode::Editing);
    type_text(&mut app, "x");
    // Name → Goal → Deadline
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode(), Mode::PopupOpen);
    type_text(&mut app, "2026-11-01");
    press(&mut app, KeyCode::Enter);

    // The popup answer only lands in the draft, and focus stays put
    let deadline = Value::Date(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
    assert_eq!(app.mode(), Mode::Editing);
    match &app.active_cursor().unwrap().session {
        Some(Session::Edit(edit)) => {
            assert_eq!(edit.focused_field(), Field::Deadline);
            assert_eq!(edit.draft.get(&Field::Deadline), Some(&deadline));
        }
        other => panic!("expected edit session, got {:?}", other),
    }
    assert_eq!(project(&app, 0).name(), "A");
    assert_eq!(project(&app, 0).field(Field::Deadline), &Value::Null);
    assert!(app.outbox.queued().is_empty());

    commit(&mut app);
    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(project(&app, 0).name(), "Ax");
    assert_eq!(project(&app, 0).field(Field::Deadline), &deadline);
    match app.outbox.queued() {
        [WriteRequest::Update { local: updated, patch, .. }] => {
            assert_eq!(*updated, local);
            assert_eq!(patch.completed, None);
            let keys: Vec<Field> = patch.fields.keys().copied().collect();
            assert_eq!(keys, vec![Field::Name, Field::Deadline]);
        }
        other => panic!("expected one update, got {:?}", other),
    }
}

#[test]
fn escape_discards_the_edit() {
    let mut app = app_with_projects(&["A"]);
    enter_projects(&mut app);
    let before = project(&app, 0).clone();

    press(&mut app, KeyCode::Char('e'));
    type_text(&mut app, "zzz");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Enter);
    // Goal picker: pick nothing, close it
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode(), Mode::Editing);
    press(&mut app, KeyCode::Esc);

    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(project(&app, 0), &before);
    assert!(app.outbox.queued().is_empty());
}

#[test]
fn edit_refuses_an_empty_name() {
    let mut app = app_with_projects(&["A"]);
    enter_projects(&mut app);

    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Backspace);
    commit(&mut app);

    assert_eq!(app.mode(), Mode::Editing);
    match &app.active_cursor().unwrap().session {
        Some(Session::Edit(edit)) => assert!(edit.error.is_some()),
        other => panic!("expected edit session, got {:?}", other),
    }
    assert!(app.status.as_ref().unwrap().is_error);
    assert_eq!(project(&app, 0).name(), "A");
    assert!(app.outbox.queued().is_empty());

    // Still editable: fix the name and save
    type_text(&mut app, "B");
    commit(&mut app);
    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(project_names(&app), vec!["B"]);
}

#[test]
fn failed_delete_restores_item_and_tasks() {
    let mut app = app_with_projects(&["A", "B", "C"]);
    let b = project(&app, 1).local;
    let tasks = CollectionRef::children(ItemKind::ProjectTask, b);
    let mut fields = Fields::new();
    fields.insert(Field::Name, Value::Text("Step".into()));
    fields.insert(Field::Duration, Value::Null);
    let task = Item::new(app.workspace.alloc_local(), ItemKind::ProjectTask, fields);
    app.workspace
        .collection_mut(tasks)
        .unwrap()
        .insert(InsertSlot::Bottom, task);

    enter_projects(&mut app);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Backspace);
    assert_eq!(project_names(&app), vec!["A", "C"]);
    assert!(app.workspace.children_of(b).is_none());

    let op = app.outbox.drain()[0].op();
    app.apply_outcome(failure(op));

    assert_eq!(project_names(&app), vec!["A", "B", "C"]);
    assert_eq!(project(&app, 1).local, b);
    let names: Vec<&str> = app
        .workspace
        .children_of(b)
        .unwrap()
        .items()
        .iter()
        .map(|i| i.name())
        .collect();
    assert_eq!(names, vec!["Step"]);
    assert_eq!(status_text(&app), "Could not delete project");
    assert_eq!(app.outbox.in_flight(), 0);
}

#[test]
fn failed_reorder_puts_cursor_back_on_the_item() {
    let mut app = app_with_projects(&["A", "B", "C"]);
    enter_projects(&mut app);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char('g'));
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char('g'));
    assert_eq!(project_names(&app), vec!["A", "C", "B"]);
    press(&mut app, KeyCode::Up);
    press(&mut app, KeyCode::Up);
    assert_eq!(position(&app), Position::item(0));

    let op = app.outbox.drain()[0].op();
    app.apply_outcome(failure(op));

    assert_eq!(project_names(&app), vec!["A", "B", "C"]);
    assert_eq!(position(&app), Position::item(1));
    assert_eq!(status_text(&app), "Could not save new order");
}

#[test]
fn tab_opens_project_tasks_for_creation() {
    let mut app = app_with_projects(&["A"]);
    enter_projects(&mut app);
    let a = project(&app, 0).local;

    press(&mut app, KeyCode::Tab);
    assert!(app.child.is_some());
    assert_eq!(app.mode(), Mode::ItemLevel);
    assert_eq!(position(&app), Position::BOTTOM);

    type_text(&mut app, "Step");
    press(&mut app, KeyCode::Enter);
    // Duration entry
    assert_eq!(app.mode(), Mode::PopupOpen);
    type_text(&mut app, "45m");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), Mode::ItemLevel);
    let tasks = app.workspace.children_of(a).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks.items()[0].name(), "Step");
    assert_eq!(tasks.items()[0].field(Field::Duration), &Value::Minutes(45));
    match app.outbox.queued() {
        [WriteRequest::Create { kind, parent, .. }] => {
            assert_eq!(*kind, ItemKind::ProjectTask);
            assert_eq!(*parent, Some(a));
        }
        other => panic!("expected one create, got {:?}", other),
    }

    handle_key(&mut app, KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT));
    assert!(app.child.is_none());
    assert_eq!(app.mode(), Mode::ItemLevel);
}

#[test]
fn grab_skips_hidden_items_and_filter_toggles() {
    let mut app = app_with_projects(&["A", "x", "B"]);
    let done = project(&app, 1).local;
    app.workspace
        .section_mut(SectionKind::Projects)
        .get_mut(done)
        .unwrap()
        .completed = true;
    enter_projects(&mut app);
    assert_eq!(app.visible_len(CollectionRef::section(SectionKind::Projects)), 2);

    press(&mut app, KeyCode::Char('g'));
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char('g'));
    assert_eq!(project_names(&app), vec!["B", "x", "A"]);
    assert_eq!(position(&app), Position::item(1));
    let order: Vec<LocalId> = app.workspace.section(SectionKind::Projects).order();
    match app.outbox.queued() {
        [WriteRequest::Reorder { order: sent, .. }] => assert_eq!(sent, &order),
        other => panic!("expected one reorder, got {:?}", other),
    }

    press(&mut app, KeyCode::Right);
    let section = app.workspace.section(SectionKind::Projects);
    assert_eq!(section.filter(), ViewFilter::Completed);
    assert_eq!(section.visible_len(), 1);
    assert_eq!(section.visible_item(0).unwrap().local, done);
    assert_eq!(position(&app), Position::item(0));

    // No new items in the done view
    press(&mut app, KeyCode::Down);
    assert_eq!(position(&app), Position::BOTTOM);
    type_text(&mut app, "n");
    assert_eq!(app.mode(), Mode::ItemLevel);

    press(&mut app, KeyCode::Left);
    assert_eq!(
        app.workspace.section(SectionKind::Projects).filter(),
        ViewFilter::Active
    );
    assert_eq!(position(&app), Position::item(0));
}
