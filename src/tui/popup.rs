use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{
    DaySet, Field, Value, ValidationError, Workspace, parse_date, parse_date_range, parse_minutes,
    parse_time_range, parse_time_slot,
};
use crate::util::unicode::pop_grapheme;

/// Result of feeding one key to a popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupResult {
    Pending,
    Select(Value),
    Cancel,
}

/// A value collector. Consumes every key until it resolves.
#[derive(Debug, Clone, PartialEq)]
pub enum Popup {
    /// Pick one of a fixed list (goal picker, yes/no)
    Choice {
        field: Field,
        options: Vec<(String, Value)>,
        selected: usize,
    },
    /// Free-form entry parsed on Enter
    Entry {
        field: Field,
        input: String,
        error: Option<String>,
        today: NaiveDate,
    },
    /// Weekday toggles
    Days {
        days: DaySet,
        focus: usize,
        error: Option<String>,
    },
}

impl Popup {
    /// Build the collector for `field`, preloaded with `current`.
    /// Returns `None` for fields typed directly (name).
    pub fn open_for(field: Field, current: &Value, workspace: &Workspace) -> Option<Popup> {
        let today = workspace.today();
        let popup = match field {
            Field::Name => return None,
            Field::Goal => {
                let mut options = vec![("None".to_string(), Value::Null)];
                options.extend(
                    workspace
                        .pickable_goals()
                        .into_iter()
                        .map(|(id, name)| (name, Value::Goal(id))),
                );
                let selected = options.iter().position(|(_, v)| v == current).unwrap_or(0);
                Popup::Choice {
                    field,
                    options,
                    selected,
                }
            }
            Field::Recurring => {
                let options = vec![
                    ("No".to_string(), Value::Flag(false)),
                    ("Yes".to_string(), Value::Flag(true)),
                ];
                let selected = usize::from(matches!(current, Value::Flag(true)));
                Popup::Choice {
                    field,
                    options,
                    selected,
                }
            }
            Field::Days => Popup::Days {
                days: match current {
                    Value::Days(days) => *days,
                    _ => DaySet::empty(),
                },
                focus: 0,
                error: None,
            },
            _ => Popup::Entry {
                field,
                input: current.entry_text(),
                error: None,
                today,
            },
        };
        Some(popup)
    }

    pub fn field(&self) -> Field {
        match self {
            Popup::Choice { field, .. } | Popup::Entry { field, .. } => *field,
            Popup::Days { .. } => Field::Days,
        }
    }

    /// Inline validation message, if the last Enter was rejected
    pub fn error(&self) -> Option<&str> {
        match self {
            Popup::Entry { error, .. } | Popup::Days { error, .. } => error.as_deref(),
            Popup::Choice { .. } => None,
        }
    }

    pub fn title(&self) -> String {
        let hint = match self.field() {
            Field::Goal => "",
            Field::Recurring => "",
            Field::Deadline | Field::Date => " (YYYY-MM-DD, today, +3d; empty for none)",
            Field::Duration => " (45m, 1h30m; empty for none)",
            Field::DateRange => " (DATE..DATE; empty for none)",
            Field::Days => " (Space toggles, 1-7)",
            Field::TimeSlot => " (HH:MM 45m; empty for none)",
            Field::TimeRange => " (HH:MM-HH:MM; empty for none)",
            Field::Link => " (empty for none)",
            Field::Name => "",
        };
        format!("{}{}", self.field().label(), hint)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PopupResult {
        if key.code == KeyCode::Esc {
            return PopupResult::Cancel;
        }
        match self {
            Popup::Choice {
                options, selected, ..
            } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    *selected = selected.saturating_sub(1);
                    PopupResult::Pending
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if *selected + 1 < options.len() {
                        *selected += 1;
                    }
                    PopupResult::Pending
                }
                KeyCode::Enter => options
                    .get(*selected)
                    .map_or(PopupResult::Cancel, |(_, v)| PopupResult::Select(v.clone())),
                _ => PopupResult::Pending,
            },
            Popup::Entry {
                field,
                input,
                error,
                today,
            } => match (key.modifiers, key.code) {
                (_, KeyCode::Enter) => match parse_entry(*field, input, *today) {
                    Ok(value) => PopupResult::Select(value),
                    Err(e) => {
                        *error = Some(e.to_string());
                        PopupResult::Pending
                    }
                },
                (_, KeyCode::Backspace) => {
                    pop_grapheme(input);
                    *error = None;
                    PopupResult::Pending
                }
                (m, KeyCode::Char(c)) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                    input.push(c);
                    *error = None;
                    PopupResult::Pending
                }
                _ => PopupResult::Pending,
            },
            Popup::Days { days, focus, error } => match key.code {
                KeyCode::Left => {
                    *focus = (*focus + 6) % 7;
                    PopupResult::Pending
                }
                KeyCode::Right => {
                    *focus = (*focus + 1) % 7;
                    PopupResult::Pending
                }
                KeyCode::Char(' ') => {
                    days.toggle(*focus);
                    *error = None;
                    PopupResult::Pending
                }
                KeyCode::Char(c @ '1'..='7') => {
                    let index = c as usize - '1' as usize;
                    days.toggle(index);
                    *focus = index;
                    *error = None;
                    PopupResult::Pending
                }
                KeyCode::Enter => {
                    if days.is_empty() {
                        *error = Some(ValidationError::NoDays.to_string());
                        PopupResult::Pending
                    } else {
                        PopupResult::Select(Value::Days(*days))
                    }
                }
                _ => PopupResult::Pending,
            },
        }
    }
}

/// Parse entry-popup text for `field`. Empty input means "none".
pub fn parse_entry(field: Field, input: &str, today: NaiveDate) -> Result<Value, ValidationError> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(Value::Null);
    }
    let value = match field {
        Field::Deadline | Field::Date => Value::Date(parse_date(s, today)?),
        Field::Duration => Value::Minutes(parse_minutes(s)?),
        Field::DateRange => {
            let (start, end) = parse_date_range(s, today)?;
            Value::DateRange { start, end }
        }
        Field::TimeSlot => {
            let (start, minutes) = parse_time_slot(s)?;
            Value::TimeSlot { start, minutes }
        }
        Field::TimeRange => {
            let (start, end) = parse_time_range(s)?;
            Value::TimeRange { start, end }
        }
        Field::Name | Field::Link | Field::Goal | Field::Days | Field::Recurring => {
            Value::Text(s.to_string())
        }
    };
    Ok(value)
}
