use crossterm::event::{KeyCode, KeyEvent};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::{non_empty, Client, MeasurementField, Measurements};
use crate::ui::components::text::{edit_number, edit_text};

pub enum ClientFormAction {
    Cancel,
    Save(Client),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum FormField {
    Name,
    Phone,
    Measurement(MeasurementField),
    Notes,
}

impl FormField {
    const ORDER: [FormField; 9] = [
        FormField::Name,
        FormField::Phone,
        FormField::Measurement(MeasurementField::Waist),
        FormField::Measurement(MeasurementField::PantsLength),
        FormField::Measurement(MeasurementField::ShoulderWidth),
        FormField::Measurement(MeasurementField::Neck),
        FormField::Measurement(MeasurementField::Sleeve),
        FormField::Measurement(MeasurementField::Wrist),
        FormField::Notes,
    ];

    fn label(self) -> &'static str {
        match self {
            FormField::Name => "Full name",
            FormField::Phone => "Phone",
            FormField::Measurement(field) => field.label(),
            FormField::Notes => "Notes",
        }
    }

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Add/edit form. Values are kept as raw text until the form is saved.
pub struct ClientFormState {
    existing: Option<Client>,
    name: String,
    phone: String,
    measurements: [String; 6],
    notes: String,
    pub current_field: FormField,
    pub editing: bool,
}

impl ClientFormState {
    pub fn new() -> Self {
        Self {
            existing: None,
            name: String::new(),
            phone: String::new(),
            measurements: Default::default(),
            notes: String::new(),
            current_field: FormField::Name,
            editing: false,
        }
    }

    pub fn from_existing(client: Client) -> Self {
        let m = &client.measurements;
        let measurements =
            MeasurementField::ALL.map(|field| m.get(field).unwrap_or_default().to_string());

        Self {
            name: client.name.clone(),
            phone: client.phone.clone().unwrap_or_default(),
            notes: m.notes.clone().unwrap_or_default(),
            measurements,
            existing: Some(client),
            current_field: FormField::Name,
            editing: false,
        }
    }

    pub fn is_new(&self) -> bool {
        self.existing.is_none()
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        let i = (self.current_field.position() + 1) % FormField::ORDER.len();
        self.current_field = FormField::ORDER[i];
    }

    pub fn previous_field(&mut self) {
        let len = FormField::ORDER.len();
        let i = (self.current_field.position() + len - 1) % len;
        self.current_field = FormField::ORDER[i];
    }

    fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Phone => &self.phone,
            FormField::Measurement(m) => &self.measurements[measurement_index(m)],
            FormField::Notes => &self.notes,
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match self.current_field {
            FormField::Name => edit_text(&mut self.name, key),
            FormField::Phone => edit_text(&mut self.phone, key),
            FormField::Measurement(m) => edit_number(&mut self.measurements[measurement_index(m)], key),
            FormField::Notes => edit_text(&mut self.notes, key),
        };
    }

    /// A client can only be saved once it has a name.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Build the client to save. Edits keep the original identifier and
    /// creation time.
    pub fn to_client(&self) -> Client {
        let mut measurements = Measurements::default();
        for field in MeasurementField::ALL {
            measurements.set(field, &self.measurements[measurement_index(field)]);
        }
        measurements.set_notes(&self.notes);

        let name = self.name.trim().to_string();
        let phone = non_empty(&self.phone);

        match &self.existing {
            Some(existing) => Client {
                id: existing.id.clone(),
                created_at: existing.created_at,
                name,
                phone,
                measurements,
            },
            None => Client::new(name, phone, measurements),
        }
    }
}

fn measurement_index(field: MeasurementField) -> usize {
    MeasurementField::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or(0)
}

pub fn render_client_form<B: Backend>(f: &mut Frame<B>, state: &mut ClientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.is_new() {
        "Add New Client"
    } else {
        "Edit Client"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    // Help text
    let help_text = if state.editing {
        "Enter - Finish field | Esc - Finish field"
    } else if state.is_valid() {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save client | Esc - Cancel"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | Name is required to save | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &mut ClientFormState, area: Rect) {
    let items: Vec<ListItem> = FormField::ORDER
        .iter()
        .map(|&field| {
            let value = state.value(field);
            let suffix = match field {
                FormField::Measurement(_) if !value.is_empty() => " cm",
                _ => "",
            };
            let is_current = field == state.current_field;

            let content = if is_current && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label()), Style::default().fg(Color::Yellow)),
                    Span::styled(format!("{}|", value), Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                let style = if is_current {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };

                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label()), style),
                    Span::raw(format!("{}{}", value, suffix)),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Client Details"))
        .highlight_style(Style::default().fg(Color::Yellow));

    f.render_widget(form_list, area);
}

pub fn handle_input(state: &mut ClientFormState, key: KeyEvent) -> Option<ClientFormAction> {
    match key.code {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ClientFormAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down | KeyCode::Tab if !state.editing => state.next_field(),
        KeyCode::Char('s' | 'S') if !state.editing => {
            if state.is_valid() {
                return Some(ClientFormAction::Save(state.to_client()));
            }
        }
        code if state.editing => state.edit_current_field(code),
        _ => {}
    }

    None
}
