use crossterm::event::{KeyCode, KeyEvent};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{Client, MeasurementField};
use crate::search::filter_clients;
use crate::ui::components::popup::render_delete_confirmation;
use crate::ui::components::text::edit_text;

// Represents the state of the client list screen
pub struct ClientsState {
    query: String,
    searching: bool,
    visible: Vec<Client>,
    total: usize,
    table_state: TableState,
}

pub enum ClientAction {
    Quit,
    NewClient,
    SelectClient(String),
    DeleteClient(String),
}

impl ClientsState {
    pub fn new(clients: &[Client]) -> Self {
        let mut state = Self {
            query: String::new(),
            searching: false,
            visible: Vec::new(),
            total: 0,
            table_state: TableState::default(),
        };
        state.refresh(clients);
        state
    }

    /// Re-apply the search to a fresh copy of the collection.
    pub fn refresh(&mut self, clients: &[Client]) {
        let selected_id = self.selected_client_id().map(str::to_owned);

        self.total = clients.len();
        self.visible = filter_clients(clients, &self.query)
            .into_iter()
            .cloned()
            .collect();

        let index = selected_id
            .and_then(|id| self.visible.iter().position(|c| c.id == id))
            .or(if self.visible.is_empty() { None } else { Some(0) });
        self.table_state.select(index);
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn visible(&self) -> &[Client] {
        &self.visible
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= self.visible.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.visible.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.table_state.selected().and_then(|i| self.visible.get(i))
    }

    pub fn selected_client_id(&self) -> Option<&str> {
        self.selected_client().map(|c| c.id.as_str())
    }
}

pub fn render_clients<B: Backend>(frame: &mut Frame<B>, state: &mut ClientsState, pending_delete: Option<&str>) {
    let size = frame.size();

    // Create the layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    // Search bar
    let search_style = if state.searching {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let search_text = if state.searching {
        format!("{}|", state.query)
    } else if state.query.is_empty() {
        "Press / to search by name or phone".to_string()
    } else {
        state.query.clone()
    };
    let search = Paragraph::new(search_text)
        .style(search_style)
        .block(Block::default().title("Search").borders(Borders::ALL));
    frame.render_widget(search, chunks[0]);

    // Client table
    let title = format!("Clients ({} registered)", state.total);
    if state.visible.is_empty() {
        let message = if state.total == 0 {
            "No clients yet. Press <N> to add your first client."
        } else {
            "No clients match the search."
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, chunks[1]);
    } else {
        let header = Row::new(vec!["Name", "Phone", "Waist", "Pants", "Shoulder"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = state
            .visible
            .iter()
            .map(|client| {
                let m = &client.measurements;
                Row::new(vec![
                    Cell::from(client.name.clone()),
                    Cell::from(client.phone_display().to_string()),
                    Cell::from(m.get(MeasurementField::Waist).unwrap_or("-").to_string()),
                    Cell::from(m.get(MeasurementField::PantsLength).unwrap_or("-").to_string()),
                    Cell::from(m.get(MeasurementField::ShoulderWidth).unwrap_or("-").to_string()),
                ])
            })
            .collect();

        let table = Table::new(rows)
            .header(header)
            .block(Block::default().title(title).borders(Borders::ALL))
            .widths(&[
                Constraint::Percentage(34),
                Constraint::Percentage(24),
                Constraint::Percentage(14),
                Constraint::Percentage(14),
                Constraint::Percentage(14),
            ])
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_stateful_widget(table, chunks[1], &mut state.table_state);
    }

    // Create and render the buttons
    let buttons_text = if state.searching {
        "Type to filter | <Enter>/<Esc> Done"
    } else if state.selected_client().is_some() {
        "<N> New Client | <Enter> Details | <D> Delete | </> Search | <Q> Quit"
    } else {
        "<N> New Client | </> Search | <Q> Quit"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[2]);

    if let Some(id) = pending_delete {
        let name = state
            .visible
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
            .unwrap_or("this client");
        render_delete_confirmation(frame, name);
    }
}

/// Handle a key on the list screen. `clients` is the full collection, used
/// to re-run the search while the query is edited.
pub fn handle_input(state: &mut ClientsState, clients: &[Client], key: KeyEvent) -> Option<ClientAction> {
    if state.searching {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => state.searching = false,
            code => {
                if edit_text(&mut state.query, code) {
                    state.refresh(clients);
                }
            }
        }
        return None;
    }

    match key.code {
        KeyCode::Char('q' | 'Q') => return Some(ClientAction::Quit),
        KeyCode::Char('/') => state.searching = true,
        KeyCode::Esc if !state.query.is_empty() => {
            state.query.clear();
            state.refresh(clients);
        }
        KeyCode::Char('n' | 'N') => return Some(ClientAction::NewClient),
        KeyCode::Char('d' | 'D') => {
            if let Some(id) = state.selected_client_id() {
                return Some(ClientAction::DeleteClient(id.to_string()));
            }
        }
        KeyCode::Enter => {
            if let Some(id) = state.selected_client_id() {
                return Some(ClientAction::SelectClient(id.to_string()));
            }
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::models::Measurements;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn clients() -> Vec<Client> {
        vec![
            Client::new("Ali Rezaei", Some("0912".into()), Measurements::default()),
            Client::new("Sara Ahmadi", Some("0935".into()), Measurements::default()),
        ]
    }

    #[test]
    fn typing_a_query_filters_live() {
        let all = clients();
        let mut state = ClientsState::new(&all);

        handle_input(&mut state, &all, key(KeyCode::Char('/')));
        for c in "sara".chars() {
            handle_input(&mut state, &all, key(KeyCode::Char(c)));
        }

        assert_eq!(state.query(), "sara");
        assert_eq!(state.visible().len(), 1);
        assert_eq!(state.selected_client().unwrap().name, "Sara Ahmadi");

        handle_input(&mut state, &all, key(KeyCode::Enter));
        handle_input(&mut state, &all, key(KeyCode::Esc));
        assert_eq!(state.query(), "");
        assert_eq!(state.visible().len(), 2);
    }

    #[test]
    fn search_mode_swallows_command_keys() {
        let all = clients();
        let mut state = ClientsState::new(&all);

        handle_input(&mut state, &all, key(KeyCode::Char('/')));
        assert!(handle_input(&mut state, &all, key(KeyCode::Char('q'))).is_none());
        assert_eq!(state.query(), "q");
    }

    #[test]
    fn enter_and_delete_name_the_highlighted_client() {
        let all = clients();
        let mut state = ClientsState::new(&all);
        state.next();

        match handle_input(&mut state, &all, key(KeyCode::Enter)) {
            Some(ClientAction::SelectClient(id)) => assert_eq!(id, all[1].id),
            _ => panic!("expected a selection"),
        }
        match handle_input(&mut state, &all, key(KeyCode::Char('d'))) {
            Some(ClientAction::DeleteClient(id)) => assert_eq!(id, all[1].id),
            _ => panic!("expected a delete request"),
        }
    }

    #[test]
    fn command_keys_ignore_case() {
        let all = clients();
        let mut state = ClientsState::new(&all);

        assert!(matches!(handle_input(&mut state, &all, key(KeyCode::Char('N'))), Some(ClientAction::NewClient)));
        assert!(matches!(handle_input(&mut state, &all, key(KeyCode::Char('D'))), Some(ClientAction::DeleteClient(_))));
        assert!(matches!(handle_input(&mut state, &all, key(KeyCode::Char('Q'))), Some(ClientAction::Quit)));
    }

    #[test]
    fn refresh_keeps_the_highlight_on_the_same_client() {
        let mut all = clients();
        let mut state = ClientsState::new(&all);
        state.next();

        all.insert(0, Client::new("New", None, Measurements::default()));
        state.refresh(&all);

        assert_eq!(state.selected_client().unwrap().name, "Sara Ahmadi");
    }

    #[test]
    fn empty_list_has_no_selection() {
        let mut state = ClientsState::new(&[]);
        state.next();
        assert!(state.selected_client().is_none());
        assert!(handle_input(&mut state, &[], key(KeyCode::Enter)).is_none());
    }
}
