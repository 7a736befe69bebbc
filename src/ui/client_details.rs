use crossterm::event::{KeyCode, KeyEvent};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::advice::{AdviceRequest, AdviceTracker, Gender, DEFAULT_GARMENT};
use crate::models::{Client, MeasurementField};
use crate::ui::components::popup::render_delete_confirmation;
use crate::ui::components::text::{edit_text, markdown_lines};

// Represents the state of the client details screen
pub struct DetailsState {
    client: Client,
    garment: String,
    gender: Gender,
    editing_garment: bool,
    advice_scroll: u16,
}

pub enum DetailsAction {
    Back,
    Edit,
    Delete(String),
    RequestAdvice(AdviceRequest),
}

impl DetailsState {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            garment: DEFAULT_GARMENT.to_string(),
            gender: Gender::default(),
            editing_garment: false,
            advice_scroll: 0,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Swap in the freshly saved copy of the client.
    pub fn refresh_client(&mut self, client: Client) {
        self.client = client;
        self.advice_scroll = 0;
    }

    pub fn advice_request(&self) -> AdviceRequest {
        let garment = match self.garment.trim() {
            "" => DEFAULT_GARMENT.to_string(),
            garment => garment.to_string(),
        };
        AdviceRequest {
            garment,
            gender: self.gender,
            measurements: self.client.measurements.clone(),
        }
    }
}

pub fn render_client_details<B: Backend>(
    frame: &mut Frame<B>,
    state: &DetailsState,
    advice: &AdviceTracker,
    pending_delete: Option<&str>,
) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    let title = Paragraph::new(Spans::from(vec![
        Span::styled(
            state.client.name.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(state.client.phone_display().to_string(), Style::default().fg(Color::Gray)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(chunks[1]);

    render_measurements(frame, state, body[0]);
    render_advice(frame, state, advice, body[1]);

    let buttons_text = if state.editing_garment {
        "Type the garment | <Enter>/<Esc> Done"
    } else if advice.is_pending() {
        "Thinking... | <E> Edit | <D> Delete | <Esc> Back"
    } else {
        "<A> Ask for advice | <G> Garment | <Tab> Gender | <E> Edit | <D> Delete | <Esc> Back"
    };
    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[2]);

    if pending_delete.is_some() {
        render_delete_confirmation(frame, &state.client.name);
    }
}

fn render_measurements<B: Backend>(frame: &mut Frame<B>, state: &DetailsState, area: Rect) {
    let m = &state.client.measurements;

    let mut lines: Vec<Spans> = MeasurementField::ALL
        .iter()
        .map(|&field| {
            Spans::from(vec![
                Span::styled(format!("{:<16}", field.label()), Style::default().fg(Color::Gray)),
                Span::styled(
                    m.display(field),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
            ])
        })
        .collect();

    if let Some(notes) = &m.notes {
        lines.push(Spans::from(""));
        lines.push(Spans::from(Span::styled(
            "Notes:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Spans::from(notes.clone()));
    }

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Measurements").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn render_advice<B: Backend>(frame: &mut Frame<B>, state: &DetailsState, advice: &AdviceTracker, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)].as_ref())
        .split(area);

    let garment_style = if state.editing_garment {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let garment_text = if state.editing_garment {
        format!("{}|", state.garment)
    } else {
        state.garment.clone()
    };
    let inputs = Paragraph::new(Spans::from(vec![
        Span::styled("Garment: ", Style::default().fg(Color::Gray)),
        Span::styled(garment_text, garment_style),
        Span::styled("   Gender: ", Style::default().fg(Color::Gray)),
        Span::raw(state.gender.to_string()),
    ]))
    .block(Block::default().title("Tailoring Assistant").borders(Borders::ALL));
    frame.render_widget(inputs, chunks[0]);

    let content = if advice.is_pending() {
        vec![Spans::from(Span::styled(
            "Thinking...",
            Style::default().fg(Color::Yellow),
        ))]
    } else if let Some(text) = advice.advice() {
        markdown_lines(text)
    } else {
        vec![Spans::from(
            "Choose a garment and gender, then press <A> for fabric and sewing advice.",
        )]
    };

    let panel = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .scroll((state.advice_scroll, 0))
        .block(Block::default().title("Advice").borders(Borders::ALL));
    frame.render_widget(panel, chunks[1]);
}

pub fn handle_input(state: &mut DetailsState, advice: &AdviceTracker, key: KeyEvent) -> Option<DetailsAction> {
    if state.editing_garment {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => state.editing_garment = false,
            code => {
                edit_text(&mut state.garment, code);
            }
        }
        return None;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('b' | 'B') => return Some(DetailsAction::Back),
        KeyCode::Char('e' | 'E') => return Some(DetailsAction::Edit),
        KeyCode::Char('d' | 'D') => return Some(DetailsAction::Delete(state.client.id.clone())),
        KeyCode::Char('g' | 'G') => state.editing_garment = true,
        KeyCode::Tab => state.gender = state.gender.next(),
        KeyCode::Char('a' | 'A') if !advice.is_pending() => {
            state.advice_scroll = 0;
            return Some(DetailsAction::RequestAdvice(state.advice_request()));
        }
        KeyCode::Down => state.advice_scroll = state.advice_scroll.saturating_add(1),
        KeyCode::Up => state.advice_scroll = state.advice_scroll.saturating_sub(1),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::models::Measurements;

    fn press(state: &mut DetailsState, advice: &AdviceTracker, code: KeyCode) -> Option<DetailsAction> {
        handle_input(state, advice, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn details() -> DetailsState {
        let mut measurements = Measurements::default();
        measurements.set(MeasurementField::Waist, "80");
        DetailsState::new(Client::new("Ali", None, measurements))
    }

    #[test]
    fn advice_request_uses_the_panel_inputs() {
        let mut state = details();
        let tracker = AdviceTracker::new();

        press(&mut state, &tracker, KeyCode::Char('g'));
        for _ in 0..DEFAULT_GARMENT.len() {
            press(&mut state, &tracker, KeyCode::Backspace);
        }
        for c in "coat".chars() {
            press(&mut state, &tracker, KeyCode::Char(c));
        }
        press(&mut state, &tracker, KeyCode::Enter);
        press(&mut state, &tracker, KeyCode::Tab);

        let Some(DetailsAction::RequestAdvice(request)) = press(&mut state, &tracker, KeyCode::Char('a')) else {
            panic!("expected an advice request");
        };
        assert_eq!(request.garment, "coat");
        assert_eq!(request.gender, Gender::Female);
        assert_eq!(request.measurements.waist.as_deref(), Some("80"));
    }

    #[test]
    fn blank_garment_falls_back_to_the_default() {
        let mut state = details();
        state.garment.clear();
        assert_eq!(state.advice_request().garment, DEFAULT_GARMENT);
    }

    #[test]
    fn advice_key_is_ignored_while_pending() {
        let mut state = details();
        let mut tracker = AdviceTracker::new();
        tracker.begin(&state.client().id);

        assert!(press(&mut state, &tracker, KeyCode::Char('a')).is_none());
    }

    #[test]
    fn uppercase_keys_act_like_lowercase() {
        let mut state = details();
        let tracker = AdviceTracker::new();

        assert!(matches!(press(&mut state, &tracker, KeyCode::Char('E')), Some(DetailsAction::Edit)));
        assert!(matches!(press(&mut state, &tracker, KeyCode::Char('A')), Some(DetailsAction::RequestAdvice(_))));
        assert!(matches!(press(&mut state, &tracker, KeyCode::Char('B')), Some(DetailsAction::Back)));
    }

    #[test]
    fn delete_names_the_subject() {
        let mut state = details();
        let tracker = AdviceTracker::new();
        let id = state.client().id.clone();

        match press(&mut state, &tracker, KeyCode::Char('d')) {
            Some(DetailsAction::Delete(target)) => assert_eq!(target, id),
            _ => panic!("expected delete"),
        }
    }
}
