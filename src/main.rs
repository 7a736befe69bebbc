mod advice;
mod config;
mod db;
mod logging;
mod models;
mod navigator;
mod search;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};

use crate::advice::{AdviceRequest, AdviceRequester, AdviceTicket, AdviceTracker, GeminiClient};
use crate::db::{ClientRepository, KeyValueStore, StoreError};
use crate::models::Client;
use crate::navigator::{Navigator, View};
use crate::ui::{
    client_details::{DetailsAction, DetailsState, render_client_details, handle_input as handle_details_input},
    client_form::{ClientFormAction, ClientFormState, render_client_form, handle_input as handle_form_input},
    clients::{ClientAction, ClientsState, render_clients, handle_input as handle_clients_input},
    components::popup::render_notice,
};

// How long to wait for a key before checking on advice results
const TICK: Duration = Duration::from_millis(100);

/// Terminal client book for a tailoring shop
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// SQLite database URL, overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Log file path, overrides LOG_FILE
    #[arg(long)]
    log_file: Option<String>,
}

// Answer from a finished advice task
struct AdviceOutcome {
    ticket: AdviceTicket,
    text: String,
}

// Main application state
struct AppState<S> {
    repo: ClientRepository<S>,
    nav: Navigator,
    clients_state: ClientsState,
    form_state: Option<ClientFormState>,
    details_state: Option<DetailsState>,
    advisor: Arc<AdviceRequester>,
    advice: AdviceTracker,
    advice_task: Option<JoinHandle<()>>,
    advice_tx: UnboundedSender<AdviceOutcome>,
    advice_rx: UnboundedReceiver<AdviceOutcome>,
    notice: Option<String>,
}

impl<S: KeyValueStore> AppState<S> {
    fn new(repo: ClientRepository<S>, advisor: AdviceRequester) -> Self {
        let (advice_tx, advice_rx) = mpsc::unbounded_channel();
        let clients_state = ClientsState::new(repo.clients());

        Self {
            repo,
            nav: Navigator::new(),
            clients_state,
            form_state: None,
            details_state: None,
            advisor: Arc::new(advisor),
            advice: AdviceTracker::new(),
            advice_task: None,
            advice_tx,
            advice_rx,
            notice: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = config::init()?;
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(path) = args.log_file {
        config.log_file = path;
    }

    logging::init(&config.log_file)?;
    info!(database = %config.database_url(), "starting tailor manager");

    // Open the client store
    let db = db::init(&config).await?;
    let repo = ClientRepository::load(db).await;

    if config.gemini_api_key().is_none() {
        warn!("GEMINI_API_KEY is not set, advice requests will show the fallback message");
    }
    let advisor = AdviceRequester::new(
        Arc::new(GeminiClient::from_config(&config)),
        config.advice_timeout(),
    );

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(repo, advisor);

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    cancel_advice(&mut app_state);

    // Show any error message
    if let Err(err) = &result {
        error!(error = %err, "application stopped");
        println!("Error: {}", err);
    }

    // One last attempt for changes that could not be written earlier
    if app_state.repo.is_dirty() {
        if let Err(err) = app_state.repo.save_all().await {
            println!("Warning: recent changes could not be saved: {}", err);
        }
    }

    info!("tailor manager stopped");
    println!("Thanks for using Tailor Manager!");

    Ok(())
}

async fn run_app<B: Backend, S: KeyValueStore>(terminal: &mut Terminal<B>, app_state: &mut AppState<S>) -> Result<()> {
    loop {
        drain_advice(app_state);

        terminal.draw(|f| render(f, app_state))?;

        if !event::poll(TICK)? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if handle_key(app_state, key).await? {
            break;
        }
    }

    Ok(())
}

fn render<B: Backend, S: KeyValueStore>(f: &mut Frame<B>, app_state: &mut AppState<S>) {
    let pending_delete = app_state.nav.pending_delete();

    match app_state.nav.view() {
        View::List => render_clients(f, &mut app_state.clients_state, pending_delete),
        View::Add | View::Edit => {
            if let Some(state) = &mut app_state.form_state {
                render_client_form(f, state);
            }
        }
        View::Details => {
            if let Some(state) = &app_state.details_state {
                render_client_details(f, state, &app_state.advice, pending_delete);
            }
        }
    }

    if let Some(message) = &app_state.notice {
        render_notice(f, message);
    }
}

/// Route one key press to the active screen. Returns true to quit.
async fn handle_key<S: KeyValueStore>(app_state: &mut AppState<S>, key: KeyEvent) -> Result<bool> {
    // A visible notice swallows the key that dismisses it
    if app_state.notice.take().is_some() {
        return Ok(false);
    }

    if app_state.nav.pending_delete().is_some() {
        handle_delete_confirmation(app_state, key).await?;
        return Ok(false);
    }

    match app_state.nav.view() {
        View::List => handle_clients_screen(app_state, key).await,
        View::Add | View::Edit => handle_form_screen(app_state, key).await,
        View::Details => handle_details_screen(app_state, key).await,
    }
}

async fn handle_clients_screen<S: KeyValueStore>(app_state: &mut AppState<S>, key: KeyEvent) -> Result<bool> {
    let action = handle_clients_input(&mut app_state.clients_state, app_state.repo.clients(), key);

    match action {
        Some(ClientAction::Quit) => return Ok(true),
        Some(ClientAction::NewClient) => {
            app_state.nav.add_new()?;
            app_state.form_state = Some(ClientFormState::new());
        }
        Some(ClientAction::SelectClient(id)) => {
            if let Some(client) = app_state.repo.get(&id).cloned() {
                cancel_advice(app_state);
                app_state.nav.select(client.clone())?;
                app_state.details_state = Some(DetailsState::new(client));
            }
        }
        Some(ClientAction::DeleteClient(id)) => {
            app_state.nav.request_delete(id)?;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_form_screen<S: KeyValueStore>(app_state: &mut AppState<S>, key: KeyEvent) -> Result<bool> {
    let action = match &mut app_state.form_state {
        Some(state) => handle_form_input(state, key),
        None => None,
    };

    match action {
        Some(ClientFormAction::Cancel) => {
            app_state.nav.cancel()?;
            app_state.form_state = None;
        }
        Some(ClientFormAction::Save(client)) => {
            app_state.form_state = None;
            if app_state.nav.view() == View::Edit {
                save_edited_client(app_state, client).await?;
            } else {
                save_new_client(app_state, client).await?;
            }
            app_state.clients_state.refresh(app_state.repo.clients());
        }
        None => {}
    }

    Ok(false)
}

async fn save_new_client<S: KeyValueStore>(app_state: &mut AppState<S>, client: Client) -> Result<()> {
    if let Err(err) = app_state.repo.create(client).await {
        report_store_error(app_state, err);
    }
    app_state.nav.created()?;
    Ok(())
}

async fn save_edited_client<S: KeyValueStore>(app_state: &mut AppState<S>, client: Client) -> Result<()> {
    let id = client.id.clone();

    match app_state.repo.update(client.clone()).await {
        Ok(true) => {}
        Ok(false) => debug!(%id, "edited client no longer exists"),
        Err(err) => report_store_error(app_state, err),
    }

    // The repository copy is authoritative for the details screen
    let saved = app_state.repo.get(&id).cloned().unwrap_or(client);
    app_state.nav.updated(saved.clone())?;
    if let Some(details) = &mut app_state.details_state {
        details.refresh_client(saved);
    }
    Ok(())
}

async fn handle_details_screen<S: KeyValueStore>(app_state: &mut AppState<S>, key: KeyEvent) -> Result<bool> {
    let action = match &mut app_state.details_state {
        Some(state) => handle_details_input(state, &app_state.advice, key),
        None => None,
    };

    match action {
        Some(DetailsAction::Back) => {
            cancel_advice(app_state);
            app_state.nav.back()?;
            app_state.details_state = None;
        }
        Some(DetailsAction::Edit) => {
            cancel_advice(app_state);
            app_state.nav.edit()?;
            if let Some(client) = app_state.nav.selected().cloned() {
                app_state.form_state = Some(ClientFormState::from_existing(client));
            }
        }
        Some(DetailsAction::Delete(id)) => {
            app_state.nav.request_delete(id)?;
        }
        Some(DetailsAction::RequestAdvice(request)) => {
            start_advice(app_state, request);
        }
        None => {}
    }

    Ok(false)
}

async fn handle_delete_confirmation<S: KeyValueStore>(app_state: &mut AppState<S>, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('y' | 'Y') => {
            let id = app_state.nav.confirm_delete()?;
            cancel_advice(app_state);
            app_state.details_state = None;

            if let Err(err) = app_state.repo.delete(&id).await {
                report_store_error(app_state, err);
            }
            app_state.clients_state.refresh(app_state.repo.clients());
        }
        KeyCode::Char('n' | 'N') | KeyCode::Esc => {
            app_state.nav.decline_delete()?;
        }
        _ => {}
    }

    Ok(())
}

fn report_store_error<S: KeyValueStore>(app_state: &mut AppState<S>, err: StoreError) {
    error!(error = %err, "could not save clients");
    app_state.notice = Some(format!(
        "Changes are kept on screen but could not be saved: {}",
        err
    ));
}

/// Spawn an advice request for the client on the details screen.
fn start_advice<S: KeyValueStore>(app_state: &mut AppState<S>, request: AdviceRequest) {
    let Some(client_id) = app_state.nav.selected().map(|c| c.id.clone()) else {
        return;
    };
    let Some(ticket) = app_state.advice.begin(&client_id) else {
        return;
    };

    if let Some(task) = app_state.advice_task.take() {
        task.abort();
    }

    let advisor = Arc::clone(&app_state.advisor);
    let tx = app_state.advice_tx.clone();
    app_state.advice_task = Some(tokio::spawn(async move {
        let text = advisor.request(&request).await;
        // The receiver only goes away when the app is shutting down
        let _ = tx.send(AdviceOutcome { ticket, text });
    }));
}

/// Drop any request in flight and clear the advice panel.
fn cancel_advice<S: KeyValueStore>(app_state: &mut AppState<S>) {
    if let Some(task) = app_state.advice_task.take() {
        task.abort();
    }
    app_state.advice.reset();
}

fn drain_advice<S: KeyValueStore>(app_state: &mut AppState<S>) {
    while let Ok(outcome) = app_state.advice_rx.try_recv() {
        if !app_state.advice.resolve(&outcome.ticket, outcome.text) {
            debug!(client = outcome.ticket.client_id(), "dropped stale advice");
        }
    }
}
