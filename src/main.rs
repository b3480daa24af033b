use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use geo_explorer::api::ApiClient;
use geo_explorer::app::{App, Screen};
use geo_explorer::config::{Cli, Command, SeedArgs};
use geo_explorer::data::ReferenceLoader;
use geo_explorer::session::Session;
use geo_explorer::worker::Dispatcher;
use geo_explorer::seed::{self, SeedData};
use geo_explorer::{logging, ui};
use ratatui::DefaultTerminal;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(&cli.log_path(), &cli.log_level)?;

    if let Some(Command::Seed(args)) = &cli.command {
        return run_seed(&cli, args);
    }

    let session = Session::open(cli.token_path());
    let api = ApiClient::new(&cli.api_base_url, session.clone(), cli.timeout())
        .with_context(|| format!("configuring API client for {}", cli.api_base_url))?;
    let reference = ReferenceLoader::new(cli.timeout())?;
    let dispatcher = Dispatcher::new(
        api,
        reference,
        cli.world_topology.clone(),
        cli.us_topology.clone(),
    );
    let mut app = App::new(dispatcher, session, cli.api_base_url.clone());
    tracing::info!(api = %cli.api_base_url, "starting");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exited with error");
    }
    result
}

/// Seeding has no UI; results go to stdout
fn run_seed(cli: &Cli, args: &SeedArgs) -> Result<()> {
    let data = SeedData::from_path(&args.file)?;
    let mut api = ApiClient::new(&cli.api_base_url, Session::in_memory(), cli.timeout())
        .with_context(|| format!("configuring API client for {}", cli.api_base_url))?;
    if let Some(key) = &args.api_key {
        api = api.with_api_key(key.as_str());
    }
    tracing::info!(api = %cli.api_base_url, file = %args.file.display(), "seeding");

    for posted in seed::seed(&api, &data)? {
        println!("/{}/bulk: status={}", posted.path, posted.status.as_u16());
        println!("{}", serde_json::to_string_pretty(&posted.response)?);
    }
    println!("Done seeding.");
    Ok(())
}

/// Hover follows every mouse move; a left click acts on the shape under it
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => app.pointer_moved(mouse.column, mouse.row),
        MouseEventKind::Down(MouseButton::Left) => app.clicked(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_map_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => app.back(),
        KeyCode::Char('x') => app.close_sidebar(),
        KeyCode::Char('l') => app.open(Screen::Login),
        KeyCode::Char('g') => app.open(Screen::Register),
        KeyCode::Char('o') => app.sign_out(),
        _ => {}
    }
}

fn handle_form_key(app: &mut App, key: KeyEvent) {
    if app.session.is_authenticated() {
        match key.code {
            KeyCode::Char('o') => app.sign_out(),
            KeyCode::Esc | KeyCode::Char('q') => app.open(Screen::Map),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.open(Screen::Map),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = app.form_mut() {
                form.focus_next();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(form) = app.form_mut() {
                form.focus_prev();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = app.form_mut() {
                form.backspace();
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.form_mut() {
                form.input(c);
            }
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    app.start();

    // Main loop
    loop {
        // Fold in finished fetches before drawing
        app.tick();

        // Draw
        terminal.draw(|frame| {
            let regions = ui::regions(frame.area(), app);
            app.sync_layout(regions.map_inner, regions.back_button);
            ui::render(frame, app);
        })?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match app.screen {
                            Screen::Map => handle_map_key(app, key),
                            Screen::Login | Screen::Register => handle_form_key(app, key),
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(app, mouse);
                }
                // Layout is recomputed on the next draw
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
