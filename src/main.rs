//! Formlets preview - build a form from a JSON fixture and inspect it
//!
//! `formlets <fixture.json> [--json]` prints the build output as JSON with
//! `--json`, otherwise opens a Ratatui viewer listing every field with its key
//! path, value and source.

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use formlets::app::App;
use formlets::{ui, FormFixture, FormletsConfig};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build a form from a JSON fixture and preview it
#[derive(Parser, Debug)]
#[command(name = "formlets")]
#[command(about = "Build a form from a JSON fixture and preview it")]
struct Args {
    /// Fixture file describing the formlets, bound record and prior input
    fixture: PathBuf,

    /// Print the build output as JSON instead of opening the viewer
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formlets=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = FormletsConfig::load()?;
    let fixture = FormFixture::load(&args.fixture)?;
    let title = fixture.root.clone();

    let mut form = fixture.into_form(config)?;
    let output = form.build()?.clone();
    tracing::info!(fixture = %args.fixture.display(), "form built");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(title, output);
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
