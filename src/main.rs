use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, ValueEnum};
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tabler::controller::Controller;
use tabler::display::{DisplayOptions, Layout, SelectionMode};
use tabler::domain::{TVConfig, TVError};
use tabler::loader::expand_path;
use tabler::model::{Model, Status};
use tabler::ui::TableUI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SelectionArg {
    None,
    Single,
    Multiple,
}

/// Sortable, selectable table demo.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CSV, Parquet or Arrow file with an "id" column. Shows the fruit basket when omitted.
    file: Option<String>,

    #[arg(long, value_enum, default_value_t = SelectionArg::Single)]
    selection: SelectionArg,

    #[arg(long, value_enum, default_value_t = Layout::List)]
    layout: Layout,

    /// Tint rows with their color.
    #[arg(long)]
    colorize: bool,

    /// Hide the column header.
    #[arg(long)]
    no_header: bool,

    /// Show the summary footer.
    #[arg(long)]
    footer: bool,

    /// Disable in-place editing.
    #[arg(long)]
    read_only: bool,

    /// Write logs to this file. RUST_LOG controls the level.
    #[arg(long)]
    log_file: Option<String>,

    /// Milliseconds to wait for terminal events per frame.
    #[arg(long, default_value_t = 100)]
    event_poll_time: u64,
}

impl Args {
    fn into_config(self) -> Result<TVConfig, TVError> {
        let data_file = self.file.as_deref().map(expand_path).transpose()?;
        let selection = match self.selection {
            SelectionArg::None => None,
            SelectionArg::Single => Some(SelectionMode::Single),
            SelectionArg::Multiple => Some(SelectionMode::Multiple),
        };
        let display = DisplayOptions::default()
            .colorize(self.colorize)
            .headerize(!self.no_header)
            .footerize(self.footer)
            .layout(self.layout);
        Ok(TVConfig {
            event_poll_time: self.event_poll_time,
            data_file,
            display,
            selection,
            read_only: self.read_only,
        })
    }
}

fn init_logging(log_file: Option<PathBuf>) -> Result<(), TVError> {
    // The terminal belongs to the UI, so logs only go to a file.
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(&path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = run(args);
    ratatui::restore();
    match result {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: Args) -> Result<(), TVError> {
    let log_file = args.log_file.as_deref().map(expand_path).transpose()?;
    init_logging(log_file)?;
    let cfg = args.into_config()?;
    info!("Starting tabler with {:?}", cfg);

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let size = terminal.size()?;

    let result = event_loop(&cfg, &mut terminal, size.width as usize, size.height as usize);
    execute!(stdout(), DisableMouseCapture)?;
    result
}

fn event_loop(
    cfg: &TVConfig,
    terminal: &mut ratatui::DefaultTerminal,
    width: usize,
    height: usize,
) -> Result<(), TVError> {
    let mut model = Model::init(cfg, width, height)?;
    let mut ui = TableUI::new(cfg);
    let controller = Controller::new(cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    Ok(())
}
