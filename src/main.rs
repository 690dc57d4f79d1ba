use clap::{error::ErrorKind, CommandFactory, Parser};
use cloudtype::{
    app::App,
    app_dirs::AppDirs,
    catalog::ContentCatalog,
    config::{Config, ConfigStore, FileConfigStore},
    error::CatalogError,
    record::{FileRecordStore, RecordStore},
    runtime::{CrosstermEventSource, FixedTicker, Runner, SystemClock},
    ui::effects::TerminalBell,
};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TICK_RATE: Duration = Duration::from_millis(100);

/// timed typing game for cloud service vocabulary
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type sentences that embed cloud service names before the clock runs out. Score is accuracy times words per minute; completed terms can be reviewed after each round."
)]
pub struct Cli {
    /// session length in seconds
    #[clap(short = 't', long)]
    time: Option<u64>,

    /// JSON corpus to load instead of the built-in one
    #[clap(short = 'c', long)]
    corpus: Option<PathBuf>,

    /// only practice sentences from this category
    #[clap(long)]
    category: Option<String>,

    /// high score file location
    #[clap(long)]
    record: Option<PathBuf>,

    /// do not ring the terminal bell on mistakes
    #[clap(long)]
    no_sound: bool,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Flags win over stored config values.
    fn merge(&self, stored: Config) -> Config {
        Config {
            time_limit_secs: self.time.unwrap_or(stored.time_limit_secs),
            corpus_path: self.corpus.clone().or(stored.corpus_path),
            category: self.category.clone().or(stored.category),
            sound: stored.sound && !self.no_sound,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config_store = FileConfigStore::new();
    let config = cli.merge(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        info!(path = %config_store.path().display(), "config saved");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let catalog = match load_catalog(&config) {
        Ok(catalog) => catalog,
        Err(e @ CatalogError::UnknownCategory(_)) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
        Err(e) => return Err(e.into()),
    };

    let record: Rc<dyn RecordStore> = Rc::new(match &cli.record {
        Some(path) => FileRecordStore::with_path(path),
        None => FileRecordStore::new(),
    });
    let sound = config.sound;
    let mut app = App::new(catalog, record, Rc::new(SystemClock), config);
    if sound {
        app = app.with_observer(Rc::new(TerminalBell));
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Built-in corpus unless a corpus file is configured, narrowed to the configured category.
fn load_catalog(config: &Config) -> Result<ContentCatalog, CatalogError> {
    let catalog = match &config.corpus_path {
        Some(path) => ContentCatalog::from_path(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "falling back to built-in corpus");
            ContentCatalog::embedded()
        }),
        None => ContentCatalog::embedded(),
    };

    match &config.category {
        Some(name) => catalog.restrict_to_category(name),
        None => Ok(catalog),
    }
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(TICK_RATE));

    while !app.should_quit() {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        for event in runner.next_batch() {
            app.handle_event(event);
            if app.should_quit() {
                break;
            }
        }
        app.tick();
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
        Some((path, file))
    });

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        info!(path = %log_path.display(), "logging initialized");
        return;
    }

    // the terminal belongs to the TUI, so no log file means no logs
    tracing_subscriber::registry().with(env_filter).init();
}
