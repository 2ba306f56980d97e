mod app;
mod model;
mod msg;
mod service;

use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use app::App;
use model::config::AppConfig;
use msg::Msg;
use service::SimulatedService;

fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // Log to file, the terminal belongs to the UI
    let log_dir = directories::ProjectDirs::from("", "", "storefront-setup")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("storefront-setup"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "storefront-setup.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_filter));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    tracing::info!(
        "storefront-setup starting, {} required plugins",
        config.setup.required_plugins.len()
    );

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!("storefront-setup failed: {e:?}");
        eprintln!("storefront-setup error: {e:?}");
    }

    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, config: AppConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();
    let tick = Duration::from_millis(config.general.tick_ms);

    let service = SimulatedService::spawn(&config, tx.clone());
    let mut app = App::new(config, Box::new(service))?;

    // Input thread: reads terminal events and forwards them as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            let msg = match event::read() {
                Ok(Event::Key(k)) => Msg::Key(k),
                Ok(Event::Resize(w, h)) => Msg::Resize(w, h),
                Ok(_) => continue,
                Err(err) => {
                    tracing::error!("terminal input failed: {err}");
                    Msg::Quit
                }
            };
            let quit = matches!(msg, Msg::Quit);
            if tx_input.send(msg).is_err() || quit {
                break;
            }
        }
    });

    // Tick thread: drives the progress pulse
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(tick);
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    drop(tx);

    // ── Main event loop ──
    terminal.draw(|f| app.view(f))?;
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first)?;

        while let Ok(msg) = rx.try_recv() {
            app.update(msg)?;
        }

        if app.should_quit {
            break;
        }

        terminal.draw(|f| app.view(f))?;
    }

    tracing::info!(
        "storefront-setup exiting, progress {:.0}%, finished: {}",
        app.progress(),
        app.is_setup_finished()
    );

    Ok(())
}
