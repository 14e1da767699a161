//! Main event loop.
//!
//! Multiplexes terminal input, the navigation and app-event channels fed by
//! shortcut handlers, unix signals, and a periodic tick. SIGHUP reloads the
//! config file and resyncs every shortcut binding session against the new
//! map.
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor,
    event::{
        Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, Clear, ClearType,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use futures::StreamExt;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use crate::app::{App, AppChannels};
use crate::config::Config;

use super::input::{handle_input, Action};
use super::render::render;

/// Runs the application event loop until quit or a termination signal.
///
/// # Panic Safety
///
/// Installs a panic hook that restores terminal state before unwinding,
/// ensuring the terminal is not left in raw mode on panic.
pub async fn run(app: &mut App, channels: AppChannels, config_path: PathBuf) -> Result<()> {
    let AppChannels {
        mut nav_rx,
        mut event_rx,
    } = channels;

    // Install panic hook BEFORE setting up the terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
        original_hook(panic_info);
    }));

    let mut stdout = io::stdout();
    let enhanced = setup_terminal(&mut stdout)?;
    if enhanced {
        tracing::debug!("Keyboard enhancement active; key-up shortcuts available");
    }

    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    // Signal handlers (Unix only). On other platforms these become pending
    // futures that never complete.
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;
    #[cfg(unix)]
    let mut sighup = signal(SignalKind::hangup())?;

    loop {
        if app.needs_redraw {
            render(&mut stdout, app)?;
            app.needs_redraw = false;
        }

        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        // Drain pending channel messages before blocking so a burst of
        // shortcut fires is applied in order.
        while let Ok(route) = nav_rx.try_recv() {
            app.navigate(route);
        }
        while let Ok(event) = event_rx.try_recv() {
            app.handle_event(event);
        }
        if app.should_quit {
            break;
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sighup_fut = sighup.recv();
        #[cfg(not(unix))]
        let sighup_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;  // Process in order listed for predictable behavior

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            _ = sighup_fut => {
                reload_config(app, &config_path);
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if let Action::Quit = handle_input(app, &key) {
                            break;
                        }
                    }
                    Some(Ok(Event::Resize(..))) => app.needs_redraw = true,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        tracing::warn!(%error, "Terminal event error");
                    }
                    None => break,
                }
            }

            Some(route) = nav_rx.recv() => app.navigate(route),

            Some(event) = event_rx.recv() => app.handle_event(event),

            _ = tick_interval.tick() => {}
        }
    }

    restore_terminal(&mut stdout, enhanced)?;
    Ok(())
}

/// Reload the config file and swap in its shortcut map. A broken file keeps
/// the current bindings.
fn reload_config(app: &mut App, path: &Path) {
    tracing::info!(path = %path.display(), "Received SIGHUP, reloading configuration");
    match Config::load(path) {
        Ok(config) => {
            let (map, warnings) = config.shortcut_map();
            app.set_shortcut_map(map);
            if warnings.is_empty() {
                app.set_status("Configuration reloaded");
            } else {
                app.set_status(format!(
                    "Configuration reloaded ({} shortcut override(s) ignored)",
                    warnings.len()
                ));
            }
        }
        Err(error) => {
            tracing::warn!(%error, "Config reload failed, keeping current shortcuts");
            app.set_status(format!("Config reload failed: {}", error));
        }
    }
}

/// Set up the terminal. Returns whether keyboard enhancement (key-up
/// reporting) could be enabled.
fn setup_terminal(stdout: &mut io::Stdout) -> Result<bool> {
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    Ok(enhanced)
}

/// Restore terminal to normal state.
fn restore_terminal(stdout: &mut io::Stdout, enhanced: bool) -> Result<()> {
    if enhanced {
        execute!(stdout, PopKeyboardEnhancementFlags)?;
    }
    execute!(
        stdout,
        Clear(ClearType::All),
        LeaveAlternateScreen,
        cursor::Show
    )?;
    disable_raw_mode()?;
    stdout.flush()?;
    Ok(())
}
