//! Line-oriented terminal renderer.
//!
//! Draws the whole screen on every redraw: title bar with the page
//! indicator, the publication list, any open dialog or the help overlay,
//! and the search/status line at the bottom.
use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Print, PrintStyledContent, Stylize},
    terminal::{size, Clear, ClearType},
};

use crate::app::App;
use crate::dialog::Dialog;
use crate::lcp::{catalog_controls, LsdStatus};
use crate::opds::Publication;

/// Collapsed height of the description panel, in lines.
const DESCRIPTION_VIEWPORT: usize = 4;
/// Wrap width for dialog text.
const DIALOG_WIDTH: usize = 64;

pub fn render(out: &mut impl Write, app: &mut App) -> io::Result<()> {
    let (cols, _) = size().unwrap_or((80, 24));
    let width = cols as usize;

    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;

    let mut title = format!("folio — {}", app.feed.title);
    if let Some(indicator) = app.feed.page_info.indicator() {
        title.push_str(&format!("  [{}]", indicator));
    }
    queue!(
        out,
        PrintStyledContent(truncate(&title, width).bold()),
        Print("\r\n\r\n")
    )?;

    if app.show_help {
        render_help(out, app, width)?;
    } else {
        render_catalog(out, app, width)?;
        render_dialog(out, app)?;
    }

    queue!(out, Print("\r\n"))?;
    if app.search_focused {
        queue!(out, Print(format!("Search: {}_", app.search_query)))?;
    } else if let Some((message, _)) = &app.status_message {
        queue!(out, Print(truncate(message, width)))?;
    }

    out.flush()
}

fn render_catalog(out: &mut impl Write, app: &App, width: usize) -> io::Result<()> {
    if app.feed.publications.is_empty() {
        return queue!(out, Print("  (no publications on this page)\r\n"));
    }
    for (i, publication) in app.feed.publications.iter().enumerate() {
        let marker = if i == app.selected { '>' } else { ' ' };
        let line = format!("{} {}{}", marker, publication.title, lcp_badge(publication));
        if i == app.selected {
            queue!(out, PrintStyledContent(truncate(&line, width).reverse()))?;
        } else {
            queue!(out, Print(truncate(&line, width)))?;
        }
        queue!(out, Print("\r\n"))?;
    }
    Ok(())
}

fn render_help(out: &mut impl Write, app: &App, width: usize) -> io::Result<()> {
    queue!(out, PrintStyledContent("Keyboard shortcuts".to_string().bold()), Print("\r\n"))?;
    for (_, keys, description) in app.shortcut_map.all_bindings() {
        let line = format!("  {:<28} {}", keys, description);
        queue!(out, Print(truncate(&line, width)), Print("\r\n"))?;
    }
    queue!(
        out,
        Print("\r\n  Plain keys: j/k select, Enter open, Backspace back, d delete, q quit\r\n")
    )
}

fn render_dialog(out: &mut impl Write, app: &mut App) -> io::Result<()> {
    let Some(dialog) = app.dialogs.current_mut() else {
        return Ok(());
    };
    queue!(out, Print("\r\n"))?;
    match dialog {
        Dialog::PublicationInfo {
            publication,
            description,
        } => {
            queue!(
                out,
                PrintStyledContent("About this publication".to_string().bold()),
                Print("\r\n")
            )?;
            queue!(out, Print(format!("  {}\r\n", publication.title)))?;
            if let Some(identifier) = &publication.identifier {
                queue!(out, Print(format!("  {}\r\n", identifier)))?;
            }
            if let Some(lcp) = &publication.lcp {
                let mut line = String::from("  Loan:");
                if let Some(status) = lcp.status {
                    line.push_str(&format!(" {}", status_label(status)));
                }
                if let Some(end) = lcp.rights_end {
                    line.push_str(&format!(", until {}", end.format("%Y-%m-%d")));
                }
                queue!(out, Print(line), Print("\r\n"))?;
            }

            if let Some(text) = &publication.description {
                let lines = wrap(text, DIALOG_WIDTH);
                description.measure(lines.len(), DESCRIPTION_VIEWPORT);
                let shown = if description.is_expanded() {
                    lines.len()
                } else {
                    lines.len().min(DESCRIPTION_VIEWPORT)
                };
                queue!(out, Print("\r\n"))?;
                for line in &lines[..shown] {
                    queue!(out, Print(format!("  {}\r\n", line)))?;
                }
                if description.offers_toggle() {
                    let label = if description.is_expanded() {
                        "[m] Less"
                    } else {
                        "[m] More"
                    };
                    queue!(out, Print(format!("  {}\r\n", label)))?;
                }
            }

            let controls = catalog_controls(publication.lcp.as_ref());
            let mut hints = Vec::new();
            if controls.can_read {
                hints.push("[Enter] Read");
            }
            if controls.renew.is_some() {
                hints.push("[r] Renew");
            }
            if controls.return_link.is_some() {
                hints.push("[t] Return");
            }
            hints.push("[d] Delete");
            hints.push("[Esc] Close");
            queue!(out, Print(format!("\r\n  {}\r\n", hints.join("  "))))?;
        }
        Dialog::DeleteConfirm(publication) => {
            render_confirm(out, &format!("Delete '{}'?", publication.title))?;
        }
        Dialog::LcpRenewConfirm(publication) => {
            render_confirm(out, &format!("Renew the loan for '{}'?", publication.title))?;
        }
        Dialog::LcpReturnConfirm(publication) => {
            render_confirm(out, &format!("Return the loan for '{}'?", publication.title))?;
        }
    }
    Ok(())
}

fn render_confirm(out: &mut impl Write, question: &str) -> io::Result<()> {
    queue!(
        out,
        PrintStyledContent(question.to_string().bold()),
        Print("\r\n  [y] Confirm  [n] Cancel\r\n")
    )
}

fn lcp_badge(publication: &Publication) -> String {
    let Some(lcp) = &publication.lcp else {
        return String::new();
    };
    let mut badge = String::new();
    if let Some(status) = lcp.status {
        badge.push_str(&format!(" [{}]", status_label(status)));
    }
    if let Some(end) = lcp.rights_end {
        badge.push_str(&format!(" (until {})", end.format("%Y-%m-%d")));
    }
    badge
}

fn status_label(status: LsdStatus) -> &'static str {
    match status {
        LsdStatus::Ready => "ready",
        LsdStatus::Active => "active",
        LsdStatus::Revoked => "revoked",
        LsdStatus::Returned => "returned",
        LsdStatus::Cancelled => "cancelled",
        LsdStatus::Expired => "expired",
    }
}

/// Greedy word wrap by character count. Words longer than `width` get a
/// line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if !current.is_empty() && current.chars().count() + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

// ============================================================================
// Tests
// ============================================================================
