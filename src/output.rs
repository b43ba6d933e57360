//! Terminal output for resolutions, highlight state and the format table

use crate::highlight::{HighlightState, Phase};
use crate::host::Effect;
use crate::registry::RecognizerRule;
use crate::resolver::ResolveOutcome;
use crate::utils::AppConfig;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn write_label(stdout: &mut StandardStream, label: &str, color: Color) -> io::Result<()> {
    stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(stdout, "{}", label)?;
    stdout.reset()
}

/// One-line summary of an effect
fn describe_effect(effect: &Effect) -> String {
    match effect {
        Effect::SetViewport { lon, lat, zoom } => match zoom {
            Some(z) => format!("viewport {:.6},{:.6} z{}", lat, lon, z),
            None => format!("viewport {:.6},{:.6}", lat, lon),
        },
        Effect::SetSelection { kind, ids } => {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            format!("select {} [{}]", kind, ids.join(","))
        }
        Effect::ShowProblemDetail { id } => format!("show problem {}", id),
        Effect::EnsureLayerVisible { layer } => format!("layer {:?} on", layer),
        Effect::NotifyUser { message } => format!("notify \"{}\"", message),
        Effect::ClearInput => "clear input".to_string(),
        Effect::SubscribeViewport => "subscribe viewport".to_string(),
        Effect::UnsubscribeViewport => "unsubscribe viewport".to_string(),
        Effect::RenderOverlay { features } => format!("overlay {} features", features),
        Effect::ClearOverlay => "clear overlay".to_string(),
        Effect::ShowCounts { roads, places } => format!("counts roads={} places={}", roads, places),
        Effect::RemoveCounts => "remove counts".to_string(),
    }
}

/// Print host effects, one per line
pub fn print_effects(effects: &[Effect], color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);
    write_effects(&mut stdout, effects)
}

fn write_effects(stdout: &mut StandardStream, effects: &[Effect]) -> io::Result<()> {
    for effect in effects {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(stdout, "  -> ")?;
        stdout.reset()?;
        writeln!(stdout, "{}", describe_effect(effect))?;
    }
    Ok(())
}

/// Print a resolution: the input, which rule took it, and what happened
pub fn print_outcome(
    input: &str,
    outcome: &ResolveOutcome,
    effects: &[Effect],
    color: bool,
) -> io::Result<()> {
    let mut stdout = stdout(color);

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    writeln!(stdout, "{}", input)?;
    stdout.reset()?;

    write!(stdout, "  ")?;
    match outcome {
        ResolveOutcome::Ignored => write_label(&mut stdout, "ignored", Color::Yellow)?,
        ResolveOutcome::NoMatch => write_label(&mut stdout, "no match", Color::Yellow)?,
        ResolveOutcome::Resolved { rule, result } => {
            write_label(&mut stdout, "resolved", Color::Green)?;
            write!(stdout, " via {}", rule)?;
            if !result.consumed {
                write!(stdout, " (input kept)")?;
            }
        }
        ResolveOutcome::Malformed { rule, reason } => {
            write_label(&mut stdout, "malformed", Color::Red)?;
            write!(stdout, " {}: {}", rule, reason)?;
        }
        ResolveOutcome::Failed { rule, error } => {
            write_label(&mut stdout, "failed", Color::Red)?;
            write!(stdout, " {}: {}", rule, error)?;
        }
        ResolveOutcome::NotFound { rule } => {
            write_label(&mut stdout, "not found", Color::Yellow)?;
            write!(stdout, " via {}", rule)?;
        }
    }
    writeln!(stdout)?;

    write_effects(&mut stdout, effects)
}

/// Print highlight engine state after one keystroke
pub fn print_highlight(
    input: &str,
    phase: Phase,
    state: &HighlightState,
    effects: &[Effect],
    color: bool,
) -> io::Result<()> {
    let mut stdout = stdout(color);

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    writeln!(stdout, "{}", input)?;
    stdout.reset()?;

    write!(stdout, "  ")?;
    match phase {
        Phase::Active => write_label(&mut stdout, "active", Color::Green)?,
        Phase::Idle => write_label(&mut stdout, "idle", Color::Yellow)?,
    }
    writeln!(
        stdout,
        " roads={} places={}",
        state.matched_segment_ids.len(),
        state.matched_venue_ids.len()
    )?;

    for id in &state.matched_segment_ids {
        writeln!(stdout, "  segment {}", id)?;
    }
    for id in &state.matched_venue_ids {
        writeln!(stdout, "  venue {}", id)?;
    }

    write_effects(&mut stdout, effects)
}

/// Print the recognizer table in dispatch order
pub fn print_formats(rules: &[RecognizerRule], color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);

    for rule in rules {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(stdout, "{:>3}", rule.priority())?;
        stdout.reset()?;
        write!(stdout, "  {:<11} ", rule.stage().to_string())?;
        stdout.set_color(ColorSpec::new().set_bold(true))?;
        write!(stdout, "{:<22}", rule.name())?;
        stdout.reset()?;
        writeln!(stdout, " {}", rule.pattern())?;
    }

    Ok(())
}

/// Print the effective configuration and where it lives
pub fn print_config(path: &Path, config: &AppConfig, color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    writeln!(stdout, "{}", path.display())?;
    stdout.reset()?;

    if !path.exists() {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(stdout, "(file not found, using defaults)")?;
        stdout.reset()?;
    }

    serde_json::to_writer_pretty(&mut stdout, config)?;
    writeln!(stdout)?;
    Ok(())
}

/// Print any serializable value as one line of JSON
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)
}
