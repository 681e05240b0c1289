//! Terminal output for query results

use crate::server::protocol::StatusResponse;
use std::io::{self, Write};
use std::path::PathBuf;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn stdout(color: bool) -> StandardStream {
    StandardStream::stdout(if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    })
}

/// One document path per line
pub fn print_paths(paths: &[PathBuf], color: bool) -> io::Result<()> {
    let mut out = stdout(color);
    for path in paths {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        writeln!(out, "{}", path.display())?;
        out.reset()?;
    }
    Ok(())
}

/// One vocabulary term per line
pub fn print_terms(terms: &[String], color: bool) -> io::Result<()> {
    let mut out = stdout(color);
    for term in terms {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
        writeln!(out, "{}", term)?;
        out.reset()?;
    }
    Ok(())
}

fn field(out: &mut StandardStream, name: &str, value: impl std::fmt::Display) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    write!(out, "  {:<16}", name)?;
    out.reset()?;
    writeln!(out, "{}", value)
}

pub fn print_status(status: &StatusResponse, color: bool) -> io::Result<()> {
    let mut out = stdout(color);
    writeln!(out, "minidex server status:")?;
    field(&mut out, "Root", status.root_path.display())?;
    field(&mut out, "Uptime", format_args!("{}s", status.uptime_secs))?;
    field(&mut out, "Queries served", status.queries_served)?;
    field(&mut out, "Documents", status.stats.documents)?;
    field(&mut out, "Terms", status.stats.terms)?;
    field(&mut out, "Word pairs", status.stats.pairs)?;
    field(&mut out, "Trigrams", status.stats.trigrams)?;
    field(&mut out, "Pending events", status.stats.pending_events)?;
    Ok(())
}

/// Trailing "N results" line on stderr so stdout stays pipeable
pub fn print_summary(count: usize, noun: &str, duration_ms: f64) {
    let plural = if count == 1 { "" } else { "s" };
    eprintln!("{} {}{} ({:.2}ms)", count, noun, plural, duration_ms);
}
