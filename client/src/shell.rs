//! Line commands for the interactive shell.

use std::path::PathBuf;

use common::data::{FilterCriteria, LogStatus};

pub const HELP: &str = "\
commands:
  select <path>                        pick the file to upload
  clear                                forget the selected file
  upload [user id]                     upload the selected file
  stats                                refresh upload statistics
  logs [page]                          show a page of the audit log
  next | prev                          move through the audit log
  filter [status=S] [user=U] [risk=N]  filter the audit log (no arguments clears)
  help                                 show this message
  quit                                 leave the shell";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Select(PathBuf),
    Clear,
    Upload(Option<String>),
    Stats,
    /// Zero-based page; `None` reloads the current one.
    Logs(Option<u32>),
    Next,
    Prev,
    Filter(FilterCriteria),
    Help,
    Quit,
}

/// Parses one shell line. Blank lines yield `Ok(None)`.
///
/// Page numbers are typed one-based.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "select" => {
            if rest.is_empty() {
                return Err("usage: select <path>".to_string());
            }
            Command::Select(PathBuf::from(rest))
        }
        "clear" => Command::Clear,
        "upload" => Command::Upload((!rest.is_empty()).then(|| rest.to_string())),
        "stats" => Command::Stats,
        "logs" => Command::Logs(match rest {
            "" => None,
            page => Some(parse_page(page)?),
        }),
        "next" => Command::Next,
        "prev" | "previous" => Command::Prev,
        "filter" => Command::Filter(parse_filter(rest)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command {other:?}; try help")),
    };
    Ok(Some(command))
}

fn parse_page(input: &str) -> Result<u32, String> {
    match input.parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page - 1),
        _ => Err(format!("bad page number {input:?}")),
    }
}

fn parse_filter(input: &str) -> Result<FilterCriteria, String> {
    let mut status = None;
    let mut user = None;
    let mut risk = None;
    for pair in input.split_whitespace() {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!("expected key=value, got {pair:?}"));
        };
        match key.to_ascii_lowercase().as_str() {
            "status" => status = Some(value.parse::<LogStatus>()?),
            "user" => user = Some(value.to_string()),
            "risk" => {
                let threshold = value
                    .parse::<u32>()
                    .ok()
                    .filter(|t| *t <= 100)
                    .ok_or_else(|| format!("risk must be 0-100, got {value:?}"))?;
                risk = Some(threshold);
            }
            other => return Err(format!("unknown filter {other:?}")),
        }
    }
    Ok(FilterCriteria::new(status, user, risk))
}
