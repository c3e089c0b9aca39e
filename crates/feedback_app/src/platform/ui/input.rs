use feedback_core::{parse_raw_ids, Msg, TaskKind};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  set <ids>        replace the pending id list
  add <ids>        append ids to the pending list
  search <query>   reload the picklist filtered by query
  refresh          reload the picklist with the current query
  pick <n...>      queue picklist rows by number
  feedback         leave feedback on every unset item
  feedback!        leave feedback on every item, including resolved ones
  stop             stop leaving feedback
  stop-search      stop loading the picklist
  ignore           mark every unset item as ignored
  clear            remove done and ignored items
  sanitize         rewrite the pending list from the queue
  show             print queue and picklist
  quit";

/// One line of console input, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Msg(Msg),
    /// 1-based picklist row numbers; resolved against the current view.
    Pick(Vec<usize>),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a row number")]
    BadRow(String),
}

/// Decodes a console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "set" => Command::Msg(Msg::RawInputChanged(rest.to_string())),
        "add" => {
            let ids = parse_raw_ids(rest);
            if ids.is_empty() {
                return Err(InputError::MissingArgument("add"));
            }
            Command::Msg(Msg::ItemsPicked(ids))
        }
        "search" => Command::Msg(Msg::SearchChanged(rest.to_string())),
        "refresh" => Command::Msg(Msg::RefreshClicked),
        "pick" => Command::Pick(parse_rows(rest)?),
        "feedback" => Command::Msg(Msg::LeaveFeedbackClicked { force: false }),
        "feedback!" => Command::Msg(Msg::LeaveFeedbackClicked { force: true }),
        "stop" => Command::Msg(Msg::StopClicked(TaskKind::BulkFeedback)),
        "stop-search" => Command::Msg(Msg::StopClicked(TaskKind::Search)),
        "ignore" => Command::Msg(Msg::IgnoreListedClicked),
        "clear" => Command::Msg(Msg::ClearCompletedClicked),
        "sanitize" => Command::Msg(Msg::SanitizeClicked),
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_rows(rest: &str) -> Result<Vec<usize>, InputError> {
    let rows = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<usize>() {
            Ok(row) if row > 0 => Ok(row),
            _ => Err(InputError::BadRow(token.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Err(InputError::MissingArgument("pick"));
    }
    Ok(rows)
}
