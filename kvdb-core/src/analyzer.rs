//! Maps a token list to a typed `Command` with exact arity checks.

use crate::command::Command;
use crate::error::AnalyzeError;

/// Analyzes `tokens` into a `Command` with `seq_id` left unassigned (0); the
/// caller assigns it via the sequencer once parsing has succeeded.
pub fn analyze(tokens: &[String]) -> Result<Command, AnalyzeError> {
    let (head, args) = tokens.split_first().ok_or(AnalyzeError::EmptyTokens)?;

    match head.as_str() {
        "GET" => {
            let key = exactly_one(args)?;
            Ok(Command::Get { seq_id: 0, key })
        }
        "SET" => {
            let (key, value) = exactly_two(args)?;
            Ok(Command::Set { seq_id: 0, key, value })
        }
        "DEL" => {
            let key = exactly_one(args)?;
            Ok(Command::Del { seq_id: 0, key })
        }
        _ => Err(AnalyzeError::UnknownCommand),
    }
}

fn exactly_one(args: &[String]) -> Result<String, AnalyzeError> {
    match args.len() {
        n if n < 1 => Err(AnalyzeError::NotEnoughArguments),
        1 => Ok(args[0].clone()),
        _ => Err(AnalyzeError::TooManyArguments),
    }
}

fn exactly_two(args: &[String]) -> Result<(String, String), AnalyzeError> {
    match args.len() {
        n if n < 2 => Err(AnalyzeError::NotEnoughArguments),
        2 => Ok((args[0].clone(), args[1].clone())),
        _ => Err(AnalyzeError::TooManyArguments),
    }
}
