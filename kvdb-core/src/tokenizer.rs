//! Splits a raw command string into tokens via a small character state
//! machine: `initial` -> `word` -> `space`, dispatched on two events
//! (symbol / whitespace).

use crate::error::TokenizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Word,
    Space,
}

/// Splits `raw` into tokens, or fails on the first character that is neither
/// Unicode whitespace nor in `[0-9A-Za-z*/_]`. A synthetic trailing whitespace
/// event flushes any in-progress word once the input ends, so `"SET k v"` and
/// `"SET k v "` tokenize identically. Empty input yields an empty list.
pub fn tokenize(raw: &str) -> Result<Vec<String>, TokenizeError> {
    let mut state = State::Initial;
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in raw.chars().chain(std::iter::once(' ')) {
        if c.is_whitespace() {
            if state == State::Word {
                tokens.push(std::mem::take(&mut current));
            }
            state = State::Space;
        } else if is_symbol(c) {
            current.push(c);
            state = State::Word;
        } else {
            return Err(TokenizeError::UnexpectedSymbol(c));
        }
    }

    Ok(tokens)
}

fn is_symbol(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_alphabetic() || matches!(c, '*' | '_' | '/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_tokens() {
        assert_eq!(tokenize("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn splits_on_whitespace_runs() {
        assert_eq!(
            tokenize("SET  k\tv\n").unwrap(),
            vec!["SET".to_string(), "k".to_string(), "v".to_string()]
        );
    }

    #[test]
    fn leading_and_trailing_whitespace_is_ignored() {
        assert_eq!(
            tokenize("  GET k  ").unwrap(),
            vec!["GET".to_string(), "k".to_string()]
        );
    }

    #[test]
    fn no_trailing_whitespace_still_flushes_last_word() {
        assert_eq!(tokenize("GET k").unwrap(), vec!["GET".to_string(), "k".to_string()]);
    }

    #[test]
    fn rejects_disallowed_characters() {
        let err = tokenize("SET k v!").unwrap_err();
        assert!(matches!(err, TokenizeError::UnexpectedSymbol('!')));
    }

    #[test]
    fn accepts_full_symbol_set() {
        assert_eq!(
            tokenize("a_b/c*1 X9").unwrap(),
            vec!["a_b/c*1".to_string(), "X9".to_string()]
        );
    }

    #[test]
    fn whitespace_only_input_yields_no_tokens() {
        assert_eq!(tokenize("   \t  ").unwrap(), Vec::<String>::new());
    }
}
