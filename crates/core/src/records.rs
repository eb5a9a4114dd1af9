//! Line parsers turning job input text into records.
//!
//! Line numbers in errors are 1-based and count blank lines too.

use crate::{CompositeKey, CoreError, Key};

/// Every whitespace-separated token is one integer record.
pub fn parse_numbers(text: &str) -> Result<Vec<Key>, CoreError> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            let value = token.parse::<Key>().map_err(|err| CoreError::Parse {
                line: idx + 1,
                reason: format!("{token:?} is not an integer: {err}"),
            })?;
            out.push(value);
        }
    }
    Ok(out)
}

/// One key per non-blank line.
pub fn parse_composite_keys(text: &str) -> Result<Vec<CompositeKey>, CoreError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            line.parse::<CompositeKey>()
                .map_err(|reason| CoreError::Parse { line: idx + 1, reason })
        })
        .collect()
}

/// Words split on single spaces; empty tokens are dropped.
pub fn split_words(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| line.split(' '))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_span_lines_and_tokens() {
        let parsed = parse_numbers("2\n1 10\n\n-4  8\n").unwrap();
        assert_eq!(parsed, vec![2, 1, 10, -4, 8]);
    }

    #[test]
    fn bad_number_reports_line() {
        let err = parse_numbers("1\n2\nthree\n").unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 3, .. }));
    }

    #[test]
    fn composite_keys_skip_blank_lines() {
        let keys = parse_composite_keys("3 3\n\n3 1\n7\n").unwrap();
        assert_eq!(
            keys,
            vec![
                CompositeKey::new(3, 3),
                CompositeKey::new(3, 1),
                CompositeKey::new(7, 0)
            ]
        );
        let err = parse_composite_keys("1 1\n\n1 x\n").unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 3, .. }));
    }

    #[test]
    fn words_split_on_spaces() {
        assert_eq!(
            split_words("hello you\nhello  me\n"),
            vec!["hello", "you", "hello", "me"]
        );
    }
}
