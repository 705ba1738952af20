//! Shell-like splitting of free-form argument strings
//!
//! Used for `deploy-args`, `install-args` and the `run` override. The
//! grammar is deliberately small:
//!
//! - a backslash copies the next character verbatim, inside or outside quotes
//! - `'` or `"` opens a quoted region closed only by the same character
//! - unquoted whitespace ends the current token
//! - a trailing backslash is kept literally
//!
//! Empty tokens are never produced, so `a "" b` splits into `["a", "b"]`.

use crate::core::error::TokenizeError;

/// Split `input` into an argument vector
pub fn tokenize(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            }
            continue;
        }

        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(ch),
        }
    }

    if let Some(quote) = quote {
        return Err(TokenizeError::UnterminatedQuote { quote });
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(input: &str) -> Vec<String> {
        tokenize(input).unwrap()
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(split("").is_empty());
        assert!(split("   \t\n ").is_empty());
    }

    #[test]
    fn test_double_quoted_region_keeps_spaces() {
        assert_eq!(split(r#"a "b c" d"#), vec!["a", "b c", "d"]);
    }

    #[test]
    fn test_single_quoted_region_keeps_double_quote() {
        assert_eq!(split(r#"--msg 'say "hi"'"#), vec!["--msg", r#"say "hi""#]);
    }

    #[test]
    fn test_escaped_space_joins_token() {
        assert_eq!(split(r"x\ y"), vec!["x y"]);
    }

    #[test]
    fn test_escape_inside_quotes_copies_next_char() {
        assert_eq!(split(r#""a\"b""#), vec![r#"a"b"#]);
        assert_eq!(split(r"'a\'b'"), vec!["a'b"]);
    }

    #[test]
    fn test_trailing_backslash_is_literal() {
        assert_eq!(split(r"a\"), vec![r"a\"]);
        assert_eq!(split(r"\"), vec![r"\"]);
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        assert_eq!(
            tokenize(r#""open"#),
            Err(TokenizeError::UnterminatedQuote { quote: '"' })
        );
        assert_eq!(
            tokenize("a 'b"),
            Err(TokenizeError::UnterminatedQuote { quote: '\'' })
        );
    }

    #[test]
    fn test_adjacent_quotes_concatenate() {
        assert_eq!(split(r#"--tag="v 1"'x'"#), vec!["--tag=v 1x"]);
    }

    #[test]
    fn test_empty_quotes_produce_no_token() {
        assert_eq!(split(r#"a "" b"#), vec!["a", "b"]);
    }

    #[test]
    fn test_runs_of_whitespace_collapse() {
        assert_eq!(split("  --foo \t bar\n"), vec!["--foo", "bar"]);
    }
}
