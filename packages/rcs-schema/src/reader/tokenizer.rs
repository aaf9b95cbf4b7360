//! Splits schema source text into tokens.

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: u32,
}

impl Token {
    pub fn new(text: impl Into<String>, line: u32) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }

    /// Returns `true` for the single-character punctuation tokens.
    pub fn is_symbol(&self) -> bool {
        let mut chars = self.text.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if is_symbol(c))
    }
}

/// Starts a comment running to the end of the line.
pub const COMMENT: char = '#';

/// Characters that always form a token of their own.
pub fn is_symbol(c: char) -> bool {
    matches!(c, ';' | '{' | '}' | ',')
}

/// Splits `source` into tokens.
///
/// Tokens are maximal runs of characters that are neither whitespace nor
/// symbols; every symbol is a token by itself. Comments produce no tokens.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start_line = 1;
    let mut line = 1;
    let mut in_comment = false;

    for c in source.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                line += 1;
            }
            continue;
        }

        if c == COMMENT || c.is_whitespace() || is_symbol(c) {
            if !current.is_empty() {
                tokens.push(Token::new(std::mem::take(&mut current), start_line));
            }
            if c == COMMENT {
                in_comment = true;
            } else if is_symbol(c) {
                tokens.push(Token::new(c, line));
            } else if c == '\n' {
                line += 1;
            }
            continue;
        }

        if current.is_empty() {
            start_line = line;
        }
        current.push(c);
    }

    if !current.is_empty() {
        tokens.push(Token::new(current, start_line));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_on_whitespace_and_symbols() {
        let tokens = tokenize("resource Mesh{uint32 a;string[] names;}");
        assert_eq!(
            texts(&tokens),
            vec![
                "resource", "Mesh", "{", "uint32", "a", ";", "string[]", "names", ";", "}"
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokenize("# header\nenum E { A, # first\n B }# tail");
        assert_eq!(texts(&tokens), vec!["enum", "E", "{", "A", ",", "B", "}"]);
    }

    #[test]
    fn tokens_carry_their_starting_line() {
        let tokens = tokenize("resource A\n{\n  uint32 x;\n\n}\n");
        let lines = tokens.iter().map(|t| t.line).collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 1, 2, 3, 3, 3, 5]);
    }

    #[test]
    fn line_count_survives_comments_and_crlf() {
        let tokens = tokenize("# one\r\n# two\r\ndata D {}\r\n");
        assert_eq!(tokens[0], Token::new("data", 3));
        assert_eq!(tokens.last().map(|t| t.line), Some(3));
    }

    #[test]
    fn symbol_tokens() {
        assert!(Token::new(";", 1).is_symbol());
        assert!(!Token::new(";;", 1).is_symbol());
        assert!(!Token::new("x", 1).is_symbol());
        assert!(tokenize("").is_empty());
    }
}
