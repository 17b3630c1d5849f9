//! A forgiving Python tokenizer.
//!
//! It only understands what registration-call scanning needs: identifiers,
//! string literals (every prefix, triple quotes, escapes), comments, bracket
//! nesting and a handful of punctuation. Everything else becomes
//! [`TokenKind::Other`]. A file is rejected when a string literal never ends
//! or brackets do not balance.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    /// A string literal. `plain` is false for byte strings, f-strings and
    /// literals with escapes that were not decoded, whose text is not a
    /// usable name.
    Str { value: String, plain: bool },
    Open(char),
    Close(char),
    Comma,
    Equals,
    Dot,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based line where the token starts.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("unmatched closing '{found}'")]
    UnexpectedClose { line: usize, found: char },

    #[error("closing '{found}' does not match opening '{open}'")]
    MismatchedClose { line: usize, open: char, found: char },

    #[error("'{open}' is never closed")]
    UnclosedBracket { line: usize, open: char },
}

impl TokenizeError {
    pub fn line(&self) -> usize {
        match self {
            TokenizeError::UnterminatedString { line }
            | TokenizeError::UnexpectedClose { line, .. }
            | TokenizeError::MismatchedClose { line, .. }
            | TokenizeError::UnclosedBracket { line, .. } => *line,
        }
    }
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_string_prefix(ident: &str) -> bool {
    matches!(
        ident.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// Consumes exactly `digits` hex digits and returns the code point.
    fn hex_escape(&mut self, digits: usize) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self.peek()?.to_digit(16)?;
            self.bump();
            code = code * 16 + digit;
        }
        char::from_u32(code)
    }

    /// Consumes up to two more octal digits after `first`.
    fn octal_escape(&mut self, first: char) -> Option<char> {
        let mut code = first.to_digit(8)?;
        for _ in 0..2 {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(digit) => {
                    self.bump();
                    code = code * 8 + digit;
                }
                None => break,
            }
        }
        char::from_u32(code)
    }

    /// Reads a string body after the opening quote has been consumed.
    ///
    /// Returns the decoded value and whether every escape could be decoded.
    /// `\N{...}` names are not resolved.
    fn string_body(
        &mut self,
        quote: char,
        raw: bool,
        start_line: usize,
    ) -> Result<(String, bool), TokenizeError> {
        let triple = {
            let mut lookahead = self.chars.clone();
            lookahead.next() == Some(quote) && lookahead.next() == Some(quote)
        };
        if triple {
            self.bump();
            self.bump();
        } else if self.peek() == Some(quote) {
            // Empty literal.
            self.bump();
            return Ok((String::new(), true));
        }

        let mut value = String::new();
        let mut decoded = true;
        let mut run = 0usize;
        loop {
            let c = self
                .bump()
                .ok_or(TokenizeError::UnterminatedString { line: start_line })?;
            match c {
                '\\' => {
                    run = 0;
                    let escaped = self
                        .bump()
                        .ok_or(TokenizeError::UnterminatedString { line: start_line })?;
                    if raw {
                        value.push('\\');
                        value.push(escaped);
                        continue;
                    }
                    let simple = match escaped {
                        '\n' => continue,
                        'n' => Some('\n'),
                        't' => Some('\t'),
                        'r' => Some('\r'),
                        'a' => Some('\u{7}'),
                        'b' => Some('\u{8}'),
                        'f' => Some('\u{c}'),
                        'v' => Some('\u{b}'),
                        '\\' | '\'' | '"' => Some(escaped),
                        '0'..='7' => match self.octal_escape(escaped) {
                            Some(c) => Some(c),
                            None => {
                                decoded = false;
                                continue;
                            }
                        },
                        'x' | 'u' | 'U' => {
                            let digits = match escaped {
                                'x' => 2,
                                'u' => 4,
                                _ => 8,
                            };
                            match self.hex_escape(digits) {
                                Some(c) => Some(c),
                                None => {
                                    decoded = false;
                                    continue;
                                }
                            }
                        }
                        'N' => {
                            decoded = false;
                            None
                        }
                        _ => None,
                    };
                    match simple {
                        Some(c) => value.push(c),
                        None => {
                            value.push('\\');
                            value.push(escaped);
                        }
                    }
                }
                '\n' if !triple => {
                    return Err(TokenizeError::UnterminatedString { line: start_line });
                }
                c if c == quote => {
                    if !triple {
                        return Ok((value, decoded));
                    }
                    run += 1;
                    if run == 3 {
                        value.truncate(value.len() - 2);
                        return Ok((value, decoded));
                    }
                    value.push(c);
                }
                c => {
                    run = 0;
                    value.push(c);
                }
            }
        }
    }
}

/// Split Python source text into tokens.
pub fn tokenize(text: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut cursor = Cursor::new(text);
    let mut tokens = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();

    while let Some(c) = cursor.peek() {
        let line = cursor.line;
        match c {
            '#' => {
                cursor.eat_while(|c| c != '\n');
            }
            '\\' => {
                // Explicit line continuation.
                cursor.bump();
            }
            c if c.is_whitespace() => {
                cursor.bump();
            }
            '\'' | '"' => {
                cursor.bump();
                let (value, plain) = cursor.string_body(c, false, line)?;
                tokens.push(Token {
                    kind: TokenKind::Str { value, plain },
                    line,
                });
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = cursor.eat_while(|c| c.is_alphanumeric() || c == '_');
                match cursor.peek() {
                    Some(quote @ ('\'' | '"')) if is_string_prefix(&ident) => {
                        cursor.bump();
                        let prefix = ident.to_ascii_lowercase();
                        let (value, decoded) =
                            cursor.string_body(quote, prefix.contains('r'), line)?;
                        let plain = decoded && !prefix.contains('b') && !prefix.contains('f');
                        tokens.push(Token {
                            kind: TokenKind::Str { value, plain },
                            line,
                        });
                    }
                    _ => tokens.push(Token {
                        kind: TokenKind::Ident(ident),
                        line,
                    }),
                }
            }
            c if c.is_ascii_digit() => {
                cursor.eat_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
                tokens.push(Token {
                    kind: TokenKind::Other,
                    line,
                });
            }
            '(' | '[' | '{' => {
                cursor.bump();
                stack.push((c, line));
                tokens.push(Token {
                    kind: TokenKind::Open(c),
                    line,
                });
            }
            ')' | ']' | '}' => {
                cursor.bump();
                match stack.pop() {
                    None => return Err(TokenizeError::UnexpectedClose { line, found: c }),
                    Some((open, _)) if closing_for(open) != c => {
                        return Err(TokenizeError::MismatchedClose {
                            line,
                            open,
                            found: c,
                        })
                    }
                    Some(_) => tokens.push(Token {
                        kind: TokenKind::Close(c),
                        line,
                    }),
                }
            }
            ',' | '.' => {
                cursor.bump();
                let kind = if c == ',' {
                    TokenKind::Comma
                } else {
                    TokenKind::Dot
                };
                tokens.push(Token { kind, line });
            }
            '=' | '!' | '<' | '>' | ':' => {
                cursor.bump();
                let kind = if cursor.peek() == Some('=') {
                    cursor.bump();
                    TokenKind::Other
                } else if c == '=' {
                    TokenKind::Equals
                } else {
                    TokenKind::Other
                };
                tokens.push(Token { kind, line });
            }
            _ => {
                cursor.bump();
                tokens.push(Token {
                    kind: TokenKind::Other,
                    line,
                });
            }
        }
    }

    if let Some((open, line)) = stack.pop() {
        return Err(TokenizeError::UnclosedBracket { line, open });
    }

    Ok(tokens)
}
