//! A minimal single-pass lexer over source text that only knows about delimiter characters
//! (`{`, `}`, `[`, `]`), string/template literals (`"..."`, `'...'`, `` `...` ``) and comments
//! (`// ...`, `/* ... */`).
//!
//! The lexer is either *in code*, *in a literal* or *in a comment*. While in a literal every
//! delimiter is inert, a backslash escapes the following character, and only the quote kind that
//! opened the literal can close it. Inside a comment quotes and delimiters are inert too.
//! Everything else in the document (identifiers, colons, commas, whitespace) is not a token at
//! all; callers recover it from the gaps between token spans when they need it.

use std::str::CharIndices;

use thiserror::Error;

use crate::span::Span;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
    Backtick,
}

impl Quote {
    pub fn from_char(c: char) -> Option<Quote> {
        match c {
            '"' => Some(Quote::Double),
            '\'' => Some(Quote::Single),
            '`' => Some(Quote::Backtick),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Quote::Double => '"',
            Quote::Single => '\'',
            Quote::Backtick => '`',
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Open(char),
    Close(char),
    Literal(Quote),
    Comment,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// For literals this includes both quotes. A line comment ends before its newline.
    pub span: Span,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub open: char,
    pub close: char,
}

pub const BRACES: Delimiters = Delimiters {
    open: '{',
    close: '}',
};

pub const BRACKETS: Delimiters = Delimiters {
    open: '[',
    close: ']',
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("no opening `{open}` found")]
    NoOpening { open: char },
    #[error("`{open}` is never closed")]
    Unclosed { open: char, span: Span },
    #[error("unexpected `{close}` without a matching `{open}`")]
    StrayClose { open: char, close: char, span: Span },
    #[error("string literal is never terminated")]
    UnterminatedLiteral { span: Span },
    #[error("block comment is never terminated")]
    UnterminatedComment { span: Span },
}

impl ScanError {
    /// Where in the document the problem is, if there is a meaningful location.
    pub fn span(&self) -> Option<Span> {
        match self {
            ScanError::NoOpening { .. } => None,
            ScanError::Unclosed { span, .. }
            | ScanError::StrayClose { span, .. }
            | ScanError::UnterminatedLiteral { span }
            | ScanError::UnterminatedComment { span } => Some(*span),
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum State {
    Code,
    Literal {
        quote: Quote,
        start: usize,
        escaped: bool,
    },
    LineComment {
        start: usize,
    },
    BlockComment {
        start: usize,
        star: bool,
    },
}

/// Iterator over the delimiter, literal and comment tokens of `src` restricted to a span. Yields
/// an error (and then stops) if the span ends inside a literal or a block comment.
pub struct Tokens<'a> {
    chars: CharIndices<'a>,
    base: usize,
    end: usize,
    done: bool,
}

impl<'a> Tokens<'a> {
    pub fn new(src: &'a str, within: Span) -> Self {
        Tokens {
            chars: within.slice(src).char_indices(),
            base: within.lo,
            end: within.hi,
            done: false,
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut state = State::Code;
        while let Some((i, c)) = self.chars.next() {
            let at = self.base + i;
            match state {
                State::Code => match c {
                    '/' => match self.chars.clone().next() {
                        Some((_, '/')) => {
                            self.chars.next();
                            state = State::LineComment { start: at };
                        }
                        Some((_, '*')) => {
                            self.chars.next();
                            state = State::BlockComment {
                                start: at,
                                star: false,
                            };
                        }
                        _ => {}
                    },
                    '{' | '[' => {
                        return Some(Ok(Token {
                            kind: TokenKind::Open(c),
                            span: Span::new(at, at + 1),
                        }))
                    }
                    '}' | ']' => {
                        return Some(Ok(Token {
                            kind: TokenKind::Close(c),
                            span: Span::new(at, at + 1),
                        }))
                    }
                    _ => {
                        if let Some(quote) = Quote::from_char(c) {
                            state = State::Literal {
                                quote,
                                start: at,
                                escaped: false,
                            };
                        }
                    }
                },
                State::Literal {
                    quote,
                    start,
                    escaped,
                } => {
                    if escaped {
                        state = State::Literal {
                            quote,
                            start,
                            escaped: false,
                        };
                    } else if c == '\\' {
                        state = State::Literal {
                            quote,
                            start,
                            escaped: true,
                        };
                    } else if c == quote.as_char() {
                        return Some(Ok(Token {
                            kind: TokenKind::Literal(quote),
                            span: Span::new(start, at + c.len_utf8()),
                        }));
                    }
                }
                State::LineComment { start } => {
                    if c == '\n' {
                        return Some(Ok(Token {
                            kind: TokenKind::Comment,
                            span: Span::new(start, at),
                        }));
                    }
                }
                State::BlockComment { start, star } => {
                    if star && c == '/' {
                        return Some(Ok(Token {
                            kind: TokenKind::Comment,
                            span: Span::new(start, at + 1),
                        }));
                    }
                    state = State::BlockComment {
                        start,
                        star: c == '*',
                    };
                }
            }
        }

        self.done = true;
        match state {
            State::Code => None,
            State::Literal { start, .. } => Some(Err(ScanError::UnterminatedLiteral {
                span: Span::new(start, self.end),
            })),
            State::LineComment { start } => Some(Ok(Token {
                kind: TokenKind::Comment,
                span: Span::new(start, self.end),
            })),
            State::BlockComment { start, .. } => Some(Err(ScanError::UnterminatedComment {
                span: Span::new(start, self.end),
            })),
        }
    }
}

/// Walk `src` from `from` and return the span of the first balanced `delims` region, from its
/// opening delimiter through its closing delimiter inclusive. The very first opening delimiter is
/// recorded as the region's start, so nested pairs never end the region early.
pub fn balanced_region(src: &str, from: usize, delims: Delimiters) -> Result<Span, ScanError> {
    let mut depth = 0usize;
    let mut start = None;

    for token in Tokens::new(src, Span::new(from, src.len())) {
        let token = token?;
        match token.kind {
            TokenKind::Open(c) if c == delims.open => {
                if start.is_none() {
                    start = Some(token.span.lo);
                }
                depth += 1;
            }
            TokenKind::Close(c) if c == delims.close => {
                let Some(lo) = start else {
                    return Err(ScanError::StrayClose {
                        open: delims.open,
                        close: delims.close,
                        span: token.span,
                    });
                };
                depth -= 1;
                if depth == 0 {
                    return Ok(Span::new(lo, token.span.hi));
                }
            }
            _ => {}
        }
    }

    match start {
        None => Err(ScanError::NoOpening { open: delims.open }),
        Some(lo) => Err(ScanError::Unclosed {
            open: delims.open,
            span: Span::new(lo, src.len()),
        }),
    }
}

/// Render `value` as the body of a `quote` literal (without the surrounding quotes).
pub fn escape(value: &str, quote: Quote) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '$' if quote == Quote::Backtick && chars.peek() == Some(&'{') => out.push_str("\\$"),
            '\n' if quote != Quote::Backtick => out.push_str("\\n"),
            '\r' if quote != Quote::Backtick => out.push_str("\\r"),
            c if c == quote.as_char() => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Decode the body of a literal (without the surrounding quotes).
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// The decoded value of the literal spanning `span`, quotes included.
pub fn literal_value(src: &str, span: Span) -> String {
    unescape(span.interior().slice(src))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Tokens::new(src, Span::new(0, src.len()))
            .map(|t| t.unwrap().kind)
            .collect()
    }

    #[test]
    fn test_braces_inside_literals_are_inert() {
        assert_eq!(
            kinds(r#"{ a: "x { y } z", b: '[' }"#),
            vec![
                TokenKind::Open('{'),
                TokenKind::Literal(Quote::Double),
                TokenKind::Literal(Quote::Single),
                TokenKind::Close('}'),
            ]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_close_literal() {
        let src = r#""a \" b" }"#;
        let tokens: Vec<_> = Tokens::new(src, Span::new(0, src.len()))
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].span.slice(src), r#""a \" b""#);
        assert_eq!(literal_value(src, tokens[0].span), r#"a " b"#);
    }

    #[test]
    fn test_escaped_backslash_then_quote_closes_literal() {
        let src = r#"'a\\' }"#;
        assert_eq!(
            kinds(src),
            vec![TokenKind::Literal(Quote::Single), TokenKind::Close('}')]
        );
    }

    #[test]
    fn test_other_quote_kinds_are_inert_inside_literal() {
        let src = r#"`it's "fine" {}` ]"#;
        assert_eq!(
            kinds(src),
            vec![TokenKind::Literal(Quote::Backtick), TokenKind::Close(']')]
        );
    }

    #[test]
    fn test_unterminated_literal() {
        let src = "{ a: 'oops }";
        let last = Tokens::new(src, Span::new(0, src.len())).last().unwrap();
        assert_eq!(
            last,
            Err(ScanError::UnterminatedLiteral {
                span: Span::new(5, src.len())
            })
        );
    }

    #[test]
    fn test_comments_hide_quotes_and_delimiters() {
        let src = "[ // don't { count\n 'a', /* ] ' */ 'b' ]";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Open('['),
                TokenKind::Comment,
                TokenKind::Literal(Quote::Single),
                TokenKind::Comment,
                TokenKind::Literal(Quote::Single),
                TokenKind::Close(']'),
            ]
        );
    }

    #[test]
    fn test_comment_spans() {
        let src = "a // line\nb /* block */ c // end";
        let spans: Vec<_> = Tokens::new(src, Span::new(0, src.len()))
            .map(|t| t.unwrap().span.slice(src))
            .collect();
        assert_eq!(spans, vec!["// line", "/* block */", "// end"]);
    }

    #[test]
    fn test_slashes_inside_literals_are_not_comments() {
        let src = "{ url: 'https://example.com/*' }";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Open('{'),
                TokenKind::Literal(Quote::Single),
                TokenKind::Close('}'),
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let src = "{ /* a } ";
        let last = Tokens::new(src, Span::new(0, src.len())).last().unwrap();
        assert_eq!(
            last,
            Err(ScanError::UnterminatedComment {
                span: Span::new(2, src.len())
            })
        );
    }

    #[test]
    fn test_balanced_region_skips_commented_delimiters() {
        let src = "= [ 'a' /* ] */, 'b' ] ;";
        let span = balanced_region(src, 0, BRACKETS).unwrap();
        assert_eq!(span.slice(src), "[ 'a' /* ] */, 'b' ]");
    }

    #[test]
    fn test_balanced_region_tracks_outermost_pair() {
        let src = "const x = { a: { b: '}' }, c: {} }; after";
        let span = balanced_region(src, 8, BRACES).unwrap();
        assert_eq!(span.slice(src), "{ a: { b: '}' }, c: {} }");
    }

    #[test]
    fn test_balanced_region_ignores_other_delimiters() {
        let src = "= [ { tags: [\"a\"] }, ]";
        let span = balanced_region(src, 0, BRACKETS).unwrap();
        assert_eq!(span, Span::new(2, src.len()));
    }

    #[test]
    fn test_balanced_region_not_found() {
        assert_eq!(
            balanced_region("= 42;", 0, BRACES),
            Err(ScanError::NoOpening { open: '{' })
        );
    }

    #[test]
    fn test_balanced_region_unclosed() {
        let src = "= { a: { }";
        assert_eq!(
            balanced_region(src, 0, BRACES),
            Err(ScanError::Unclosed {
                open: '{',
                span: Span::new(2, src.len())
            })
        );
    }

    #[test]
    fn test_balanced_region_stray_close() {
        let err = balanced_region("= } {}", 0, BRACES).unwrap_err();
        assert!(matches!(err, ScanError::StrayClose { .. }));
        assert_eq!(err.span(), Some(Span::new(2, 3)));
    }

    #[test]
    fn test_escape_roundtrips_through_unescape() {
        let value = "it's a \"quote\" \\ and\nnewline";
        for quote in [Quote::Double, Quote::Single] {
            assert_eq!(unescape(&escape(value, quote)), value);
        }
    }

    #[test]
    fn test_escape_template_literal() {
        assert_eq!(
            escape("a `b` ${c} $d\n", Quote::Backtick),
            "a \\`b\\` \\${c} $d\n"
        );
    }
}
