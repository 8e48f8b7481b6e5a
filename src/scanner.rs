//! Lexical analyzer.

use crate::diag::{Diagnostic, Diagnostics};
use crate::token::{keyword, Token, TokenKind};

/// Turns a source string into a flat token sequence in one left-to-right
/// pass.
///
/// Lexical errors are reported to the diagnostics collector and scanning
/// continues, so a single pass can surface several of them.  The produced
/// sequence always ends with an `Eof` token.
pub struct Scanner<'s, 'd> {
    source: &'s str,
    diagnostics: &'d mut Diagnostics,
    tokens: Vec<Token>,

    // Byte offsets into `source`.
    start: usize,
    current: usize,
    line: u32,
}

impl<'s, 'd> Scanner<'s, 'd> {
    pub fn new(source: &'s str, diagnostics: &'d mut Diagnostics) -> Scanner<'s, 'd> {
        Scanner {
            source,
            diagnostics,
            tokens: vec![],
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", self.line));
        self.tokens
    }

    fn scan_token(&mut self) {
        let ch = self.advance();
        match ch {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            ';' => self.add_token(TokenKind::Semicolon),
            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            '%' => self.add_token(TokenKind::Percent),
            '!' => {
                let kind = if self.matches('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.matches('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '#' => {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }
            '"' => self.scan_string(),
            ' ' | '\r' | '\t' => (),
            '\n' => self.line += 1,
            _ => {
                if ch.is_ascii_digit() {
                    self.scan_number();
                } else if is_alpha(ch) {
                    self.scan_identifier();
                } else {
                    self.diagnostics
                        .report(Diagnostic::new(self.line, "", "Unexpected character."));
                }
            }
        }
    }

    fn scan_string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.diagnostics
                .report(Diagnostic::new(self.line, "", "Unterminated string."));
            return;
        }

        // Closing quote.
        self.advance();

        let literal = &self.source[self.start + 1..self.current - 1];
        self.tokens
            .push(Token::new(TokenKind::String, literal, self.line));
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A fractional part needs a digit after the dot, otherwise the dot
        // is left for the next token.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.add_token(TokenKind::Number);
    }

    fn scan_identifier(&mut self) {
        while is_alphanumeric(self.peek()) {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        self.add_token(keyword(text).unwrap_or(TokenKind::Identifier));
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = &self.source[self.start..self.current];
        self.tokens.push(Token::new(kind, lexeme, self.line));
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.current += ch.len_utf8();
        ch
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.current += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

fn is_alpha(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_alphanumeric(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Diagnostics;

    fn scan(input: &str) -> Vec<Token> {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(input, &mut diagnostics).scan_tokens();
        assert!(!diagnostics.had_error(), "unexpected diagnostics");
        tokens
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        scan(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_yields_only_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn fixed_tokens() {
        assert_eq!(
            kinds("(){},.;+-*/%"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Semicolon,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn one_and_two_char_operators() {
        assert_eq!(
            kinds("! != = == < <= > >="),
            vec![
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers_keep_their_lexeme() {
        let tokens = scan("42 3.14");
        assert_eq!(tokens[0], Token::new(TokenKind::Number, "42", 1));
        assert_eq!(tokens[1], Token::new(TokenKind::Number, "3.14", 1));
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() {
        assert_eq!(
            kinds("1."),
            vec![TokenKind::Number, TokenKind::Dot, TokenKind::Eof]
        );
    }

    #[test]
    fn string_lexeme_excludes_quotes() {
        let tokens = scan("\"hello world\"");
        assert_eq!(tokens[0], Token::new(TokenKind::String, "hello world", 1));
    }

    #[test]
    fn strings_may_span_lines() {
        let tokens = scan("\"a\nb\" x");
        assert_eq!(tokens[0], Token::new(TokenKind::String, "a\nb", 2));
        assert_eq!(tokens[1], Token::new(TokenKind::Identifier, "x", 2));
    }

    #[test]
    fn unterminated_string_is_reported_without_aborting() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("print \"oops", &mut diagnostics).scan_tokens();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.iter().next().map(|d| d.message.as_str()),
            Some("Unterminated string.")
        );
        // The tokens before the bad literal survive.
        assert_eq!(tokens[0].kind, TokenKind::Print);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn unexpected_character_is_reported_and_skipped() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("1 @ 2", &mut diagnostics).scan_tokens();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            kinds("foo _bar t42 while whiled"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::While,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn all_keywords() {
        assert_eq!(
            kinds("and class else false for fun if nil or print return super this true var while"),
            vec![
                TokenKind::And,
                TokenKind::Class,
                TokenKind::Else,
                TokenKind::False,
                TokenKind::For,
                TokenKind::Fun,
                TokenKind::If,
                TokenKind::Nil,
                TokenKind::Or,
                TokenKind::Print,
                TokenKind::Return,
                TokenKind::Super,
                TokenKind::This,
                TokenKind::True,
                TokenKind::Var,
                TokenKind::While,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("1 # two three\n4"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn lines_are_tracked_and_non_decreasing() {
        let tokens = scan("1\n2 3\n# comment\n4");
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 2, 4, 4]);
        assert!(lines.windows(2).all(|w| w[0] <= w[1]));
    }
}
