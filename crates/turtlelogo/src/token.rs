use std::fmt;

use crate::{
    keyword::{Keyword, KeywordMap, Lookup},
    source::{Position, Source},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AddOp {
    Add,
    Sub,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MulOp {
    Mul,
    Div,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CmpOp {
    Lt,
    Gt,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn name(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Number(i32),
    Str(String),
    Ident(String),
    Keyword(Keyword),
    AddOp(AddOp),
    MulOp(MulOp),
    Cmp(CmpOp),
    ParenOpen,
    ParenClose,
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    EndOfText,
    Invalid,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Str(s) => write!(f, "\"{s}\""),
            TokenKind::Ident(s) => f.write_str(s),
            TokenKind::Keyword(k) => f.write_str(k.name()),
            TokenKind::AddOp(AddOp::Add) => f.write_str("+"),
            TokenKind::AddOp(AddOp::Sub) => f.write_str("-"),
            TokenKind::MulOp(MulOp::Mul) => f.write_str("*"),
            TokenKind::MulOp(MulOp::Div) => f.write_str("/"),
            TokenKind::Cmp(op) => f.write_str(op.name()),
            TokenKind::ParenOpen => f.write_str("("),
            TokenKind::ParenClose => f.write_str(")"),
            TokenKind::BraceOpen => f.write_str("{"),
            TokenKind::BraceClose => f.write_str("}"),
            TokenKind::BracketOpen => f.write_str("["),
            TokenKind::BracketClose => f.write_str("]"),
            TokenKind::EndOfText => f.write_str("end of text"),
            TokenKind::Invalid => f.write_str("invalid token"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }
}

/// Characters that may legally follow a number or a word.
fn is_separator(c: Option<u8>) -> bool {
    match c {
        None => true,
        Some(c) => {
            matches!(
                c,
                b'[' | b']'
                    | b'('
                    | b')'
                    | b'{'
                    | b'}'
                    | b'+'
                    | b'-'
                    | b'*'
                    | b'/'
                    | b'<'
                    | b'>'
                    | b'='
                    | b'!'
                    | b'"'
            ) || c.is_ascii_whitespace()
        }
    }
}

/// Turns the bytes of a [`Source`] into [`Token`]s, one at a time.
#[derive(Debug, Default)]
pub struct Lexer {
    source: Source,
    keywords: KeywordMap,
    // One byte of lookahead, and the position it was read from.
    current: Option<u8>,
    current_pos: Position,
}

impl Lexer {
    pub fn new(text: &str) -> Lexer {
        let mut ret = Lexer::default();
        ret.load(text);
        ret
    }

    /// Start over on a fresh program unit.
    pub fn load(&mut self, text: &str) {
        self.source.replace(text);
        self.bump();
    }

    fn bump(&mut self) {
        self.current_pos = self.source.position();
        self.current = self.source.next_char();
    }

    fn skip_whitespace(&mut self) {
        while self.current.map_or(false, |c| c.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn skip_to_separator(&mut self) {
        while !is_separator(self.current) {
            self.bump();
        }
    }

    fn invalid(&mut self, pos: Position) -> Token {
        self.skip_to_separator();
        Token {
            kind: TokenKind::Invalid,
            pos,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let pos = self.current_pos;
        let single = |kind| Token { kind, pos };

        let Some(c) = self.current else {
            return single(TokenKind::EndOfText);
        };

        let kind = match c {
            b'[' => TokenKind::BracketOpen,
            b']' => TokenKind::BracketClose,
            b'(' => TokenKind::ParenOpen,
            b')' => TokenKind::ParenClose,
            b'{' => TokenKind::BraceOpen,
            b'}' => TokenKind::BraceClose,
            b'+' => TokenKind::AddOp(AddOp::Add),
            b'-' => TokenKind::AddOp(AddOp::Sub),
            b'*' => TokenKind::MulOp(MulOp::Mul),
            b'/' => TokenKind::MulOp(MulOp::Div),
            b'<' => TokenKind::Cmp(CmpOp::Lt),
            b'>' => TokenKind::Cmp(CmpOp::Gt),
            b'=' => TokenKind::Cmp(CmpOp::Eq),
            b'!' => {
                self.bump();
                if self.current == Some(b'=') {
                    self.bump();
                    return single(TokenKind::Cmp(CmpOp::Ne));
                }
                return single(TokenKind::Invalid);
            }
            b'0'..=b'9' => return self.number(pos),
            b'"' => return self.string(pos),
            c if c.is_ascii_alphabetic() => return self.word(pos),
            _ => return self.invalid(pos),
        };
        self.bump();
        single(kind)
    }

    fn number(&mut self, pos: Position) -> Token {
        if self.current == Some(b'0') {
            self.bump();
            if is_separator(self.current) {
                return Token {
                    kind: TokenKind::Number(0),
                    pos,
                };
            }
            return self.invalid(pos);
        }

        let mut value: i64 = 0;
        while let Some(d @ b'0'..=b'9') = self.current {
            value = value * 10 + i64::from(d - b'0');
            if value > i64::from(i32::MAX) {
                return self.invalid(pos);
            }
            self.bump();
        }

        if !is_separator(self.current) {
            return self.invalid(pos);
        }
        Token {
            // The loop above guarantees that this fits.
            kind: TokenKind::Number(value as i32),
            pos,
        }
    }

    // Only `\"` is an escape. A backslash before anything else stands for itself,
    // and the character after it is read normally.
    fn string(&mut self, pos: Position) -> Token {
        self.bump();
        let mut bytes = Vec::new();
        loop {
            match self.current {
                None => {
                    return Token {
                        kind: TokenKind::Invalid,
                        pos,
                    }
                }
                Some(b'"') => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    if self.current == Some(b'"') {
                        bytes.push(b'"');
                        self.bump();
                    } else {
                        bytes.push(b'\\');
                    }
                }
                Some(c) => {
                    bytes.push(c);
                    self.bump();
                }
            }
        }
        Token {
            kind: TokenKind::Str(String::from_utf8_lossy(&bytes).into_owned()),
            pos,
        }
    }

    fn word(&mut self, pos: Position) -> Token {
        let mut word = String::new();
        while let Some(c) = self
            .current
            .filter(|c| c.is_ascii_alphanumeric() || *c == b'_')
        {
            word.push(char::from(c));
            self.bump();
        }

        let kind = match self.keywords.lookup(&word) {
            Lookup::Keyword(kw) => TokenKind::Keyword(kw),
            Lookup::Unresolved => TokenKind::Invalid,
            Lookup::Ident => TokenKind::Ident(word),
        };
        Token { kind, pos }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields tokens up to, but not including, the end of the text.
    fn next(&mut self) -> Option<Token> {
        let tok = self.next_token();
        log::trace!("token {} at {}", tok.kind, tok.pos);
        (tok.kind != TokenKind::EndOfText).then_some(tok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(s: &str) -> Vec<TokenKind> {
        Lexer::new(s).map(|t| t.kind).collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_owned())
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            kinds("[](){}+-*/<>= !="),
            vec![
                TokenKind::BracketOpen,
                TokenKind::BracketClose,
                TokenKind::ParenOpen,
                TokenKind::ParenClose,
                TokenKind::BraceOpen,
                TokenKind::BraceClose,
                TokenKind::AddOp(AddOp::Add),
                TokenKind::AddOp(AddOp::Sub),
                TokenKind::MulOp(MulOp::Mul),
                TokenKind::MulOp(MulOp::Div),
                TokenKind::Cmp(CmpOp::Lt),
                TokenKind::Cmp(CmpOp::Gt),
                TokenKind::Cmp(CmpOp::Eq),
                TokenKind::Cmp(CmpOp::Ne),
            ]
        );
    }

    #[test]
    fn bare_bang_is_invalid() {
        assert_eq!(kinds("! x"), vec![TokenKind::Invalid, ident("x")]);
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("0 12 2147483647"),
            vec![
                TokenKind::Number(0),
                TokenKind::Number(12),
                TokenKind::Number(i32::MAX)
            ]
        );
        assert_eq!(
            kinds("3+0)"),
            vec![
                TokenKind::Number(3),
                TokenKind::AddOp(AddOp::Add),
                TokenKind::Number(0),
                TokenKind::ParenClose
            ]
        );
    }

    #[test]
    fn bad_numbers() {
        assert_eq!(kinds("2147483648"), vec![TokenKind::Invalid]);
        assert_eq!(kinds("012 fd"), vec![TokenKind::Invalid, TokenKind::Keyword(Keyword::Fd)]);
        assert_eq!(kinds("12ab+1"), vec![
            TokenKind::Invalid,
            TokenKind::AddOp(AddOp::Add),
            TokenKind::Number(1)
        ]);
    }

    #[test]
    fn strings() {
        assert_eq!(
            kinds(r#""hello world" "" x"#),
            vec![
                TokenKind::Str("hello world".to_owned()),
                TokenKind::Str(String::new()),
                ident("x")
            ]
        );
        assert_eq!(
            kinds(r#""say \"hi\"""#),
            vec![TokenKind::Str("say \"hi\"".to_owned())]
        );
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::Str("a\\nb".to_owned())]
        );
        assert_eq!(kinds(r#""open"#), vec![TokenKind::Invalid]);
    }

    #[test]
    fn words() {
        assert_eq!(
            kinds("repeat square_2 getheading Print"),
            vec![
                TokenKind::Keyword(Keyword::Repeat),
                ident("square_2"),
                TokenKind::Keyword(Keyword::GetHeading),
                ident("Print"),
            ]
        );
    }

    #[test]
    fn unknown_characters_skip_to_separator() {
        assert_eq!(
            kinds("fd $$$abc 10"),
            vec![
                TokenKind::Keyword(Keyword::Fd),
                TokenKind::Invalid,
                TokenKind::Number(10)
            ]
        );
    }

    #[test]
    fn positions() {
        let toks: Vec<_> = Lexer::new("fd 10\n  rt 9").collect();
        assert_eq!(toks[0].pos, Position { byte: 0, row: 0, column: 0 });
        assert_eq!(toks[1].pos, Position { byte: 3, row: 0, column: 3 });
        assert_eq!(toks[2].pos, Position { byte: 8, row: 1, column: 2 });
        assert_eq!(toks[3].pos, Position { byte: 11, row: 1, column: 5 });
    }

    #[test]
    fn end_of_text_repeats() {
        let mut lex = Lexer::new("  ");
        assert_eq!(lex.next_token().kind, TokenKind::EndOfText);
        assert_eq!(lex.next_token().kind, TokenKind::EndOfText);
        lex.load("pu");
        assert_eq!(lex.next_token().kind, TokenKind::Keyword(Keyword::Pu));
    }
}
