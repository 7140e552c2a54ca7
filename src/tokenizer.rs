//! Scans a [`CharCursor`] into a stream of [`Token`]s.
//!
//! The tokenizer is stateless across token boundaries except for the line
//! counter (owned by the cursor) and whatever quote/escape state is local to
//! scanning a single token. Callers pull tokens one at a time with
//! [`Tokenizer::next_token`].

use crate::char_cursor::CharCursor;
use crate::error::{Result, ZincError};
use crate::token::{Token, TokenKind};

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_lowercase()
}

fn is_id_part(c: char) -> bool {
    is_letter(c) || is_digit(c) || c == '_'
}

fn is_unit_char(c: char) -> bool {
    is_letter(c) || c == '%' || c == '$' || c == '/' || (c as u32) > 127
}

fn is_ref_char(c: char) -> bool {
    is_letter(c) || is_digit(c) || matches!(c, '_' | ':' | '-' | '.' | '~')
}

pub(crate) struct Tokenizer<'a> {
    cursor: CharCursor<'a>,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Tokenizer {
            cursor: CharCursor::new(input),
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Token> {
        loop {
            match self.cursor.cur() {
                Some(' ') | Some('\t') | Some('\u{00A0}') => {
                    self.cursor.advance();
                    continue;
                }
                _ => break,
            }
        }

        let line = self.cursor.line();

        match self.cursor.cur() {
            None => Ok(Token::new(TokenKind::Eof, "", line)),
            Some('\n') | Some('\r') => {
                if self.cursor.cur() == Some('\r') && self.cursor.peek() == Some('\n') {
                    self.cursor.advance();
                }
                self.cursor.advance();
                Ok(Token::new(TokenKind::Newline, "\n", line))
            }
            Some(c) if is_id_start(c) => Ok(self.scan_identifier(line)),
            Some('C') if self.cursor.peek() == Some('(') => self.scan_coord(line),
            Some(c) if c.is_ascii_uppercase() => self.scan_reserved(line),
            Some('"') => self.scan_string(line),
            Some('@') => self.scan_ref(line),
            Some('`') => self.scan_uri(line),
            Some(c) if is_digit(c) || (c == '-' && matches!(self.cursor.peek(), Some(p) if is_digit(p))) => {
                self.scan_number_like(line)
            }
            Some(_) => self.scan_symbol(line),
        }
    }

    fn scan_identifier(&mut self, line: usize) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.cursor.cur() {
            if is_id_part(c) {
                lexeme.push(c);
                self.cursor.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Id, lexeme, line)
    }

    fn scan_reserved(&mut self, line: usize) -> Result<Token> {
        let mut lexeme = String::new();
        while let Some(c) = self.cursor.cur() {
            if is_letter(c) {
                lexeme.push(c);
                self.cursor.advance();
            } else {
                break;
            }
        }
        match lexeme.as_str() {
            "N" | "M" | "R" | "NA" | "NaN" | "T" | "F" | "INF" => {
                Ok(Token::new(TokenKind::Reserved, lexeme, line))
            }
            _ => Err(ZincError::scan(line, "unrecognized reserved word", lexeme)),
        }
    }

    fn scan_string(&mut self, line: usize) -> Result<Token> {
        self.cursor.advance(); // opening quote
        let mut lexeme = String::new();
        loop {
            match self.cursor.cur() {
                None => return Err(ZincError::scan(line, "unterminated string", lexeme)),
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\n') | Some('\r') => {
                    return Err(ZincError::scan(line, "newline inside string literal", lexeme))
                }
                Some('\\') => self.scan_escape(line, &mut lexeme)?,
                Some(c) => {
                    lexeme.push(c);
                    self.cursor.advance();
                }
            }
        }
        Ok(Token::new(TokenKind::String, lexeme, line))
    }

    /// Decodes one escape sequence starting at the current `\`. Pass-through
    /// escapes (`\b \f \n \r \t \" \$ \' \` \\`) are kept as the original
    /// two-character sequence; `\uXXXX` is decoded to its scalar value.
    fn scan_escape(&mut self, line: usize, out: &mut String) -> Result<()> {
        self.cursor.advance(); // consume backslash
        match self.cursor.cur() {
            Some(c @ ('b' | 'f' | 'n' | 'r' | 't' | '"' | '$' | '\'' | '`' | '\\')) => {
                out.push('\\');
                out.push(c);
                self.cursor.advance();
                Ok(())
            }
            Some('u') => {
                self.cursor.advance();
                let mut digits = String::with_capacity(4);
                for _ in 0..4 {
                    match self.cursor.cur() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            digits.push(c);
                            self.cursor.advance();
                        }
                        _ => {
                            return Err(ZincError::scan(
                                line,
                                "invalid unicode escape",
                                digits,
                            ))
                        }
                    }
                }
                let code = u32::from_str_radix(&digits, 16)
                    .map_err(|_| ZincError::scan(line, "invalid unicode escape", digits.clone()))?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| ZincError::scan(line, "invalid unicode scalar value", digits))?;
                out.push(decoded);
                Ok(())
            }
            Some(c) => Err(ZincError::scan(line, "invalid escape sequence", c.to_string())),
            None => Err(ZincError::scan(line, "unterminated escape sequence", "")),
        }
    }

    fn scan_ref(&mut self, line: usize) -> Result<Token> {
        self.cursor.advance(); // '@'
        let mut lexeme = String::new();
        loop {
            match self.cursor.cur() {
                Some(c) if is_ref_char(c) => {
                    lexeme.push(c);
                    self.cursor.advance();
                }
                Some(' ') if self.cursor.peek() == Some('"') => {
                    lexeme.push(' ');
                    self.cursor.advance();
                    let display = self.scan_string(line)?;
                    lexeme.push('"');
                    lexeme.push_str(&display.lexeme);
                    lexeme.push('"');
                    break;
                }
                _ => break,
            }
        }
        Ok(Token::new(TokenKind::Ref, lexeme, line))
    }

    fn scan_uri(&mut self, line: usize) -> Result<Token> {
        self.cursor.advance(); // opening backtick
        let mut lexeme = String::new();
        const VERBATIM: &[char] = &[':', '/', '?', '#', '[', ']', '@', '&', '=', ';'];
        loop {
            match self.cursor.cur() {
                Some('`') => {
                    self.cursor.advance();
                    break;
                }
                None | Some('\n') => {
                    return Err(ZincError::scan(line, "unterminated uri", lexeme))
                }
                Some('\\') if matches!(self.cursor.peek(), Some(p) if VERBATIM.contains(&p)) => {
                    lexeme.push('\\');
                    self.cursor.advance();
                    lexeme.push(self.cursor.cur().unwrap());
                    self.cursor.advance();
                }
                Some('\\') => self.scan_escape(line, &mut lexeme)?,
                Some(c) => {
                    lexeme.push(c);
                    self.cursor.advance();
                }
            }
        }
        Ok(Token::new(TokenKind::Uri, lexeme, line))
    }

    fn scan_coord(&mut self, line: usize) -> Result<Token> {
        self.cursor.advance(); // 'C'
        self.cursor.advance(); // '('
        let lat = self.scan_signed_decimal(line)?;
        while self.cursor.cur() == Some(' ') {
            self.cursor.advance();
        }
        if self.cursor.cur() != Some(',') {
            return Err(ZincError::scan(line, "expected ',' in coord", lat));
        }
        self.cursor.advance();
        while self.cursor.cur() == Some(' ') {
            self.cursor.advance();
        }
        let lng = self.scan_signed_decimal(line)?;
        if self.cursor.cur() != Some(')') {
            return Err(ZincError::scan(line, "expected ')' in coord", lng));
        }
        self.cursor.advance();
        Ok(Token::new(
            TokenKind::Coord,
            format!("C({},{})", lat, lng),
            line,
        ))
    }

    fn scan_signed_decimal(&mut self, line: usize) -> Result<String> {
        let mut s = String::new();
        if self.cursor.cur() == Some('-') {
            s.push('-');
            self.cursor.advance();
        }
        let mut saw_digit = false;
        let mut saw_dot = false;
        loop {
            match self.cursor.cur() {
                Some(c) if is_digit(c) => {
                    saw_digit = true;
                    s.push(c);
                    self.cursor.advance();
                }
                Some('.') if !saw_dot => {
                    saw_dot = true;
                    s.push('.');
                    self.cursor.advance();
                }
                _ => break,
            }
        }
        if !saw_digit {
            return Err(ZincError::scan(line, "malformed decimal in coord", s));
        }
        Ok(s)
    }

    fn scan_number_like(&mut self, line: usize) -> Result<Token> {
        if self.cursor.cur() == Some('0') && self.cursor.peek() == Some('x') {
            return self.scan_hex(line);
        }

        let mut lexeme = String::new();
        let mut dashes = 0u32;
        let mut colons = 0u32;
        let mut exp = false;
        let mut unit_index = 0usize;

        loop {
            let c = match self.cursor.cur() {
                Some(c) => c,
                None => break,
            };
            if is_digit(c) {
                lexeme.push(c);
                self.cursor.advance();
                continue;
            }
            let peek = self.cursor.peek();
            if exp && (c == '+' || c == '-') {
                // exponent sign, falls through to push below
            } else if c == '-' {
                dashes += 1;
            } else if c == ':' && matches!(peek, Some(p) if is_digit(p)) {
                colons += 1;
            } else if (exp || colons >= 1) && c == '+' {
                // pass through
            } else if c == '.' {
                if !matches!(peek, Some(p) if is_digit(p)) {
                    break;
                }
            } else if (c == 'e' || c == 'E') && matches!(peek, Some(p) if p == '+' || p == '-' || is_digit(p)) {
                exp = true;
            } else if is_unit_char(c) {
                if unit_index == 0 {
                    unit_index = lexeme.len();
                }
            } else if c == '_' {
                if unit_index == 0 && matches!(peek, Some(p) if is_digit(p)) {
                    self.cursor.advance();
                    continue;
                } else if unit_index == 0 {
                    unit_index = lexeme.len();
                }
            } else {
                break;
            }
            lexeme.push(c);
            self.cursor.advance();
        }

        if dashes == 2 && colons == 0 {
            return Ok(Token::new(TokenKind::Date, lexeme, line));
        }
        if dashes == 0 && colons >= 1 {
            self.finish_time_or_datetime(line, lexeme, TokenKind::Time)
        } else if dashes >= 2 {
            self.finish_time_or_datetime(line, lexeme, TokenKind::Datetime)
        } else {
            Ok(Token::number(lexeme, line, unit_index))
        }
    }

    fn finish_time_or_datetime(
        &mut self,
        line: usize,
        mut lexeme: String,
        kind: TokenKind,
    ) -> Result<Token> {
        if self.cursor.cur() == Some(' ') && matches!(self.cursor.peek(), Some(p) if p.is_ascii_uppercase())
        {
            let tz = self.scan_timezone(line)?;
            lexeme.push_str(&tz);
        }
        Ok(Token::new(kind, lexeme, line))
    }

    fn scan_timezone(&mut self, line: usize) -> Result<String> {
        let mut tz = String::new();
        if self.cursor.cur() != Some(' ') || !matches!(self.cursor.peek(), Some(p) if p.is_ascii_uppercase())
        {
            return Err(ZincError::scan(line, "expecting timezone", tz));
        }
        self.cursor.advance(); // space
        tz.push(' ');
        while let Some(c) = self.cursor.cur() {
            if !is_id_part(c) {
                break;
            }
            tz.push(c);
            self.cursor.advance();

            if matches!(self.cursor.cur(), Some('+') | Some('-')) && tz.ends_with("GMT") {
                tz.push(self.cursor.cur().unwrap());
                self.cursor.advance();
                while matches!(self.cursor.cur(), Some(c) if is_digit(c)) {
                    tz.push(self.cursor.cur().unwrap());
                    self.cursor.advance();
                }
            }
        }
        Ok(tz)
    }

    fn scan_hex(&mut self, line: usize) -> Result<Token> {
        self.cursor.advance(); // '0'
        self.cursor.advance(); // 'x'
        let mut lexeme = String::from("0x");
        while let Some(c) = self.cursor.cur() {
            if c.is_ascii_hexdigit() {
                lexeme.push(c);
                self.cursor.advance();
            } else if c == '_' {
                self.cursor.advance();
            } else {
                break;
            }
        }
        if lexeme == "0x" {
            return Err(ZincError::scan(line, "empty hex literal", lexeme));
        }
        Ok(Token::number(lexeme, line, 0))
    }

    fn scan_symbol(&mut self, line: usize) -> Result<Token> {
        let c = self.cursor.cur().unwrap();
        self.cursor.advance();
        let (kind, lexeme): (TokenKind, &'static str) = match c {
            ',' => (TokenKind::Comma, ","),
            ':' => (TokenKind::Colon, ":"),
            ';' => (TokenKind::Semicolon, ";"),
            '[' => (TokenKind::LBracket, "["),
            ']' => (TokenKind::RBracket, "]"),
            '{' => (TokenKind::LBrace, "{"),
            '}' => (TokenKind::RBrace, "}"),
            '(' => (TokenKind::LParen, "("),
            ')' => (TokenKind::RParen, ")"),
            '<' => {
                if self.cursor.cur() == Some('<') {
                    self.cursor.advance();
                    (TokenKind::DoubleLt, "<<")
                } else if self.cursor.cur() == Some('=') {
                    self.cursor.advance();
                    (TokenKind::LtEq, "<=")
                } else {
                    (TokenKind::Lt, "<")
                }
            }
            '>' => {
                if self.cursor.cur() == Some('>') {
                    self.cursor.advance();
                    (TokenKind::DoubleGt, ">>")
                } else if self.cursor.cur() == Some('=') {
                    self.cursor.advance();
                    (TokenKind::GtEq, ">=")
                } else {
                    (TokenKind::Gt, ">")
                }
            }
            '-' => {
                if self.cursor.cur() == Some('>') {
                    self.cursor.advance();
                    (TokenKind::Arrow, "->")
                } else {
                    (TokenKind::Minus, "-")
                }
            }
            '=' => {
                if self.cursor.cur() == Some('=') {
                    self.cursor.advance();
                    (TokenKind::Eq, "==")
                } else {
                    (TokenKind::Assign, "=")
                }
            }
            '!' => {
                if self.cursor.cur() == Some('=') {
                    self.cursor.advance();
                    (TokenKind::NotEq, "!=")
                } else {
                    (TokenKind::Bang, "!")
                }
            }
            '/' => (TokenKind::Slash, "/"),
            other => return Err(ZincError::scan(line, "unexpected symbol", other.to_string())),
        };
        Ok(Token::new(kind, lexeme, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_all(input: &str) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.next_token().expect("tokenize");
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    #[test]
    fn s1_datetime_with_timezone() {
        let tokens = tokenize_all("2020-05-17T23:47:08-07:00 Los_Angeles,");
        assert_eq!(tokens[0].kind, TokenKind::Datetime);
        assert_eq!(tokens[0].lexeme, "2020-05-17T23:47:08-07:00 Los_Angeles");
        assert_eq!(tokens[1].kind, TokenKind::Comma);
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn s2_ref_with_display_name() {
        let tokens = tokenize_all(
            r#"id:@p:q01b001:r:0197767d-c51944e4 "Building One VAV1-01 Eff Heat SP""#,
        );
        assert_eq!(tokens[0].kind, TokenKind::Id);
        assert_eq!(tokens[1].kind, TokenKind::Colon);
        assert_eq!(tokens[2].kind, TokenKind::Ref);
        assert_eq!(
            tokens[2].lexeme,
            "p:q01b001:r:0197767d-c51944e4 \"Building One VAV1-01 Eff Heat SP\""
        );
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn s3_number_with_non_ascii_unit() {
        let tokens = tokenize_all("68.553\u{b0}F");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "68.553\u{b0}F");
        assert_eq!(tokens[0].unit_index, 6);
    }

    #[test]
    fn reserved_sentinels() {
        let tokens = tokenize_all("N M R T F NA NaN INF");
        let kinds: Vec<_> = tokens.iter().map(|t| t.lexeme.clone()).collect();
        assert_eq!(kinds, vec!["N", "M", "R", "T", "F", "NA", "NaN", "INF", ""]);
    }

    #[test]
    fn unknown_reserved_word_is_scan_error() {
        let mut tokenizer = Tokenizer::new("BOGUS");
        assert!(tokenizer.next_token().is_err());
    }

    #[test]
    fn string_preserves_pass_through_escapes_and_decodes_unicode() {
        let tokens = tokenize_all(r#""a\"b\ncé""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "a\\\"b\\nc\u{e9}");
    }

    #[test]
    fn coord_squeezes_whitespace() {
        let tokens = tokenize_all("C(37.545, -77.449)");
        assert_eq!(tokens[0].kind, TokenKind::Coord);
        assert_eq!(tokens[0].lexeme, "C(37.545,-77.449)");
    }

    #[test]
    fn uri_round_trips_verbatim_escapes() {
        let tokens = tokenize_all(r"`http://example.com/a\?b=c`");
        assert_eq!(tokens[0].kind, TokenKind::Uri);
        assert_eq!(tokens[0].lexeme, r"http://example.com/a\?b=c");
    }

    #[test]
    fn hex_literal_is_supported() {
        let tokens = tokenize_all("0x1_0F");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "0x10F");
    }

    #[test]
    fn newline_and_crlf_are_tokens() {
        let tokens = tokenize_all("a\nb\r\nc");
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[3].kind, TokenKind::Newline);
    }
}
