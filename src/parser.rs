//! Recursive-descent parser: turns a [`TokenCursor`] into a [`Grid`] via
//! [`GridBuilder`].

use crate::builder::GridBuilder;
use crate::dict::Dict;
use crate::error::{Result, ZincError};
use crate::grid::Grid;
use crate::scalar::{decode_escapes, is_valid_tz, NumberValue, Scalar};
use crate::token::{Token, TokenKind};
use crate::token_cursor::TokenCursor;
use crate::tokenizer::Tokenizer;

pub fn parse(text: &str) -> Result<Grid> {
    let tokenizer = Tokenizer::new(text);
    let cursor = TokenCursor::new(tokenizer)?;
    Parser { cursor }.parse_grid()
}

struct Parser<'a> {
    cursor: TokenCursor<'a>,
}

impl<'a> Parser<'a> {
    fn line(&self) -> usize {
        self.cursor.cur().line
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.cursor.cur().kind != kind {
            return Err(ZincError::parse(
                self.line(),
                format!("expected {what}, found {:?}", self.cursor.cur().kind),
            ));
        }
        let token = self.cursor.cur().clone();
        self.cursor.advance()?;
        Ok(token)
    }

    fn parse_grid(&mut self) -> Result<Grid> {
        let ver_name = self.expect(TokenKind::Id, "'ver'")?;
        if ver_name.lexeme != "ver" {
            return Err(ZincError::parse(ver_name.line, "grid must begin with 'ver'"));
        }
        self.expect(TokenKind::Colon, "':' after 'ver'")?;
        let ver_string = self.expect(TokenKind::String, "version string")?;
        let version = match ver_string.lexeme.as_str() {
            "2.0" => 2,
            "3.0" => 3,
            other => return Err(ZincError::Unsupported(format!("grid version {other:?}"))),
        };

        let grid_info = self.parse_tag_sequence()?;
        if let Some(message) = grid_info.get("err").map(|_| error_grid_message(&grid_info)) {
            log::warn!("grid reports an in-band error: {message}");
            return Err(ZincError::ErrorGrid { message });
        }
        self.expect(TokenKind::Newline, "newline after grid header")?;

        let mut builder = GridBuilder::new(version);
        builder.add_meta(grid_info);
        self.parse_colspecs(&mut builder)?;
        self.expect(TokenKind::Newline, "newline after column header")?;

        self.parse_rows(&mut builder)?;
        self.expect(TokenKind::Eof, "end of grid")?;

        let grid = builder.build()?;
        log::debug!(
            "parsed version {} grid with {} columns and {} rows",
            grid.version(),
            grid.column_info().len(),
            grid.row_count()
        );
        Ok(grid)
    }

    fn parse_tag_sequence(&mut self) -> Result<Dict> {
        let mut dict = Dict::new();
        while self.cursor.cur().kind == TokenKind::Id {
            let (name, value) = self.parse_tag()?;
            dict.insert(name, value);
        }
        Ok(dict)
    }

    fn parse_tag(&mut self) -> Result<(String, Scalar)> {
        let name_token = self.expect(TokenKind::Id, "tag name")?;
        if !name_token.lexeme.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(ZincError::parse(
                name_token.line,
                format!("tag name '{}' must start with a lowercase letter", name_token.lexeme),
            ));
        }
        if self.cursor.cur().kind == TokenKind::Colon {
            self.cursor.advance()?;
            let value = self.parse_value()?;
            Ok((name_token.lexeme, value))
        } else {
            Ok((name_token.lexeme, Scalar::Marker))
        }
    }

    fn parse_colspecs(&mut self, builder: &mut GridBuilder) -> Result<()> {
        loop {
            let name_token = self.expect(TokenKind::Id, "column name")?;
            if !name_token.lexeme.starts_with(|c: char| c.is_ascii_lowercase()) {
                return Err(ZincError::parse(
                    name_token.line,
                    format!("column name '{}' must start with a lowercase letter", name_token.lexeme),
                ));
            }
            let meta = self.parse_tag_sequence()?;
            builder.add_col(name_token.lexeme, meta)?;
            if self.cursor.cur().kind == TokenKind::Comma {
                self.cursor.advance()?;
                continue;
            }
            break;
        }
        Ok(())
    }

    fn parse_rows(&mut self, builder: &mut GridBuilder) -> Result<()> {
        loop {
            match self.cursor.cur().kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.cursor.advance()?;
                    break;
                }
                _ => {
                    let cells = self.parse_row()?;
                    builder.add_row(cells)?;
                }
            }
        }
        Ok(())
    }

    fn parse_row(&mut self) -> Result<Vec<Scalar>> {
        let mut cells = Vec::new();
        loop {
            match self.cursor.cur().kind {
                TokenKind::Comma | TokenKind::Newline | TokenKind::Eof => cells.push(Scalar::Null),
                _ => cells.push(self.parse_value()?),
            }
            if self.cursor.cur().kind == TokenKind::Comma {
                self.cursor.advance()?;
                continue;
            }
            break;
        }
        match self.cursor.cur().kind {
            TokenKind::Newline => self.cursor.advance()?,
            TokenKind::Eof => {}
            other => {
                return Err(ZincError::parse(
                    self.line(),
                    format!("expected end of row, found {other:?}"),
                ))
            }
        }
        Ok(cells)
    }

    fn parse_value(&mut self) -> Result<Scalar> {
        let line = self.line();
        if self.cursor.cur().kind == TokenKind::Minus
            && self.cursor.peek().kind == TokenKind::Reserved
            && self.cursor.peek().lexeme == "INF"
        {
            self.cursor.advance()?;
            self.cursor.advance()?;
            return Ok(Scalar::Number(NumberValue::Float(f64::NEG_INFINITY), None));
        }

        match self.cursor.cur().kind {
            TokenKind::Reserved => {
                let lexeme = self.cursor.cur().lexeme.clone();
                self.cursor.advance()?;
                reserved_to_scalar(&lexeme, line)
            }
            TokenKind::Number => {
                let token = self.cursor.cur().clone();
                self.cursor.advance()?;
                number_to_scalar(&token, line)
            }
            TokenKind::String => {
                let text = decode_escapes(&self.cursor.cur().lexeme);
                self.cursor.advance()?;
                Ok(Scalar::Str(text))
            }
            TokenKind::Ref => {
                let lexeme = self.cursor.cur().lexeme.clone();
                self.cursor.advance()?;
                ref_to_scalar(&lexeme)
            }
            TokenKind::Uri => {
                let text = decode_escapes(&self.cursor.cur().lexeme);
                self.cursor.advance()?;
                Ok(Scalar::Uri(text))
            }
            TokenKind::Coord => {
                let lexeme = self.cursor.cur().lexeme.clone();
                self.cursor.advance()?;
                coord_to_scalar(&lexeme, line)
            }
            TokenKind::Date => {
                let lexeme = self.cursor.cur().lexeme.clone();
                self.cursor.advance()?;
                date_to_scalar(&lexeme, line)
            }
            TokenKind::Time => {
                let lexeme = self.cursor.cur().lexeme.clone();
                self.cursor.advance()?;
                time_to_scalar(&lexeme, line)
            }
            TokenKind::Datetime => {
                let lexeme = self.cursor.cur().lexeme.clone();
                self.cursor.advance()?;
                datetime_to_scalar(&lexeme, line)
            }
            TokenKind::LBracket => Err(ZincError::Unsupported("list literal".to_string())),
            TokenKind::LBrace => Err(ZincError::Unsupported("dict literal in cell position".to_string())),
            other => Err(ZincError::parse(line, format!("unexpected {other:?} in value position"))),
        }
    }
}

fn error_grid_message(grid_info: &Dict) -> String {
    let dis = grid_info.get("dis").map(|v| v.to_string());
    let trace = grid_info.get("errTrace").map(|v| v.to_string());
    match (dis, trace) {
        (Some(dis), Some(trace)) => format!("{dis}: {trace}"),
        (Some(dis), None) => dis,
        (None, Some(trace)) => trace,
        (None, None) => "grid reports err".to_string(),
    }
}

fn reserved_to_scalar(lexeme: &str, line: usize) -> Result<Scalar> {
    match lexeme {
        "N" => Ok(Scalar::Null),
        "M" => Ok(Scalar::Marker),
        "R" => Ok(Scalar::Remove),
        "NA" => Ok(Scalar::Na),
        "T" => Ok(Scalar::Bool(true)),
        "F" => Ok(Scalar::Bool(false)),
        "NaN" => Ok(Scalar::Number(NumberValue::Float(f64::NAN), None)),
        "INF" => Ok(Scalar::Number(NumberValue::Float(f64::INFINITY), None)),
        other => Err(ZincError::parse(line, format!("unrecognized reserved scalar '{other}'"))),
    }
}

fn number_to_scalar(token: &Token, line: usize) -> Result<Scalar> {
    let lexeme = &token.lexeme;
    if let Some(digits) = lexeme.strip_prefix("0x") {
        let value = i64::from_str_radix(digits, 16)
            .map_err(|_| ZincError::parse(line, format!("invalid hex literal '{lexeme}'")))?;
        return Ok(Scalar::Number(NumberValue::Int(value), None));
    }

    let unit_index = token.unit_index;
    let (numeric_part, unit) = if unit_index == 0 {
        (lexeme.as_str(), None)
    } else {
        (&lexeme[..unit_index], Some(lexeme[unit_index..].to_string()))
    };
    let is_float = numeric_part.contains('.') || numeric_part.contains('e') || numeric_part.contains('E');
    let value = if is_float {
        let v: f64 = numeric_part
            .parse()
            .map_err(|_| ZincError::parse(line, format!("invalid number literal '{numeric_part}'")))?;
        NumberValue::Float(v)
    } else {
        let v: i64 = numeric_part
            .parse()
            .map_err(|_| ZincError::parse(line, format!("invalid integer literal '{numeric_part}'")))?;
        NumberValue::Int(v)
    };
    Ok(Scalar::Number(value, unit))
}

fn ref_to_scalar(lexeme: &str) -> Result<Scalar> {
    match lexeme.find(' ') {
        None => Ok(Scalar::Ref {
            uid: lexeme.to_string(),
            display: None,
        }),
        Some(idx) => {
            let uid = lexeme[..idx].to_string();
            let rest = &lexeme[idx + 1..];
            let inner = rest
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(rest);
            Ok(Scalar::Ref {
                uid,
                display: Some(decode_escapes(inner)),
            })
        }
    }
}

fn coord_to_scalar(lexeme: &str, line: usize) -> Result<Scalar> {
    let inner = lexeme
        .strip_prefix("C(")
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| ZincError::parse(line, format!("malformed coord '{lexeme}'")))?;
    let (lat_str, lng_str) = inner
        .split_once(',')
        .ok_or_else(|| ZincError::parse(line, format!("malformed coord '{lexeme}'")))?;
    let lat: f64 = lat_str
        .parse()
        .map_err(|_| ZincError::parse(line, format!("invalid coord latitude '{lat_str}'")))?;
    let lng: f64 = lng_str
        .parse()
        .map_err(|_| ZincError::parse(line, format!("invalid coord longitude '{lng_str}'")))?;
    Ok(Scalar::Coord { lat, lng })
}

fn date_to_scalar(lexeme: &str, line: usize) -> Result<Scalar> {
    let date = chrono::NaiveDate::parse_from_str(lexeme, "%Y-%m-%d")
        .map_err(|e| ZincError::parse(line, format!("invalid date '{lexeme}': {e}")))?;
    Ok(Scalar::Date(date))
}

fn time_to_scalar(lexeme: &str, line: usize) -> Result<Scalar> {
    let time_part = lexeme.split(' ').next().unwrap_or(lexeme);
    let time = parse_naive_time(time_part)
        .map_err(|e| ZincError::parse(line, format!("invalid time '{lexeme}': {e}")))?;
    Ok(Scalar::Time(time))
}

fn parse_naive_time(s: &str) -> std::result::Result<chrono::NaiveTime, chrono::ParseError> {
    if s.contains('.') {
        chrono::NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
    } else {
        chrono::NaiveTime::parse_from_str(s, "%H:%M:%S")
    }
}

fn datetime_to_scalar(lexeme: &str, line: usize) -> Result<Scalar> {
    let (instant_part, tz) = match lexeme.find(' ') {
        Some(idx) => (&lexeme[..idx], Some(lexeme[idx + 1..].to_string())),
        None => (lexeme, None),
    };
    if let Some(tz_word) = &tz {
        if !is_valid_tz(tz_word) {
            return Err(ZincError::parse(line, format!("invalid timezone word '{tz_word}'")));
        }
    }
    let instant = chrono::DateTime::parse_from_rfc3339(instant_part)
        .map_err(|e| ZincError::parse(line, format!("invalid datetime '{instant_part}': {e}")))?;
    Ok(Scalar::Datetime { instant, tz })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ver_is_parse_error() {
        assert!(parse("").is_err());
        assert!(matches!(parse("hi\n").unwrap_err(), ZincError::Parse { .. }));
    }

    #[test]
    fn unsupported_version_is_unsupported_error() {
        let err = parse("ver:\"1.0\"\nts\n").unwrap_err();
        assert!(matches!(err, ZincError::Unsupported(_)));
    }

    #[test]
    fn zero_columns_is_parse_error() {
        assert!(parse("ver:\"3.0\"\n").is_err());
    }

    #[test]
    fn s4_sentinels_in_row_data() {
        let input = "ver:\"3.0\" hisEnd:M hisStart:M\n\
ts,v0 id:@x,v1 id:@y\n\
2018-03-21T15:45:00+10:00 GMT-10,F,INF\n\
2018-03-21T15:50:00+10:00 GMT-10,N,NA\n\
2018-03-21T15:55:00+10:00 GMT-10,T,NaN\n";
        let grid = parse(input).unwrap();
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.cell(1, 0), Scalar::Bool(false));
        assert_eq!(grid.cell(1, 1), Scalar::Null);
        assert_eq!(grid.cell(1, 2), Scalar::Bool(true));
        assert_eq!(
            grid.cell(2, 0),
            Scalar::Number(NumberValue::Float(f64::INFINITY), None)
        );
        assert_eq!(grid.cell(2, 1), Scalar::Null);
        match grid.cell(2, 2) {
            Scalar::Number(NumberValue::Float(v), None) => assert!(v.is_nan()),
            other => panic!("expected NaN number, got {other:?}"),
        }
    }

    #[test]
    fn s5_error_grid() {
        let input = "ver:\"3.0\" errType:\"sys::NullErr\" err errTrace:\"boom\" dis:\"failed\"\nempty\n";
        let err = parse(input).unwrap_err();
        match err {
            ZincError::ErrorGrid { message } => assert!(message.contains("failed")),
            other => panic!("expected ErrorGrid, got {other:?}"),
        }
    }

    #[test]
    fn trailing_comma_yields_null_last_cell() {
        let input = "ver:\"3.0\"\nts,v0\n2020-01-01T00:00:00Z,\n";
        let grid = parse(input).unwrap();
        assert_eq!(grid.cell(1, 0), Scalar::Null);
    }

    #[test]
    fn negative_infinity_parses() {
        let input = "ver:\"3.0\"\nts,v0\n2020-01-01T00:00:00Z,-INF\n";
        let grid = parse(input).unwrap();
        assert_eq!(grid.cell(1, 0), Scalar::Number(NumberValue::Float(f64::NEG_INFINITY), None));
    }

    #[test]
    fn list_in_cell_position_is_unsupported() {
        let input = "ver:\"3.0\"\nts,v0\n2020-01-01T00:00:00Z,[1,2]\n";
        assert!(matches!(parse(input).unwrap_err(), ZincError::Unsupported(_)));
    }

    #[test]
    fn trailing_garbage_after_blank_line_is_parse_error() {
        let input = "ver:\"3.0\"\nts\n2020-01-01T00:00:00Z\n\ngarbage\n";
        assert!(matches!(parse(input).unwrap_err(), ZincError::Parse { .. }));
    }
}
