use crate::core::{
    GrabError,
    ResultRow,
};

/// Reads a tuple-list rendering (as printed by [`super::render_tuples`]) back into rows.
///
/// Text between tuples is skipped, so a dump wrapped in brackets, split over
/// several lines or concatenated from several runs all parse the same.
pub fn parse_rows(text: &str) -> Result<Vec<ResultRow>, GrabError> {
    let mut cursor = Cursor { text, pos: 0 };
    let mut rows = Vec::new();

    while cursor.skip_to('(') {
        cursor.bump();
        let card_id = cursor.integer()?;
        let mut strings = Vec::with_capacity(5);
        for _ in 0..5 {
            cursor.expect(',')?;
            strings.push(cursor.string()?);
        }
        cursor.expect(')')?;

        let mut strings = strings.into_iter();
        let mut next = || strings.next().unwrap_or_default();
        rows.push(ResultRow {
            card_id,
            sentence: next(),
            field_a: next(),
            field_b: next(),
            field_c: next(),
            image: next(),
        });
    }

    Ok(rows)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> GrabError {
        GrabError::Dump { offset: self.pos, message: message.into() }
    }

    /// Moves to the next `target`; false once the text runs out.
    fn skip_to(&mut self, target: char) -> bool {
        match self.text[self.pos..].find(target) {
            Some(offset) => {
                self.pos += offset;
                true
            }
            None => {
                self.pos = self.text.len();
                false
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), GrabError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn integer(&mut self) -> Result<u64, GrabError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if start == self.pos {
            return Err(self.error("expected a card id"));
        }
        self.text[start..self.pos].parse().map_err(|_| GrabError::Dump {
            offset: start,
            message: "card id out of range".to_string(),
        })
    }

    fn string(&mut self) -> Result<String, GrabError> {
        self.skip_whitespace();
        let quote = match self.bump() {
            Some(c @ ('\'' | '"')) => c,
            _ => return Err(self.error("expected a quoted string")),
        };

        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), GrabError> {
        match self.bump() {
            None => Err(self.error("unterminated string")),
            Some('n') => {
                out.push('\n');
                Ok(())
            }
            Some('r') => {
                out.push('\r');
                Ok(())
            }
            Some('t') => {
                out.push('\t');
                Ok(())
            }
            Some(c @ ('\\' | '\'' | '"')) => {
                out.push(c);
                Ok(())
            }
            Some('x') => self.code_point(2, out),
            Some('u') => self.code_point(4, out),
            Some('U') => self.code_point(8, out),
            // Unknown escapes are kept as written
            Some(c) => {
                out.push('\\');
                out.push(c);
                Ok(())
            }
        }
    }

    fn code_point(&mut self, digits: usize, out: &mut String) -> Result<(), GrabError> {
        let text = self.text;
        let start = self.pos;
        let hex = text
            .get(start..start + digits)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("bad escape sequence"))?;

        let c = u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("bad escape sequence"))?;

        self.pos += digits;
        out.push(c);
        Ok(())
    }
}
