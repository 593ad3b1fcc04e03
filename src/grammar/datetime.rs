//! `date`, `date-time`, and `zone` productions.

use std::fmt;

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{done, ParseOutcome, ParseResult};

use super::combinators::parse_space;
use super::primitives::fixed_digits_number;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar date, per `date-day "-" date-month "-" date-year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    /// Day of month, 1-31.
    pub day: u8,
    /// Month, 1-12.
    pub month: u8,
    /// Four-digit year.
    pub year: u16,
}

/// A signed offset from UTC in minutes, per `("+" / "-") 2DIGIT 2DIGIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneOffset(pub i16);

/// A full `date-time`: quoted `date SP time SP zone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    /// The calendar date.
    pub date: Date,
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-59.
    pub second: u8,
    /// UTC offset.
    pub zone: TimeZoneOffset,
}

fn month_number(text: &str) -> Option<u8> {
    MONTHS.iter().position(|m| m.eq_ignore_ascii_case(text)).map(|i| i as u8 + 1)
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let month = MONTHS.get(usize::from(self.month.saturating_sub(1))).copied().unwrap_or("Jan");
        write!(f, "{:02}-{month}-{:04}", self.day, self.year)
    }
}

impl fmt::Display for TimeZoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}{:02}{:02}", magnitude / 60, magnitude % 60)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:{:02}:{:02} {}", self.date, self.hour, self.minute, self.second, self.zone)
    }
}

/// Parses `date-text`: `date-day "-" date-month "-" date-year`, unquoted.
pub fn date(cursor: &mut Cursor<'_>) -> ParseResult<Date> {
    let start = cursor.checkpoint();
    if cursor.remaining_len() < 2 {
        return crate::outcome::incomplete();
    }
    let day_digits = cursor.take_while(|b| u8::is_ascii_digit(&b));
    if day_digits.is_empty() || day_digits.len() > 2 {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "date-day",
            hint: "expected 1 or 2 digits".to_string(),
        });
    }
    let day: u8 = std::str::from_utf8(day_digits).expect("digits are ascii").parse().map_err(|_| {
        Error::InvalidSyntax { position: start, production: "date-day", hint: "out of range".to_string() }
    })?;
    if !cursor.consume_byte(b'-') {
        if cursor.is_empty() {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
        cursor.rewind(start);
        return Err(Error::InvalidSyntax { position: start, production: "date", hint: "expected '-'".to_string() });
    }
    if cursor.remaining_len() < 3 {
        cursor.rewind(start);
        return crate::outcome::incomplete();
    }
    let month_bytes = cursor.take(3).expect("length checked");
    let month_text = std::str::from_utf8(month_bytes).map_err(|_| Error::InvalidSyntax {
        position: start,
        production: "date-month",
        hint: "not ASCII".to_string(),
    })?;
    let Some(month) = month_number(month_text) else {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "date-month",
            hint: format!("unknown month {month_text:?}"),
        });
    };
    if !cursor.consume_byte(b'-') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax { position: start, production: "date", hint: "expected '-'".to_string() });
    }
    match fixed_digits_number(cursor, 4)? {
        ParseOutcome::Done(year) => done(Date { day, month, year: year as u16 }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn zone(cursor: &mut Cursor<'_>) -> ParseResult<TimeZoneOffset> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    let sign = match cursor.peek() {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => {
            return Err(Error::InvalidSyntax {
                position: start,
                production: "zone",
                hint: "expected '+' or '-'".to_string(),
            })
        }
    };
    cursor.advance(1);
    match fixed_digits_number(cursor, 4)? {
        ParseOutcome::Done(raw) => {
            let hours = raw / 100;
            let minutes = raw % 100;
            done(TimeZoneOffset(sign * i16::try_from(hours * 60 + minutes).unwrap_or(i16::MAX)))
        }
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

/// Parses a full `date-time` value, without the surrounding DQUOTEs (the
/// caller strips those via [`super::primitives::quoted_string`] first, then
/// re-parses its contents with a fresh cursor — `date-time` only appears
/// quoted on the wire).
pub fn date_time(cursor: &mut Cursor<'_>) -> ParseResult<DateTime> {
    let start = cursor.checkpoint();
    let the_date = match date(cursor)? {
        ParseOutcome::Done(d) => d,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let hour = expect_2digit(cursor, start)?;
    let ParseOutcome::Done(hour) = hour else {
        return crate::outcome::incomplete();
    };
    if !cursor.consume_byte(b':') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax { position: start, production: "time", hint: "expected ':'".to_string() });
    }
    let ParseOutcome::Done(minute) = expect_2digit(cursor, start)? else {
        return crate::outcome::incomplete();
    };
    if !cursor.consume_byte(b':') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax { position: start, production: "time", hint: "expected ':'".to_string() });
    }
    let ParseOutcome::Done(second) = expect_2digit(cursor, start)? else {
        return crate::outcome::incomplete();
    };
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    match zone(cursor)? {
        ParseOutcome::Done(z) => done(DateTime { date: the_date, hour, minute, second, zone: z }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn expect_2digit(cursor: &mut Cursor<'_>, start: usize) -> ParseResult<u8> {
    match fixed_digits_number(cursor, 2)? {
        ParseOutcome::Done(n) => done(n as u8),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_parses_standard_form() {
        let mut cursor = Cursor::new(b"21-Nov-1997 rest");
        let d = date(&mut cursor).unwrap().done().unwrap();
        assert_eq!(d, Date { day: 21, month: 11, year: 1997 });
    }

    #[test]
    fn date_time_parses_full_value() {
        let mut cursor = Cursor::new(b"21-Nov-1997 09:55:06 -0600");
        let dt = date_time(&mut cursor).unwrap().done().unwrap();
        assert_eq!(dt.date, Date { day: 21, month: 11, year: 1997 });
        assert_eq!((dt.hour, dt.minute, dt.second), (9, 55, 6));
        assert_eq!(dt.zone, TimeZoneOffset(-360));
    }

    #[test]
    fn date_display_round_trips_through_parse() {
        let mut cursor = Cursor::new(b"21-Nov-1997");
        let d = date(&mut cursor).unwrap().done().unwrap();
        assert_eq!(d.to_string(), "21-Nov-1997");
    }

    #[test]
    fn date_time_display_matches_wire_form() {
        let dt = DateTime {
            date: Date { day: 21, month: 11, year: 1997 },
            hour: 9,
            minute: 55,
            second: 6,
            zone: TimeZoneOffset(-360),
        };
        assert_eq!(dt.to_string(), "21-Nov-1997 09:55:06 -0600");
    }

    #[test]
    fn zone_positive_offset() {
        let mut cursor = Cursor::new(b"+0530");
        assert_eq!(zone(&mut cursor).unwrap().done().unwrap(), TimeZoneOffset(330));
    }
}
