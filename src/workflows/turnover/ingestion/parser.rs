use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// One parsed feed entry: the guest stay the turnover follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedParseError {
    #[error("event beginning at line {line} has no UID")]
    MissingUid { line: usize },
    #[error("event '{uid}' is missing {field}")]
    MissingField { uid: String, field: &'static str },
    #[error("event '{uid}' carries unparseable timestamp '{value}'")]
    InvalidTimestamp { uid: String, value: String },
    #[error("feed ended inside an unterminated VEVENT block")]
    UnterminatedEvent,
}

/// Parse the iCalendar subset the booking platforms emit: VEVENT blocks
/// with UID, DTSTART, and DTEND. Anything else in the feed is ignored.
pub fn parse_events(feed: &str) -> Result<Vec<CalendarEvent>, FeedParseError> {
    let mut events = Vec::new();
    let mut current: Option<PartialEvent> = None;

    for (index, raw_line) in feed.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r').trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            current = Some(PartialEvent::new(index + 1));
            continue;
        }

        if line.eq_ignore_ascii_case("END:VEVENT") {
            if let Some(partial) = current.take() {
                events.push(partial.finish()?);
            }
            continue;
        }

        let Some(partial) = current.as_mut() else {
            continue;
        };

        let Some((name, value)) = split_property(line) else {
            continue;
        };

        match name.to_ascii_uppercase().as_str() {
            "UID" => partial.uid = Some(value.to_string()),
            "DTSTART" => partial.start = Some(value.to_string()),
            "DTEND" => partial.end = Some(value.to_string()),
            _ => {}
        }
    }

    if current.is_some() {
        return Err(FeedParseError::UnterminatedEvent);
    }

    Ok(events)
}

struct PartialEvent {
    line: usize,
    uid: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

impl PartialEvent {
    fn new(line: usize) -> Self {
        Self {
            line,
            uid: None,
            start: None,
            end: None,
        }
    }

    fn finish(self) -> Result<CalendarEvent, FeedParseError> {
        let uid = self.uid.ok_or(FeedParseError::MissingUid { line: self.line })?;
        let start = self.start.ok_or_else(|| FeedParseError::MissingField {
            uid: uid.clone(),
            field: "DTSTART",
        })?;
        let end = self.end.ok_or_else(|| FeedParseError::MissingField {
            uid: uid.clone(),
            field: "DTEND",
        })?;

        let start = parse_timestamp(&start).ok_or_else(|| FeedParseError::InvalidTimestamp {
            uid: uid.clone(),
            value: start.clone(),
        })?;
        let end = parse_timestamp(&end).ok_or_else(|| FeedParseError::InvalidTimestamp {
            uid: uid.clone(),
            value: end.clone(),
        })?;

        Ok(CalendarEvent { uid, start, end })
    }
}

/// Split `NAME;PARAM=X:value` into (`NAME`, `value`), dropping any property
/// parameters between the name and the colon.
fn split_property(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let (head, value) = line.split_at(colon);
    let name = head.split(';').next().unwrap_or(head);
    Some((name.trim(), value[1..].trim()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y%m%dT%H%M%SZ") {
        return Some(dt.and_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y%m%dT%H%M%S") {
        return Some(dt.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y%m%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
        PRODID:-//Booking//EN\r\n\
        BEGIN:VEVENT\r\n\
        UID:stay-001@feed\r\n\
        DTSTART:20260412T150000Z\r\n\
        DTEND:20260415T110000Z\r\n\
        SUMMARY:Reserved\r\n\
        END:VEVENT\r\n\
        BEGIN:VEVENT\r\n\
        UID:stay-002@feed\r\n\
        DTSTART;VALUE=DATE:20260420\r\n\
        DTEND;VALUE=DATE:20260423\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    #[test]
    fn parses_events_and_ignores_unknown_properties() {
        let events = parse_events(FEED).expect("feed parses");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].uid, "stay-001@feed");
        assert_eq!(events[0].start.to_rfc3339(), "2026-04-12T15:00:00+00:00");
        assert_eq!(events[1].uid, "stay-002@feed");
        assert_eq!(events[1].end.to_rfc3339(), "2026-04-23T00:00:00+00:00");
    }

    #[test]
    fn missing_uid_is_an_error() {
        let feed = "BEGIN:VEVENT\nDTSTART:20260412T150000Z\nDTEND:20260415T110000Z\nEND:VEVENT\n";
        assert!(matches!(
            parse_events(feed),
            Err(FeedParseError::MissingUid { line: 1 })
        ));
    }

    #[test]
    fn missing_end_time_is_an_error() {
        let feed = "BEGIN:VEVENT\nUID:x\nDTSTART:20260412T150000Z\nEND:VEVENT\n";
        assert_eq!(
            parse_events(feed),
            Err(FeedParseError::MissingField {
                uid: "x".to_string(),
                field: "DTEND",
            })
        );
    }

    #[test]
    fn garbage_timestamp_is_an_error() {
        let feed = "BEGIN:VEVENT\nUID:x\nDTSTART:whenever\nDTEND:20260415T110000Z\nEND:VEVENT\n";
        assert_eq!(
            parse_events(feed),
            Err(FeedParseError::InvalidTimestamp {
                uid: "x".to_string(),
                value: "whenever".to_string(),
            })
        );
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let feed = "BEGIN:VEVENT\nUID:x\nDTSTART:20260412T150000Z\nDTEND:20260415T110000Z\n";
        assert_eq!(parse_events(feed), Err(FeedParseError::UnterminatedEvent));
    }
}
