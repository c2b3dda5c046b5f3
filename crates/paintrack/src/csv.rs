//! CSV export and import of pain entries.
//!
//! The format is deliberately simple and matches what earlier exports
//! produced:
//!
//! ```text
//! Body Part,Pain Level,Date
//! Knee,7,"1/1/2024, 12:00:00 AM"
//! ```
//!
//! Body parts are written verbatim. One containing a comma or a quote will
//! not survive a round trip. Dates use the US locale layout at second
//! precision, so milliseconds are lost.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use tracing::debug;

use crate::entry::{PainEntry, MAX_PAIN_LEVEL};
use crate::error::{Error, Result};

/// Header row of every export.
pub const CSV_HEADER: &str = "Body Part,Pain Level,Date";

/// Default export file name.
pub const EXPORT_FILE_NAME: &str = "pain_history.csv";

/// MIME type of exported files.
pub const CSV_MIME_TYPE: &str = "text/csv";

/// Layout of the date column, e.g. `1/1/2024, 12:00:00 AM`.
const LOCALE_DATE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Date-time layouts tried on import, after RFC 3339.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y, %I:%M %p",
    "%m/%d/%Y, %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Date-only layouts tried on import; they resolve to midnight.
const NAIVE_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Time zone used to render and read the date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateZone {
    /// The system's local zone.
    #[default]
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

impl DateZone {
    /// UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Local zone for `None`, otherwise a fixed offset in minutes east of UTC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the offset is not a valid UTC offset.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Result<Self> {
        let Some(minutes) = minutes else {
            return Ok(Self::Local);
        };
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::Fixed)
            .ok_or_else(|| Error::ConfigValidation {
                message: format!("utc_offset_minutes ({minutes}) is not a valid UTC offset"),
            })
    }

    /// Render an epoch-millisecond timestamp in the export layout.
    ///
    /// Returns `None` if the timestamp is outside the representable range.
    #[must_use]
    pub fn format_timestamp(&self, timestamp_ms: i64) -> Option<String> {
        let utc = DateTime::from_timestamp_millis(timestamp_ms)?;
        let text = match self {
            Self::Local => utc.with_timezone(&Local).format(LOCALE_DATE_FORMAT).to_string(),
            Self::Fixed(offset) => utc.with_timezone(offset).format(LOCALE_DATE_FORMAT).to_string(),
        };
        Some(text)
    }

    /// Parse a date in any accepted layout into epoch milliseconds.
    ///
    /// Layouts without an offset are read in this zone.
    #[must_use]
    pub fn parse_date(&self, text: &str) -> Option<i64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.timestamp_millis());
        }

        let naive = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .or_else(|| {
                NAIVE_DATE_FORMATS
                    .iter()
                    .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })?;

        self.resolve_local(&naive)
    }

    fn resolve_local(&self, naive: &NaiveDateTime) -> Option<i64> {
        match self {
            Self::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.timestamp_millis()),
            Self::Fixed(offset) => offset
                .from_local_datetime(naive)
                .single()
                .map(|dt| dt.timestamp_millis()),
        }
    }
}

/// Why a CSV line was not imported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineRejection {
    /// The body part field is empty.
    #[error("missing body part")]
    MissingBodyPart,

    /// The pain level field is not a number.
    #[error("pain level '{value}' is not a number")]
    InvalidPainLevel {
        /// The raw field.
        value: String,
    },

    /// The pain level is a number but not a whole value on the 0-10 scale.
    #[error("pain level {value} is not a whole number from 0 to 10")]
    PainLevelOffScale {
        /// The parsed value.
        value: f64,
    },
}

/// The validated fields of one CSV line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    /// Body part, unquoted and trimmed.
    pub body_part: String,
    /// Pain level on the 0-10 scale.
    pub pain_level: u8,
    /// Raw date text, unquoted and trimmed. May be empty.
    pub date: String,
}

/// A line that was skipped during decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedLine {
    /// 1-based line number in the input.
    pub line: usize,
    /// Why it was skipped.
    pub reason: LineRejection,
}

/// Result of decoding CSV text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeReport {
    /// Entries built from valid lines, in file order, each with a fresh id.
    pub entries: Vec<PainEntry>,
    /// Lines that failed validation.
    pub rejected: Vec<RejectedLine>,
    /// Accepted lines whose date could not be read; stamped with import time.
    pub undated: usize,
}

impl DecodeReport {
    /// Number of entries successfully decoded.
    #[must_use]
    pub fn imported(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries were decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Encoder/decoder for the pain history CSV format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvCodec {
    zone: DateZone,
}

impl CsvCodec {
    /// Create a codec that renders and reads dates in `zone`.
    #[must_use]
    pub fn new(zone: DateZone) -> Self {
        Self { zone }
    }

    /// The codec's date zone.
    #[must_use]
    pub fn zone(&self) -> DateZone {
        self.zone
    }

    /// Encode entries as CSV text, header first, without a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoEntriesToExport`] for an empty slice; a header-only
    /// file is never produced.
    pub fn encode(&self, entries: &[PainEntry]) -> Result<String> {
        if entries.is_empty() {
            return Err(Error::NoEntriesToExport);
        }

        let rows: Vec<String> = entries
            .iter()
            .map(|entry| {
                let date = self.zone.format_timestamp(entry.timestamp).unwrap_or_default();
                format!("{},{},\"{date}\"", entry.body_part, entry.pain_level)
            })
            .collect();

        Ok(format!("{CSV_HEADER}\n{}", rows.join("\n")))
    }

    /// Decode CSV text into entries.
    ///
    /// The first line is always treated as the header. Blank lines are
    /// ignored and invalid lines are reported in [`DecodeReport::rejected`];
    /// decoding itself never fails.
    #[must_use]
    pub fn decode(&self, text: &str) -> DecodeReport {
        self.decode_with_fallback(text, Utc::now().timestamp_millis())
    }

    fn decode_with_fallback(&self, text: &str, fallback_timestamp: i64) -> DecodeReport {
        let mut report = DecodeReport::default();

        for (index, raw) in text.lines().enumerate().skip(1) {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let line_number = index + 1;

            match parse_line(line) {
                Ok(record) => {
                    let timestamp = self.zone.parse_date(&record.date).unwrap_or_else(|| {
                        debug!(line = line_number, date = %record.date, "Unreadable date, using import time");
                        report.undated += 1;
                        fallback_timestamp
                    });
                    report
                        .entries
                        .push(PainEntry::new(record.body_part, record.pain_level, timestamp));
                }
                Err(reason) => {
                    debug!(line = line_number, %reason, "Skipping CSV line");
                    report.rejected.push(RejectedLine {
                        line: line_number,
                        reason,
                    });
                }
            }
        }

        debug!(
            imported = report.imported(),
            rejected = report.rejected.len(),
            "Decoded CSV"
        );
        report
    }
}

/// Validate one data line.
///
/// The line is split at its first two commas into body part, pain level and
/// date, so a quoted date containing a comma stays whole. Each field loses
/// one layer of surrounding double quotes and outer whitespace.
///
/// # Errors
///
/// Returns the [`LineRejection`] describing the first failed check.
pub fn parse_line(line: &str) -> std::result::Result<ParsedRecord, LineRejection> {
    let mut fields = line.splitn(3, ',').map(unquote);
    let body_part = fields.next().unwrap_or_default();
    let pain_level = fields.next();
    let date = fields.next().unwrap_or_default();

    if body_part.is_empty() {
        return Err(LineRejection::MissingBodyPart);
    }
    let pain_level = parse_pain_level(pain_level)?;

    Ok(ParsedRecord {
        body_part: body_part.to_string(),
        pain_level,
        date: date.to_string(),
    })
}

/// An empty level field reads as 0; a missing one is rejected.
fn parse_pain_level(field: Option<&str>) -> std::result::Result<u8, LineRejection> {
    let field = field.ok_or_else(|| LineRejection::InvalidPainLevel {
        value: String::new(),
    })?;
    if field.is_empty() {
        return Ok(0);
    }

    let value = field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LineRejection::InvalidPainLevel {
            value: field.to_string(),
        })?;

    #[allow(clippy::float_cmp)]
    let whole = value.trunc() == value;
    if !whole || !(0.0..=f64::from(MAX_PAIN_LEVEL)).contains(&value) {
        return Err(LineRejection::PainLevelOffScale { value });
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let level = value as u8;
    Ok(level)
}

/// Trim a field and strip one layer of surrounding double quotes.
fn unquote(field: &str) -> &str {
    let trimmed = field.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2024-01-01T00:00:00Z
    const NEW_YEAR_2024: i64 = 1_704_067_200_000;

    fn utc_codec() -> CsvCodec {
        CsvCodec::new(DateZone::utc())
    }

    #[test]
    fn test_encode_single_entry() {
        let entry = PainEntry::new("Knee", 7, NEW_YEAR_2024);
        let csv = utc_codec().encode(&[entry]).unwrap();
        assert_eq!(
            csv,
            "Body Part,Pain Level,Date\nKnee,7,\"1/1/2024, 12:00:00 AM\""
        );
    }

    #[test]
    fn test_encode_afternoon_and_order() {
        let entries = vec![
            PainEntry::new("Knee", 7, NEW_YEAR_2024 + 13 * 3_600_000),
            PainEntry::new("Lower back", 3, NEW_YEAR_2024 + 86_400_000 * 40),
        ];
        let csv = utc_codec().encode(&entries).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "Knee,7,\"1/1/2024, 1:00:00 PM\"");
        assert_eq!(lines[2], "Lower back,3,\"2/10/2024, 12:00:00 AM\"");
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_encode_empty_is_refused() {
        let err = utc_codec().encode(&[]).unwrap_err();
        assert!(err.is_nothing_to_export());
        assert_eq!(err.to_string(), "No entries to export");
    }

    #[test]
    fn test_encode_uses_fixed_offset() {
        let codec = CsvCodec::new(DateZone::from_offset_minutes(Some(-300)).unwrap());
        let csv = codec.encode(&[PainEntry::new("Hip", 2, NEW_YEAR_2024)]).unwrap();
        assert!(csv.ends_with("Hip,2,\"12/31/2023, 7:00:00 PM\""));
    }

    #[test]
    fn test_decode_locale_line() {
        let report =
            utc_codec().decode("Body Part,Pain Level,Date\nKnee,7,\"1/1/2024, 12:00:00 AM\"\n");
        assert_eq!(report.imported(), 1);
        let entry = &report.entries[0];
        assert_eq!(entry.body_part, "Knee");
        assert_eq!(entry.pain_level, 7);
        assert_eq!(entry.timestamp, NEW_YEAR_2024);
        assert!(report.rejected.is_empty());
        assert_eq!(report.undated, 0);
    }

    #[test]
    fn test_decode_skips_non_numeric_level() {
        let report = utc_codec().decode("Body Part,Pain Level,Date\nKnee,notanumber,\"...\"\n");
        assert!(report.is_empty());
        assert_eq!(
            report.rejected,
            vec![RejectedLine {
                line: 2,
                reason: LineRejection::InvalidPainLevel {
                    value: "notanumber".to_string()
                },
            }]
        );
    }

    #[test]
    fn test_decode_always_skips_first_line() {
        let report = utc_codec().decode("Knee,7,\"1/1/2024, 12:00:00 AM\"");
        assert!(report.is_empty());
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_decode_empty_text() {
        assert!(utc_codec().decode("").is_empty());
    }

    #[test]
    fn test_decode_ignores_blank_lines_and_crlf() {
        let text = "Body Part,Pain Level,Date\r\n\r\nKnee,7,\"1/1/2024, 12:00:00 AM\"\r\n   \r\nNeck,2,\"1/2/2024, 8:30:00 PM\"\r\n";
        let report = utc_codec().decode(text);
        assert_eq!(report.imported(), 2);
        assert_eq!(report.entries[1].body_part, "Neck");
        assert_eq!(
            report.entries[1].timestamp,
            NEW_YEAR_2024 + 86_400_000 + 20 * 3_600_000 + 30 * 60_000
        );
    }

    #[test]
    fn test_decode_assigns_fresh_ids() {
        let text = "h\nKnee,7,\"1/1/2024, 12:00:00 AM\"\nKnee,7,\"1/1/2024, 12:00:00 AM\"";
        let report = utc_codec().decode(text);
        assert_eq!(report.imported(), 2);
        assert_ne!(report.entries[0].id, report.entries[1].id);
    }

    #[test]
    fn test_decode_rejects_blank_body_part() {
        let report = utc_codec().decode("h\n\"\",5,\"1/1/2024, 12:00:00 AM\"\n  ,5,x");
        assert!(report.is_empty());
        assert_eq!(report.rejected.len(), 2);
        assert!(report
            .rejected
            .iter()
            .all(|r| r.reason == LineRejection::MissingBodyPart));
    }

    #[test]
    fn test_decode_rejects_off_scale_levels() {
        let report = utc_codec().decode("h\nKnee,11,x\nKnee,-1,x\nKnee,7.5,x\nKnee,NaN,x");
        assert!(report.is_empty());
        assert_eq!(report.rejected.len(), 4);
        assert_eq!(
            report.rejected[0].reason,
            LineRejection::PainLevelOffScale { value: 11.0 }
        );
        assert_eq!(
            report.rejected[3].reason,
            LineRejection::InvalidPainLevel {
                value: "NaN".to_string()
            }
        );
    }

    #[test]
    fn test_decode_accepts_whole_float_level() {
        let report = utc_codec().decode("h\nKnee,7.0,\"1/1/2024, 12:00:00 AM\"");
        assert_eq!(report.entries[0].pain_level, 7);
    }

    #[test]
    fn test_decode_unreadable_date_uses_fallback() {
        let report = utc_codec().decode_with_fallback("h\nKnee,4,\"someday\"\nHip,2", 42);
        assert_eq!(report.imported(), 2);
        assert_eq!(report.undated, 2);
        assert!(report.entries.iter().all(|e| e.timestamp == 42));
    }

    #[test]
    fn test_decode_body_part_with_comma_is_lost() {
        // Known limitation: body parts are not escaped on export.
        let entry = PainEntry::new("Left, knee", 6, NEW_YEAR_2024);
        let csv = utc_codec().encode(&[entry]).unwrap();
        let report = utc_codec().decode(&csv);
        assert!(report.is_empty());
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn test_round_trip_fixed_zone() {
        let entries = vec![
            PainEntry::new("Knee", 7, NEW_YEAR_2024),
            PainEntry::new("Lower back", 0, NEW_YEAR_2024 + 45_296_000),
            PainEntry::new("Shoulder", 10, 1_718_450_123_000),
        ];
        let codec = utc_codec();
        let report = codec.decode(&codec.encode(&entries).unwrap());

        assert_eq!(report.imported(), entries.len());
        for (original, decoded) in entries.iter().zip(&report.entries) {
            assert_eq!(decoded.body_part, original.body_part);
            assert_eq!(decoded.pain_level, original.pain_level);
            assert_eq!(decoded.timestamp, original.timestamp);
        }
    }

    #[test]
    fn test_round_trip_local_zone() {
        // Mid-June noon, clear of any DST transition.
        let entry = PainEntry::new("Wrist", 4, 1_718_452_800_000);
        let codec = CsvCodec::default();
        let report = codec.decode(&codec.encode(&[entry.clone()]).unwrap());

        assert_eq!(report.imported(), 1);
        assert_eq!(report.entries[0].body_part, entry.body_part);
        assert_eq!(report.entries[0].pain_level, entry.pain_level);
        assert_eq!(report.entries[0].timestamp, entry.timestamp);
    }

    #[test]
    fn test_round_trip_drops_milliseconds() {
        let entry = PainEntry::new("Knee", 7, NEW_YEAR_2024 + 789);
        let codec = utc_codec();
        let report = codec.decode(&codec.encode(&[entry]).unwrap());
        assert_eq!(report.entries[0].timestamp, NEW_YEAR_2024);
    }

    #[test]
    fn test_parse_line_strips_quotes() {
        let record = parse_line("\"Knee\", \"7\" ,\"1/1/2024, 12:00:00 AM\"").unwrap();
        assert_eq!(
            record,
            ParsedRecord {
                body_part: "Knee".to_string(),
                pain_level: 7,
                date: "1/1/2024, 12:00:00 AM".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_line_missing_level() {
        assert_eq!(
            parse_line("Knee"),
            Err(LineRejection::InvalidPainLevel {
                value: String::new()
            })
        );
    }

    #[test]
    fn test_parse_line_empty_level_is_zero() {
        let record = parse_line("Knee,,\"1/1/2024, 12:00:00 AM\"").unwrap();
        assert_eq!(record.pain_level, 0);
        assert_eq!(parse_line("Knee, \"\" ,x").unwrap().pain_level, 0);
    }

    #[test]
    fn test_decode_empty_level_imports_as_zero() {
        let report = utc_codec().decode("Body Part,Pain Level,Date\nKnee,,\"1/1/2024, 12:00:00 AM\"");
        assert!(report.rejected.is_empty());
        assert_eq!(report.imported(), 1);
        assert_eq!(report.entries[0].pain_level, 0);
        assert_eq!(report.entries[0].timestamp, NEW_YEAR_2024);
    }

    #[test]
    fn test_unquote_single_layer_only() {
        assert_eq!(unquote("\"\"Knee\"\""), "\"Knee\"");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("  plain "), "plain");
    }

    #[test]
    fn test_parse_date_layouts() {
        let zone = DateZone::utc();
        assert_eq!(zone.parse_date("1/1/2024, 12:00:00 AM"), Some(NEW_YEAR_2024));
        assert_eq!(zone.parse_date("01/01/2024 12:00:00 AM"), Some(NEW_YEAR_2024));
        assert_eq!(zone.parse_date("2024-01-01T00:00:00Z"), Some(NEW_YEAR_2024));
        assert_eq!(
            zone.parse_date("2024-01-01T01:00:00+01:00"),
            Some(NEW_YEAR_2024)
        );
        assert_eq!(zone.parse_date("2024-01-01 00:00:00"), Some(NEW_YEAR_2024));
        assert_eq!(zone.parse_date("2024-01-01"), Some(NEW_YEAR_2024));
        assert_eq!(zone.parse_date("1/1/2024"), Some(NEW_YEAR_2024));
        assert_eq!(zone.parse_date(""), None);
        assert_eq!(zone.parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_date_respects_fixed_offset() {
        let zone = DateZone::from_offset_minutes(Some(60)).unwrap();
        assert_eq!(
            zone.parse_date("1/1/2024, 1:00:00 AM"),
            Some(NEW_YEAR_2024)
        );
    }

    #[test]
    fn test_from_offset_minutes() {
        assert_eq!(DateZone::from_offset_minutes(None).unwrap(), DateZone::Local);
        assert_eq!(DateZone::from_offset_minutes(Some(0)).unwrap(), DateZone::utc());
        assert!(DateZone::from_offset_minutes(Some(24 * 60)).is_err());
        assert!(DateZone::from_offset_minutes(Some(i32::MAX)).is_err());
    }

    #[test]
    fn test_format_timestamp_out_of_range() {
        assert_eq!(DateZone::utc().format_timestamp(i64::MAX), None);
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(LineRejection::MissingBodyPart.to_string(), "missing body part");
        assert!(LineRejection::PainLevelOffScale { value: 12.0 }
            .to_string()
            .contains("12"));
    }
}
