use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::Result;
use crate::utils::constants::{DATE_FORMAT, OUTPUT_TIMESTAMP_FORMAT, TIME_FORMAT};

/// Combine a YYYYMMDD date token and a zero-padded HHMM time token
pub fn to_timestamp(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT)?;
    let time = NaiveTime::parse_from_str(time, TIME_FORMAT)?;
    Ok(date.and_time(time))
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(OUTPUT_TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter writing timestamps as `YYYY-MM-DD HH:MM` in output rows
pub mod output_format {
    use super::OUTPUT_TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&timestamp.format(OUTPUT_TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, OUTPUT_TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_timestamp() {
        let ts = to_timestamp("20210315", "2355").unwrap();
        assert_eq!(format_timestamp(&ts), "2021-03-15 23:55");

        let midnight = to_timestamp("20210101", "0000").unwrap();
        assert_eq!(format_timestamp(&midnight), "2021-01-01 00:00");
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(to_timestamp("20211301", "0000").is_err());
        assert!(to_timestamp("20210101", "2460").is_err());
        assert!(to_timestamp("2021-01-01", "0000").is_err());
    }

    #[test]
    fn test_output_format_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Row {
            #[serde(with = "output_format")]
            timestamp: NaiveDateTime,
        }

        let row = Row {
            timestamp: to_timestamp("20210315", "0105").unwrap(),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"timestamp":"2021-03-15 01:05"}"#);

        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp, row.timestamp);
    }
}
