use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::FIELD_COUNT;
use crate::utils::datetime::to_timestamp;

/// Columns of a sub-hourly station record, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    Wbanno,
    UtcDate,
    UtcTime,
    LstDate,
    LstTime,
    CrxVn,
    Longitude,
    Latitude,
    AirTemperature,
    Precipitation,
    SolarRadiation,
    SrFlag,
    SurfaceTemperature,
    StType,
    StFlag,
    RelativeHumidity,
    RhFlag,
    #[serde(rename = "SOIL_MOISTURE_5")]
    SoilMoisture5,
    #[serde(rename = "SOIL_TEMPERATURE_5")]
    SoilTemperature5,
    Wetness,
    WetFlag,
    #[serde(rename = "WIND_1_5")]
    Wind1_5,
    WindFlag,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Wbanno,
        Field::UtcDate,
        Field::UtcTime,
        Field::LstDate,
        Field::LstTime,
        Field::CrxVn,
        Field::Longitude,
        Field::Latitude,
        Field::AirTemperature,
        Field::Precipitation,
        Field::SolarRadiation,
        Field::SrFlag,
        Field::SurfaceTemperature,
        Field::StType,
        Field::StFlag,
        Field::RelativeHumidity,
        Field::RhFlag,
        Field::SoilMoisture5,
        Field::SoilTemperature5,
        Field::Wetness,
        Field::WetFlag,
        Field::Wind1_5,
        Field::WindFlag,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Wbanno => "WBANNO",
            Field::UtcDate => "UTC_DATE",
            Field::UtcTime => "UTC_TIME",
            Field::LstDate => "LST_DATE",
            Field::LstTime => "LST_TIME",
            Field::CrxVn => "CRX_VN",
            Field::Longitude => "LONGITUDE",
            Field::Latitude => "LATITUDE",
            Field::AirTemperature => "AIR_TEMPERATURE",
            Field::Precipitation => "PRECIPITATION",
            Field::SolarRadiation => "SOLAR_RADIATION",
            Field::SrFlag => "SR_FLAG",
            Field::SurfaceTemperature => "SURFACE_TEMPERATURE",
            Field::StType => "ST_TYPE",
            Field::StFlag => "ST_FLAG",
            Field::RelativeHumidity => "RELATIVE_HUMIDITY",
            Field::RhFlag => "RH_FLAG",
            Field::SoilMoisture5 => "SOIL_MOISTURE_5",
            Field::SoilTemperature5 => "SOIL_TEMPERATURE_5",
            Field::Wetness => "WETNESS",
            Field::WetFlag => "WET_FLAG",
            Field::Wind1_5 => "WIND_1_5",
            Field::WindFlag => "WIND_FLAG",
        }
    }

    /// Zero-based column position
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| ProcessingError::Config(format!("Unknown record field: '{}'", s)))
    }
}

/// Which date/time column pair stamps a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clock {
    #[default]
    Utc,
    Local,
}

impl Clock {
    pub fn date_field(&self) -> Field {
        match self {
            Clock::Utc => Field::UtcDate,
            Clock::Local => Field::LstDate,
        }
    }

    pub fn time_field(&self) -> Field {
        match self {
            Clock::Utc => Field::UtcTime,
            Clock::Local => Field::LstTime,
        }
    }
}

impl FromStr for Clock {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "utc" => Ok(Clock::Utc),
            "local" | "lst" => Ok(Clock::Local),
            _ => Err(ProcessingError::Config(format!(
                "Unknown clock '{}', expected 'utc' or 'local'",
                s
            ))),
        }
    }
}

/// One annotated line: every schema field mapped to its raw token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRecord {
    values: Vec<String>,
}

impl StationRecord {
    /// Raw token for a field
    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Parse a field as a float; the sentinel is returned as-is
    pub fn value(&self, field: Field) -> Result<f64> {
        let raw = self.get(field);
        raw.parse::<f64>().map_err(|_| ProcessingError::InvalidValue {
            field: field.name(),
            value: raw.to_string(),
        })
    }

    /// Date (YYYYMMDD) + time (HHMM) of the record on the given clock
    pub fn timestamp(&self, clock: Clock) -> Result<NaiveDateTime> {
        to_timestamp(self.get(clock.date_field()), self.get(clock.time_field()))
    }

    pub fn station_id(&self) -> &str {
        self.get(Field::Wbanno)
    }

    /// (name, raw value) pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        Field::ALL
            .iter()
            .zip(self.values.iter())
            .map(|(field, value)| (field.name(), value.as_str()))
    }
}

/// Maps whitespace-tokenized lines onto the fixed field schema
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAnnotator;

impl RecordAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Annotate a line. The token count must match the schema exactly.
    ///
    /// Errors carry line 0; readers attach the real position with
    /// [`ProcessingError::at_line`].
    pub fn annotate(&self, line: &str) -> Result<StationRecord> {
        let values: Vec<String> = line.split_whitespace().map(str::to_string).collect();

        if values.len() != FIELD_COUNT {
            return Err(ProcessingError::Annotation {
                line: 0,
                expected: FIELD_COUNT,
                found: values.len(),
            });
        }

        Ok(StationRecord { values })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    /// Build a well-formed line with the given UTC date/time and air temperature
    pub(crate) fn sample_line(date: &str, time: &str, temperature: f64) -> String {
        format!(
            "25630 {date} {time} {date} {time} 2.422 -131.57 55.04 {temperature:.1} 0.0 0 0 \
             4.5 C 0 95 0 -99.000 -9999.0 -9999 0 1.03 0"
        )
    }

    #[test]
    fn test_field_order_matches_schema() {
        assert_eq!(Field::ALL.len(), FIELD_COUNT);
        assert_eq!(Field::Wbanno.index(), 0);
        assert_eq!(Field::AirTemperature.index(), 8);
        assert_eq!(Field::WindFlag.index(), 22);
        for (position, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), position);
        }
    }

    #[test]
    fn test_serialized_names_match_schema() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.name()));
            assert_eq!(serde_json::from_str::<Field>(&json).unwrap(), field);
        }
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("AIR_TEMPERATURE".parse::<Field>().unwrap(), Field::AirTemperature);
        assert_eq!("wind_1_5".parse::<Field>().unwrap(), Field::Wind1_5);
        assert!("HUMIDITY".parse::<Field>().is_err());
    }

    #[test]
    fn test_annotate_line() {
        let record = RecordAnnotator::new()
            .annotate(&sample_line("20210101", "0005", 3.4))
            .unwrap();

        assert_eq!(record.station_id(), "25630");
        assert_eq!(record.get(Field::UtcDate), "20210101");
        assert_eq!(record.get(Field::UtcTime), "0005");
        assert_eq!(record.value(Field::AirTemperature).unwrap(), 3.4);
        assert_eq!(record.iter().count(), FIELD_COUNT);
        assert_eq!(record.iter().nth(8), Some(("AIR_TEMPERATURE", "3.4")));
    }

    #[test]
    fn test_annotate_rejects_wrong_token_count() {
        let annotator = RecordAnnotator::new();

        match annotator.annotate("25630 20210101 0005") {
            Err(ProcessingError::Annotation {
                expected, found, ..
            }) => {
                assert_eq!(expected, FIELD_COUNT);
                assert_eq!(found, 3);
            }
            other => panic!("expected annotation error, got {:?}", other),
        }

        let too_long = format!("{} extra", sample_line("20210101", "0005", 1.0));
        assert!(annotator.annotate(&too_long).is_err());
    }

    #[test]
    fn test_annotation_error_line_number() {
        let err = RecordAnnotator::new().annotate("").unwrap_err().at_line(42);
        assert!(err.to_string().starts_with("Line 42:"));
    }

    #[test]
    fn test_timestamp_on_both_clocks() {
        let line = "25630 20210101 0105 20201231 1605 2.422 -131.57 55.04 3.4 0.0 0 0 \
                    4.5 C 0 95 0 -99.000 -9999.0 -9999 0 1.03 0";
        let record = RecordAnnotator::new().annotate(line).unwrap();

        let utc = record.timestamp(Clock::Utc).unwrap();
        assert_eq!(utc.date(), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!((utc.hour(), utc.minute()), (1, 5));

        let local = record.timestamp(Clock::Local).unwrap();
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
        assert_eq!((local.hour(), local.minute()), (16, 5));
    }

    #[test]
    fn test_non_numeric_value() {
        let record = RecordAnnotator::new()
            .annotate(&sample_line("20210101", "0005", 1.0))
            .unwrap();
        assert!(matches!(
            record.value(Field::StType),
            Err(ProcessingError::InvalidValue { field: "ST_TYPE", .. })
        ));
    }

    #[test]
    fn test_clock_from_str() {
        assert_eq!("UTC".parse::<Clock>().unwrap(), Clock::Utc);
        assert_eq!("lst".parse::<Clock>().unwrap(), Clock::Local);
        assert!("gmt".parse::<Clock>().is_err());
    }
}
