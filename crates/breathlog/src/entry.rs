//! Core log entry types for breathlog.
//!
//! This module defines one wellness check-in ([`LogEntry`]), the ordered,
//! append-only history it lives in ([`LogCollection`]), and the advisory range
//! checks applied to captured readings.
//!
//! The JSON shape matches what the web form stored: camelCase keys, readings
//! as the raw text typed into the input, and an empty string for an unset
//! breathing choice.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Advisory bounds for blood-oxygen readings, in percent.
pub const OXYGEN_RANGE: RangeInclusive<f64> = 80.0..=100.0;

/// Advisory bounds for heart-rate readings, in beats per minute.
pub const HEART_RATE_RANGE: RangeInclusive<f64> = 30.0..=200.0;

/// How breathing feels compared to usual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breathing {
    /// Breathing is better than usual.
    Better,
    /// Breathing is about the same.
    Same,
    /// Breathing is worse than usual.
    Worse,
}

impl Breathing {
    /// All choices, in the order the form presents them.
    pub const ALL: [Self; 3] = [Self::Better, Self::Same, Self::Worse];

    /// Lowercase name as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Better => "better",
            Self::Same => "same",
            Self::Worse => "worse",
        }
    }
}

impl fmt::Display for Breathing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Breathing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "better" => Ok(Self::Better),
            "same" => Ok(Self::Same),
            "worse" => Ok(Self::Worse),
            _ => Err(Error::invalid_field("breathing", s)),
        }
    }
}

/// The meal time a gated check-in belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MealTime {
    /// Morning check-in.
    Breakfast,
    /// Midday check-in.
    Lunch,
    /// Evening check-in.
    Dinner,
}

impl MealTime {
    /// All meal times, in the order of the day.
    pub const ALL: [Self; 3] = [Self::Breakfast, Self::Lunch, Self::Dinner];

    /// The meal slot populated by entries captured at this meal time.
    #[must_use]
    pub fn slot(self) -> MealSlot {
        match self {
            Self::Breakfast => MealSlot::Breakfast,
            Self::Lunch => MealSlot::Lunch,
            Self::Dinner => MealSlot::Dinner,
        }
    }
}

impl fmt::Display for MealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breakfast => f.write_str("Breakfast"),
            Self::Lunch => f.write_str("Lunch"),
            Self::Dinner => f.write_str("Dinner"),
        }
    }
}

impl FromStr for MealTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            _ => Err(Error::invalid_field("meal time", s)),
        }
    }
}

/// A named slot in the meals record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    /// Breakfast.
    Breakfast,
    /// Lunch.
    Lunch,
    /// Dinner.
    Dinner,
    /// Anything eaten between meals.
    Snacks,
}

impl MealSlot {
    /// All slots, in display order.
    pub const ALL: [Self; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snacks];

    /// Lowercase name as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snacks => "snacks",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snacks" | "snack" => Ok(Self::Snacks),
            _ => Err(Error::invalid_field("meal slot", s)),
        }
    }
}

/// Free-text meal descriptions keyed by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meals {
    /// What was eaten for breakfast.
    pub breakfast: String,
    /// What was eaten for lunch.
    pub lunch: String,
    /// What was eaten for dinner.
    pub dinner: String,
    /// Snacks.
    pub snacks: String,
}

impl Meals {
    /// Text recorded for a slot.
    #[must_use]
    pub fn get(&self, slot: MealSlot) -> &str {
        match slot {
            MealSlot::Breakfast => &self.breakfast,
            MealSlot::Lunch => &self.lunch,
            MealSlot::Dinner => &self.dinner,
            MealSlot::Snacks => &self.snacks,
        }
    }

    /// Replace the text for a slot.
    pub fn set(&mut self, slot: MealSlot, text: impl Into<String>) {
        let text = text.into();
        match slot {
            MealSlot::Breakfast => self.breakfast = text,
            MealSlot::Lunch => self.lunch = text,
            MealSlot::Dinner => self.dinner = text,
            MealSlot::Snacks => self.snacks = text,
        }
    }

    /// A copy holding only `slot`, every other slot empty.
    #[must_use]
    pub fn only(&self, slot: MealSlot) -> Self {
        let mut meals = Self::default();
        meals.set(slot, self.get(slot));
        meals
    }

    /// True if no slot has any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        MealSlot::ALL.iter().all(|slot| self.get(*slot).is_empty())
    }
}

/// A numeric reading as it was typed.
///
/// The raw text is kept so that whatever the user entered is stored and shown
/// back unchanged; [`Reading::value`] coerces it to a number on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Reading(String);

impl Reading {
    /// Wrap raw input text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The text as entered.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// True if nothing was entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Numeric value, or `None` for empty or non-numeric input.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Check the reading against advisory bounds.
    ///
    /// Empty readings produce no advisory.
    #[must_use]
    pub fn check(&self, field: &'static str, range: &RangeInclusive<f64>) -> Option<Advisory> {
        if self.is_empty() {
            return None;
        }
        match self.value() {
            Some(value) if range.contains(&value) => None,
            Some(value) => Some(Advisory::OutOfRange {
                field,
                value,
                min: *range.start(),
                max: *range.end(),
            }),
            None => Some(Advisory::NotNumeric {
                field,
                raw: self.0.clone(),
            }),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Reading {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Reading {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ReadingVisitor;

        impl serde::de::Visitor<'_> for ReadingVisitor {
            type Value = Reading;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a reading as a string or a number")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<Reading, E> {
                Ok(Reading::new(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<Reading, E> {
                Ok(Reading(v.to_string()))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<Reading, E> {
                Ok(Reading(v.to_string()))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<Reading, E> {
                Ok(Reading(v.to_string()))
            }

            fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Reading, E> {
                Ok(Reading::default())
            }

            fn visit_none<E: serde::de::Error>(self) -> std::result::Result<Reading, E> {
                Ok(Reading::default())
            }
        }

        deserializer.deserialize_any(ReadingVisitor)
    }
}

/// A non-blocking finding about a captured reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    /// The reading parsed but falls outside its advisory bounds.
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// The parsed value.
        value: f64,
        /// Lower advisory bound.
        min: f64,
        /// Upper advisory bound.
        max: f64,
    },
    /// The reading is not a number.
    NotNumeric {
        /// Field name.
        field: &'static str,
        /// The text as entered.
        raw: String,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} {value} is outside the expected range {min}-{max}"),
            Self::NotNumeric { field, raw } => write!(f, "{field} '{raw}' is not a number"),
        }
    }
}

/// One wellness check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Day the entry was saved.
    #[serde(deserialize_with = "date_field::deserialize")]
    pub date: NaiveDate,

    /// Meal time chosen in the gated flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_time: Option<MealTime>,

    /// Breathing quality, `None` if never chosen.
    #[serde(default, with = "breathing_field")]
    pub breathing: Option<Breathing>,

    /// Blood-oxygen percentage.
    #[serde(default)]
    pub oxygen: Reading,

    /// Heart rate in BPM.
    #[serde(default)]
    pub heart_rate: Reading,

    /// Free-text observations.
    #[serde(default)]
    pub notes: String,

    /// Meal descriptions.
    #[serde(default)]
    pub meals: Meals,

    /// Activities done today.
    #[serde(default)]
    pub activities: String,
}

impl LogEntry {
    /// An entry for `date` with every field unset.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            meal_time: None,
            breathing: None,
            oxygen: Reading::default(),
            heart_rate: Reading::default(),
            notes: String::new(),
            meals: Meals::default(),
            activities: String::new(),
        }
    }

    /// Advisory findings for this entry's readings.
    #[must_use]
    pub fn advisories(&self) -> Vec<Advisory> {
        [
            self.oxygen.check("oxygen", &OXYGEN_RANGE),
            self.heart_rate.check("heart rate", &HEART_RATE_RANGE),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Unset breathing is stored as `""`; unknown values read back as unset.
mod breathing_field {
    use super::Breathing;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<Breathing>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map_or("", Breathing::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Breathing>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|s| s.parse().ok()))
    }
}

/// Dates are written as `YYYY-MM-DD`. On read, the locale formats the web
/// form produced with `toLocaleDateString()` are also accepted, as are full
/// timestamps. Slash dates are read month first, falling back to day first
/// when the month would be out of range.
mod date_field {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer};

    const FORMATS: [&str; 7] = [
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%d.%m.%Y",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%Y.%m.%d",
    ];

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim().trim_end_matches('.');
        FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("unrecognized date '{raw}'")))
    }
}

/// The ordered, append-only history of check-ins.
///
/// Insertion order is chronological order. There is no way to edit or remove
/// an entry once it is in the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogCollection(Vec<LogEntry>);

impl LogCollection {
    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: LogEntry) {
        self.0.push(entry);
    }

    /// Undo the most recent append after its write failed.
    pub(crate) fn rollback_last(&mut self) -> Option<LogEntry> {
        self.0.pop()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.0.iter()
    }

    /// The most recently saved entry.
    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.0.last()
    }

    /// Earliest and latest entry dates.
    #[must_use]
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.0.iter().map(|e| e.date).min()?;
        let last = self.0.iter().map(|e| e.date).max()?;
        Some((first, last))
    }
}

impl From<Vec<LogEntry>> for LogCollection {
    fn from(entries: Vec<LogEntry>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a LogCollection {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_breathing_parse_and_display() {
        assert_eq!("better".parse::<Breathing>().unwrap(), Breathing::Better);
        assert_eq!(" Same ".parse::<Breathing>().unwrap(), Breathing::Same);
        assert_eq!("WORSE".parse::<Breathing>().unwrap(), Breathing::Worse);
        assert!("great".parse::<Breathing>().is_err());
        assert_eq!(Breathing::Better.to_string(), "better");
    }

    #[test]
    fn test_meal_time_slot() {
        assert_eq!(MealTime::Breakfast.slot(), MealSlot::Breakfast);
        assert_eq!(MealTime::Lunch.slot(), MealSlot::Lunch);
        assert_eq!(MealTime::Dinner.slot(), MealSlot::Dinner);
        assert_eq!("lunch".parse::<MealTime>().unwrap(), MealTime::Lunch);
        assert!("snacks".parse::<MealTime>().is_err());
    }

    #[test]
    fn test_meal_slot_parse() {
        assert_eq!("snack".parse::<MealSlot>().unwrap(), MealSlot::Snacks);
        assert_eq!("Dinner".parse::<MealSlot>().unwrap(), MealSlot::Dinner);
    }

    #[test]
    fn test_meals_only_keeps_one_slot() {
        let mut meals = Meals::default();
        meals.set(MealSlot::Breakfast, "oatmeal");
        meals.set(MealSlot::Snacks, "apple");

        let only = meals.only(MealSlot::Breakfast);
        assert_eq!(only.breakfast, "oatmeal");
        assert!(only.snacks.is_empty());
        assert!(Meals::default().is_empty());
        assert!(!only.is_empty());
    }

    #[test]
    fn test_reading_value() {
        assert_eq!(Reading::new("97").value(), Some(97.0));
        assert_eq!(Reading::new(" 72.5 ").value(), Some(72.5));
        assert_eq!(Reading::new("").value(), None);
        assert_eq!(Reading::new("abc").value(), None);
        assert_eq!(Reading::new("NaN").value(), None);
    }

    #[test]
    fn test_reading_check() {
        assert!(Reading::new("97").check("oxygen", &OXYGEN_RANGE).is_none());
        assert!(Reading::new("").check("oxygen", &OXYGEN_RANGE).is_none());

        let advisory = Reading::new("75").check("oxygen", &OXYGEN_RANGE).unwrap();
        assert!(matches!(advisory, Advisory::OutOfRange { value, .. } if value == 75.0));
        assert!(advisory.to_string().contains("80-100"));

        let advisory = Reading::new("high").check("heart rate", &HEART_RATE_RANGE);
        assert!(matches!(advisory, Some(Advisory::NotNumeric { .. })));
    }

    #[test]
    fn test_reading_deserializes_strings_and_numbers() {
        let from_str: Reading = serde_json::from_str(r#""97""#).unwrap();
        let from_int: Reading = serde_json::from_str("97").unwrap();
        let from_null: Reading = serde_json::from_str("null").unwrap();
        assert_eq!(from_str.value(), Some(97.0));
        assert_eq!(from_int.value(), Some(97.0));
        assert!(from_null.is_empty());
    }

    #[test]
    fn test_entry_advisories() {
        let mut entry = LogEntry::empty(day(19));
        assert!(entry.advisories().is_empty());

        entry.oxygen = Reading::new("79");
        entry.heart_rate = Reading::new("250");
        let advisories = entry.advisories();
        assert_eq!(advisories.len(), 2);
    }

    #[test]
    fn test_entry_json_shape() {
        let mut entry = LogEntry::empty(day(19));
        entry.breathing = Some(Breathing::Better);
        entry.oxygen = Reading::new("97");
        entry.heart_rate = Reading::new("72");

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2026-10-19");
        assert_eq!(json["breathing"], "better");
        assert_eq!(json["oxygen"], "97");
        assert_eq!(json["heartRate"], "72");
        assert_eq!(json["meals"]["breakfast"], "");
        assert!(json.get("mealTime").is_none());
    }

    #[test]
    fn test_unset_breathing_stored_as_empty_string() {
        let entry = LogEntry::empty(day(19));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["breathing"], "");

        let back: LogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.breathing, None);
    }

    #[test]
    fn test_unknown_breathing_reads_as_unset() {
        let json = r#"{"date":"2026-10-19","breathing":"fantastic","oxygen":96,"heartRate":"70"}"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.breathing, None);
        assert_eq!(entry.oxygen.value(), Some(96.0));
        assert!(entry.meals.is_empty());
    }

    #[test]
    fn test_locale_dates_are_read() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        for raw in [
            "2026-10-19",
            "10/19/2026",
            "19/10/2026",
            "19.10.2026",
            "2026/10/19",
            "19-10-2026",
            "2026-10-19T08:30:00.000Z",
        ] {
            let json = format!(r#"{{"date":"{raw}"}}"#);
            let entry: LogEntry = serde_json::from_str(&json).unwrap();
            assert_eq!(entry.date, expected, "{raw}");
        }
        assert_eq!(
            date_field::parse("1/5/2026"),
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
    }

    #[test]
    fn test_locale_date_written_back_as_iso() {
        let entry: LogEntry = serde_json::from_str(r#"{"date":"10/19/2026"}"#).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2026-10-19");
    }

    #[test]
    fn test_unrecognized_date_is_rejected() {
        let err = serde_json::from_str::<LogEntry>(r#"{"date":"yesterday"}"#).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_collection_append_and_span() {
        let mut collection = LogCollection::new();
        assert!(collection.is_empty());
        assert!(collection.date_span().is_none());

        collection.push(LogEntry::empty(day(18)));
        collection.push(LogEntry::empty(day(19)));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.date_span(), Some((day(18), day(19))));
        assert_eq!(collection.last().unwrap().date, day(19));

        let rolled_back = collection.rollback_last().unwrap();
        assert_eq!(rolled_back.date, day(19));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_collection_serializes_as_array() {
        let collection = LogCollection::from(vec![LogEntry::empty(day(19))]);
        let json = serde_json::to_string(&collection).unwrap();
        assert!(json.starts_with('['));
        let back: LogCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, collection);
    }
}
