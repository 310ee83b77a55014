use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::{
	Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
	macros::format_description,
};

use crate::CriteriaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
	Equals,
	Contains,
	StartsWith,
	EndsWith,
	EarlierOrEqual,
	LaterOrEqual,
	InSet,
}
impl MatchKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Equals => "EQUALS",
			Self::Contains => "CONTAINS",
			Self::StartsWith => "STARTS_WITH",
			Self::EndsWith => "ENDS_WITH",
			Self::EarlierOrEqual => "EARLIER_OR_EQUAL",
			Self::LaterOrEqual => "LATER_OR_EQUAL",
			Self::InSet => "IN_SET",
		}
	}
}

impl Display for MatchKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
	Text,
	Number,
	Date,
	Boolean,
}
impl ValueType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Number => "number",
			Self::Date => "date",
			Self::Boolean => "boolean",
		}
	}

	/// Substring kinds only apply to text; ordering kinds only to dates and numbers.
	pub fn supports(&self, match_kind: MatchKind) -> bool {
		match self {
			Self::Text => matches!(
				match_kind,
				MatchKind::Equals
					| MatchKind::Contains
					| MatchKind::StartsWith
					| MatchKind::EndsWith
					| MatchKind::InSet
			),
			Self::Number => matches!(
				match_kind,
				MatchKind::Equals
					| MatchKind::EarlierOrEqual
					| MatchKind::LaterOrEqual
					| MatchKind::InSet
			),
			Self::Date => matches!(
				match_kind,
				MatchKind::Equals | MatchKind::EarlierOrEqual | MatchKind::LaterOrEqual
			),
			Self::Boolean => matches!(match_kind, MatchKind::Equals),
		}
	}
}

impl Display for ValueType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
	Text(String),
	TextSet(Vec<String>),
	Number(f64),
	NumberSet(Vec<f64>),
	Date(DateValue),
	Boolean(bool),
}
impl FieldValue {
	pub fn value_type(&self) -> ValueType {
		match self {
			Self::Text(_) | Self::TextSet(_) => ValueType::Text,
			Self::Number(_) | Self::NumberSet(_) => ValueType::Number,
			Self::Date(_) => ValueType::Date,
			Self::Boolean(_) => ValueType::Boolean,
		}
	}

	pub fn is_set(&self) -> bool {
		matches!(self, Self::TextSet(_) | Self::NumberSet(_))
	}

	/// Checks the pairing of a match kind with this value, independent of any field.
	pub fn check_match_kind(&self, match_kind: MatchKind) -> Result<(), CriteriaError> {
		let value_type = self.value_type();

		if !value_type.supports(match_kind) {
			return Err(CriteriaError::UnsupportedMatchKind { match_kind, value_type });
		}
		if match_kind == MatchKind::InSet && !self.is_set() {
			return Err(CriteriaError::ValueShape { match_kind, expected: "a list value" });
		}
		if match_kind != MatchKind::InSet && self.is_set() {
			return Err(CriteriaError::ValueShape { match_kind, expected: "a single value" });
		}

		Ok(())
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<f64> for FieldValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i64> for FieldValue {
	fn from(value: i64) -> Self {
		Self::Number(value as f64)
	}
}

impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		Self::Boolean(value)
	}
}

impl From<DateValue> for FieldValue {
	fn from(value: DateValue) -> Self {
		Self::Date(value)
	}
}

/// A point in time used by date comparisons.
///
/// `Day` compares on the UTC calendar day of the stored timestamp, `Instant` compares the
/// timestamp itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
	Day(Date),
	Instant(OffsetDateTime),
}
impl DateValue {
	/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM`, `YYYY-MM-DD HH:MM:SS` (UTC) and RFC 3339.
	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();

		if let Ok(day) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
			return Some(Self::Day(day));
		}
		if let Ok(value) = PrimitiveDateTime::parse(
			raw,
			format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
		) {
			return Some(Self::Instant(value.assume_utc()));
		}
		if let Ok(value) =
			PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day] [hour]:[minute]"))
		{
			return Some(Self::Instant(value.assume_utc()));
		}

		OffsetDateTime::parse(raw, &Rfc3339).ok().map(Self::Instant)
	}
}

impl From<Date> for DateValue {
	fn from(value: Date) -> Self {
		Self::Day(value)
	}
}

impl From<OffsetDateTime> for DateValue {
	fn from(value: OffsetDateTime) -> Self {
		Self::Instant(value)
	}
}

#[cfg(test)]
mod tests {
	use time::macros::{date, datetime};

	use crate::{CriteriaError, DateValue, FieldValue, MatchKind, ValueType};

	#[test]
	fn string_values_reject_ordering_kinds() {
		let err = FieldValue::from("S1")
			.check_match_kind(MatchKind::LaterOrEqual)
			.expect_err("expected incompatible match kind");

		assert_eq!(
			err,
			CriteriaError::UnsupportedMatchKind {
				match_kind: MatchKind::LaterOrEqual,
				value_type: ValueType::Text,
			}
		);
	}

	#[test]
	fn date_values_reject_substring_kinds() {
		let value = FieldValue::Date(DateValue::Day(date!(2019 - 06 - 12)));

		assert!(value.check_match_kind(MatchKind::Contains).is_err());
		assert!(value.check_match_kind(MatchKind::InSet).is_err());
		assert!(value.check_match_kind(MatchKind::LaterOrEqual).is_ok());
	}

	#[test]
	fn in_set_requires_list_values() {
		assert!(FieldValue::from("S1").check_match_kind(MatchKind::InSet).is_err());
		assert!(
			FieldValue::TextSet(vec!["S1".to_string()]).check_match_kind(MatchKind::Equals).is_err()
		);
		assert!(
			FieldValue::NumberSet(vec![1.0, 2.0]).check_match_kind(MatchKind::InSet).is_ok()
		);
	}

	#[test]
	fn parses_supported_date_formats() {
		assert_eq!(DateValue::parse("2019-06-12"), Some(DateValue::Day(date!(2019 - 06 - 12))));
		assert_eq!(
			DateValue::parse("2019-06-12 10:15"),
			Some(DateValue::Instant(datetime!(2019-06-12 10:15 UTC)))
		);
		assert_eq!(
			DateValue::parse("2019-06-12 10:15:30"),
			Some(DateValue::Instant(datetime!(2019-06-12 10:15:30 UTC)))
		);
		assert_eq!(
			DateValue::parse("2019-06-12T10:15:30+02:00"),
			Some(DateValue::Instant(datetime!(2019-06-12 10:15:30 +2)))
		);
		assert_eq!(DateValue::parse("12.06.2019"), None);
	}
}
