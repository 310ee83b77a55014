//! The property dictionary: property code to id and data type.

use std::{collections::HashMap, str::FromStr};

use sift_domain::{CriteriaError, ValueType};
use sift_storage::{SqlExecutor, SqlValue};

use crate::{Error, Result};

const LOAD_PROPERTY_TYPES: &str = "SELECT id, code, data_type FROM property_types";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyDataType {
	Varchar,
	MultilineVarchar,
	Integer,
	Real,
	Boolean,
	Date,
	Timestamp,
}
impl PropertyDataType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Varchar => "VARCHAR",
			Self::MultilineVarchar => "MULTILINE_VARCHAR",
			Self::Integer => "INTEGER",
			Self::Real => "REAL",
			Self::Boolean => "BOOLEAN",
			Self::Date => "DATE",
			Self::Timestamp => "TIMESTAMP",
		}
	}

	pub fn accepts(&self, value_type: ValueType) -> bool {
		match self {
			Self::Varchar | Self::MultilineVarchar => value_type == ValueType::Text,
			Self::Integer | Self::Real => value_type == ValueType::Number,
			Self::Boolean => value_type == ValueType::Boolean,
			Self::Date | Self::Timestamp => value_type == ValueType::Date,
		}
	}
}

impl FromStr for PropertyDataType {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"VARCHAR" => Ok(Self::Varchar),
			"MULTILINE_VARCHAR" => Ok(Self::MultilineVarchar),
			"INTEGER" => Ok(Self::Integer),
			"REAL" => Ok(Self::Real),
			"BOOLEAN" => Ok(Self::Boolean),
			"DATE" => Ok(Self::Date),
			"TIMESTAMP" => Ok(Self::Timestamp),
			other => Err(format!("Unknown property data type {other}.")),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyType {
	pub id: i64,
	pub code: String,
	pub data_type: PropertyDataType,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyDictionary {
	by_code: HashMap<String, PropertyType>,
}
impl PropertyDictionary {
	pub fn new(types: impl IntoIterator<Item = PropertyType>) -> Self {
		Self { by_code: types.into_iter().map(|ty| (ty.code.clone(), ty)).collect() }
	}

	pub async fn load(executor: &dyn SqlExecutor) -> Result<Self> {
		let rows = executor.execute(LOAD_PROPERTY_TYPES, &[]).await?;
		let mut types = Vec::with_capacity(rows.len());

		for row in rows {
			let [SqlValue::Int(id), SqlValue::Text(code), SqlValue::Text(data_type)] = row.as_slice()
			else {
				return Err(Error::Storage {
					message: "Unexpected property_types row shape.".to_string(),
				});
			};
			let data_type = data_type.parse().map_err(|message| Error::Storage { message })?;

			types.push(PropertyType { id: *id, code: code.clone(), data_type });
		}

		Ok(Self::new(types))
	}

	/// Looks up a property whose value must be comparable with `value_type`.
	pub fn compatible(&self, code: &str, value_type: ValueType) -> Result<&PropertyType, CriteriaError> {
		let property = self
			.by_code
			.get(code)
			.ok_or_else(|| CriteriaError::UnknownProperty { code: code.to_string() })?;

		if !property.data_type.accepts(value_type) {
			return Err(CriteriaError::IncompatibleProperty {
				code: code.to_string(),
				data_type: property.data_type.as_str().to_string(),
				value_type,
			});
		}

		Ok(property)
	}

	/// Every property comparable with `value_type`, ordered by code.
	pub fn all_compatible(&self, value_type: ValueType) -> Vec<&PropertyType> {
		let mut properties = self
			.by_code
			.values()
			.filter(|property| property.data_type.accepts(value_type))
			.collect::<Vec<_>>();

		properties.sort_by(|left, right| left.code.cmp(&right.code));

		properties
	}
}

#[cfg(test)]
mod tests {
	use sift_domain::{CriteriaError, ValueType};

	use crate::properties::{PropertyDataType, PropertyDictionary, PropertyType};

	fn dictionary() -> PropertyDictionary {
		PropertyDictionary::new([
			PropertyType { id: 1, code: "NAME".to_string(), data_type: PropertyDataType::Varchar },
			PropertyType { id: 2, code: "SIZE".to_string(), data_type: PropertyDataType::Integer },
			PropertyType {
				id: 3,
				code: "COMMENT".to_string(),
				data_type: PropertyDataType::MultilineVarchar,
			},
		])
	}

	#[test]
	fn unknown_codes_are_rejected() {
		assert_eq!(
			dictionary().compatible("COLOR", ValueType::Text),
			Err(CriteriaError::UnknownProperty { code: "COLOR".to_string() })
		);
	}

	#[test]
	fn incompatible_values_are_rejected() {
		assert!(matches!(
			dictionary().compatible("SIZE", ValueType::Text),
			Err(CriteriaError::IncompatibleProperty { .. })
		));
		assert_eq!(dictionary().compatible("SIZE", ValueType::Number).map(|ty| ty.id), Ok(2));
	}

	#[test]
	fn any_property_fans_out_over_compatible_types() {
		let dictionary = dictionary();
		let codes = dictionary
			.all_compatible(ValueType::Text)
			.into_iter()
			.map(|property| property.code.as_str())
			.collect::<Vec<_>>();

		assert_eq!(codes, vec!["COMMENT", "NAME"]);
	}
}
