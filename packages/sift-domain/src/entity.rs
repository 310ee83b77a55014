use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::CriteriaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
	Sample,
	Experiment,
	DataSet,
	SampleType,
	ExperimentType,
	DataSetType,
	Project,
	Space,
	Tag,
}
impl EntityKind {
	pub const ALL: [Self; 9] = [
		Self::Sample,
		Self::Experiment,
		Self::DataSet,
		Self::SampleType,
		Self::ExperimentType,
		Self::DataSetType,
		Self::Project,
		Self::Space,
		Self::Tag,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Sample => "SAMPLE",
			Self::Experiment => "EXPERIMENT",
			Self::DataSet => "DATA_SET",
			Self::SampleType => "SAMPLE_TYPE",
			Self::ExperimentType => "EXPERIMENT_TYPE",
			Self::DataSetType => "DATA_SET_TYPE",
			Self::Project => "PROJECT",
			Self::Space => "SPACE",
			Self::Tag => "TAG",
		}
	}

	/// Type kinds describe other entities and carry no properties or registration date.
	pub fn is_type(&self) -> bool {
		matches!(self, Self::SampleType | Self::ExperimentType | Self::DataSetType)
	}
}

impl Display for EntityKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for EntityKind {
	type Err = CriteriaError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let normalized = raw.trim().replace('-', "_").to_ascii_uppercase();

		Self::ALL.into_iter().find(|kind| kind.as_str() == normalized).ok_or_else(|| {
			CriteriaError::Malformed {
				path: "$.kind".to_string(),
				message: format!("unknown entity kind '{raw}'."),
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use crate::EntityKind;

	#[test]
	fn parses_kind_case_insensitively() {
		assert_eq!("sample".parse::<EntityKind>().ok(), Some(EntityKind::Sample));
		assert_eq!("data-set".parse::<EntityKind>().ok(), Some(EntityKind::DataSet));
		assert_eq!("SAMPLE_TYPE".parse::<EntityKind>().ok(), Some(EntityKind::SampleType));
		assert_eq!("tag".parse::<EntityKind>().ok(), Some(EntityKind::Tag));
		assert!("material".parse::<EntityKind>().is_err());
	}
}
