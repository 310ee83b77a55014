use crate::{EntityKind, MatchKind, ValueType};

/// A criteria tree that cannot be evaluated as written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriteriaError {
	#[error("{path}: {message}")]
	Malformed { path: String, message: String },
	#[error("Match kind {match_kind} is not supported for {value_type} values.")]
	UnsupportedMatchKind { match_kind: MatchKind, value_type: ValueType },
	#[error("Match kind {match_kind} requires {expected}.")]
	ValueShape { match_kind: MatchKind, expected: &'static str },
	#[error("Field {field} expects {expected} values, got {found}.")]
	FieldTypeMismatch { field: &'static str, expected: ValueType, found: ValueType },
	#[error("Unknown property code '{code}'.")]
	UnknownProperty { code: String },
	#[error("Property '{code}' of data type {data_type} cannot be compared with {value_type} values.")]
	IncompatibleProperty { code: String, data_type: String, value_type: ValueType },
	#[error("{kind} does not support {what}.")]
	IncompatibleEntityKind { kind: EntityKind, what: String },
}
