//! JSON criteria DSL.
//!
//! ```json
//! { "op": "or", "args": [
//!     { "op": "equals", "field": "code", "value": "S1" },
//!     { "op": "parents", "expr": { "op": "equals", "field": "code", "value": "P1" } }
//! ] }
//! ```
//!
//! Errors carry a JSON path to the offending node.

use serde_json::{Map, Value};

use crate::{
	AbsenceField, AbsenceLeaf, AttributeField, AttributeLeaf, CriteriaError, CriteriaNode,
	DateValue, Direction, FieldValue, MatchKind, PropertyLeaf, PropertyTarget, Reference,
	ReferenceLeaf, RelationLeaf, ValueType,
};

const MAX_STRING_BYTES: usize = 512;
const ANY_PROPERTY: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriteriaLimits {
	pub max_depth: usize,
	pub max_nodes: usize,
	pub max_in_set_items: usize,
}
impl Default for CriteriaLimits {
	fn default() -> Self {
		Self { max_depth: 16, max_nodes: 256, max_in_set_items: 1_024 }
	}
}

#[derive(Default)]
struct ParseState {
	nodes: usize,
	max_depth: usize,
}

pub fn parse_criteria(raw: &Value, limits: &CriteriaLimits) -> Result<CriteriaNode, CriteriaError> {
	let mut state = ParseState::default();

	parse_node(raw, "$.criteria", 1, limits, &mut state)
}

fn parse_node(
	raw: &Value,
	path: &str,
	depth: usize,
	limits: &CriteriaLimits,
	state: &mut ParseState,
) -> Result<CriteriaNode, CriteriaError> {
	track(path, depth, limits, state)?;

	let map = raw.as_object().ok_or_else(|| malformed(path, "criteria node must be an object."))?;
	let op = map
		.get("op")
		.and_then(Value::as_str)
		.ok_or_else(|| malformed(path, "criteria node is missing required string op."))?;

	match op {
		"and" | "or" => {
			let args_path = format!("{path}.args");
			let args = match map.get("args") {
				Some(args) => args
					.as_array()
					.ok_or_else(|| malformed(&args_path, "args must be an array."))?,
				None => return Err(malformed(&args_path, format!("{op} node requires args."))),
			};
			let children = args
				.iter()
				.enumerate()
				.map(|(index, child)| {
					parse_node(
						child,
						&format!("{args_path}[{index}]"),
						depth.saturating_add(1),
						limits,
						state,
					)
				})
				.collect::<Result<Vec<_>, _>>()?;

			Ok(if op == "and" { CriteriaNode::and(children) } else { CriteriaNode::or(children) })
		},
		"parents" | "children" => {
			let direction = if op == "parents" { Direction::Parent } else { Direction::Child };
			let nested = parse_nested(map, path, depth, limits, state)?;

			Ok(CriteriaNode::Relation(RelationLeaf { direction, nested }))
		},
		"type" | "experiment" | "sample" | "container" | "project" | "space" | "tag" => {
			let reference = match op {
				"type" => Reference::Type,
				"experiment" => Reference::Experiment,
				"sample" => Reference::Sample,
				"container" => Reference::Container,
				"project" => Reference::Project,
				"tag" => Reference::Tag,
				_ => Reference::Space,
			};
			let nested = parse_nested(map, path, depth, limits, state)?;

			Ok(CriteriaNode::Reference(ReferenceLeaf { reference, nested }))
		},
		"missing" => parse_absence(map, path),
		_ => {
			let match_kind = parse_match_kind(op)
				.ok_or_else(|| malformed(path, format!("unsupported criteria op '{op}'.")))?;

			parse_leaf(map, match_kind, path, limits)
		},
	}
}

fn parse_nested(
	map: &Map<String, Value>,
	path: &str,
	depth: usize,
	limits: &CriteriaLimits,
	state: &mut ParseState,
) -> Result<Box<CriteriaNode>, CriteriaError> {
	let expr_path = format!("{path}.expr");
	let expr = map.get("expr").ok_or_else(|| malformed(&expr_path, "node requires expr."))?;

	parse_node(expr, &expr_path, depth.saturating_add(1), limits, state).map(Box::new)
}

fn parse_absence(map: &Map<String, Value>, path: &str) -> Result<CriteriaNode, CriteriaError> {
	let field_path = format!("{path}.field");
	let field = map
		.get("field")
		.and_then(Value::as_str)
		.ok_or_else(|| malformed(&field_path, "missing node requires a string field."))?;
	let field = match field.to_ascii_lowercase().as_str() {
		"space" => AbsenceField::Space,
		"project" => AbsenceField::Project,
		"experiment" => AbsenceField::Experiment,
		"container" => AbsenceField::Container,
		"sample" => AbsenceField::Sample,
		_ => {
			return Err(malformed(
				&field_path,
				format!(
					"field '{field}' is not in allowlist: space, project, experiment, container, sample."
				),
			));
		},
	};

	Ok(CriteriaNode::Absence(AbsenceLeaf { field }))
}

fn parse_leaf(
	map: &Map<String, Value>,
	match_kind: MatchKind,
	path: &str,
	limits: &CriteriaLimits,
) -> Result<CriteriaNode, CriteriaError> {
	let value_path = format!("{path}.value");
	let raw_value =
		map.get("value").ok_or_else(|| malformed(&value_path, "leaf node requires value."))?;

	if let Some(field) = map.get("field") {
		let field = parse_attribute_field(&format!("{path}.field"), field)?;
		let value = parse_value(field.value_type(), raw_value, &value_path, limits)?;
		let leaf = AttributeLeaf::new(field, match_kind, value).map_err(|err| at(path, err))?;

		return Ok(CriteriaNode::Attribute(leaf));
	}

	let Some(property) = map.get("property") else {
		return Err(malformed(path, "leaf node requires either field or property."));
	};
	let property_path = format!("{path}.property");
	let code = parse_string(&property_path, property)?;
	let target = if code == ANY_PROPERTY {
		PropertyTarget::Any
	} else if code.trim().is_empty() {
		return Err(malformed(&property_path, "property code must be non-empty."));
	} else {
		PropertyTarget::Code(code.trim().to_ascii_uppercase())
	};
	let value_type = match map.get("value_type") {
		Some(raw) => parse_value_type(&format!("{path}.value_type"), raw)?,
		None => infer_value_type(raw_value),
	};
	let value = parse_value(value_type, raw_value, &value_path, limits)?;
	let leaf = PropertyLeaf::new(target, match_kind, value).map_err(|err| at(path, err))?;

	Ok(CriteriaNode::Property(leaf))
}

fn parse_match_kind(op: &str) -> Option<MatchKind> {
	match op {
		"equals" => Some(MatchKind::Equals),
		"contains" => Some(MatchKind::Contains),
		"starts_with" => Some(MatchKind::StartsWith),
		"ends_with" => Some(MatchKind::EndsWith),
		"earlier_or_equal" | "lte" => Some(MatchKind::EarlierOrEqual),
		"later_or_equal" | "gte" => Some(MatchKind::LaterOrEqual),
		"in" => Some(MatchKind::InSet),
		_ => None,
	}
}

fn parse_attribute_field(path: &str, raw: &Value) -> Result<AttributeField, CriteriaError> {
	let field = raw
		.as_str()
		.ok_or_else(|| malformed(path, "field must be a string."))?
		.to_ascii_lowercase();

	AttributeField::ALL.into_iter().find(|candidate| candidate.as_str() == field).ok_or_else(|| {
		malformed(
			path,
			format!(
				"field '{field}' is not in allowlist: code, perm_id, id, registration_date, modification_date, any_field."
			),
		)
	})
}

fn parse_value_type(path: &str, raw: &Value) -> Result<ValueType, CriteriaError> {
	match raw.as_str().map(str::to_ascii_lowercase).as_deref() {
		Some("text") => Ok(ValueType::Text),
		Some("number") => Ok(ValueType::Number),
		Some("date") => Ok(ValueType::Date),
		Some("boolean") => Ok(ValueType::Boolean),
		_ => Err(malformed(path, "value_type must be one of text, number, date, boolean.")),
	}
}

fn infer_value_type(raw: &Value) -> ValueType {
	let sample = match raw {
		Value::Array(items) => items.first().unwrap_or(&Value::Null),
		other => other,
	};

	match sample {
		Value::Number(_) => ValueType::Number,
		Value::Bool(_) => ValueType::Boolean,
		_ => ValueType::Text,
	}
}

fn parse_value(
	value_type: ValueType,
	raw: &Value,
	path: &str,
	limits: &CriteriaLimits,
) -> Result<FieldValue, CriteriaError> {
	if let Value::Array(items) = raw {
		if items.len() > limits.max_in_set_items {
			return Err(malformed(
				path,
				format!(
					"in list exceeds maximum size ({}/{}).",
					items.len(),
					limits.max_in_set_items
				),
			));
		}

		return match value_type {
			ValueType::Text => items
				.iter()
				.enumerate()
				.map(|(index, item)| parse_string(&format!("{path}[{index}]"), item))
				.collect::<Result<Vec<_>, _>>()
				.map(FieldValue::TextSet),
			ValueType::Number => items
				.iter()
				.enumerate()
				.map(|(index, item)| parse_number(&format!("{path}[{index}]"), item))
				.collect::<Result<Vec<_>, _>>()
				.map(FieldValue::NumberSet),
			ValueType::Date | ValueType::Boolean =>
				Err(malformed(path, format!("{value_type} values cannot be given as a list."))),
		};
	}

	match value_type {
		ValueType::Text => parse_string(path, raw).map(FieldValue::Text),
		ValueType::Number => parse_number(path, raw).map(FieldValue::Number),
		ValueType::Boolean => raw
			.as_bool()
			.map(FieldValue::Boolean)
			.ok_or_else(|| malformed(path, "boolean value expected.")),
		ValueType::Date => {
			let text = parse_string(path, raw)?;

			DateValue::parse(&text).map(FieldValue::Date).ok_or_else(|| {
				malformed(
					path,
					"date value must be YYYY-MM-DD, YYYY-MM-DD HH:MM, YYYY-MM-DD HH:MM:SS or RFC3339.",
				)
			})
		},
	}
}

fn parse_string(path: &str, raw: &Value) -> Result<String, CriteriaError> {
	let value = raw.as_str().ok_or_else(|| malformed(path, "string value expected."))?;

	if value.len() > MAX_STRING_BYTES {
		return Err(malformed(
			path,
			format!("string value exceeds maximum bytes ({MAX_STRING_BYTES})."),
		));
	}

	Ok(value.to_string())
}

fn parse_number(path: &str, raw: &Value) -> Result<f64, CriteriaError> {
	raw.as_f64()
		.filter(|value| value.is_finite())
		.ok_or_else(|| malformed(path, "numeric value expected."))
}

fn track(
	path: &str,
	depth: usize,
	limits: &CriteriaLimits,
	state: &mut ParseState,
) -> Result<(), CriteriaError> {
	state.nodes = state.nodes.saturating_add(1);
	state.max_depth = state.max_depth.max(depth);

	if state.nodes > limits.max_nodes {
		return Err(malformed(
			path,
			format!("criteria exceed node limit ({}/{}).", state.nodes, limits.max_nodes),
		));
	}
	if state.max_depth > limits.max_depth {
		return Err(malformed(
			path,
			format!("criteria exceed depth limit ({}/{}).", state.max_depth, limits.max_depth),
		));
	}

	Ok(())
}

fn malformed(path: &str, message: impl Into<String>) -> CriteriaError {
	CriteriaError::Malformed { path: path.to_string(), message: message.into() }
}

fn at(path: &str, err: CriteriaError) -> CriteriaError {
	match err {
		CriteriaError::Malformed { .. } => err,
		other => malformed(path, other.to_string()),
	}
}
