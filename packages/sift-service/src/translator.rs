//! Leaf criteria to parameterized SQL.
//!
//! Every query selects a single bigint id column. Values are always bound; identifiers only ever
//! come from [`TableMapper`].

use sift_domain::{
	AbsenceField, AttributeField, AttributeLeaf, CriteriaError, DateValue, Direction, FieldValue,
	MatchKind,
};
use sift_storage::SqlArg;

use crate::{
	mapper::{ReferencePath, TableMapper},
	properties::{PropertyDataType, PropertyType},
	set_algebra::IdSet,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
	pub sql: String,
	pub args: Vec<SqlArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberColumn {
	BigInt,
	Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateColumn {
	Timestamp,
	Date,
}

pub fn all_ids(mapper: &TableMapper) -> SelectQuery {
	SelectQuery { sql: format!("SELECT id FROM {}", mapper.table), args: Vec::new() }
}

/// One query per column searched. Only `any_field` yields more than one.
pub fn attribute(
	mapper: &TableMapper,
	leaf: &AttributeLeaf,
) -> Result<Vec<SelectQuery>, CriteriaError> {
	let match_kind = leaf.match_kind();
	let value = leaf.value();
	let mut args = Vec::new();
	let predicate = match leaf.field() {
		AttributeField::AnyField => return any_field(mapper, match_kind, value),
		field @ (AttributeField::Code | AttributeField::PermId) =>
			text_predicate(mapper.attribute_column(field)?, match_kind, value, &mut args)?,
		field @ AttributeField::Id => number_predicate(
			mapper.attribute_column(field)?,
			NumberColumn::BigInt,
			match_kind,
			value,
			&mut args,
		)?,
		field @ (AttributeField::RegistrationDate | AttributeField::ModificationDate) =>
			date_predicate(
				mapper.attribute_column(field)?,
				DateColumn::Timestamp,
				match_kind,
				value,
				&mut args,
			)?,
	};

	Ok(vec![select_where(mapper, &predicate, args)])
}

pub fn property(
	mapper: &TableMapper,
	property: &PropertyType,
	match_kind: MatchKind,
	value: &FieldValue,
) -> Result<SelectQuery, CriteriaError> {
	let mapping = mapper.property_mapping()?;
	let mut args = vec![SqlArg::BigInt(property.id)];
	// Values of other property types may not parse as this type, so the cast is guarded.
	let guarded = |cast: &str| format!("(CASE WHEN p.prty_id = $1 THEN p.value::{cast} END)");
	let predicate = match property.data_type {
		PropertyDataType::Varchar | PropertyDataType::MultilineVarchar =>
			text_predicate("p.value", match_kind, value, &mut args)?,
		PropertyDataType::Integer | PropertyDataType::Real => number_predicate(
			&guarded("float8"),
			NumberColumn::Float,
			match_kind,
			value,
			&mut args,
		)?,
		PropertyDataType::Boolean =>
			boolean_predicate(&guarded("boolean"), match_kind, value, &mut args)?,
		PropertyDataType::Date =>
			date_predicate(&guarded("date"), DateColumn::Date, match_kind, value, &mut args)?,
		PropertyDataType::Timestamp => date_predicate(
			&guarded("timestamptz"),
			DateColumn::Timestamp,
			match_kind,
			value,
			&mut args,
		)?,
	};

	Ok(SelectQuery {
		sql: format!(
			"SELECT p.{entity} FROM {table} p WHERE p.prty_id = $1 AND {predicate}",
			entity = mapping.entity_column,
			table = mapping.table,
		),
		args,
	})
}

pub fn absence(mapper: &TableMapper, field: AbsenceField) -> Result<SelectQuery, CriteriaError> {
	let column = mapper.absence_column(field)?;

	Ok(select_where(mapper, &format!("{column} IS NULL"), Vec::new()))
}

/// Owners having a parent (or child) in `related`.
pub fn relation_expansion(table: &str, direction: Direction, related: &IdSet) -> SelectQuery {
	let (owner, matched) = match direction {
		Direction::Parent => ("child_id", "parent_id"),
		Direction::Child => ("parent_id", "child_id"),
	};

	SelectQuery {
		sql: format!("SELECT DISTINCT {owner} FROM {table} WHERE {matched} = ANY($1)"),
		args: vec![SqlArg::BigIntArray(sorted(related))],
	}
}

/// Owners that reach an id in `related` through `via`.
pub fn reference_expansion(
	mapper: &TableMapper,
	via: ReferencePath,
	related: &IdSet,
) -> SelectQuery {
	let args = vec![SqlArg::BigIntArray(sorted(related))];

	match via {
		ReferencePath::Column(column) => select_where(mapper, &format!("{column} = ANY($1)"), args),
		ReferencePath::Link { table, owner_column, target_column } => SelectQuery {
			sql: format!(
				"SELECT DISTINCT {owner_column} FROM {table} \
				 WHERE {target_column} = ANY($1) AND {owner_column} IS NOT NULL"
			),
			args,
		},
	}
}

pub fn sorted(ids: &IdSet) -> Vec<i64> {
	let mut ids = ids.iter().copied().collect::<Vec<_>>();

	ids.sort_unstable();

	ids
}

pub fn escape_like(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			escaped.push('\\');
		}

		escaped.push(ch);
	}

	escaped
}

fn any_field(
	mapper: &TableMapper,
	match_kind: MatchKind,
	value: &FieldValue,
) -> Result<Vec<SelectQuery>, CriteriaError> {
	let mut queries = Vec::new();

	for column in mapper.any_field_text_columns() {
		let mut args = Vec::new();
		let predicate = text_predicate(&column, match_kind, value, &mut args)?;

		queries.push(select_where(mapper, &predicate, args));
	}

	if match_kind == MatchKind::Equals
		&& let FieldValue::Text(raw) = value
		&& let Some(date) = DateValue::parse(raw)
	{
		for column in mapper.date_columns() {
			let mut args = Vec::new();
			let predicate = date_predicate(
				column,
				DateColumn::Timestamp,
				MatchKind::Equals,
				&FieldValue::Date(date),
				&mut args,
			)?;

			queries.push(select_where(mapper, &predicate, args));
		}
	}

	Ok(queries)
}

fn select_where(mapper: &TableMapper, predicate: &str, args: Vec<SqlArg>) -> SelectQuery {
	SelectQuery { sql: format!("SELECT id FROM {} WHERE {predicate}", mapper.table), args }
}

fn bind(args: &mut Vec<SqlArg>, arg: SqlArg) -> String {
	args.push(arg);

	format!("${}", args.len())
}

/// Text comparisons ignore case. `*` and `?` in an `EQUALS` value match any run of characters and
/// any single character.
fn text_predicate(
	expr: &str,
	match_kind: MatchKind,
	value: &FieldValue,
	args: &mut Vec<SqlArg>,
) -> Result<String, CriteriaError> {
	let predicate = match (match_kind, value) {
		(MatchKind::Equals, FieldValue::Text(text)) if has_wildcards(text) =>
			format!("{expr} ILIKE {}", bind(args, SqlArg::Text(wildcard_pattern(text)))),
		(MatchKind::Equals, FieldValue::Text(text)) =>
			format!("lower({expr}) = {}", bind(args, SqlArg::Text(text.to_lowercase()))),
		(MatchKind::Contains, FieldValue::Text(text)) => format!(
			"{expr} ILIKE {}",
			bind(args, SqlArg::Text(format!("%{}%", escape_like(text))))
		),
		(MatchKind::StartsWith, FieldValue::Text(text)) =>
			format!("{expr} ILIKE {}", bind(args, SqlArg::Text(format!("{}%", escape_like(text))))),
		(MatchKind::EndsWith, FieldValue::Text(text)) =>
			format!("{expr} ILIKE {}", bind(args, SqlArg::Text(format!("%{}", escape_like(text))))),
		(MatchKind::InSet, FieldValue::TextSet(values)) => {
			let lowered = values.iter().map(|value| value.to_lowercase()).collect();

			format!("lower({expr}) = ANY({})", bind(args, SqlArg::TextArray(lowered)))
		},
		_ => return Err(unsupported(match_kind, value)),
	};

	Ok(predicate)
}

fn has_wildcards(raw: &str) -> bool {
	raw.contains(['*', '?'])
}

fn wildcard_pattern(raw: &str) -> String {
	escape_like(raw)
		.chars()
		.map(|ch| match ch {
			'*' => '%',
			'?' => '_',
			other => other,
		})
		.collect()
}

fn number_predicate(
	expr: &str,
	column: NumberColumn,
	match_kind: MatchKind,
	value: &FieldValue,
	args: &mut Vec<SqlArg>,
) -> Result<String, CriteriaError> {
	// Non-integral values against a bigint column compare in float space.
	let float_expr = match column {
		NumberColumn::BigInt => format!("{expr}::float8"),
		NumberColumn::Float => expr.to_string(),
	};
	let predicate = match (match_kind, value) {
		(MatchKind::InSet, FieldValue::NumberSet(values)) => {
			if column == NumberColumn::BigInt && values.iter().all(|value| is_integral(*value)) {
				let ids = values.iter().map(|value| *value as i64).collect();

				format!("{expr} = ANY({})", bind(args, SqlArg::BigIntArray(ids)))
			} else {
				format!("{float_expr} = ANY({})", bind(args, SqlArg::DoubleArray(values.clone())))
			}
		},
		(_, FieldValue::Number(number)) => {
			let op = comparison(match_kind).ok_or_else(|| unsupported(match_kind, value))?;

			if column == NumberColumn::BigInt && is_integral(*number) {
				format!("{expr} {op} {}", bind(args, SqlArg::BigInt(*number as i64)))
			} else {
				format!("{float_expr} {op} {}", bind(args, SqlArg::Double(*number)))
			}
		},
		_ => return Err(unsupported(match_kind, value)),
	};

	Ok(predicate)
}

fn date_predicate(
	expr: &str,
	column: DateColumn,
	match_kind: MatchKind,
	value: &FieldValue,
	args: &mut Vec<SqlArg>,
) -> Result<String, CriteriaError> {
	let FieldValue::Date(date) = value else {
		return Err(unsupported(match_kind, value));
	};
	let op = comparison(match_kind).ok_or_else(|| unsupported(match_kind, value))?;
	let predicate = match (column, date) {
		(DateColumn::Timestamp, DateValue::Day(day)) =>
			format!("({expr} AT TIME ZONE 'UTC')::date {op} {}", bind(args, SqlArg::Date(*day))),
		(DateColumn::Timestamp, DateValue::Instant(instant)) =>
			format!("{expr} {op} {}", bind(args, SqlArg::Timestamp(*instant))),
		(DateColumn::Date, DateValue::Day(day)) =>
			format!("{expr} {op} {}", bind(args, SqlArg::Date(*day))),
		(DateColumn::Date, DateValue::Instant(instant)) => format!(
			"{expr} {op} ({} AT TIME ZONE 'UTC')::date",
			bind(args, SqlArg::Timestamp(*instant))
		),
	};

	Ok(predicate)
}

fn boolean_predicate(
	expr: &str,
	match_kind: MatchKind,
	value: &FieldValue,
	args: &mut Vec<SqlArg>,
) -> Result<String, CriteriaError> {
	match (match_kind, value) {
		(MatchKind::Equals, FieldValue::Boolean(flag)) =>
			Ok(format!("{expr} = {}", bind(args, SqlArg::Bool(*flag)))),
		_ => Err(unsupported(match_kind, value)),
	}
}

fn comparison(match_kind: MatchKind) -> Option<&'static str> {
	match match_kind {
		MatchKind::Equals => Some("="),
		MatchKind::EarlierOrEqual => Some("<="),
		MatchKind::LaterOrEqual => Some(">="),
		_ => None,
	}
}

fn is_integral(value: f64) -> bool {
	value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64
}

fn unsupported(match_kind: MatchKind, value: &FieldValue) -> CriteriaError {
	CriteriaError::UnsupportedMatchKind { match_kind, value_type: value.value_type() }
}

#[cfg(test)]
mod tests {
	use time::macros::{date, datetime};

	use sift_domain::{
		AbsenceField, AttributeField, AttributeLeaf, CriteriaError, DateValue, Direction,
		EntityKind, FieldValue, MatchKind,
	};
	use sift_storage::SqlArg;

	use crate::{
		mapper::TableMapper,
		properties::{PropertyDataType, PropertyType},
		set_algebra::IdSet,
		translator::{self, escape_like},
	};

	fn leaf(field: AttributeField, match_kind: MatchKind, value: FieldValue) -> AttributeLeaf {
		AttributeLeaf::new(field, match_kind, value).expect("valid leaf")
	}

	#[test]
	fn code_equality_ignores_case() {
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Sample),
			&leaf(AttributeField::Code, MatchKind::Equals, "S1".into()),
		)
		.expect("translatable leaf");

		assert_eq!(queries.len(), 1);
		assert_eq!(queries[0].sql, "SELECT id FROM samples WHERE lower(code) = $1");
		assert_eq!(queries[0].args, vec![SqlArg::Text("s1".to_string())]);
	}

	#[test]
	fn equality_wildcards_compile_to_ilike() {
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Sample),
			&leaf(AttributeField::Code, MatchKind::Equals, "S?_*".into()),
		)
		.expect("translatable leaf");

		assert_eq!(queries[0].sql, "SELECT id FROM samples WHERE code ILIKE $1");
		assert_eq!(queries[0].args, vec![SqlArg::Text("S_\\_%".to_string())]);
	}

	#[test]
	fn text_sets_compare_lowercased() {
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Space),
			&leaf(
				AttributeField::Code,
				MatchKind::InSet,
				FieldValue::TextSet(vec!["Lab".to_string(), "OTHER".to_string()]),
			),
		)
		.expect("translatable leaf");

		assert_eq!(queries[0].sql, "SELECT id FROM spaces WHERE lower(code) = ANY($1)");
		assert_eq!(
			queries[0].args,
			vec![SqlArg::TextArray(vec!["lab".to_string(), "other".to_string()])]
		);
	}

	#[test]
	fn substring_matches_escape_like_wildcards() {
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Sample),
			&leaf(AttributeField::Code, MatchKind::Contains, "50%_A".into()),
		)
		.expect("translatable leaf");

		assert_eq!(queries[0].sql, "SELECT id FROM samples WHERE code ILIKE $1");
		assert_eq!(queries[0].args, vec![SqlArg::Text("%50\\%\\_A%".to_string())]);
		assert_eq!(escape_like("a\\b"), "a\\\\b");
	}

	#[test]
	fn day_dates_compare_on_the_utc_calendar_day() {
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Sample),
			&leaf(
				AttributeField::RegistrationDate,
				MatchKind::LaterOrEqual,
				DateValue::Day(date!(2019 - 06 - 12)).into(),
			),
		)
		.expect("translatable leaf");

		assert_eq!(
			queries[0].sql,
			"SELECT id FROM samples WHERE (registration_timestamp AT TIME ZONE 'UTC')::date >= $1"
		);
		assert_eq!(queries[0].args, vec![SqlArg::Date(date!(2019 - 06 - 12))]);
	}

	#[test]
	fn instants_compare_the_timestamp() {
		let instant = datetime!(2019-06-12 10:15 UTC);
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Experiment),
			&leaf(
				AttributeField::ModificationDate,
				MatchKind::EarlierOrEqual,
				DateValue::Instant(instant).into(),
			),
		)
		.expect("translatable leaf");

		assert_eq!(
			queries[0].sql,
			"SELECT id FROM experiments WHERE modification_timestamp <= $1"
		);
		assert_eq!(queries[0].args, vec![SqlArg::Timestamp(instant)]);
	}

	#[test]
	fn integral_ids_bind_as_bigint() {
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Project),
			&leaf(AttributeField::Id, MatchKind::InSet, FieldValue::NumberSet(vec![3.0, 1.0])),
		)
		.expect("translatable leaf");

		assert_eq!(queries[0].sql, "SELECT id FROM projects WHERE id = ANY($1)");
		assert_eq!(queries[0].args, vec![SqlArg::BigIntArray(vec![3, 1])]);
	}

	#[test]
	fn any_field_fans_out_to_text_and_date_columns() {
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Project),
			&leaf(AttributeField::AnyField, MatchKind::Equals, "2020-01-02".into()),
		)
		.expect("translatable leaf");
		let sql = queries.iter().map(|query| query.sql.as_str()).collect::<Vec<_>>();

		assert_eq!(
			sql,
			vec![
				"SELECT id FROM projects WHERE lower(code) = $1",
				"SELECT id FROM projects WHERE lower(perm_id) = $1",
				"SELECT id FROM projects WHERE lower(id::text) = $1",
				"SELECT id FROM projects WHERE lower(space_id::text) = $1",
				"SELECT id FROM projects WHERE (registration_timestamp AT TIME ZONE 'UTC')::date = $1",
				"SELECT id FROM projects WHERE (modification_timestamp AT TIME ZONE 'UTC')::date = $1",
			]
		);
	}

	#[test]
	fn any_field_substring_skips_date_columns() {
		let queries = translator::attribute(
			TableMapper::for_kind(EntityKind::Space),
			&leaf(AttributeField::AnyField, MatchKind::StartsWith, "2020".into()),
		)
		.expect("translatable leaf");

		assert_eq!(queries.len(), 2);
	}

	#[test]
	fn registration_date_is_rejected_for_type_kinds() {
		let err = translator::attribute(
			TableMapper::for_kind(EntityKind::DataSetType),
			&leaf(
				AttributeField::RegistrationDate,
				MatchKind::Equals,
				DateValue::Day(date!(2020 - 01 - 02)).into(),
			),
		)
		.expect_err("type kinds have no registration date");

		assert!(matches!(err, CriteriaError::IncompatibleEntityKind { .. }));
	}

	#[test]
	fn numeric_properties_guard_the_cast() {
		let property =
			PropertyType { id: 7, code: "SIZE".to_string(), data_type: PropertyDataType::Integer };
		let query = translator::property(
			TableMapper::for_kind(EntityKind::Sample),
			&property,
			MatchKind::LaterOrEqual,
			&FieldValue::Number(2.5),
		)
		.expect("translatable property");

		assert_eq!(
			query.sql,
			"SELECT p.samp_id FROM sample_properties p WHERE p.prty_id = $1 AND (CASE WHEN p.prty_id = $1 THEN p.value::float8 END) >= $2"
		);
		assert_eq!(query.args, vec![SqlArg::BigInt(7), SqlArg::Double(2.5)]);
	}

	#[test]
	fn properties_are_rejected_for_kinds_without_property_tables() {
		let property =
			PropertyType { id: 1, code: "NAME".to_string(), data_type: PropertyDataType::Varchar };

		assert!(
			translator::property(
				TableMapper::for_kind(EntityKind::Space),
				&property,
				MatchKind::Equals,
				&"x".into(),
			)
			.is_err()
		);
	}

	#[test]
	fn absence_compiles_to_is_null() {
		let query = translator::absence(TableMapper::for_kind(EntityKind::Sample), AbsenceField::Experiment)
			.expect("samples may lack an experiment");

		assert_eq!(query.sql, "SELECT id FROM samples WHERE expe_id IS NULL");
		assert!(query.args.is_empty());
	}

	#[test]
	fn parent_expansion_returns_children_of_matched_parents() {
		let related = IdSet::from([5, 2]);
		let query = translator::relation_expansion("sample_relationships", Direction::Parent, &related);

		assert_eq!(
			query.sql,
			"SELECT DISTINCT child_id FROM sample_relationships WHERE parent_id = ANY($1)"
		);
		assert_eq!(query.args, vec![SqlArg::BigIntArray(vec![2, 5])]);

		let query = translator::relation_expansion("sample_relationships", Direction::Child, &related);

		assert_eq!(
			query.sql,
			"SELECT DISTINCT parent_id FROM sample_relationships WHERE child_id = ANY($1)"
		);
	}
}
