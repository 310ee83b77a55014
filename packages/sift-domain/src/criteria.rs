//! Criteria trees and the builder used to compose them.
//!
//! A tree is a closed set of node variants. Leaves carry a single condition; `Operator` nodes
//! combine the ids matched by their children. Relation and reference leaves nest a complete tree
//! that is evaluated against the related entity kind.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{CriteriaError, DateValue, FieldValue, MatchKind, ValueType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
	#[default]
	And,
	Or,
}
impl Display for Operator {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::And => f.write_str("AND"),
			Self::Or => f.write_str("OR"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaNode {
	/// An operator without children matches every entity of the kind.
	Operator { operator: Operator, children: Vec<CriteriaNode> },
	Attribute(AttributeLeaf),
	Property(PropertyLeaf),
	Relation(RelationLeaf),
	Reference(ReferenceLeaf),
	Absence(AbsenceLeaf),
}
impl CriteriaNode {
	pub fn and(children: Vec<CriteriaNode>) -> Self {
		Self::Operator { operator: Operator::And, children }
	}

	pub fn or(children: Vec<CriteriaNode>) -> Self {
		Self::Operator { operator: Operator::Or, children }
	}

	/// Nesting depth, counting the root as one and descending into related sub-trees.
	pub fn depth(&self) -> usize {
		match self {
			Self::Operator { children, .. } =>
				1 + children.iter().map(Self::depth).max().unwrap_or(0),
			Self::Relation(leaf) => 1 + leaf.nested.depth(),
			Self::Reference(leaf) => 1 + leaf.nested.depth(),
			Self::Attribute(_) | Self::Property(_) | Self::Absence(_) => 1,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeField {
	Code,
	PermId,
	Id,
	RegistrationDate,
	ModificationDate,
	AnyField,
}
impl AttributeField {
	pub const ALL: [Self; 6] = [
		Self::Code,
		Self::PermId,
		Self::Id,
		Self::RegistrationDate,
		Self::ModificationDate,
		Self::AnyField,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Code => "code",
			Self::PermId => "perm_id",
			Self::Id => "id",
			Self::RegistrationDate => "registration_date",
			Self::ModificationDate => "modification_date",
			Self::AnyField => "any_field",
		}
	}

	pub fn value_type(&self) -> ValueType {
		match self {
			Self::Code | Self::PermId | Self::AnyField => ValueType::Text,
			Self::Id => ValueType::Number,
			Self::RegistrationDate | Self::ModificationDate => ValueType::Date,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeLeaf {
	field: AttributeField,
	match_kind: MatchKind,
	value: FieldValue,
}
impl AttributeLeaf {
	pub fn new(
		field: AttributeField,
		match_kind: MatchKind,
		value: FieldValue,
	) -> Result<Self, CriteriaError> {
		let expected = field.value_type();
		let found = value.value_type();

		if expected != found {
			return Err(CriteriaError::FieldTypeMismatch { field: field.as_str(), expected, found });
		}

		value.check_match_kind(match_kind)?;

		Ok(Self { field, match_kind, value })
	}

	pub fn field(&self) -> AttributeField {
		self.field
	}

	pub fn match_kind(&self) -> MatchKind {
		self.match_kind
	}

	pub fn value(&self) -> &FieldValue {
		&self.value
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyTarget {
	Code(String),
	Any,
}

/// A property comparison. The property's data type is only known to the store, so the value is
/// checked against it when the leaf is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyLeaf {
	target: PropertyTarget,
	match_kind: MatchKind,
	value: FieldValue,
}
impl PropertyLeaf {
	pub fn new(
		target: PropertyTarget,
		match_kind: MatchKind,
		value: FieldValue,
	) -> Result<Self, CriteriaError> {
		value.check_match_kind(match_kind)?;

		Ok(Self { target, match_kind, value })
	}

	pub fn target(&self) -> &PropertyTarget {
		&self.target
	}

	pub fn match_kind(&self) -> MatchKind {
		self.match_kind
	}

	pub fn value(&self) -> &FieldValue {
		&self.value
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
	Parent,
	Child,
}

/// Matches owners that have a parent (or child) matched by `nested`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationLeaf {
	pub direction: Direction,
	pub nested: Box<CriteriaNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reference {
	Type,
	Experiment,
	Sample,
	Container,
	Project,
	Space,
	/// Private tags of the searching user, linked many-to-many.
	Tag,
}
impl Reference {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Type => "type",
			Self::Experiment => "experiment",
			Self::Sample => "sample",
			Self::Container => "container",
			Self::Project => "project",
			Self::Space => "space",
			Self::Tag => "tag",
		}
	}
}

/// Matches owners whose foreign key (or tag link) points at an entity matched by `nested`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLeaf {
	pub reference: Reference,
	pub nested: Box<CriteriaNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceField {
	Space,
	Project,
	Experiment,
	Container,
	Sample,
}
impl AbsenceField {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Space => "space",
			Self::Project => "project",
			Self::Experiment => "experiment",
			Self::Container => "container",
			Self::Sample => "sample",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsenceLeaf {
	pub field: AbsenceField,
}

/// Composes a criteria tree. The combinator defaults to AND.
///
/// ```
/// use sift_domain::CriteriaBuilder;
///
/// let mut criteria = CriteriaBuilder::new();
///
/// criteria.with_or_operator();
/// criteria.with_code().that_equals("S1");
/// criteria.with_parents(|parents| {
/// 	parents.with_code().that_equals("P1");
/// });
///
/// let node = criteria.build();
///
/// assert_eq!(node.depth(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
	operator: Operator,
	children: Vec<CriteriaNode>,
}
impl CriteriaBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_and_operator(&mut self) -> &mut Self {
		self.operator = Operator::And;

		self
	}

	pub fn with_or_operator(&mut self) -> &mut Self {
		self.operator = Operator::Or;

		self
	}

	pub fn with_code(&mut self) -> TextField<'_> {
		TextField::attribute(&mut self.children, AttributeField::Code)
	}

	pub fn with_perm_id(&mut self) -> TextField<'_> {
		TextField::attribute(&mut self.children, AttributeField::PermId)
	}

	pub fn with_any_field(&mut self) -> TextField<'_> {
		TextField::attribute(&mut self.children, AttributeField::AnyField)
	}

	pub fn with_id(&mut self) -> NumberField<'_> {
		NumberField::attribute(&mut self.children, AttributeField::Id)
	}

	pub fn with_registration_date(&mut self) -> DateField<'_> {
		DateField::attribute(&mut self.children, AttributeField::RegistrationDate)
	}

	pub fn with_modification_date(&mut self) -> DateField<'_> {
		DateField::attribute(&mut self.children, AttributeField::ModificationDate)
	}

	pub fn with_property(&mut self, code: impl Into<String>) -> TextField<'_> {
		TextField::property(&mut self.children, PropertyTarget::Code(code.into()))
	}

	pub fn with_any_property(&mut self) -> TextField<'_> {
		TextField::property(&mut self.children, PropertyTarget::Any)
	}

	pub fn with_number_property(&mut self, code: impl Into<String>) -> NumberField<'_> {
		NumberField::property(&mut self.children, PropertyTarget::Code(code.into()))
	}

	pub fn with_date_property(&mut self, code: impl Into<String>) -> DateField<'_> {
		DateField::property(&mut self.children, PropertyTarget::Code(code.into()))
	}

	pub fn with_boolean_property(&mut self, code: impl Into<String>, value: bool) -> &mut Self {
		self.children.push(CriteriaNode::Property(PropertyLeaf {
			target: PropertyTarget::Code(code.into()),
			match_kind: MatchKind::Equals,
			value: FieldValue::Boolean(value),
		}));

		self
	}

	pub fn with_parents(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_relation(Direction::Parent, build)
	}

	pub fn with_children(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_relation(Direction::Child, build)
	}

	pub fn with_type(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_reference(Reference::Type, build)
	}

	pub fn with_experiment(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_reference(Reference::Experiment, build)
	}

	pub fn with_sample(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_reference(Reference::Sample, build)
	}

	pub fn with_container(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_reference(Reference::Container, build)
	}

	pub fn with_project(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_reference(Reference::Project, build)
	}

	pub fn with_space(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_reference(Reference::Space, build)
	}

	pub fn with_tag(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		self.with_reference(Reference::Tag, build)
	}

	pub fn without_space(&mut self) -> &mut Self {
		self.without(AbsenceField::Space)
	}

	pub fn without_project(&mut self) -> &mut Self {
		self.without(AbsenceField::Project)
	}

	pub fn without_experiment(&mut self) -> &mut Self {
		self.without(AbsenceField::Experiment)
	}

	pub fn without_container(&mut self) -> &mut Self {
		self.without(AbsenceField::Container)
	}

	pub fn without_sample(&mut self) -> &mut Self {
		self.without(AbsenceField::Sample)
	}

	/// Adds a nested operator node over the same entity kind.
	pub fn with_subcriteria(&mut self, build: impl FnOnce(&mut CriteriaBuilder)) -> &mut Self {
		let node = nested(build);

		self.children.push(node);

		self
	}

	/// Adds an already built node, e.g. one parsed from the JSON DSL.
	pub fn with_node(&mut self, node: CriteriaNode) -> &mut Self {
		self.children.push(node);

		self
	}

	pub fn build(self) -> CriteriaNode {
		CriteriaNode::Operator { operator: self.operator, children: self.children }
	}

	fn with_relation(
		&mut self,
		direction: Direction,
		build: impl FnOnce(&mut CriteriaBuilder),
	) -> &mut Self {
		let nested = Box::new(nested(build));

		self.children.push(CriteriaNode::Relation(RelationLeaf { direction, nested }));

		self
	}

	fn with_reference(
		&mut self,
		reference: Reference,
		build: impl FnOnce(&mut CriteriaBuilder),
	) -> &mut Self {
		let nested = Box::new(nested(build));

		self.children.push(CriteriaNode::Reference(ReferenceLeaf { reference, nested }));

		self
	}

	fn without(&mut self, field: AbsenceField) -> &mut Self {
		self.children.push(CriteriaNode::Absence(AbsenceLeaf { field }));

		self
	}
}

enum LeafTarget {
	Attribute(AttributeField),
	Property(PropertyTarget),
}

// Field builders only expose the match kinds their value type supports, so the leaves they push
// never need the runtime compatibility check.
fn push_leaf(
	children: &mut Vec<CriteriaNode>,
	target: LeafTarget,
	match_kind: MatchKind,
	value: FieldValue,
) {
	let node = match target {
		LeafTarget::Attribute(field) =>
			CriteriaNode::Attribute(AttributeLeaf { field, match_kind, value }),
		LeafTarget::Property(target) =>
			CriteriaNode::Property(PropertyLeaf { target, match_kind, value }),
	};

	children.push(node);
}

fn nested(build: impl FnOnce(&mut CriteriaBuilder)) -> CriteriaNode {
	let mut builder = CriteriaBuilder::new();

	build(&mut builder);

	builder.build()
}

pub struct TextField<'a> {
	children: &'a mut Vec<CriteriaNode>,
	target: LeafTarget,
}
impl<'a> TextField<'a> {
	fn attribute(children: &'a mut Vec<CriteriaNode>, field: AttributeField) -> Self {
		Self { children, target: LeafTarget::Attribute(field) }
	}

	fn property(children: &'a mut Vec<CriteriaNode>, target: PropertyTarget) -> Self {
		Self { children, target: LeafTarget::Property(target) }
	}

	pub fn that_equals(self, value: impl Into<String>) {
		self.push(MatchKind::Equals, FieldValue::Text(value.into()));
	}

	pub fn that_contains(self, value: impl Into<String>) {
		self.push(MatchKind::Contains, FieldValue::Text(value.into()));
	}

	pub fn that_starts_with(self, value: impl Into<String>) {
		self.push(MatchKind::StartsWith, FieldValue::Text(value.into()));
	}

	pub fn that_ends_with(self, value: impl Into<String>) {
		self.push(MatchKind::EndsWith, FieldValue::Text(value.into()));
	}

	pub fn that_is_in<I, S>(self, values: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let values = values.into_iter().map(Into::into).collect();

		self.push(MatchKind::InSet, FieldValue::TextSet(values));
	}

	fn push(self, match_kind: MatchKind, value: FieldValue) {
		push_leaf(self.children, self.target, match_kind, value);
	}
}

pub struct NumberField<'a> {
	children: &'a mut Vec<CriteriaNode>,
	target: LeafTarget,
}
impl<'a> NumberField<'a> {
	fn attribute(children: &'a mut Vec<CriteriaNode>, field: AttributeField) -> Self {
		Self { children, target: LeafTarget::Attribute(field) }
	}

	fn property(children: &'a mut Vec<CriteriaNode>, target: PropertyTarget) -> Self {
		Self { children, target: LeafTarget::Property(target) }
	}

	pub fn that_equals(self, value: f64) {
		self.push(MatchKind::Equals, FieldValue::Number(value));
	}

	pub fn that_is_less_than_or_equal_to(self, value: f64) {
		self.push(MatchKind::EarlierOrEqual, FieldValue::Number(value));
	}

	pub fn that_is_greater_than_or_equal_to(self, value: f64) {
		self.push(MatchKind::LaterOrEqual, FieldValue::Number(value));
	}

	pub fn that_is_in(self, values: impl IntoIterator<Item = f64>) {
		self.push(MatchKind::InSet, FieldValue::NumberSet(values.into_iter().collect()));
	}

	fn push(self, match_kind: MatchKind, value: FieldValue) {
		push_leaf(self.children, self.target, match_kind, value);
	}
}

pub struct DateField<'a> {
	children: &'a mut Vec<CriteriaNode>,
	target: LeafTarget,
}
impl<'a> DateField<'a> {
	fn attribute(children: &'a mut Vec<CriteriaNode>, field: AttributeField) -> Self {
		Self { children, target: LeafTarget::Attribute(field) }
	}

	fn property(children: &'a mut Vec<CriteriaNode>, target: PropertyTarget) -> Self {
		Self { children, target: LeafTarget::Property(target) }
	}

	pub fn that_equals(self, value: impl Into<DateValue>) {
		self.push(MatchKind::Equals, value.into());
	}

	pub fn that_is_earlier_than_or_equal_to(self, value: impl Into<DateValue>) {
		self.push(MatchKind::EarlierOrEqual, value.into());
	}

	pub fn that_is_later_than_or_equal_to(self, value: impl Into<DateValue>) {
		self.push(MatchKind::LaterOrEqual, value.into());
	}

	fn push(self, match_kind: MatchKind, value: DateValue) {
		push_leaf(self.children, self.target, match_kind, FieldValue::Date(value));
	}
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use crate::{
		AttributeField, AttributeLeaf, CriteriaBuilder, CriteriaError, CriteriaNode, DateValue,
		Direction, FieldValue, MatchKind, Operator, ValueType,
	};

	#[test]
	fn builder_defaults_to_and() {
		let mut criteria = CriteriaBuilder::new();

		criteria.with_code().that_equals("S1");

		let CriteriaNode::Operator { operator, children } = criteria.build() else {
			panic!("expected operator root");
		};

		assert_eq!(operator, Operator::And);
		assert_eq!(children.len(), 1);
	}

	#[test]
	fn builder_nests_relation_trees() {
		let mut criteria = CriteriaBuilder::new();

		criteria.with_or_operator();
		criteria.with_code().that_equals("S1");
		criteria.with_parents(|parents| {
			parents.with_code().that_equals("P1");
			parents.with_children(|children| {
				children
					.with_registration_date()
					.that_is_later_than_or_equal_to(date!(2019 - 06 - 12));
			});
		});

		let node = criteria.build();

		assert_eq!(node.depth(), 6);

		let CriteriaNode::Operator { operator: Operator::Or, children } = node else {
			panic!("expected OR root");
		};
		let CriteriaNode::Relation(relation) = &children[1] else {
			panic!("expected relation leaf");
		};

		assert_eq!(relation.direction, Direction::Parent);
	}

	#[test]
	fn empty_builder_is_an_empty_operator() {
		assert_eq!(CriteriaBuilder::new().build(), CriteriaNode::and(Vec::new()));
		assert_eq!(CriteriaNode::and(Vec::new()).depth(), 1);
	}

	#[test]
	fn attribute_leaf_rejects_value_of_wrong_type() {
		let err = AttributeLeaf::new(
			AttributeField::RegistrationDate,
			MatchKind::Equals,
			FieldValue::from("yesterday"),
		)
		.expect_err("expected type mismatch");

		assert_eq!(
			err,
			CriteriaError::FieldTypeMismatch {
				field: "registration_date",
				expected: ValueType::Date,
				found: ValueType::Text,
			}
		);
	}

	#[test]
	fn attribute_leaf_rejects_substring_match_on_dates() {
		let err = AttributeLeaf::new(
			AttributeField::ModificationDate,
			MatchKind::StartsWith,
			FieldValue::Date(DateValue::Day(date!(2020 - 01 - 01))),
		)
		.expect_err("expected unsupported match kind");

		assert!(matches!(err, CriteriaError::UnsupportedMatchKind { .. }));
	}
}
