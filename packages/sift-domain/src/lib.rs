pub mod criteria;
pub mod dsl;
pub mod entity;
pub mod options;
pub mod value;

mod error;

pub use criteria::{
	AbsenceField, AbsenceLeaf, AttributeField, AttributeLeaf, CriteriaBuilder, CriteriaNode,
	Direction, Operator, PropertyLeaf, PropertyTarget, Reference, ReferenceLeaf, RelationLeaf,
};
pub use entity::EntityKind;
pub use error::CriteriaError;
pub use options::{FetchOptions, SortField, SortOptions, SortOrder, Sorting};
pub use value::{DateValue, FieldValue, MatchKind, ValueType};
