//! Per-kind table and column mapping.
//!
//! Every SQL identifier the search engine emits comes from the tables in this module.

use sift_domain::{AbsenceField, AttributeField, CriteriaError, EntityKind, Reference, SortField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyMapping {
	pub table: &'static str,
	pub entity_column: &'static str,
}

/// How an owner row reaches the entity it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePath {
	/// Foreign-key column on the owner's table.
	Column(&'static str),
	/// Link table pairing `owner_column` with `target_column`; one owner may have many targets.
	Link { table: &'static str, owner_column: &'static str, target_column: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceMapping {
	pub reference: Reference,
	pub via: ReferencePath,
	pub target: EntityKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMapper {
	pub kind: EntityKind,
	pub table: &'static str,
	pub code_column: &'static str,
	pub perm_id_column: &'static str,
	pub registration_column: Option<&'static str>,
	pub modification_column: &'static str,
	pub properties: Option<PropertyMapping>,
	/// Parent/child table with `parent_id` and `child_id` columns.
	pub relationships: Option<&'static str>,
	pub references: &'static [ReferenceMapping],
	pub absences: &'static [(AbsenceField, &'static str)],
	/// Foreign-key columns matched as text by `any_field`.
	pub foreign_keys: &'static [&'static str],
}
impl TableMapper {
	pub fn for_kind(kind: EntityKind) -> &'static Self {
		match kind {
			EntityKind::Sample => &SAMPLE,
			EntityKind::Experiment => &EXPERIMENT,
			EntityKind::DataSet => &DATA_SET,
			EntityKind::SampleType => &SAMPLE_TYPE,
			EntityKind::ExperimentType => &EXPERIMENT_TYPE,
			EntityKind::DataSetType => &DATA_SET_TYPE,
			EntityKind::Project => &PROJECT,
			EntityKind::Space => &SPACE,
			EntityKind::Tag => &TAG,
		}
	}

	/// Column backing a single-column attribute. `AnyField` has none.
	pub fn attribute_column(&self, field: AttributeField) -> Result<&'static str, CriteriaError> {
		match field {
			AttributeField::Code => Ok(self.code_column),
			AttributeField::PermId => Ok(self.perm_id_column),
			AttributeField::Id => Ok("id"),
			AttributeField::RegistrationDate =>
				self.registration_column.ok_or_else(|| self.unsupported("registration_date")),
			AttributeField::ModificationDate => Ok(self.modification_column),
			AttributeField::AnyField => Err(self.unsupported("any_field as a single column")),
		}
	}

	pub fn sort_column(&self, field: SortField) -> Result<&'static str, CriteriaError> {
		match field {
			SortField::Id => Ok("id"),
			SortField::Code => Ok(self.code_column),
			SortField::PermId => Ok(self.perm_id_column),
			SortField::RegistrationDate => self
				.registration_column
				.ok_or_else(|| self.unsupported("sorting by registration_date")),
			SortField::ModificationDate => Ok(self.modification_column),
		}
	}

	pub fn property_mapping(&self) -> Result<PropertyMapping, CriteriaError> {
		self.properties.ok_or_else(|| self.unsupported("property criteria"))
	}

	pub fn relationship_table(&self) -> Result<&'static str, CriteriaError> {
		self.relationships.ok_or_else(|| self.unsupported("parent/child criteria"))
	}

	pub fn reference(&self, reference: Reference) -> Result<ReferenceMapping, CriteriaError> {
		self.references
			.iter()
			.find(|mapping| mapping.reference == reference)
			.copied()
			.ok_or_else(|| self.unsupported(&format!("{} criteria", reference.as_str())))
	}

	pub fn absence_column(&self, field: AbsenceField) -> Result<&'static str, CriteriaError> {
		self.absences
			.iter()
			.find(|(candidate, _)| *candidate == field)
			.map(|(_, column)| *column)
			.ok_or_else(|| self.unsupported(&format!("missing {} criteria", field.as_str())))
	}

	/// Text expressions searched by `any_field`, without duplicates.
	pub fn any_field_text_columns(&self) -> Vec<String> {
		let mut columns = vec![self.code_column.to_string()];

		if self.perm_id_column != self.code_column {
			columns.push(self.perm_id_column.to_string());
		}

		columns.push("id::text".to_string());
		columns.extend(self.foreign_keys.iter().map(|column| format!("{column}::text")));

		columns
	}

	pub fn date_columns(&self) -> Vec<&'static str> {
		self.registration_column.into_iter().chain([self.modification_column]).collect()
	}

	fn unsupported(&self, what: &str) -> CriteriaError {
		CriteriaError::IncompatibleEntityKind { kind: self.kind, what: what.to_string() }
	}
}

static SAMPLE: TableMapper = TableMapper {
	kind: EntityKind::Sample,
	table: "samples",
	code_column: "code",
	perm_id_column: "perm_id",
	registration_column: Some("registration_timestamp"),
	modification_column: "modification_timestamp",
	properties: Some(PropertyMapping { table: "sample_properties", entity_column: "samp_id" }),
	relationships: Some("sample_relationships"),
	references: &[
		ReferenceMapping {
			reference: Reference::Type,
			via: ReferencePath::Column("saty_id"),
			target: EntityKind::SampleType,
		},
		ReferenceMapping {
			reference: Reference::Experiment,
			via: ReferencePath::Column("expe_id"),
			target: EntityKind::Experiment,
		},
		ReferenceMapping {
			reference: Reference::Container,
			via: ReferencePath::Column("samp_id_part_of"),
			target: EntityKind::Sample,
		},
		ReferenceMapping {
			reference: Reference::Project,
			via: ReferencePath::Column("proj_id"),
			target: EntityKind::Project,
		},
		ReferenceMapping {
			reference: Reference::Space,
			via: ReferencePath::Column("space_id"),
			target: EntityKind::Space,
		},
		ReferenceMapping {
			reference: Reference::Tag,
			via: tag_link("samp_id"),
			target: EntityKind::Tag,
		},
	],
	absences: &[
		(AbsenceField::Space, "space_id"),
		(AbsenceField::Project, "proj_id"),
		(AbsenceField::Experiment, "expe_id"),
		(AbsenceField::Container, "samp_id_part_of"),
	],
	foreign_keys: &["saty_id", "space_id", "proj_id", "expe_id", "samp_id_part_of"],
};

static EXPERIMENT: TableMapper = TableMapper {
	kind: EntityKind::Experiment,
	table: "experiments",
	code_column: "code",
	perm_id_column: "perm_id",
	registration_column: Some("registration_timestamp"),
	modification_column: "modification_timestamp",
	properties: Some(PropertyMapping { table: "experiment_properties", entity_column: "expe_id" }),
	relationships: None,
	references: &[
		ReferenceMapping {
			reference: Reference::Type,
			via: ReferencePath::Column("exty_id"),
			target: EntityKind::ExperimentType,
		},
		ReferenceMapping {
			reference: Reference::Project,
			via: ReferencePath::Column("proj_id"),
			target: EntityKind::Project,
		},
		ReferenceMapping {
			reference: Reference::Tag,
			via: tag_link("expe_id"),
			target: EntityKind::Tag,
		},
	],
	absences: &[],
	foreign_keys: &["exty_id", "proj_id"],
};

static DATA_SET: TableMapper = TableMapper {
	kind: EntityKind::DataSet,
	table: "data_sets",
	code_column: "code",
	perm_id_column: "perm_id",
	registration_column: Some("registration_timestamp"),
	modification_column: "modification_timestamp",
	properties: Some(PropertyMapping { table: "data_set_properties", entity_column: "ds_id" }),
	relationships: Some("data_set_relationships"),
	references: &[
		ReferenceMapping {
			reference: Reference::Type,
			via: ReferencePath::Column("dsty_id"),
			target: EntityKind::DataSetType,
		},
		ReferenceMapping {
			reference: Reference::Experiment,
			via: ReferencePath::Column("expe_id"),
			target: EntityKind::Experiment,
		},
		ReferenceMapping {
			reference: Reference::Sample,
			via: ReferencePath::Column("samp_id"),
			target: EntityKind::Sample,
		},
		ReferenceMapping {
			reference: Reference::Tag,
			via: tag_link("data_id"),
			target: EntityKind::Tag,
		},
	],
	absences: &[(AbsenceField::Experiment, "expe_id"), (AbsenceField::Sample, "samp_id")],
	foreign_keys: &["dsty_id", "expe_id", "samp_id"],
};

static SAMPLE_TYPE: TableMapper = type_mapper(EntityKind::SampleType, "sample_types");
static EXPERIMENT_TYPE: TableMapper = type_mapper(EntityKind::ExperimentType, "experiment_types");
static DATA_SET_TYPE: TableMapper = type_mapper(EntityKind::DataSetType, "data_set_types");

static PROJECT: TableMapper = TableMapper {
	kind: EntityKind::Project,
	table: "projects",
	code_column: "code",
	perm_id_column: "perm_id",
	registration_column: Some("registration_timestamp"),
	modification_column: "modification_timestamp",
	properties: None,
	relationships: None,
	references: &[ReferenceMapping {
		reference: Reference::Space,
		via: ReferencePath::Column("space_id"),
		target: EntityKind::Space,
	}],
	absences: &[],
	foreign_keys: &["space_id"],
};

// Spaces are identified by their code.
static SPACE: TableMapper = TableMapper {
	kind: EntityKind::Space,
	table: "spaces",
	code_column: "code",
	perm_id_column: "code",
	registration_column: Some("registration_timestamp"),
	modification_column: "modification_timestamp",
	properties: None,
	relationships: None,
	references: &[],
	absences: &[],
	foreign_keys: &[],
};

// Tags are private to their owner and identified by their code.
static TAG: TableMapper = TableMapper {
	kind: EntityKind::Tag,
	table: "metaprojects",
	code_column: "code",
	perm_id_column: "code",
	registration_column: Some("registration_timestamp"),
	modification_column: "modification_timestamp",
	properties: None,
	relationships: None,
	references: &[],
	absences: &[],
	foreign_keys: &[],
};

const fn tag_link(owner_column: &'static str) -> ReferencePath {
	ReferencePath::Link { table: "metaproject_assignments", owner_column, target_column: "mepr_id" }
}

const fn type_mapper(kind: EntityKind, table: &'static str) -> TableMapper {
	TableMapper {
		kind,
		table,
		code_column: "code",
		perm_id_column: "code",
		registration_column: None,
		modification_column: "modification_timestamp",
		properties: None,
		relationships: None,
		references: &[],
		absences: &[],
		foreign_keys: &[],
	}
}
