pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

/// Splits a rendered schema into executable statements, skipping comments and blanks.
pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| {
		statement.lines().any(|line| {
			let line = line.trim();

			!line.is_empty() && !line.starts_with("--")
		})
	})
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_spaces.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_spaces.sql")),
				"tables/002_projects.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_projects.sql")),
				"tables/003_entity_types.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_entity_types.sql")),
				"tables/004_experiments.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_experiments.sql")),
				"tables/005_samples.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_samples.sql")),
				"tables/006_data_sets.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_data_sets.sql")),
				"tables/007_relationships.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_relationships.sql")),
				"tables/008_property_types.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_property_types.sql")),
				"tables/009_properties.sql" =>
					out.push_str(include_str!("../../../sql/tables/009_properties.sql")),
				"tables/010_role_assignments.sql" =>
					out.push_str(include_str!("../../../sql/tables/010_role_assignments.sql")),
				"tables/011_metaprojects.sql" =>
					out.push_str(include_str!("../../../sql/tables/011_metaprojects.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
