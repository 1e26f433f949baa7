pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../sql/00_extensions.sql")),
				"tables/001_organizations.sql" =>
					out.push_str(include_str!("../sql/tables/001_organizations.sql")),
				"tables/002_projects.sql" =>
					out.push_str(include_str!("../sql/tables/002_projects.sql")),
				"tables/003_sessions.sql" =>
					out.push_str(include_str!("../sql/tables/003_sessions.sql")),
				"tables/004_entries.sql" =>
					out.push_str(include_str!("../sql/tables/004_entries.sql")),
				"tables/005_entry_versions.sql" =>
					out.push_str(include_str!("../sql/tables/005_entry_versions.sql")),
				"tables/006_tags.sql" => out.push_str(include_str!("../sql/tables/006_tags.sql")),
				"tables/007_entry_tags.sql" =>
					out.push_str(include_str!("../sql/tables/007_entry_tags.sql")),
				"tables/008_entry_relations.sql" =>
					out.push_str(include_str!("../sql/tables/008_entry_relations.sql")),
				"tables/009_embeddings.sql" =>
					out.push_str(include_str!("../sql/tables/009_embeddings.sql")),
				"tables/010_entry_fts.sql" =>
					out.push_str(include_str!("../sql/tables/010_entry_fts.sql")),
				"tables/011_retrieval_outcomes.sql" =>
					out.push_str(include_str!("../sql/tables/011_retrieval_outcomes.sql")),
				"tables/012_embedding_jobs.sql" =>
					out.push_str(include_str!("../sql/tables/012_embedding_jobs.sql")),
				"tables/013_permission_grants.sql" =>
					out.push_str(include_str!("../sql/tables/013_permission_grants.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
