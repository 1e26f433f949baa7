use uuid::Uuid;

use crate::{Result, StrataService, access, entries};

pub struct ContextRequest<'a> {
	pub agent_id: &'a str,
	pub scope_type: &'a str,
	pub scope_id: Option<Uuid>,
	pub inherit: bool,
	pub compact: bool,
	pub limit_per_type: u32,
	/// When true, results are grouped by the scope they originated from instead of flattened.
	pub hierarchical: bool,
}

pub struct ScopeBundle {
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub by_kind: Vec<(String, Vec<strata_storage::models::Entry>)>,
}

pub struct ContextResponse {
	pub scopes: Vec<ScopeBundle>,
}

/// Aggregates active entries of every kind across the (optionally inherited) scope chain.
/// `experience` is included by default at the same `limitPerType` as every other kind (§9 Open
/// Question decision).
pub async fn build(service: &StrataService, request: ContextRequest<'_>) -> Result<ContextResponse> {
	let chain = if request.inherit {
		match request.scope_id {
			Some(id) => strata_storage::scopes::ancestor_chain(&service.db, request.scope_type, id).await?,
			None => vec![("global".to_string(), None)],
		}
	} else {
		vec![(request.scope_type.to_string(), request.scope_id)]
	};

	let mut scopes = Vec::with_capacity(chain.len());

	for (scope_type, scope_id) in &chain {
		let mut by_kind = Vec::with_capacity(entries::KINDS.len());

		for kind in entries::KINDS {
			if access::check(service, request.agent_id, scope_type, *scope_id, *kind, access::Level::Read).await.is_err() {
				continue;
			}

			let filter = entries::ListFilter {
				kind: Some(*kind),
				scope_type: Some(scope_type.as_str()),
				scope_id: *scope_id,
				category: None,
				include_inactive: false,
			};
			let rows = entries::list(service, filter, request.limit_per_type as i64, 0).await?;

			by_kind.push((kind.to_string(), rows));
		}

		scopes.push(ScopeBundle { scope_type: scope_type.clone(), scope_id: *scope_id, by_kind });
	}

	if !request.hierarchical {
		let flattened: Vec<(String, Vec<strata_storage::models::Entry>)> = entries::KINDS
			.iter()
			.map(|kind| {
				let merged: Vec<strata_storage::models::Entry> =
					scopes.iter().flat_map(|bundle| bundle.by_kind.iter().find(|(k, _)| k == kind).map(|(_, rows)| rows.clone()).unwrap_or_default()).collect();

				(kind.to_string(), merged)
			})
			.collect();

		return Ok(ContextResponse {
			scopes: vec![ScopeBundle { scope_type: request.scope_type.to_string(), scope_id: request.scope_id, by_kind: flattened }],
		});
	}

	Ok(ContextResponse { scopes })
}
