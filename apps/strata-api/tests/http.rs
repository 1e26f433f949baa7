use axum::{
	body::Body,
	http::{Request, StatusCode},
};
use strata_api::{routes, state::AppState};
use tower::ServiceExt;

fn test_config(dsn: String) -> strata_config::Config {
	strata_config::Config {
		service: strata_config::Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			mcp_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: strata_config::Storage {
			postgres: strata_config::Postgres { dsn, pool_max_conns: 4, vector_dim: 8 },
		},
		providers: strata_config::Providers {
			embedder: dummy_provider(),
			reranker: dummy_provider(),
			classifier: dummy_provider(),
			summarizer: dummy_provider(),
		},
		search: strata_config::Search {
			hybrid_alpha: 0.5,
			rerank_alpha: 0.3,
			rerank_top_k: 20,
			hyde_enabled: false,
			default_limit: 10,
			max_limit: 100,
			coverage_bonus: 0.05,
		},
		prioritization: strata_config::Prioritization {
			weights: strata_config::PriorityWeights { adaptive_weight: 0.3, usefulness: 0.3, context_boost: 0.4 },
			adaptive: strata_config::AdaptiveConfig {
				min_samples: 5,
				confidence_span: 20.0,
				learning_rate: 0.1,
				baselines: Default::default(),
			},
			usefulness: strata_config::UsefulnessConfig {
				volume_confidence_weight: 0.3,
				success_rate_weight: 0.5,
				recency_weight: 0.2,
				recency_tau_days: 30.0,
				min_retrievals_for_signal: 3,
			},
			context_boost: strata_config::ContextBoostConfig { beta: 0.5, boost_multiplier: 1.0, exemplar_count: 3 },
		},
		cache: strata_config::Cache { capacity: 256, ttl_seconds: 60 },
		security: strata_config::Security {
			cursor_secret: "test-cursor-secret".to_string(),
			cursor_ttl_seconds: 300,
			rate_limit: strata_config::RateLimit { window_seconds: 60, max_requests_per_agent: 1000, max_requests_global: 10_000 },
			permission_mode: "permissive".to_string(),
			admin_key: Some("test-admin-key".to_string()),
		},
		embedding_queue: strata_config::EmbeddingQueue {
			concurrency: 4,
			max_queue_length: 1000,
			base_backoff_ms: 100,
			max_backoff_ms: 5000,
			max_attempts: 5,
			claim_lease_seconds: 30,
			poll_interval_ms: 50,
		},
	}
}

fn dummy_provider() -> strata_config::ProviderConfig {
	strata_config::ProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		path: "/".to_string(),
		model: "test".to_string(),
		timeout_ms: 1000,
		default_headers: Default::default(),
	}
}

#[tokio::test]
async fn health_ok() {
	let Some(base_dsn) = strata_testkit::env_dsn() else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let db = strata_testkit::TestDatabase::new(&base_dsn).await.expect("create test database");
	let cfg = test_config(db.dsn().to_string());
	let state = AppState::new(cfg).await.expect("build app state");
	let app = routes::router(state);

	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("build request"))
		.await
		.expect("call /health");

	assert_eq!(response.status(), StatusCode::OK);

	db.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn add_and_get_entry_round_trips_over_http() {
	let Some(base_dsn) = strata_testkit::env_dsn() else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let db = strata_testkit::TestDatabase::new(&base_dsn).await.expect("create test database");
	let cfg = test_config(db.dsn().to_string());
	let state = AppState::new(cfg).await.expect("build app state");
	let app = routes::router(state);

	let body = serde_json::json!({
		"agent_id": "agent-1",
		"kind": "knowledge",
		"scope_type": "global",
		"scope_id": null,
		"name": "http-entry",
		"category": null,
		"content": "hello over http",
		"rationale": null,
	});

	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/entries")
				.header("content-type", "application/json")
				.body(Body::from(serde_json::to_vec(&body).unwrap()))
				.expect("build request"),
		)
		.await
		.expect("call POST /v1/entries");

	assert_eq!(response.status(), StatusCode::OK);

	db.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn organization_project_session_lifecycle_over_http() {
	let Some(base_dsn) = strata_testkit::env_dsn() else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let db = strata_testkit::TestDatabase::new(&base_dsn).await.expect("create test database");
	let cfg = test_config(db.dsn().to_string());
	let state = AppState::new(cfg).await.expect("build app state");
	let app = routes::router(state);

	let create_org = app
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/organizations")
				.header("content-type", "application/json")
				.body(Body::from(serde_json::to_vec(&serde_json::json!({ "name": "acme" })).unwrap()))
				.expect("build request"),
		)
		.await
		.expect("call POST /v1/organizations");

	assert_eq!(create_org.status(), StatusCode::OK);

	let body = axum::body::to_bytes(create_org.into_body(), usize::MAX).await.expect("read body");
	let org: serde_json::Value = serde_json::from_slice(&body).expect("parse org json");
	let org_id = org["id"].as_str().expect("org id").to_string();

	let rename = app
		.clone()
		.oneshot(
			Request::builder()
				.method("PUT")
				.uri(format!("/v1/organizations/{org_id}"))
				.header("content-type", "application/json")
				.body(Body::from(serde_json::to_vec(&serde_json::json!({ "name": "acme-renamed" })).unwrap()))
				.expect("build request"),
		)
		.await
		.expect("call PUT /v1/organizations/{org_id}");

	assert_eq!(rename.status(), StatusCode::OK);

	let list_orgs = app
		.clone()
		.oneshot(Request::builder().uri("/v1/organizations").body(Body::empty()).expect("build request"))
		.await
		.expect("call GET /v1/organizations");

	assert_eq!(list_orgs.status(), StatusCode::OK);

	let body = axum::body::to_bytes(list_orgs.into_body(), usize::MAX).await.expect("read body");
	let orgs: Vec<serde_json::Value> = serde_json::from_slice(&body).expect("parse orgs json");

	assert!(orgs.iter().any(|o| o["id"] == org_id));

	let create_project = app
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/projects")
				.header("content-type", "application/json")
				.body(Body::from(
					serde_json::to_vec(&serde_json::json!({
						"org_id": org_id,
						"name": "widget-factory",
						"description": null,
						"root_path": null,
					}))
					.unwrap(),
				))
				.expect("build request"),
		)
		.await
		.expect("call POST /v1/projects");

	assert_eq!(create_project.status(), StatusCode::OK);

	let body = axum::body::to_bytes(create_project.into_body(), usize::MAX).await.expect("read body");
	let project: serde_json::Value = serde_json::from_slice(&body).expect("parse project json");
	let project_id = project["id"].as_str().expect("project id").to_string();

	let start_session = app
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/sessions")
				.header("content-type", "application/json")
				.body(Body::from(
					serde_json::to_vec(&serde_json::json!({
						"project_id": project_id,
						"name": "http-session",
						"purpose": null,
						"agent_id": "agent-1",
					}))
					.unwrap(),
				))
				.expect("build request"),
		)
		.await
		.expect("call POST /v1/sessions");

	assert_eq!(start_session.status(), StatusCode::OK);

	let body = axum::body::to_bytes(start_session.into_body(), usize::MAX).await.expect("read body");
	let session: serde_json::Value = serde_json::from_slice(&body).expect("parse session json");
	let session_id = session["id"].as_str().expect("session id").to_string();

	let list_sessions = app
		.clone()
		.oneshot(
			Request::builder()
				.uri(format!("/v1/sessions?project_id={project_id}"))
				.body(Body::empty())
				.expect("build request"),
		)
		.await
		.expect("call GET /v1/sessions");

	assert_eq!(list_sessions.status(), StatusCode::OK);

	let body = axum::body::to_bytes(list_sessions.into_body(), usize::MAX).await.expect("read body");
	let sessions: Vec<serde_json::Value> = serde_json::from_slice(&body).expect("parse sessions json");

	assert!(sessions.iter().any(|s| s["id"] == session_id));

	db.cleanup().await.expect("cleanup");
}
