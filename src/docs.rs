use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::audit;
use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::auth::register,
		routes::auth::login,
		routes::auth::me,
		routes::auth::logout,
		routes::craftsmen::list_public,
		routes::craftsmen::get_public,
		routes::craftsmen::list_admin,
		routes::craftsmen::approve,
		routes::craftsmen::reject,
		routes::blog::list_posts,
		routes::blog::get_post,
		routes::blog::list_categories,
		routes::newsletter::subscribe,
		routes::newsletter::unsubscribe,
		routes::team::list,
		routes::team::create,
		routes::team::update,
		routes::team::remove,
		routes::users::list,
		routes::users::update_status,
		routes::content::list_articles,
		routes::content::create_article,
		routes::content::update_article,
		routes::content::delete_article,
		routes::content::toggle_article,
		routes::content::list_categories,
		routes::content::create_category,
		routes::content::update_category,
		routes::content::delete_category,
		routes::logs::list,
		routes::dashboard::overview,
		routes::health::health
	),
	components(
		schemas(
			models::user::User,
			models::user::AuthResponse,
			models::user::LoginRequest,
			models::user::RegisterRequest,
			models::user::TeamMemberCreateRequest,
			models::user::TeamMemberUpdateRequest,
			models::user::StatusUpdateRequest,
			models::user::StatusUpdateResponse,
			models::craftsman::Craftsman,
			models::craftsman::CraftsmanProfile,
			models::craftsman::CraftsmanOnboarding,
			models::craftsman::CraftsmanWithUser,
			models::craftsman::CraftsmanActionResponse,
			models::blog::BlogPost,
			models::blog::BlogCategory,
			models::blog::ArticleCreateRequest,
			models::blog::ArticleUpdateRequest,
			models::blog::ToggleRequest,
			models::blog::ArticleActionResponse,
			models::blog::CategoryCreateRequest,
			models::blog::CategoryUpdateRequest,
			models::blog::BlogListResponse,
			models::newsletter::SubscribeRequest,
			models::newsletter::NewsletterResponse,
			models::pagination::PageMeta,
			audit::ActivityEntry,
			routes::auth::MessageResponse,
			routes::craftsmen::DirectoryResponse,
			routes::team::DeleteResponse,
			routes::users::UserListResponse,
			routes::logs::ActivityLogResponse,
			routes::dashboard::DashboardResponse,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Auth", description = "Authentication endpoints"),
		(name = "Craftsmen", description = "Public craftsman directory"),
		(name = "Blog", description = "Public blog"),
		(name = "Newsletter", description = "Newsletter subscription"),
		(name = "Admin", description = "Back office"),
		(name = "Health", description = "Service health")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(&ApiDoc::openapi())?;

	normalize_path_operations(&mut doc);
	ensure_security_components(&mut doc);
	ensure_global_security(&mut doc);
	ensure_openapi_version(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc).expect("OpenAPI serialization must succeed"));

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config))
}

fn normalize_path_operations(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		let snapshot = paths.clone();
		for (path, item) in snapshot {
			if let Some(ops) = item.as_object() {
				let mut normalized = Map::new();
				for (method, val) in ops {
					let key = method.to_lowercase();
					if let Some(existing) = normalized.get_mut(&key) {
						merge_values(existing, &val);
					} else {
						normalized.insert(key, val.clone());
					}
				}
				paths.insert(path, Value::Object(normalized));
			}
		}
	}
}

fn ensure_security_components(doc: &mut Value) {
	let components = doc
		.as_object_mut()
		.expect("OpenAPI root must be an object")
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.expect("components must be an object");

	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.expect("securitySchemes must be an object");

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT"
		}),
	);
}

fn ensure_global_security(doc: &mut Value) {
	doc
		.as_object_mut()
		.expect("OpenAPI root must be an object")
		.entry("security")
		.or_insert_with(|| json!([{ "bearerAuth": [] }]));
}

fn ensure_openapi_version(doc: &mut Value) {
	doc
		.as_object_mut()
		.expect("OpenAPI root must be an object")
		.entry("openapi")
		.or_insert_with(|| Value::String("3.1.0".to_string()));
}

fn ensure_servers(doc: &mut Value, port: u16) {
	// Match the scheme the server will actually bind; Swagger's Try-it-out
	// calls the backend directly.
	let tls_enabled = std::env::var("CERT_PATH").is_ok() && std::env::var("KEY_PATH").is_ok();
	let scheme = if tls_enabled { "https" } else { "http" };
	let server_url = format!("{}://localhost:{}", scheme, port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr
				.iter()
				.any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(dest), Value::Object(src)) => {
			for (key, value) in src {
				if let Some(existing) = dest.get_mut(key) {
					merge_values(existing, value);
				} else {
					dest.insert(key.clone(), value.clone());
				}
			}
		}
		(Value::Array(dest), Value::Array(src)) => {
			for item in src {
				if !dest.contains(item) {
					dest.push(item.clone());
				}
			}
		}
		_ => {}
	}
}
