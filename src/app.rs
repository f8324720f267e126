use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, patch, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, blog, content, craftsmen, dashboard, health, logs, newsletter, team, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt_config);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    // Public directory of listable craftsmen.
    let craftsman_routes = Router::new()
        .route("/", get(craftsmen::list_public))
        .route("/:id", get(craftsmen::get_public));

    let blog_routes = Router::new()
        .route("/posts", get(blog::list_posts))
        .route("/posts/:slug", get(blog::get_post))
        .route("/categories", get(blog::list_categories));

    let newsletter_routes = Router::new()
        .route("/subscribe", post(newsletter::subscribe))
        .route("/unsubscribe", post(newsletter::unsubscribe));

    // Back office: every handler resolves the session and consults the
    // access guard before touching the repository layer.
    let admin_routes = Router::new()
        .route("/craftsmen", get(craftsmen::list_admin))
        .route("/craftsmen/:id/approve", patch(craftsmen::approve))
        .route("/craftsmen/:id/reject", patch(craftsmen::reject))
        .route("/team", get(team::list).post(team::create))
        .route("/team/:id", put(team::update).delete(team::remove))
        .route("/users", get(users::list))
        .route("/users/:id/status", put(users::update_status))
        .route("/content/articles", get(content::list_articles).post(content::create_article))
        .route(
            "/content/articles/:id",
            put(content::update_article).delete(content::delete_article),
        )
        .route("/content/articles/:id/toggle", patch(content::toggle_article))
        .route("/content/categories", get(content::list_categories).post(content::create_category))
        .route(
            "/content/categories/:id",
            put(content::update_category).delete(content::delete_category),
        )
        .route("/logs", get(logs::list))
        .route("/dashboard", get(dashboard::overview));

    let router = Router::new()
        .nest("/auth", auth_routes)
        .nest("/craftsmen", craftsman_routes)
        .nest("/blog", blog_routes)
        .nest("/newsletter", newsletter_routes)
        .nest("/admin", admin_routes)
        .route("/api/health", get(health::health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
