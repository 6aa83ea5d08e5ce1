mod auth;
mod config;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use crate::service::budget_warning::WarningPolicy;
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG overrides the configured level, e.g.
    //   RUST_LOG=info,spendsense::service=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // A global subscriber may already be set (tests build several rockets).
    let _ = if json_format { subscriber.json().try_init() } else { subscriber.try_init() };
}

fn ensure_rocket_secret_key() {
    let profile = std::env::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());

    // Only enforce ROCKET_SECRET_KEY requirement for non-debug profiles
    if profile != "debug" && std::env::var("ROCKET_SECRET_KEY").is_err() {
        panic!(
            "ROCKET_SECRET_KEY is required for profile '{}'. Generate one with: openssl rand -base64 32",
            profile
        );
    }
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Put, Method::Delete, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Authorization", "Accept"]),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

fn get_swagger_config(openapi_url: &str) -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: openapi_url.to_string(),
        ..Default::default()
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return config::DEFAULT_API_BASE_PATH.to_string();
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }

    normalized
}

fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

struct RouteSpec {
    path: &'static str,
    routes: Vec<rocket::Route>,
    openapi: rocket_okapi::okapi::openapi3::OpenApi,
}

fn collect_route_specs() -> Vec<RouteSpec> {
    let (user_routes, user_openapi) = app_routes::user::routes();
    let (budget_routes, budget_openapi) = app_routes::budget::routes();
    let (transaction_routes, transaction_openapi) = app_routes::transaction::routes();
    let (admin_routes, admin_openapi) = app_routes::admin::routes();
    let (health_routes, health_openapi) = app_routes::health::routes();

    vec![
        RouteSpec {
            path: "/users",
            routes: user_routes,
            openapi: user_openapi,
        },
        RouteSpec {
            path: "/budgets",
            routes: budget_routes,
            openapi: budget_openapi,
        },
        RouteSpec {
            path: "/transactions",
            routes: transaction_routes,
            openapi: transaction_openapi,
        },
        RouteSpec {
            path: "/admin",
            routes: admin_routes,
            openapi: admin_openapi,
        },
        RouteSpec {
            path: "/health",
            routes: health_routes,
            openapi: health_openapi,
        },
    ]
}

fn mount_api_routes(mut rocket: Rocket<Build>, base_path: &str, enable_swagger: bool) -> Rocket<Build> {
    let route_specs = collect_route_specs();

    if enable_swagger {
        let mut openapi_list = Vec::new();
        for spec in route_specs {
            rocket = rocket.mount(format!("{}{}", base_path, spec.path), spec.routes);
            openapi_list.push((spec.path, spec.openapi));
        }

        let openapi_docs = match marge_spec_list(&openapi_list) {
            Ok(docs) => docs,
            Err(err) => panic!("Could not merge OpenAPI spec: {}", err),
        };

        let settings = rocket_okapi::settings::OpenApiSettings::default();
        rocket = rocket.mount(base_path, vec![get_openapi_route(openapi_docs, &settings)]);

        let docs_path = join_base_path(base_path, "docs");
        let openapi_url = join_base_path(base_path, "openapi.json");
        rocket = rocket.mount(docs_path, make_swagger_ui(&get_swagger_config(&openapi_url)));
    } else {
        for spec in route_specs {
            rocket = rocket.mount(format!("{}{}", base_path, spec.path), spec.routes);
        }
    }

    rocket
}

/// Everything except the database stage.
fn assemble(config: &Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);
    ensure_rocket_secret_key();

    let cors = build_cors(&config.cors).to_cors().expect("Failed to create CORS fairing");
    let policy = WarningPolicy::from_config(&config.budgets).unwrap_or_else(|e| panic!("Invalid budgets configuration: {}", e));

    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port));

    let base_path = normalize_base_path(&config.api.base_path);

    let rocket = rocket::custom(figment)
        .attach(cors)
        .attach(RequestLogger)
        .manage(policy)
        .manage(config.session.clone());

    mount_api_routes(rocket, &base_path, config.api.enable_swagger).register(
        base_path.as_str(),
        catchers![
            app_routes::error::bad_request,
            app_routes::error::unauthorized,
            app_routes::error::forbidden,
            app_routes::error::not_found,
            app_routes::error::conflict,
            app_routes::error::unprocessable_entity,
            app_routes::error::internal_error,
        ],
    )
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    assemble(&config).attach(stage_db(config.database))
}

/// Same application over a lazily connected pool, so no database is needed until a query runs.
#[cfg(test)]
pub(crate) fn build_test_rocket(config: Config) -> Rocket<Build> {
    let pool = db::lazy_pool(&config.database).expect("valid database url");
    assemble(&config).manage(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_path_adds_leading_and_strips_trailing_slash() {
        assert_eq!(normalize_base_path("api/"), "/api");
        assert_eq!(normalize_base_path("/v1/api//"), "/v1/api");
        assert_eq!(normalize_base_path("  "), config::DEFAULT_API_BASE_PATH);
    }

    #[test]
    fn join_base_path_handles_slashes() {
        assert_eq!(join_base_path("/api", "docs"), "/api/docs");
        assert_eq!(join_base_path("/api/", "/openapi.json"), "/api/openapi.json");
        assert_eq!(join_base_path("", "docs"), "/docs");
    }

    #[test]
    #[should_panic(expected = "wildcard")]
    fn wildcard_cors_with_credentials_is_rejected() {
        let cors = config::CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        };
        build_cors(&cors);
    }

    #[rocket::async_test]
    async fn openapi_document_is_served() {
        let client = crate::test_utils::test_client().await;
        let response = client.get("/api/openapi.json").dispatch().await;
        assert_eq!(response.status(), rocket::http::Status::Ok);
    }
}
