#![allow(clippy::needless_for_each)]

use crate::{
    api::handlers::{
        customers::{
            self, __path_change_password, __path_login, __path_profile, __path_register,
            __path_update_profile,
        },
        health::{self, __path_health},
    },
    credentials::CredentialService,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod handlers;

pub use crate::GIT_COMMIT_HASH;

#[derive(OpenApi)]
#[openapi(
    paths(health, register, login, profile, update_profile, change_password),
    components(schemas(
        health::Health,
        customers::RegisterRequest,
        customers::LoginRequest,
        customers::UpdateProfileRequest,
        customers::ChangePasswordRequest,
        customers::CustomerResponse,
        handlers::ErrorBody,
        crate::credentials::Customer,
    )),
    tags(
        (name = "zoo-auth", description = "Customer authentication API")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router around `service`.
pub fn router(service: Arc<CredentialService>) -> Router {
    Router::new()
        .route("/customers/register", post(handlers::register))
        .route("/customers/login", post(handlers::login))
        .route(
            "/customers/:id",
            get(handlers::profile).put(handlers::update_profile),
        )
        .route("/customers/:id/password", put(handlers::change_password))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(service)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(port: u16, service: Arc<CredentialService>) -> Result<()> {
    let app = router(service);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_customer_routes() {
        let doc = openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for expected in [
            "/health",
            "/customers/register",
            "/customers/login",
            "/customers/{id}",
            "/customers/{id}/password",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }

        let customer = &doc.paths.paths["/customers/{id}"];
        assert!(customer.get.is_some());
        assert!(customer.put.is_some());
    }
}
