//! HTTP transport for the catalog schema.

use std::future::Future;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::types::CatalogSchema;

/// Endpoint serving queries (POST) and GraphiQL (GET).
pub const GRAPHQL_PATH: &str = "/graphql";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Also serve GraphiQL on `/`.
    pub enable_playground: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            enable_playground: true,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Routes for `schema`: the GraphQL endpoint, `/health`, and GraphiQL on `/`
/// when enabled.
pub fn router(schema: CatalogSchema, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route(GRAPHQL_PATH, get(graphiql).post(graphql_handler))
        .route("/health", get(health_check));

    let app = if config.enable_playground {
        app.route("/", get(graphiql))
    } else {
        app
    };

    app.with_state(schema)
}

/// Bind `config.address()` and serve until `shutdown_signal` resolves.
pub async fn serve_with_shutdown<F>(
    schema: CatalogSchema,
    config: ServerConfig,
    shutdown_signal: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(schema, &config);
    let listener = tokio::net::TcpListener::bind(config.address()).await?;

    info!(
        "GraphQL server listening on http://{}{}",
        listener.local_addr()?,
        GRAPHQL_PATH
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    debug!("GraphQL server stopped");
    Ok(())
}

#[instrument(skip_all, fields(operation = tracing::field::Empty))]
async fn graphql_handler(
    State(schema): State<CatalogSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request = req.into_inner();
    if let Some(name) = &request.operation_name {
        tracing::Span::current().record("operation", name.as_str());
    }

    let response = schema.execute(request).await;
    if response.is_err() {
        debug!(errors = response.errors.len(), "Query answered with errors");
    }
    response.into()
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
