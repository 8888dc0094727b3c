use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api::SalesSchema;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::{Path, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use sales::{render_customer_form, submit_customer_form, CreateOutcome, FormData, SalesError};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub schema: SalesSchema,
}

pub async fn serve(addr: SocketAddr, router: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "sales server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/healthz", get(health_handler))
        .route(
            "/customers/new",
            get(new_customer_form).post(create_customer_handler),
        )
        .route("/customers/{id}", get(customer_form_handler))
        .route("/graphql", get(graphql_handler).post(graphql_handler))
        .route("/graphiql", get(graphiql))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_allowed_origins)),
        )
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.db.get_database_backend();
    let db_ok = state
        .db
        .execute(Statement::from_string(backend, "SELECT 1"))
        .await
        .is_ok();
    let (status, label) = if db_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (status, Json(json!({ "status": label, "database": db_ok })))
}

async fn new_customer_form(State(state): State<AppState>) -> HttpResult<Response> {
    let view = render_customer_form(state.db.as_ref(), None).await?;
    Ok(Json(view).into_response())
}

async fn customer_form_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HttpResult<Response> {
    let view = render_customer_form(state.db.as_ref(), Some(id)).await?;
    Ok(Json(view).into_response())
}

/// Valid submissions redirect to the stored customer with `303 See Other`;
/// invalid ones come back as the form with errors and `422`.
async fn create_customer_handler(
    State(state): State<AppState>,
    Form(data): Form<FormData>,
) -> HttpResult<Response> {
    match submit_customer_form(state.db.as_ref(), &data).await? {
        CreateOutcome::Created { redirect_to, .. } => Ok(Redirect::to(&redirect_to).into_response()),
        CreateOutcome::Invalid(view) => {
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response())
        }
    }
}

async fn graphql_handler(State(state): State<AppState>, request: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(request.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug, Serialize)]
struct HttpError {
    #[serde(skip)]
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<SalesError> for HttpError {
    fn from(err: SalesError) -> Self {
        let status = match &err {
            SalesError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SalesError::UniquenessConflict { .. } | SalesError::ReferentialIntegrity { .. } => {
                StatusCode::CONFLICT
            }
            SalesError::NotFound(_) => StatusCode::NOT_FOUND,
            SalesError::Db(db) => {
                error!(error = %db, "database error while serving http");
                return Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: err.code(),
                    message: "internal server error".to_string(),
                };
            }
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(&self)).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to install CTRL+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
    info!("shutdown signal received");
}
