use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, patch, post},
    serve, Json, Router,
};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::application::payment_service::PaymentService;
use crate::application::reconciliation::PaymentReconciler;
use crate::errors::AppError;
use crate::inbound::http::auth::require_admin_key;
use orders_types::domain::order::{NewOrder, Order, OrderStatus};
use orders_types::domain::payment::{PaymentIntentHandle, PaymentIntentRequest};
use orders_types::ports::order_repository::OrderRepository;
use orders_types::ports::payment_gateway::PaymentGateway;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub admin_api_key: String,
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub environment: String,
    pub database_kind: String,
    pub processor_configured: bool,
}

impl HttpServerConfig {
    pub fn new(port: impl Into<String>, admin_api_key: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            admin_api_key: admin_api_key.into(),
            allowed_origins: Vec::new(),
            request_timeout: Duration::from_secs(30),
            environment: "development".into(),
            database_kind: "memory".into(),
            processor_configured: false,
        }
    }
}

/// Shared handler state; every service holds the same store and gateway.
pub struct AppState<R: OrderRepository, P: PaymentGateway> {
    pub orders: Arc<OrderService<R>>,
    pub payments: Arc<PaymentService<R, P>>,
    pub reconciler: Arc<PaymentReconciler<R, P>>,
    health: Arc<serde_json::Value>,
}

impl<R: OrderRepository, P: PaymentGateway> Clone for AppState<R, P> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            payments: self.payments.clone(),
            reconciler: self.reconciler.clone(),
            health: self.health.clone(),
        }
    }
}

impl<R: OrderRepository, P: PaymentGateway> AppState<R, P> {
    pub fn new(repo: Arc<R>, gateway: Arc<P>) -> Self {
        let orders = OrderService::new(repo.clone());
        let reconciler = PaymentReconciler::new(orders.lifecycle().clone(), gateway.clone());
        Self {
            payments: Arc::new(PaymentService::new(repo, gateway)),
            reconciler: Arc::new(reconciler),
            orders: Arc::new(orders),
            health: Arc::new(serde_json::Value::Null),
        }
    }
}

pub struct HttpServer<R, P>
where
    R: OrderRepository,
    P: PaymentGateway,
{
    pub state: AppState<R, P>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub order_status: OrderStatus,
}

impl<R, P> HttpServer<R, P>
where
    R: OrderRepository + Send + Sync + 'static,
    P: PaymentGateway + Send + Sync + 'static,
{
    pub async fn new(
        repo: Arc<R>,
        gateway: Arc<P>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        let mut state = AppState::new(repo, gateway);
        state.health = Arc::new(serde_json::json!({
            "status": "healthy",
            "environment": config.environment,
            "database_type": config.database_kind,
            "stripe_configured": config.processor_configured,
        }));
        Ok(Self { state, config })
    }

    fn cors(&self) -> anyhow::Result<CorsLayer> {
        let origins = self
            .config
            .allowed_origins
            .iter()
            .map(|o| HeaderValue::from_str(o))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
            .allow_headers(Any))
    }

    pub fn router(&self) -> anyhow::Result<Router> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let admin_key: Arc<str> = Arc::from(self.config.admin_api_key.as_str());
        let manage = Router::new()
            .route("/orders", get(list_orders::<R, P>))
            .route("/orders/{id}", get(get_order::<R, P>))
            .route("/orders/{id}/status", patch(update_status::<R, P>))
            .route_layer(middleware::from_fn_with_state(admin_key, require_admin_key));

        let app = Router::new()
            .route("/", get(root))
            .route("/health", get(health::<R, P>))
            .route("/orders", post(create_order::<R, P>))
            .route("/orders/{id}", get(get_order::<R, P>))
            .route(
                "/payments/create-payment-intent",
                post(create_payment_intent::<R, P>),
            )
            .route("/payments/webhook", post(payment_webhook::<R, P>))
            .nest("/manage", manage)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(self.cors()?)
            .layer(trace_layer)
            .with_state(self.state.clone());
        Ok(app)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router()?;
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("server stopped");
        Ok(())
    }
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "orders-hex",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health<R, P>(State(state): State<AppState<R, P>>) -> Json<serde_json::Value>
where
    R: OrderRepository + Send + Sync + 'static,
    P: PaymentGateway + Send + Sync + 'static,
{
    Json((*state.health).clone())
}

async fn create_order<R, P>(
    State(state): State<AppState<R, P>>,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError>
where
    R: OrderRepository + Send + Sync + 'static,
    P: PaymentGateway + Send + Sync + 'static,
{
    let Json(input) = payload?;
    let order = state.orders.create_order(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order<R, P>(
    State(state): State<AppState<R, P>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
    P: PaymentGateway + Send + Sync + 'static,
{
    let order = state.orders.get_order(parse_id(&id)?).await?;
    Ok(Json(order))
}

async fn list_orders<R, P>(
    State(state): State<AppState<R, P>>,
) -> Result<Json<Vec<Order>>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
    P: PaymentGateway + Send + Sync + 'static,
{
    let list = state.orders.list_orders().await?;
    Ok(Json(list))
}

async fn update_status<R, P>(
    State(state): State<AppState<R, P>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
    P: PaymentGateway + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    let Json(body) = payload?;
    let updated = state.orders.update_order_status(id, body.order_status).await?;
    Ok(Json(updated))
}

async fn create_payment_intent<R, P>(
    State(state): State<AppState<R, P>>,
    payload: Result<Json<PaymentIntentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentIntentHandle>), AppError>
where
    R: OrderRepository + Send + Sync + 'static,
    P: PaymentGateway + Send + Sync + 'static,
{
    let Json(request) = payload?;
    let handle = state.payments.create_payment_intent(request).await?;
    Ok((StatusCode::CREATED, Json(handle)))
}

async fn payment_webhook<R, P>(
    State(state): State<AppState<R, P>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
    P: PaymentGateway + Send + Sync + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    match state.reconciler.handle_event(&body, signature).await {
        Ok(outcome) => Ok(Json(serde_json::json!({
            "status": "success",
            "result": outcome,
        }))),
        // Acknowledge so the processor stops redelivering an event we can never use.
        Err(AppError::MalformedEvent(reason)) => {
            tracing::warn!(%reason, "dropping malformed webhook event");
            Ok(Json(serde_json::json!({ "status": "ignored", "reason": reason })))
        }
        Err(e) => Err(e),
    }
}
