//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to application use cases.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::dto::{
    CategoryDto, CategoryRequestDto, ChangeStatusDto, CreateInstrumentDto, InstrumentDto,
    LoginDto, LoginResultDto, OrderDto, PlaceOrderDto, PriceEntryDto, RecordPriceDto,
    RegisterUserDto, ReplenishStockDto, StockDto, UpdateInstrumentDto, UpdateUserDto, UserDto,
};
use crate::application::ports::Store;
use crate::application::use_cases::{
    Caller, ManageCatalogUseCase, ManageCategoriesUseCase, OrderWorkflowUseCase,
    QueryOrdersUseCase, UserAccountsUseCase,
};
use crate::domain::shared::{CategoryId, InstrumentId, OrderId, UserId};
use crate::error::ServiceError;

use super::auth::{USER_ID_HEADER, authorize};
use super::request::{ApiJson, InstrumentFilter};
use super::response::HealthResponse;

type ApiResult<T> = Result<T, ServiceError>;

/// Application state shared across handlers.
pub struct AppState<S>
where
    S: Store,
{
    /// Order placement, status changes and deletion.
    pub orders: Arc<OrderWorkflowUseCase<S>>,
    /// Order reads.
    pub order_queries: Arc<QueryOrdersUseCase<S>>,
    /// Instrument catalog.
    pub catalog: Arc<ManageCatalogUseCase<S>>,
    /// Instrument categories.
    pub categories: Arc<ManageCategoriesUseCase<S>>,
    /// Accounts and caller resolution.
    pub accounts: Arc<UserAccountsUseCase<S>>,
    /// Application version.
    pub version: String,
}

impl<S> AppState<S>
where
    S: Store,
{
    /// Wire every use case against one store.
    pub fn new(store: &Arc<S>, version: impl Into<String>) -> Self {
        Self {
            orders: Arc::new(OrderWorkflowUseCase::new(Arc::clone(store))),
            order_queries: Arc::new(QueryOrdersUseCase::new(Arc::clone(store))),
            catalog: Arc::new(ManageCatalogUseCase::new(Arc::clone(store))),
            categories: Arc::new(ManageCategoriesUseCase::new(Arc::clone(store))),
            accounts: Arc::new(UserAccountsUseCase::new(Arc::clone(store))),
            version: version.into(),
        }
    }
}

impl<S> Clone for AppState<S>
where
    S: Store,
{
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
            order_queries: Arc::clone(&self.order_queries),
            catalog: Arc::clone(&self.catalog),
            categories: Arc::clone(&self.categories),
            accounts: Arc::clone(&self.accounts),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
///
/// `cors_origins` lists the browser origins allowed to call the API;
/// entries that are not valid header values are skipped.
pub fn create_router<S>(state: AppState<S>, cors_origins: &[String]) -> Router
where
    S: Store,
{
    let api = Router::new()
        .route("/api/usuarios/login", post(login))
        .route("/api/usuarios/registro", post(register))
        .route("/api/usuarios", get(list_users))
        .route(
            "/api/usuarios/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/api/instrumentos",
            get(list_instruments).post(create_instrument),
        )
        .route(
            "/api/instrumentos/{id}",
            get(get_instrument)
                .put(update_instrument)
                .delete(delete_instrument),
        )
        .route("/api/instrumentos/{id}/precios", get(price_history))
        .route("/api/instrumentos/{id}/precio", patch(record_price))
        .route("/api/instrumentos/{id}/stock", patch(replenish_stock))
        .route("/api/categorias", get(list_categories).post(create_category))
        .route(
            "/api/categorias/{id}",
            get(get_category)
                .put(rename_category)
                .delete(delete_category),
        )
        .route("/api/pedidos", get(list_orders).post(create_order))
        .route("/api/pedidos/usuario/{id}", get(list_user_orders))
        .route("/api/pedidos/{id}", get(get_order).delete(delete_order))
        .route("/api/pedidos/{id}/estado", patch(change_order_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize::<S>));

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let user_id = HeaderName::from_static(USER_ID_HEADER);
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, user_id.clone()])
        .expose_headers([user_id])
}

/// Health check endpoint.
async fn health_check<S: Store>(State(state): State<AppState<S>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

// Users

async fn login<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(request): ApiJson<LoginDto>,
) -> ApiResult<Json<LoginResultDto>> {
    state.accounts.login(request).await.map(Json)
}

async fn register<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(request): ApiJson<RegisterUserDto>,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    let user = state.accounts.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Json<Vec<UserDto>>> {
    state.accounts.list().await.map(Json)
}

async fn get_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDto>> {
    state.accounts.get(&UserId::new(id)).await.map(Json)
}

async fn update_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUserDto>,
) -> ApiResult<Json<UserDto>> {
    state.accounts.update(&UserId::new(id), request).await.map(Json)
}

async fn delete_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.accounts.delete(&UserId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Instruments

async fn list_instruments<S: Store>(
    State(state): State<AppState<S>>,
    Query(filter): Query<InstrumentFilter>,
) -> ApiResult<Json<Vec<InstrumentDto>>> {
    let category = filter.category_id.map(CategoryId::new);
    state.catalog.list(category.as_ref()).await.map(Json)
}

async fn get_instrument<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<InstrumentDto>> {
    state.catalog.get(&InstrumentId::new(id)).await.map(Json)
}

async fn price_history<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<PriceEntryDto>>> {
    state
        .catalog
        .price_history(&InstrumentId::new(id))
        .await
        .map(Json)
}

async fn create_instrument<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(request): ApiJson<CreateInstrumentDto>,
) -> ApiResult<(StatusCode, Json<InstrumentDto>)> {
    let instrument = state.catalog.create(request).await?;
    Ok((StatusCode::CREATED, Json(instrument)))
}

async fn update_instrument<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateInstrumentDto>,
) -> ApiResult<Json<InstrumentDto>> {
    state
        .catalog
        .update(&InstrumentId::new(id), request)
        .await
        .map(Json)
}

async fn delete_instrument<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.catalog.delete(&InstrumentId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_price<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<RecordPriceDto>,
) -> ApiResult<Json<PriceEntryDto>> {
    state
        .catalog
        .record_price(&InstrumentId::new(id), request.price)
        .await
        .map(Json)
}

async fn replenish_stock<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ReplenishStockDto>,
) -> ApiResult<Json<StockDto>> {
    state
        .catalog
        .replenish(&InstrumentId::new(id), request.quantity)
        .await
        .map(Json)
}

// Categories

async fn list_categories<S: Store>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<CategoryDto>>> {
    state.categories.list().await.map(Json)
}

async fn get_category<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<CategoryDto>> {
    state.categories.get(&CategoryId::new(id)).await.map(Json)
}

async fn create_category<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(request): ApiJson<CategoryRequestDto>,
) -> ApiResult<(StatusCode, Json<CategoryDto>)> {
    let category = state.categories.create(request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn rename_category<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CategoryRequestDto>,
) -> ApiResult<Json<CategoryDto>> {
    state
        .categories
        .rename(&CategoryId::new(id), request)
        .await
        .map(Json)
}

async fn delete_category<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.categories.delete(&CategoryId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Orders

async fn create_order<S: Store>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<PlaceOrderDto>,
) -> ApiResult<(StatusCode, Json<OrderDto>)> {
    let order = state.orders.create_order(caller.user_id(), request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders<S: Store>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<OrderDto>>> {
    state.order_queries.list_all(&caller).await.map(Json)
}

async fn list_user_orders<S: Store>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<OrderDto>>> {
    state
        .order_queries
        .list_for_user(&caller, &UserId::new(id))
        .await
        .map(Json)
}

async fn get_order<S: Store>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderDto>> {
    state
        .order_queries
        .get(&caller, &OrderId::new(id))
        .await
        .map(Json)
}

async fn change_order_status<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChangeStatusDto>,
) -> ApiResult<Json<OrderDto>> {
    state
        .orders
        .set_status(&OrderId::new(id), &request.status)
        .await
        .map(Json)
}

async fn delete_order<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.orders.delete_order(&OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
