// Expense Tracker - REST API with Axum
//
// The store sits behind a mutex; every handler takes the lock for the
// duration of one store call.

use crate::db::ExpenseStore;
use crate::error::StoreError;
use crate::notice::Notice;
use crate::record::{Category, Expense, ExpenseFilter, StoredExpense};
use crate::storage::KeyValueStore;
use crate::summary::{summarize, Summary};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub type SharedStore = Arc<Mutex<ExpenseStore<Box<dyn KeyValueStore + Send>>>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
}

impl AppState {
    pub fn new(store: ExpenseStore<Box<dyn KeyValueStore + Send>>) -> Self {
        AppState {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn store(&self) -> MutexGuard<'_, ExpenseStore<Box<dyn KeyValueStore + Send>>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn failed(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

#[derive(Serialize)]
struct SavedResponse {
    id: u64,
    notice: Notice,
}

#[derive(Serialize)]
struct RejectedResponse {
    missing: Vec<&'static str>,
    notice: Notice,
}

#[derive(Serialize)]
struct CategoryResponse {
    code: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    time: String,
}

fn internal_error(context: &str, err: StoreError) -> Response {
    tracing::error!(error = %err, "{}", context);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::failed((), err.to_string())),
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "OK",
        time: chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/expenses - List expenses, narrowed by any query parameters given
async fn list_expenses(
    State(state): State<AppState>,
    Query(criteria): Query<ExpenseFilter>,
) -> Response {
    match state.store().filter(&criteria) {
        Ok(expenses) => (StatusCode::OK, Json(ApiResponse::ok(expenses))).into_response(),
        Err(e) => internal_error("Error listing expenses", e),
    }
}

/// POST /api/expenses - Register a new expense
async fn create_expense(State(state): State<AppState>, Json(expense): Json<Expense>) -> Response {
    if !expense.validate() {
        let rejected = RejectedResponse {
            missing: expense.missing_fields(),
            notice: Notice::incomplete(),
        };
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::failed(rejected, Notice::incomplete().body.to_string())),
        )
            .into_response();
    }

    match state.store().save(&expense) {
        Ok(id) => {
            tracing::info!(id, "Expense registered");
            let saved = SavedResponse {
                id,
                notice: Notice::saved(),
            };
            (StatusCode::CREATED, Json(ApiResponse::ok(saved))).into_response()
        }
        Err(e) => internal_error("Error saving expense", e),
    }
}

/// GET /api/expenses/:id - One expense
async fn get_expense(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.store().get(id) {
        Ok(Some(expense)) => {
            (StatusCode::OK, Json(ApiResponse::ok(StoredExpense { id, expense }))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failed((), format!("expense {} not found", id))),
        )
            .into_response(),
        Err(e) => internal_error("Error reading expense", e),
    }
}

/// DELETE /api/expenses/:id - Remove an expense (idempotent)
async fn delete_expense(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.store().delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error("Error deleting expense", e),
    }
}

/// GET /api/categories - Category codes and labels
async fn list_categories() -> impl IntoResponse {
    let categories: Vec<CategoryResponse> = Category::ALL
        .iter()
        .map(|category| CategoryResponse {
            code: category.code(),
            label: category.label(),
        })
        .collect();

    Json(ApiResponse::ok(categories))
}

/// GET /api/summary - Totals per category
async fn get_summary(State(state): State<AppState>) -> Response {
    match state.store().list_all() {
        Ok(expenses) => {
            let summary: Summary = summarize(&expenses);
            (StatusCode::OK, Json(ApiResponse::ok(summary))).into_response()
        }
        Err(e) => internal_error("Error building summary", e),
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/:id", get(get_expense).delete(delete_expense))
        .route("/categories", get(list_categories))
        .route("/summary", get(get_summary))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let storage: Box<dyn KeyValueStore + Send> = Box::new(MemoryStorage::new());
        let store = ExpenseStore::new(storage).unwrap();
        router(AppState::new(store))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn expense_json(day: &str, category: &str, description: &str, amount: &str) -> Value {
        json!({
            "year": "2023",
            "month": "1",
            "day": day,
            "category": category,
            "description": description,
            "amount": amount,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "OK");
    }

    #[tokio::test]
    async fn test_create_list_filter_delete() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/expenses",
            Some(expense_json("1", "1", "Lunch", "20")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["data"]["notice"]["title"], "Record saved successfully");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/expenses",
            Some(expense_json("2", "2", "Course", "500")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, Method::GET, "/api/expenses", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, Method::GET, "/api/expenses?category=2", None).await;
        let filtered = body["data"].as_array().unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["id"], 2);
        assert_eq!(filtered[0]["description"], "Course");

        let (status, _) = send(&app, Method::DELETE, "/api/expenses/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, "/api/expenses/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, "/api/expenses/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, Method::GET, "/api/expenses", None).await;
        let remaining = body["data"].as_array().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["id"], 2);
    }

    #[tokio::test]
    async fn test_incomplete_expense_is_rejected() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/expenses",
            Some(expense_json("1", "1", "", "20")),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["missing"], json!(["description"]));
        assert_eq!(body["data"]["notice"]["title"], "Save error");

        let (_, body) = send(&app, Method::GET, "/api/expenses", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_numeric_json_fields_are_accepted() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/expenses",
            Some(json!({
                "year": 2023,
                "month": "1",
                "day": "1",
                "category": 1,
                "description": "Lunch",
                "amount": 20.5,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["id"], 1);

        let (_, body) = send(&app, Method::GET, "/api/expenses?year=2023&category=1", None).await;
        let listed = body["data"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["year"], "2023");
        assert_eq!(listed[0]["category"], "1");
        assert_eq!(listed[0]["amount"], "20.5");
    }

    #[tokio::test]
    async fn test_categories_and_summary() {
        let app = test_app();

        let (_, body) = send(&app, Method::GET, "/api/categories", None).await;
        let categories = body["data"].as_array().unwrap();
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[4]["label"], "Transport");

        send(&app, Method::POST, "/api/expenses", Some(expense_json("1", "1", "Lunch", "20"))).await;
        send(&app, Method::POST, "/api/expenses", Some(expense_json("2", "1", "Dinner", "30"))).await;

        let (status, body) = send(&app, Method::GET, "/api/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 2);
        assert_eq!(body["data"]["by_category"][0]["label"], "Food");
        assert_eq!(body["data"]["by_category"][0]["count"], 2);
    }
}
