use crate::{error::AppError, AppState};
use analyzer::{PaymentAnalysis, PaymentAnalyzer};
use axum::{
    extract::{Query, State},
    Json,
};
use core_types::{QueryResult, ScalarValue, SchemaModel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PaymentAnalysisParams {
    pub top_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteQueryRequest {
    pub query: String,
    #[serde(default)]
    pub params: HashMap<String, ScalarValue>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteQueryResponse {
    pub results: QueryResult,
}

#[derive(Debug, Serialize)]
pub struct DiagramResponse {
    pub diagram: String,
}

/// # GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Pagila DVD Rental API" }))
}

/// # GET /health
/// Reports healthy only after a round trip to the database.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    state
        .db_repo
        .ping()
        .await
        .map_err(|e| AppError::Unhealthy(e.to_string()))?;
    Ok(Json(json!({ "status": "healthy", "database": "connected" })))
}

/// # GET /database/schema
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemaModel>, AppError> {
    let model = state.db_repo.reflect_schema().await?;
    Ok(Json(model))
}

/// # GET /database/schema-diagram
/// Reflects the schema afresh and renders it as a Mermaid ER diagram.
pub async fn get_schema_diagram(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DiagramResponse>, AppError> {
    let model = state.db_repo.reflect_schema().await?;
    Ok(Json(DiagramResponse {
        diagram: diagram::render(&model),
    }))
}

/// # GET /analysis/customer-payments?top_count=N
pub async fn get_customer_payment_analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaymentAnalysisParams>,
) -> Result<Json<PaymentAnalysis>, AppError> {
    let top_count = params.top_count.unwrap_or(state.default_top_count);
    let analysis = PaymentAnalyzer::new().run(&state.db_repo, top_count).await?;
    Ok(Json(analysis))
}

/// # POST /execute-query
/// Runs a caller-supplied statement. Writes are rolled back.
pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteQueryRequest>,
) -> Result<Json<ExecuteQueryResponse>, AppError> {
    let results = state
        .db_repo
        .ad_hoc_executor()
        .execute(&request.query, &request.params)
        .await?;
    Ok(Json(ExecuteQueryResponse { results }))
}
