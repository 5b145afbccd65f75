//! JSON endpoints for creating, editing and positioning transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    column::Column,
    database_id::{PlanId, TransactionId},
    stores::SQLiteTransactionStore,
    transaction::{
        Currency, MoveRequest, ReorderRequest, Transaction, TransactionPatch, create_transaction,
        delete_transaction, get_transaction, move_transaction, reorder_transaction, set_spent,
        tail_rank, update_transaction,
    },
};

/// The state needed for the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionEndpointState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Request body for creating a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionData {
    pub plan_id: PlanId,
    pub amount: f64,
    #[serde(default)]
    pub name: String,
    /// The starting column, `null` or absent for the unallocated pool.
    #[serde(default)]
    pub category_id: Column,
    #[serde(default)]
    pub is_spent: bool,
    /// The currency the amount was entered in.
    #[serde(default)]
    pub source_currency: Option<Currency>,
    #[serde(default)]
    pub source_amount: Option<f64>,
    #[serde(default)]
    pub fx_rate: Option<f64>,
}

/// Request body for marking a transaction spent or unspent.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpentData {
    pub is_spent: bool,
}

/// Create a transaction at the end of its starting column.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Json(data): Json<NewTransactionData>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let mut store = SQLiteTransactionStore::new(state.db_connection.clone());
    let rank = tail_rank(&mut store, data.plan_id, data.category_id)?;

    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_transaction(
        Transaction::build(data.plan_id, data.amount)
            .name(&data.name)
            .column(data.category_id)
            .is_spent(data.is_spent)
            .source(data.source_currency, data.source_amount, data.fx_rate),
        rank,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Get a transaction by ID.
pub async fn get_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionEndpointState>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, &connection).map(Json)
}

/// Change the name and/or amount of a transaction.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionEndpointState>,
    Json(patch): Json<TransactionPatch>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_transaction(transaction_id, patch, &connection).map(Json)
}

/// Mark a transaction spent or unspent.
pub async fn set_spent_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionEndpointState>,
    Json(data): Json<SpentData>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    set_spent(
        transaction_id,
        data.is_spent,
        OffsetDateTime::now_utc(),
        &connection,
    )
    .map(Json)
}

/// Delete a transaction.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionEndpointState>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_transaction(transaction_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Move a transaction to a column, optionally between two of its members.
pub async fn move_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Transaction>, Error> {
    let mut store = SQLiteTransactionStore::new(state.db_connection);

    move_transaction(&mut store, request)
        .inspect_err(|error| {
            tracing::warn!("could not move transaction {}: {error}", request.transaction_id)
        })
        .map(Json)
}

/// Move a transaction within its own column.
pub async fn reorder_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Transaction>, Error> {
    let mut store = SQLiteTransactionStore::new(state.db_connection);

    reorder_transaction(&mut store, request)
        .inspect_err(|error| {
            tracing::warn!(
                "could not reorder transaction {}: {error}",
                request.transaction_id
            )
        })
        .map(Json)
}
