//! JSON endpoints for budget plans.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::PlanId,
    plan::{
        InitialBalanceData, Plan, PlanSnapshot, get_or_create_default_plan, get_snapshot,
        update_initial_balance,
    },
};

/// The state needed for the plan endpoints.
#[derive(Debug, Clone)]
pub struct PlanEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PlanEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the plan to open on start up, creating one if needed.
pub async fn get_default_plan_endpoint(
    State(state): State<PlanEndpointState>,
) -> Result<Json<Plan>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_or_create_default_plan(&connection).map(Json)
}

/// Set a plan's initial balance.
pub async fn update_initial_balance_endpoint(
    Path(plan_id): Path<PlanId>,
    State(state): State<PlanEndpointState>,
    Json(data): Json<InitialBalanceData>,
) -> Result<Json<Plan>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_initial_balance(plan_id, data.initial_balance, &connection).map(Json)
}

/// Get a plan with its categories, transactions and summary.
pub async fn get_snapshot_endpoint(
    Path(plan_id): Path<PlanId>,
    State(state): State<PlanEndpointState>,
) -> Result<Json<PlanSnapshot>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_snapshot(plan_id, &connection).map(Json)
}
