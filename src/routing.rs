//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};

use crate::{
    AppState, Error,
    category::{create_category_endpoint, delete_category_endpoint, mark_category_spent_endpoint},
    endpoints,
    logging::logging_middleware,
    plan::{get_default_plan_endpoint, get_snapshot_endpoint, update_initial_balance_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        move_transaction_endpoint, reorder_transaction_endpoint, set_spent_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::DEFAULT_PLAN, get(get_default_plan_endpoint))
        .route(
            endpoints::PLAN_INITIAL_BALANCE,
            put(update_initial_balance_endpoint),
        )
        .route(endpoints::PLAN_SNAPSHOT, get(get_snapshot_endpoint))
        .route(endpoints::CATEGORIES, post(create_category_endpoint))
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route(
            endpoints::CATEGORY_SPENT,
            post(mark_category_spent_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::MOVE_TRANSACTION,
            post(move_transaction_endpoint),
        )
        .route(
            endpoints::REORDER_TRANSACTION,
            post(reorder_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION_SPENT, put(set_spent_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
