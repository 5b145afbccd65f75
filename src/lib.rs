//! Budget planner is a web service for allocating a starting balance across
//! spending categories.
//!
//! Each plan has a board of columns: one per category plus an unallocated
//! pool. Transactions are ordered within a column by a fixed-width rank key so
//! that moving a transaction only rewrites that one row, except when a column
//! runs out of room and is rebalanced.
//!
//! This library provides a JSON REST API over a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod category;
mod column;
mod database_id;
mod db;
pub mod endpoints;
mod logging;
mod plan;
pub mod rank;
mod routing;
pub mod stores;
mod transaction;

pub use app_state::AppState;
pub use column::Column;
pub use database_id::{CategoryId, DatabaseId, PlanId, TransactionId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{MoveRequest, ReorderRequest, Transaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A string could not be parsed as a rank key.
    #[error("\"{0}\" is not an 18 digit rank")]
    MalformedRank(String),

    /// No rank fits at the requested position, even after rebalancing the
    /// column.
    #[error("no rank is available at the requested position")]
    NoRankAvailable,

    /// A neighbour named in a move request is not in the destination column.
    #[error("transaction {0} is not in the destination column")]
    NeighbourNotInColumn(TransactionId),

    /// The category does not exist in the transaction's plan.
    #[error("category {0} does not exist in this plan")]
    InvalidCategory(CategoryId),

    /// The plan ID used to create an object did not match a valid plan.
    #[error("plan {0} does not exist")]
    InvalidPlan(PlanId),

    /// An amount of money was NaN or infinite.
    #[error("{0} is not a valid amount")]
    InvalidAmount(f64),

    /// A currency code other than the supported ones.
    #[error("\"{0}\" is not a supported currency")]
    UnknownCurrency(String),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a plan that does not exist
    #[error("tried to update a plan that is not in the database")]
    UpdateMissingPlan,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::DeleteMissingCategory
            | Error::UpdateMissingPlan => StatusCode::NOT_FOUND,
            Error::MalformedRank(_)
            | Error::NeighbourNotInColumn(_)
            | Error::InvalidCategory(_)
            | Error::InvalidPlan(_)
            | Error::InvalidAmount(_)
            | Error::UnknownCurrency(_)
            | Error::EmptyCategoryName => StatusCode::BAD_REQUEST,
            Error::NoRankAvailable => StatusCode::CONFLICT,
            Error::SqlError(_) | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal details are for the server logs only.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    async fn body_json(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[tokio::test]
    async fn not_found_is_404_with_message() {
        let (status, body) = body_json(Error::NotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "the requested resource could not be found");
    }

    #[tokio::test]
    async fn no_rank_available_is_409() {
        let (status, _) = body_json(Error::NoRankAvailable).await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn validation_errors_are_400() {
        let (status, body) = body_json(Error::NeighbourNotInColumn(3)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "transaction 3 is not in the destination column");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_json(Error::SqlError(rusqlite::Error::InvalidQuery)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("SQL"));
    }
}
