//! JSON endpoints for categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    category::{
        Category, CategoryName, NewCategoryData, create_category,
        create_category_with_default_color, delete_category, get_category,
    },
    database_id::CategoryId,
    transaction::mark_category_spent,
};

/// The state needed for the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body for bulk updates.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UpdatedCount {
    pub updated: usize,
}

/// Handle category creation.
pub async fn create_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Json(new_category): Json<NewCategoryData>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let name = CategoryName::new(&new_category.name)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = match new_category.color {
        Some(color) => create_category(
            new_category.plan_id,
            name,
            &color,
            new_category.sort_order,
            &connection,
        ),
        None => create_category_with_default_color(
            new_category.plan_id,
            name,
            new_category.sort_order,
            &connection,
        ),
    }?;

    tracing::info!(
        "created category {} in plan {}",
        category.id,
        category.plan_id
    );

    Ok((StatusCode::CREATED, Json(category)))
}

/// Handle category deletion.
///
/// The category's transactions are moved to the unallocated pool.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryEndpointState>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_category(category_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Mark every transaction in a category as spent.
pub async fn mark_category_spent_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryEndpointState>,
) -> Result<Json<UpdatedCount>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let category = get_category(category_id, &connection)?;

    let updated = mark_category_spent(
        category.plan_id,
        category.id,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok(Json(UpdatedCount { updated }))
}
