//! Database operations for categories.

use rusqlite::{Connection, Row, params};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryName, default_color},
    database_id::{CategoryId, PlanId},
};

const CATEGORY_COLUMNS: &str = "id, plan_id, name, color, sort_order, created_at";

/// Create a category in a plan and return it with its generated ID.
///
/// A missing `sort_order` places the category after every existing category in
/// the plan.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidPlan] if the plan does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    plan_id: PlanId,
    name: CategoryName,
    color: &str,
    sort_order: Option<i64>,
    connection: &Connection,
) -> Result<Category, Error> {
    let sort_order = match sort_order {
        Some(sort_order) => sort_order,
        None => count_plan_categories(plan_id, connection)?,
    };

    connection
        .prepare(&format!(
            "INSERT INTO category (plan_id, name, color, sort_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            params![
                plan_id,
                name.as_ref(),
                color,
                sort_order,
                OffsetDateTime::now_utc()
            ],
            map_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidPlan(plan_id),
            error => error.into(),
        })
}

/// Create a category with the palette colour for its position.
pub fn create_category_with_default_color(
    plan_id: PlanId,
    name: CategoryName,
    sort_order: Option<i64>,
    connection: &Connection,
) -> Result<Category, Error> {
    let position = match sort_order {
        Some(sort_order) => sort_order,
        None => count_plan_categories(plan_id, connection)?,
    };

    create_category(
        plan_id,
        name,
        default_color(position),
        Some(position),
        connection,
    )
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id;"
        ))?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve the categories of a plan in display order.
pub fn get_plan_categories(
    plan_id: PlanId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             WHERE plan_id = :plan_id
             ORDER BY sort_order ASC, created_at ASC, id ASC;"
        ))?
        .query_map(&[(":plan_id", &plan_id)], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Whether `category_id` refers to a category in `plan_id`.
pub fn category_in_plan(
    category_id: CategoryId,
    plan_id: PlanId,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .prepare("SELECT EXISTS(SELECT 1 FROM category WHERE id = ?1 AND plan_id = ?2);")?
        .query_row((category_id, plan_id), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Delete a category by ID.
///
/// Transactions in the category are moved to the unallocated pool and keep
/// their rank.
///
/// # Errors
/// Returns [Error::DeleteMissingCategory] if the category doesn't exist.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plan_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY(plan_id) REFERENCES plan(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_plan ON category(plan_id, sort_order);",
    )?;

    Ok(())
}

fn count_plan_categories(plan_id: PlanId, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM category WHERE plan_id = ?1",
            [plan_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        plan_id: row.get(1)?,
        name: CategoryName::new_unchecked(&raw_name),
        color: row.get(3)?,
        sort_order: row.get(4)?,
        created_at: row.get(5)?,
    })
}
