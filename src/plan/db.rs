//! Database operations for budget plans.

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;

use crate::{
    Error,
    category::get_plan_categories,
    database_id::PlanId,
    plan::{BudgetSummary, DEFAULT_PLAN_NAME, Plan, PlanSnapshot},
    transaction::get_plan_transactions,
};

const PLAN_COLUMNS: &str = "id, name, initial_balance, created_at";

/// Create a plan and return it with its generated ID.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `initial_balance` is not finite.
pub fn create_plan(
    name: &str,
    initial_balance: f64,
    connection: &Connection,
) -> Result<Plan, Error> {
    if !initial_balance.is_finite() {
        return Err(Error::InvalidAmount(initial_balance));
    }

    connection
        .prepare(&format!(
            "INSERT INTO plan (name, initial_balance, created_at) VALUES (?1, ?2, ?3)
             RETURNING {PLAN_COLUMNS}"
        ))?
        .query_row(
            params![name, initial_balance, OffsetDateTime::now_utc()],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a plan by ID.
pub fn get_plan(plan_id: PlanId, connection: &Connection) -> Result<Plan, Error> {
    connection
        .prepare(&format!("SELECT {PLAN_COLUMNS} FROM plan WHERE id = :id"))?
        .query_row(&[(":id", &plan_id)], map_row)
        .map_err(|error| error.into())
}

/// Get the plan the user is most likely working on, creating one if the
/// database has none.
///
/// Plans are scored by their number of categories plus a thousand times their
/// number of transactions. Ties go to the most recently created plan.
pub fn get_or_create_default_plan(connection: &Connection) -> Result<Plan, Error> {
    let best_plan = connection
        .prepare(&format!(
            "SELECT {PLAN_COLUMNS} FROM plan
             ORDER BY
                (SELECT COUNT(*) FROM category WHERE category.plan_id = plan.id)
                + 1000 * (SELECT COUNT(*) FROM \"transaction\" t WHERE t.plan_id = plan.id) DESC,
                created_at DESC,
                id DESC
             LIMIT 1"
        ))?
        .query_row([], map_row)
        .optional()?;

    match best_plan {
        Some(plan) => Ok(plan),
        None => {
            tracing::info!("no budget plans found, creating \"{DEFAULT_PLAN_NAME}\"");
            create_plan(DEFAULT_PLAN_NAME, 0.0, connection)
        }
    }
}

/// Set the money available to a plan.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `initial_balance` is not finite,
/// - [Error::UpdateMissingPlan] if the plan does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_initial_balance(
    plan_id: PlanId,
    initial_balance: f64,
    connection: &Connection,
) -> Result<Plan, Error> {
    if !initial_balance.is_finite() {
        return Err(Error::InvalidAmount(initial_balance));
    }

    connection
        .prepare(&format!(
            "UPDATE plan SET initial_balance = ?1 WHERE id = ?2 RETURNING {PLAN_COLUMNS}"
        ))?
        .query_row(params![initial_balance, plan_id], map_row)
        .optional()?
        .ok_or(Error::UpdateMissingPlan)
}

/// Load a plan with its categories, transactions and budget summary.
pub fn get_snapshot(plan_id: PlanId, connection: &Connection) -> Result<PlanSnapshot, Error> {
    let plan = get_plan(plan_id, connection)?;
    let categories = get_plan_categories(plan_id, connection)?;
    let transactions = get_plan_transactions(plan_id, connection)?;
    let summary = BudgetSummary::calculate(plan.initial_balance, &transactions);

    Ok(PlanSnapshot {
        plan,
        categories,
        transactions,
        summary,
    })
}

/// Create the plan table.
pub fn create_plan_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS plan (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            initial_balance REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Plan, rusqlite::Error> {
    Ok(Plan {
        id: row.get(0)?,
        name: row.get(1)?,
        initial_balance: row.get(2)?,
        created_at: row.get(3)?,
    })
}
