//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    category::category_in_plan,
    column::Column,
    database_id::{CategoryId, PlanId, TransactionId},
    rank::RankKey,
    stores::ColumnEntry,
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense planned against the budget, either in the unallocated pool or
/// in a category.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The budget plan the transaction belongs to.
    pub plan_id: PlanId,
    /// The column the transaction is in.
    #[serde(rename = "categoryId")]
    pub column: Column,
    /// The amount of money allocated to this transaction.
    pub amount: f64,
    /// A short description of what the money is for.
    pub name: String,
    /// Whether the money has actually been spent.
    pub is_spent: bool,
    /// When the transaction was marked as spent.
    #[serde(with = "time::serde::rfc3339::option")]
    pub spent_at: Option<OffsetDateTime>,
    /// The sort key within the column.
    pub rank: Option<RankKey>,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The currency the amount was originally entered in.
    pub source_currency: Option<Currency>,
    /// The amount as originally entered, in [Transaction::source_currency].
    pub source_amount: Option<f64>,
    /// The exchange rate used to convert the source amount to [Transaction::amount].
    pub fx_rate: Option<f64>,
}

/// A currency an amount can be entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Moldovan leu, the currency plan amounts are kept in.
    Mdl,
    /// United States dollar.
    Usd,
    /// Euro.
    Eur,
}

impl Currency {
    fn code(self) -> &'static str {
        match self {
            Currency::Mdl => "MDL",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MDL" => Ok(Currency::Mdl),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(Error::UnknownCurrency(other.to_owned())),
        }
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(plan_id: PlanId, amount: f64) -> TransactionBuilder {
        TransactionBuilder {
            plan_id,
            amount,
            name: String::new(),
            column: Column::Unallocated,
            is_spent: false,
            source_currency: None,
            source_amount: None,
            fx_rate: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The plan that will own the transaction.
    pub plan_id: PlanId,
    /// The amount of money to allocate. Must be finite.
    pub amount: f64,
    /// A short description, empty by default.
    pub name: String,
    /// The initial column, the unallocated pool by default.
    pub column: Column,
    /// Whether the transaction starts out spent.
    pub is_spent: bool,
    /// The currency the amount was entered in, if recorded.
    pub source_currency: Option<Currency>,
    /// The amount as entered, if recorded. Must be finite.
    pub source_amount: Option<f64>,
    /// The exchange rate applied to the entered amount, if recorded. Must be
    /// finite.
    pub fx_rate: Option<f64>,
}

impl TransactionBuilder {
    /// Set the name of the transaction.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    /// Set the initial column of the transaction.
    pub fn column(mut self, column: Column) -> Self {
        self.column = column;
        self
    }

    /// Set whether the transaction starts out spent.
    pub fn is_spent(mut self, is_spent: bool) -> Self {
        self.is_spent = is_spent;
        self
    }

    /// Record the amount and currency the transaction was entered in, and the
    /// rate that converted it to the plan's amount.
    pub fn source(
        mut self,
        currency: Option<Currency>,
        amount: Option<f64>,
        fx_rate: Option<f64>,
    ) -> Self {
        self.source_currency = currency;
        self.source_amount = amount;
        self.fx_rate = fx_rate;
        self
    }
}

/// The editable, non-positional fields of a transaction.
///
/// Fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionPatch {
    /// The new name.
    pub name: Option<String>,
    /// The new amount. Must be finite.
    pub amount: Option<f64>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns [map_transaction_row] expects, in order.
pub(crate) const TRANSACTION_COLUMNS: &str = "id, plan_id, category_id, amount, name, is_spent, spent_at, \
    sort_rank, created_at, source_currency, source_amount, fx_rate";

/// Create a new transaction in the database from a builder.
///
/// The caller supplies the `rank`, usually the tail rank of the initial column
/// from [crate::transaction::tail_rank].
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount, source amount or rate is not finite,
/// - [Error::InvalidPlan] if the plan does not exist,
/// - [Error::InvalidCategory] if the category does not exist in the plan,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    rank: RankKey,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amounts = [Some(builder.amount), builder.source_amount, builder.fx_rate];
    if let Some(amount) = amounts.into_iter().flatten().find(|amount| !amount.is_finite()) {
        return Err(Error::InvalidAmount(amount));
    }

    if let Column::Category(category_id) = builder.column
        && !category_in_plan(category_id, builder.plan_id, connection)?
    {
        return Err(Error::InvalidCategory(category_id));
    }

    let spent_at = builder.is_spent.then_some(now);

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (plan_id, category_id, amount, name, is_spent, spent_at, sort_rank, created_at,
                 source_currency, source_amount, fx_rate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                builder.plan_id,
                builder.column.category_id(),
                builder.amount,
                builder.name,
                builder.is_spent,
                spent_at,
                rank.to_string(),
                now,
                builder.source_currency,
                builder.source_amount,
                builder.fx_rate,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidPlan(builder.plan_id),
            error => error.into(),
        })
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve every transaction in a plan, each column in rank order.
///
/// Callers group the result by [Transaction::column]. Within any one column
/// the order is that of [ColumnEntry::column_order].
pub fn get_plan_transactions(
    plan_id: PlanId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut transactions = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE plan_id = :plan_id"
        ))?
        .query_map(&[(":plan_id", &plan_id)], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    transactions.sort_by(|a, b| ColumnEntry::from(a).column_order(&ColumnEntry::from(b)));

    Ok(transactions)
}

/// Update the name and/or amount of a transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the new amount is not finite,
/// - [Error::UpdateMissingTransaction] if the transaction does not exist,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    patch: TransactionPatch,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if let Some(amount) = patch.amount
        && !amount.is_finite()
    {
        return Err(Error::InvalidAmount(amount));
    }

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET name = COALESCE(?1, name), amount = COALESCE(?2, amount)
             WHERE id = ?3
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(params![patch.name, patch.amount, id], map_transaction_row)
        .optional()?
        .ok_or(Error::UpdateMissingTransaction)
}

/// Mark a transaction as spent or unspent.
///
/// Marking a transaction spent records `now` as the time it was spent, marking
/// it unspent clears that time.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if the transaction does not exist,
/// - or [Error::SqlError] there is some other SQL error.
pub fn set_spent(
    id: TransactionId,
    is_spent: bool,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let spent_at = is_spent.then_some(now);

    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET is_spent = ?1, spent_at = ?2 WHERE id = ?3
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(params![is_spent, spent_at, id], map_transaction_row)
        .optional()?
        .ok_or(Error::UpdateMissingTransaction)
}

/// Mark every unspent transaction in a category as spent.
///
/// Returns the number of transactions that changed.
pub fn mark_category_spent(
    plan_id: PlanId,
    category_id: CategoryId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE \"transaction\" SET is_spent = 1, spent_at = ?1
             WHERE plan_id = ?2 AND category_id = ?3 AND is_spent = 0",
            params![now, plan_id, category_id],
        )
        .map_err(Error::from)
}

/// Delete a transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the transaction does not exist,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plan_id INTEGER NOT NULL,
                category_id INTEGER,
                amount REAL NOT NULL,
                name TEXT NOT NULL,
                is_spent INTEGER NOT NULL DEFAULT 0,
                spent_at TEXT,
                sort_rank TEXT,
                created_at TEXT NOT NULL,
                source_currency TEXT,
                source_amount REAL,
                fx_rate REAL,
                FOREIGN KEY(plan_id) REFERENCES plan(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Column lookups filter on plan and category then order by rank.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_column_rank
         ON \"transaction\"(plan_id, category_id, sort_rank);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Malformed ranks map to `None`.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let plan_id = row.get(1)?;
    let category_id: Option<i64> = row.get(2)?;
    let amount = row.get(3)?;
    let name = row.get(4)?;
    let is_spent = row.get(5)?;
    let spent_at = row.get(6)?;
    let raw_rank: Option<String> = row.get(7)?;
    let created_at = row.get(8)?;
    let source_currency = row.get(9)?;
    let source_amount = row.get(10)?;
    let fx_rate = row.get(11)?;

    Ok(Transaction {
        id,
        plan_id,
        column: Column::from(category_id),
        amount,
        name,
        is_spent,
        spent_at,
        rank: RankKey::decode(raw_rank.as_deref()),
        created_at,
        source_currency,
        source_amount,
        fx_rate,
    })
}

// ============================================================================
// TESTS
// ============================================================================
