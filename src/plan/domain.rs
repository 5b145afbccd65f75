//! Budget plans and the figures derived from them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{category::Category, database_id::PlanId, transaction::Transaction};

/// The name given to the plan created when the database has none.
pub const DEFAULT_PLAN_NAME: &str = "Main plan";

/// A budget plan: an amount of money to allocate across categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// The money available to the plan before any allocation.
    pub initial_balance: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Totals over the transactions of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    /// The sum of every transaction amount.
    pub total_allocated: f64,
    /// The sum of the amounts of spent transactions.
    pub total_spent: f64,
    /// The initial balance minus the total allocated.
    pub remaining_balance: f64,
}

impl BudgetSummary {
    /// Summarise `transactions` against a plan's `initial_balance`.
    pub fn calculate(initial_balance: f64, transactions: &[Transaction]) -> Self {
        let total_allocated: f64 = transactions
            .iter()
            .map(|transaction| transaction.amount)
            .sum();
        let total_spent: f64 = transactions
            .iter()
            .filter(|transaction| transaction.is_spent)
            .map(|transaction| transaction.amount)
            .sum();

        Self {
            total_allocated,
            total_spent,
            remaining_balance: initial_balance - total_allocated,
        }
    }
}

/// Everything needed to draw a plan's board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub plan: Plan,
    pub categories: Vec<Category>,
    /// Every transaction in the plan, each column in rank order.
    pub transactions: Vec<Transaction>,
    pub summary: BudgetSummary,
}

/// Request body for changing a plan's initial balance.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialBalanceData {
    pub initial_balance: f64,
}
