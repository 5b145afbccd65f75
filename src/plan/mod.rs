//! Budget plans: the initial balance, categories and transactions that make up
//! a planning board.

mod db;
mod domain;
mod endpoints;

pub use db::{create_plan_table, get_or_create_default_plan, get_snapshot, update_initial_balance};
pub use domain::{BudgetSummary, DEFAULT_PLAN_NAME, InitialBalanceData, Plan, PlanSnapshot};
pub use endpoints::{
    get_default_plan_endpoint, get_snapshot_endpoint, update_initial_balance_endpoint,
};

#[cfg(test)]
pub use db::{create_plan, get_plan};
