//! Transactions: planned expenses that live in a column of a budget plan.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - The move and reorder operations that keep each column ordered
//! - The JSON endpoints for all of the above

mod core;
mod endpoints;
mod ordering;

pub(crate) use core::TRANSACTION_COLUMNS;
pub use core::{
    Currency, Transaction, TransactionPatch, create_transaction, create_transaction_table,
    delete_transaction, get_plan_transactions, get_transaction, map_transaction_row,
    mark_category_spent, set_spent, update_transaction,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    move_transaction_endpoint, reorder_transaction_endpoint, set_spent_endpoint,
    update_transaction_endpoint,
};
pub use ordering::{MoveRequest, ReorderRequest, move_transaction, reorder_transaction, tail_rank};
