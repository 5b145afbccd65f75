//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/plans/{plan_id}/snapshot', use [format_endpoint].

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route to get the default budget plan.
pub const DEFAULT_PLAN: &str = "/api/plan";
/// The route to set a plan's initial balance.
pub const PLAN_INITIAL_BALANCE: &str = "/api/plans/{plan_id}/initial_balance";
/// The route to get a plan with its categories, transactions and summary.
pub const PLAN_SNAPSHOT: &str = "/api/plans/{plan_id}/snapshot";
/// The route to create a category.
pub const CATEGORIES: &str = "/api/categories";
/// The route to delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to mark every transaction in a category as spent.
pub const CATEGORY_SPENT: &str = "/api/categories/{category_id}/spent";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to mark a transaction spent or unspent.
pub const TRANSACTION_SPENT: &str = "/api/transactions/{transaction_id}/spent";
/// The route to move a transaction to a column.
pub const MOVE_TRANSACTION: &str = "/api/transactions/move";
/// The route to move a transaction within its column.
pub const REORDER_TRANSACTION: &str = "/api/transactions/reorder";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
