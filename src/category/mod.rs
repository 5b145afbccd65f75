//! Spending categories, the columns of a budget plan.

mod db;
mod domain;
mod endpoints;

pub use db::{
    category_in_plan, create_category, create_category_table, create_category_with_default_color,
    delete_category, get_category, get_plan_categories,
};
pub use domain::{Category, CategoryName, NewCategoryData, default_color};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, mark_category_spent_endpoint,
};

#[cfg(test)]
pub use domain::CATEGORY_COLORS;
