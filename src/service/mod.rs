pub mod admin;
pub mod auth;
pub mod budget_warning;
pub mod month_window;
