pub mod admin;
pub mod budget;
pub mod budget_warning;
pub mod postgres_repository;
pub mod session;
pub mod transaction;
pub mod user;
