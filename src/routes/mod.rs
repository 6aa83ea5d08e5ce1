pub mod admin;
pub mod budget;
pub mod error;
pub mod health;
pub mod transaction;
pub mod user;
