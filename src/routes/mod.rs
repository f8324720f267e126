pub mod auth;
pub mod blog;
pub mod content;
pub mod craftsmen;
pub mod dashboard;
pub mod health;
pub mod logs;
pub mod newsletter;
pub mod team;
pub mod users;
