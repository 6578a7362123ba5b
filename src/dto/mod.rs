pub mod audit;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod plans;
pub mod products;
pub mod settings;
pub mod uploads;
pub mod usage;
pub mod users;
