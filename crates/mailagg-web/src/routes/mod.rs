pub mod accounts;
pub mod auth;
pub mod emails;
pub mod health;
pub mod push_filters;
pub mod rules;
pub mod settings;
pub mod stats;
