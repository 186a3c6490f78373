pub mod auth;
pub mod call;
pub mod candidate;
pub mod settings;
