pub mod auth;
pub mod call_service;
pub mod candidate_service;
pub mod settings_service;
