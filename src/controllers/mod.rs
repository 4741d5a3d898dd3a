pub mod home_controller;
pub mod auth_controller;
pub mod language_controller;
pub mod dashboard_controller;
pub mod history_controller;
pub mod realtime_controller;
