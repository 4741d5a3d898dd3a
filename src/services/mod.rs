pub mod i18n;
pub mod auth_service;
pub mod order_source;
pub mod realtime;
pub mod order_views;
pub mod order_view_model;
