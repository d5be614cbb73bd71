pub mod admin_service;
pub mod export_service;
pub mod media_service;
pub mod period_service;
pub mod vote_service;
pub mod wizard_service;
