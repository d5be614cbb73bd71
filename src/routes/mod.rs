pub mod admin;
pub mod auth;
pub mod events;
pub mod participations;
pub mod periods;
pub mod votes;
