pub mod admin_user_entity;
pub mod category_entity;
pub mod participation_entity;
pub mod period_entity;
pub mod vote_entity;
