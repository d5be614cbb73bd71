use crate::middleware::error::{AppError, AppResult};
use surrealdb::sql::Thing;

pub fn get_str_thing(value: &str) -> AppResult<Thing> {
    Thing::try_from(value).map_err(|_| AppError::Generic {
        description: format!("error into Thing value={value}"),
    })
}
