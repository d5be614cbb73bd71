use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::database::client::Db;
use crate::entities::period_entity::{Activity, PeriodDbService, PeriodWindow};
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};

#[derive(Debug, Deserialize, Validate)]
pub struct PeriodWindowInput {
    pub activity: Activity,
    pub start_at: chrono::DateTime<Utc>,
    pub end_at: chrono::DateTime<Utc>,
}

pub struct PeriodService<'a> {
    periods_repository: PeriodDbService<'a>,
    ctx: &'a Ctx,
}

impl<'a> PeriodService<'a> {
    pub fn new(db: &'a Db, ctx: &'a Ctx) -> Self {
        Self {
            periods_repository: PeriodDbService { db, ctx },
            ctx,
        }
    }

    /// Fail closed: any lookup error counts as a closed period.
    pub async fn is_open(&self, activity: Activity) -> bool {
        match self.periods_repository.get_active(activity).await {
            Ok(Some(window)) => {
                let now = Utc::now();
                window.start_at <= now && now <= window.end_at
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!("period lookup failed, treating {activity} as closed: {err:?}");
                false
            }
        }
    }

    pub async fn guard(&self, activity: Activity) -> CtxResult<()> {
        if self.is_open(activity).await {
            Ok(())
        } else {
            Err(self.ctx.to_ctx_error(AppError::PeriodClosed {
                activity: activity.to_string(),
            }))
        }
    }

    pub async fn create(&self, input: PeriodWindowInput) -> CtxResult<PeriodWindow> {
        self.check_bounds(&input)?;
        self.periods_repository
            .create(PeriodWindow {
                id: None,
                activity: input.activity,
                start_at: input.start_at,
                end_at: input.end_at,
                active: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
    }

    pub async fn update(&self, id: &str, input: PeriodWindowInput) -> CtxResult<PeriodWindow> {
        self.check_bounds(&input)?;
        let mut window = self.periods_repository.get_by_id(id).await?;
        window.activity = input.activity;
        window.start_at = input.start_at;
        window.end_at = input.end_at;
        self.periods_repository.update(window).await
    }

    pub async fn list(&self) -> CtxResult<Vec<PeriodWindow>> {
        self.periods_repository.list().await
    }

    pub async fn activate(&self, id: &str) -> CtxResult<PeriodWindow> {
        let window = self.periods_repository.get_by_id(id).await?;
        let thing = window.id.clone().ok_or(self.ctx.to_ctx_error(AppError::Generic {
            description: "Period window has no id".to_string(),
        }))?;
        self.periods_repository
            .activate(thing, window.activity)
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> CtxResult<PeriodWindow> {
        self.periods_repository.get_by_id(id).await
    }

    fn check_bounds(&self, input: &PeriodWindowInput) -> CtxResult<()> {
        if input.start_at >= input.end_at {
            return Err(self.ctx.to_ctx_error(AppError::ValidationErrors {
                value: "start_at must be before end_at".to_string(),
            }));
        }
        Ok(())
    }
}
