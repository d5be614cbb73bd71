use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::entities::category_entity::{Category, CategoryDbService};
use crate::entities::participation_entity::{
    Participation, ParticipationDbService, ParticipationStatus,
};
use crate::entities::period_entity::Activity;
use crate::entities::vote_entity::{Vote, VoteDbService};
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};
use crate::middleware::utils::string_utils::get_str_thing;
use crate::services::period_service::PeriodService;

/// In-memory selection state of one voter, one pick per category.
/// Toggling a different candidacy in a category replaces the earlier
/// pick, toggling the same one again clears it.
#[derive(Debug, Default, Clone)]
pub struct VoteSheet {
    picks: HashMap<String, String>,
}

impl VoteSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, category_id: &str, participation_id: &str) {
        match self.picks.get(category_id) {
            Some(current) if current == participation_id => {
                self.picks.remove(category_id);
            }
            _ => {
                self.picks
                    .insert(category_id.to_string(), participation_id.to_string());
            }
        }
    }

    pub fn pick(&self, category_id: &str) -> Option<&str> {
        self.picks.get(category_id).map(String::as_str)
    }

    pub fn selections(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .picks
            .iter()
            .map(|(c, p)| (c.clone(), p.clone()))
            .collect();
        out.sort();
        out
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteSelection {
    pub category_id: String,
    pub participation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitVotesInput {
    pub voter_email: String,
    pub selections: Vec<VoteSelection>,
}

/// Confirmation snapshot handed back after a successful submission,
/// naming the establishments that received a vote.
#[derive(Debug, Serialize)]
pub struct VoteReceipt {
    pub voter_email: String,
    pub cast: usize,
    pub establishments: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BallotEntry {
    pub id: Thing,
    pub establishment_name: String,
    pub structure_name: String,
    pub video_url: Option<String>,
    pub selected_categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Ballot {
    pub categories: Vec<Category>,
    pub participations: Vec<BallotEntry>,
}

pub struct VoteService<'a> {
    votes_repository: VoteDbService<'a>,
    categories_repository: CategoryDbService<'a>,
    participations_repository: ParticipationDbService<'a>,
    period_service: PeriodService<'a>,
    ctx: &'a Ctx,
}

impl<'a> VoteService<'a> {
    pub fn new(db: &'a Db, ctx: &'a Ctx) -> Self {
        Self {
            votes_repository: VoteDbService { db, ctx },
            categories_repository: CategoryDbService { db, ctx },
            participations_repository: ParticipationDbService { db, ctx },
            period_service: PeriodService::new(db, ctx),
            ctx,
        }
    }

    /// Categories plus the approved candidacies to pick from. On first
    /// call with an empty category table, categories are seeded from the
    /// names candidacies referenced.
    pub async fn ballot(&self) -> CtxResult<Ballot> {
        let mut categories = self.categories_repository.list().await?;
        if categories.is_empty() {
            categories = self.bootstrap_categories().await?;
        }

        let approved = self
            .participations_repository
            .list_by_status(Some(ParticipationStatus::Approved), None)
            .await?;
        let participations = approved
            .into_iter()
            .filter_map(|p| {
                p.id.map(|id| BallotEntry {
                    id,
                    establishment_name: p.establishment_name,
                    structure_name: p.structure_name,
                    video_url: p.video_url,
                    selected_categories: p.selected_categories,
                })
            })
            .collect();

        Ok(Ballot {
            categories,
            participations,
        })
    }

    /// One transactional batch per voter. An empty selection list is a
    /// valid submission that writes no rows.
    pub async fn submit(&self, input: SubmitVotesInput) -> CtxResult<VoteReceipt> {
        self.period_service.guard(Activity::Voting).await?;

        let email = input.voter_email.trim().to_lowercase();
        if email.is_empty() {
            return Err(self.ctx.to_ctx_error(AppError::ValidationErrors {
                value: "voter_email is required".to_string(),
            }));
        }

        if self.votes_repository.exists_by_email(&email).await? {
            return Err(self.ctx.to_ctx_error(AppError::AlreadyVoted));
        }

        let mut rows: Vec<Vote> = Vec::with_capacity(input.selections.len());
        let mut establishments: Vec<String> = Vec::with_capacity(input.selections.len());
        for selection in &input.selections {
            let category = get_str_thing(&selection.category_id)?;
            let participation = get_str_thing(&selection.participation_id)?;

            self.categories_repository
                .get_by_id(&selection.category_id)
                .await?;
            let candidate = self
                .participations_repository
                .get_by_id(&selection.participation_id)
                .await?;
            if candidate.status != ParticipationStatus::Approved {
                return Err(self.ctx.to_ctx_error(AppError::ValidationErrors {
                    value: "votes can only target approved candidacies".to_string(),
                }));
            }

            if !establishments.contains(&candidate.establishment_name) {
                establishments.push(candidate.establishment_name.clone());
            }
            rows.push(Vote {
                id: None,
                participation,
                category,
                voter_email: email.clone(),
                value: 1,
                created_at: Utc::now(),
            });
        }

        let inserted = self.votes_repository.create_batch(rows).await?;

        Ok(VoteReceipt {
            voter_email: email,
            cast: inserted.len(),
            establishments,
            submitted_at: Utc::now(),
        })
    }

    async fn bootstrap_categories(&self) -> CtxResult<Vec<Category>> {
        let names = self
            .participations_repository
            .distinct_category_names()
            .await?;
        let mut created = Vec::with_capacity(names.len());
        for (order, name) in names.into_iter().enumerate() {
            let category = self
                .categories_repository
                .create(Category {
                    id: None,
                    name,
                    description: None,
                    display_order: order as i64,
                    created_at: Utc::now(),
                })
                .await?;
            created.push(category);
        }
        Ok(created)
    }
}
