use std::collections::HashMap;
use std::io::{Cursor, Write};

use futures::future::join_all;
use tokio::sync::broadcast::Sender;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::database::client::Db;
use crate::entities::category_entity::CategoryDbService;
use crate::entities::participation_entity::{
    Participation, ParticipationDbService, ParticipationStatus,
};
use crate::entities::vote_entity::VoteDbService;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};
use crate::middleware::mw_ctx::{AppEvent, ExportFailure, ExportProgress, ExportStage};
use crate::utils::file::convert::sanitize_filename;
use crate::utils::pdf::{render_participation, RgbImageData};

pub struct ExportService<'a> {
    participations_repository: ParticipationDbService<'a>,
    categories_repository: CategoryDbService<'a>,
    votes_repository: VoteDbService<'a>,
    event_sender: &'a Sender<AppEvent>,
    export_header_url: Option<&'a str>,
    ctx: &'a Ctx,
}

impl<'a> ExportService<'a> {
    pub fn new(
        db: &'a Db,
        ctx: &'a Ctx,
        event_sender: &'a Sender<AppEvent>,
        export_header_url: Option<&'a str>,
    ) -> Self {
        Self {
            participations_repository: ParticipationDbService { db, ctx },
            categories_repository: CategoryDbService { db, ctx },
            votes_repository: VoteDbService { db, ctx },
            event_sender,
            export_header_url,
            ctx,
        }
    }

    /// Vote totals per category and candidacy, sorted by category then
    /// descending vote count.
    pub async fn results_csv(&self) -> CtxResult<Vec<u8>> {
        let categories = self.categories_repository.list().await?;
        let participations = self
            .participations_repository
            .list_by_status(Some(ParticipationStatus::Approved), None)
            .await?;
        let tallies = self.votes_repository.tallies().await?;

        let category_names: HashMap<String, String> = categories
            .into_iter()
            .filter_map(|c| c.id.map(|id| (id.to_raw(), c.name)))
            .collect();
        let participation_names: HashMap<String, (String, String)> = participations
            .into_iter()
            .filter_map(|p| {
                p.id.map(|id| (id.to_raw(), (p.establishment_name, p.structure_name)))
            })
            .collect();

        let mut rows: Vec<(String, String, String, i64)> = tallies
            .into_iter()
            .filter_map(|t| {
                let category = category_names.get(&t.category.to_raw())?.clone();
                let (establishment, structure) =
                    participation_names.get(&t.participation.to_raw())?.clone();
                Some((category, establishment, structure, t.votes))
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0).then(b.3.cmp(&a.3)));

        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .write_record(["categorie", "etablissement", "structure", "voix"])
            .map_err(|e| self.csv_error(e))?;
        for (category, establishment, structure, votes) in rows {
            writer
                .write_record([category, establishment, structure, votes.to_string()])
                .map_err(|e| self.csv_error(e))?;
        }
        writer
            .into_inner()
            .map_err(|e| self.ctx.to_ctx_error(AppError::Generic {
                description: e.to_string(),
            }))
    }

    /// Every candidacy field flattened into one row per record, the csv
    /// writer handles quoting.
    pub async fn participations_csv(&self) -> CtxResult<Vec<u8>> {
        let participations = self
            .participations_repository
            .list_by_status(None, None)
            .await?;

        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .write_record([
                "id",
                "establishment_name",
                "candidate_surname",
                "candidate_first_name",
                "acting_capacity",
                "structure_name",
                "commercial_name",
                "siret",
                "naf_code",
                "email",
                "phone",
                "activity_description",
                "clientele",
                "products",
                "communication_modes",
                "strengths_weaknesses",
                "digital_transition",
                "disability_inclusion",
                "disability_needs",
                "disability_percentage",
                "disability_support",
                "participation_reasons",
                "improvement_axes",
                "selected_categories",
                "video_url",
                "fiscal_attestation_url",
                "registry_extract_url",
                "signature_url",
                "candidacy_consent",
                "diffusion_authorized",
                "regulation_accepted",
                "current_step",
                "completed",
                "status",
                "created_at",
                "updated_at",
            ])
            .map_err(|e| self.csv_error(e))?;

        for p in participations {
            writer
                .write_record([
                    p.id.map(|id| id.to_raw()).unwrap_or_default(),
                    p.establishment_name,
                    p.candidate_surname,
                    p.candidate_first_name,
                    p.acting_capacity,
                    p.structure_name,
                    p.commercial_name.unwrap_or_default(),
                    p.siret,
                    p.naf_code,
                    p.email,
                    p.phone.unwrap_or_default(),
                    p.activity_description.unwrap_or_default(),
                    p.clientele.unwrap_or_default(),
                    p.products.unwrap_or_default(),
                    p.communication_modes.unwrap_or_default(),
                    p.strengths_weaknesses.unwrap_or_default(),
                    p.digital_transition.unwrap_or_default(),
                    p.disability_inclusion.unwrap_or_default(),
                    p.disability_needs.unwrap_or_default(),
                    p.disability_percentage.unwrap_or_default(),
                    p.disability_support.unwrap_or_default(),
                    p.participation_reasons.unwrap_or_default(),
                    p.improvement_axes.unwrap_or_default(),
                    p.selected_categories.join(", "),
                    p.video_url.unwrap_or_default(),
                    p.fiscal_attestation_url.unwrap_or_default(),
                    p.registry_extract_url.unwrap_or_default(),
                    p.signature_url.unwrap_or_default(),
                    p.candidacy_consent.to_string(),
                    p.diffusion_authorized.to_string(),
                    p.regulation_accepted.to_string(),
                    p.current_step.to_string(),
                    p.completed.to_string(),
                    p.status.to_string(),
                    p.created_at.to_rfc3339(),
                    p.updated_at.to_rfc3339(),
                ])
                .map_err(|e| self.csv_error(e))?;
        }
        writer
            .into_inner()
            .map_err(|e| self.ctx.to_ctx_error(AppError::Generic {
                description: e.to_string(),
            }))
    }

    /// One PDF dossier per approved candidacy plus the results CSV, in a
    /// single zip. A candidacy whose dossier fails is reported through
    /// the progress stream and skipped, the archive still completes.
    pub async fn archive(&self) -> CtxResult<Vec<u8>> {
        self.send_progress(ExportStage::Preparing, vec![], vec![], None);

        let approved = self
            .participations_repository
            .list_by_status(Some(ParticipationStatus::Approved), None)
            .await?;
        let header = match self.export_header_url {
            Some(url) => fetch_image(url).await.ok(),
            None => None,
        };

        self.send_progress(
            ExportStage::Generating,
            vec![],
            vec![],
            Some(format!("{} dossiers to generate", approved.len())),
        );

        let rendered = join_all(
            approved
                .iter()
                .map(|p| render_dossier(p, header.as_ref())),
        )
        .await;

        let mut succeeded: Vec<String> = vec![];
        let mut failed: Vec<ExportFailure> = vec![];
        let mut documents: Vec<(String, Vec<u8>)> = vec![];
        for outcome in rendered {
            match outcome {
                Ok((name, bytes)) => {
                    succeeded.push(name.clone());
                    documents.push((name, bytes));
                }
                Err(failure) => failed.push(failure),
            }
        }

        self.send_progress(ExportStage::Archiving, succeeded.clone(), failed.clone(), None);

        let csv_bytes = self.results_csv().await?;
        let archive = build_zip(documents, csv_bytes).map_err(|description| {
            self.send_progress(
                ExportStage::Error,
                succeeded.clone(),
                failed.clone(),
                Some(description.clone()),
            );
            self.ctx.to_ctx_error(AppError::Generic { description })
        })?;

        self.send_progress(ExportStage::Completed, succeeded, failed, None);
        Ok(archive)
    }

    fn send_progress(
        &self,
        stage: ExportStage,
        succeeded: Vec<String>,
        failed: Vec<ExportFailure>,
        message: Option<String>,
    ) {
        let _ = self.event_sender.send(AppEvent::ExportProgress(ExportProgress {
            stage,
            succeeded,
            failed,
            message,
        }));
    }

    fn csv_error(&self, e: csv::Error) -> crate::middleware::error::CtxError {
        self.ctx.to_ctx_error(AppError::Generic {
            description: e.to_string(),
        })
    }
}

async fn render_dossier(
    participation: &Participation,
    header: Option<&RgbImageData>,
) -> Result<(String, Vec<u8>), ExportFailure> {
    let name = dossier_name(participation);
    let signature = match participation.signature_url.as_deref() {
        Some(url) => match fetch_image(url).await {
            Ok(image) => Some(image),
            Err(reason) => {
                tracing::warn!("signature image for {name} unavailable: {reason}");
                None
            }
        },
        None => None,
    };

    let bytes = render_participation(
        participation,
        &participation.selected_categories,
        header,
        signature.as_ref(),
    )
    .map_err(|reason| ExportFailure {
        name: name.clone(),
        reason,
    })?;
    Ok((name, bytes))
}

async fn fetch_image(url: &str) -> Result<RgbImageData, String> {
    let response = reqwest::get(url).await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("fetching {url} returned {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    RgbImageData::from_encoded(&bytes)
}

fn dossier_name(participation: &Participation) -> String {
    let suffix = participation
        .id
        .as_ref()
        .map(|id| id.id.to_raw())
        .unwrap_or_default();
    sanitize_filename(&format!(
        "{}_{suffix}",
        participation.establishment_name
    ))
}

fn build_zip(documents: Vec<(String, Vec<u8>)>, csv_bytes: Vec<u8>) -> Result<Vec<u8>, String> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("resultats.csv", options)
        .map_err(|e| e.to_string())?;
    zip.write_all(&csv_bytes).map_err(|e| e.to_string())?;

    for (name, bytes) in documents {
        zip.start_file(format!("dossiers/{name}.pdf"), options)
            .map_err(|e| e.to_string())?;
        zip.write_all(&bytes).map_err(|e| e.to_string())?;
    }

    let cursor = zip.finish().map_err(|e| e.to_string())?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::build_zip;

    #[test]
    fn zip_contains_csv_and_dossiers() {
        let bytes = build_zip(
            vec![("a_1".to_string(), vec![1, 2, 3])],
            b"categorie\n".to_vec(),
        )
        .unwrap();
        let reader = std::io::Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(reader).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"resultats.csv".to_string()));
        assert!(names.contains(&"dossiers/a_1.pdf".to_string()));
    }
}
