//! Catalog Service
//!
//! Read-only access to formations and the académie directory.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::application::dto::request::{EtablissementQueryParams, FormationQueryParams};
use crate::application::dto::response::AcademieDetailResponse;
use crate::domain::{
    AcademieRepository, AcademieSummary, Etablissement, EtablissementFilter, Formation,
    FormationQuery, FormationRepository,
};
use crate::shared::error::AppError;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_formations(&self, params: FormationQueryParams)
        -> Result<Vec<Formation>, CatalogError>;

    async fn get_formation(&self, id: i64) -> Result<Formation, CatalogError>;

    async fn list_academies(&self) -> Result<Vec<AcademieSummary>, CatalogError>;

    /// Académie with every etablissement
    async fn get_academie(&self, id: i64) -> Result<AcademieDetailResponse, CatalogError>;

    async fn list_etablissements(
        &self,
        academie_id: i64,
        params: EtablissementQueryParams,
    ) -> Result<Vec<Etablissement>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Formation not found")]
    FormationNotFound,

    #[error("Academie not found")]
    AcademieNotFound,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::FormationNotFound => AppError::NotFound("Formation non trouvée".into()),
            CatalogError::AcademieNotFound => AppError::NotFound("Académie non trouvée".into()),
            CatalogError::Repository(e) => e,
        }
    }
}

fn clamp_skip(skip: Option<i64>) -> i64 {
    skip.unwrap_or(0).max(0)
}

fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

/// Blank filters are treated as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<FormationQueryParams> for FormationQuery {
    fn from(params: FormationQueryParams) -> Self {
        let defaults = FormationQuery::default();
        Self {
            skip: clamp_skip(params.skip),
            limit: clamp_limit(params.limit, defaults.limit),
            search: non_blank(params.search),
        }
    }
}

impl From<EtablissementQueryParams> for EtablissementFilter {
    fn from(params: EtablissementQueryParams) -> Self {
        let defaults = EtablissementFilter::default();
        Self {
            city: non_blank(params.city),
            track: non_blank(params.track),
            sector: non_blank(params.sector),
            skip: clamp_skip(params.skip),
            limit: clamp_limit(params.limit, defaults.limit),
        }
    }
}

pub struct CatalogServiceImpl<F, A>
where
    F: FormationRepository,
    A: AcademieRepository,
{
    formation_repo: Arc<F>,
    academie_repo: Arc<A>,
}

impl<F, A> CatalogServiceImpl<F, A>
where
    F: FormationRepository,
    A: AcademieRepository,
{
    pub fn new(formation_repo: Arc<F>, academie_repo: Arc<A>) -> Self {
        Self {
            formation_repo,
            academie_repo,
        }
    }
}

#[async_trait]
impl<F, A> CatalogService for CatalogServiceImpl<F, A>
where
    F: FormationRepository + 'static,
    A: AcademieRepository + 'static,
{
    #[instrument(skip(self))]
    async fn list_formations(
        &self,
        params: FormationQueryParams,
    ) -> Result<Vec<Formation>, CatalogError> {
        let query = FormationQuery::from(params);
        Ok(self.formation_repo.list(&query).await?)
    }

    async fn get_formation(&self, id: i64) -> Result<Formation, CatalogError> {
        self.formation_repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::FormationNotFound)
    }

    async fn list_academies(&self) -> Result<Vec<AcademieSummary>, CatalogError> {
        Ok(self.academie_repo.list().await?)
    }

    async fn get_academie(&self, id: i64) -> Result<AcademieDetailResponse, CatalogError> {
        let academie = self
            .academie_repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::AcademieNotFound)?;

        let everything = EtablissementFilter {
            limit: i64::MAX,
            ..EtablissementFilter::default()
        };
        let etablissements = self
            .academie_repo
            .list_etablissements(id, &everything)
            .await?;

        Ok(AcademieDetailResponse::new(academie, etablissements))
    }

    #[instrument(skip(self))]
    async fn list_etablissements(
        &self,
        academie_id: i64,
        params: EtablissementQueryParams,
    ) -> Result<Vec<Etablissement>, CatalogError> {
        if self.academie_repo.find_by_id(academie_id).await?.is_none() {
            return Err(CatalogError::AcademieNotFound);
        }

        let filter = EtablissementFilter::from(params);
        Ok(self
            .academie_repo
            .list_etablissements(academie_id, &filter)
            .await?)
    }
}
