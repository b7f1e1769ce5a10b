//! Formation and Académie Handlers
//!
//! Public, read-only endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::application::dto::request::{EtablissementQueryParams, FormationQueryParams};
use crate::application::dto::response::AcademieDetailResponse;
use crate::application::services::{CatalogService, CatalogServiceImpl};
use crate::domain::{AcademieSummary, Etablissement, Formation};
use crate::infrastructure::repositories::{PgAcademieRepository, PgFormationRepository};
use crate::shared::error::AppError;
use crate::startup::AppState;

fn catalog_service(
    state: &AppState,
) -> CatalogServiceImpl<PgFormationRepository, PgAcademieRepository> {
    CatalogServiceImpl::new(
        Arc::new(PgFormationRepository::new(state.db.clone())),
        Arc::new(PgAcademieRepository::new(state.db.clone())),
    )
}

/// `GET /formations?skip&limit&search`
pub async fn list_formations(
    State(state): State<AppState>,
    Query(params): Query<FormationQueryParams>,
) -> Result<Json<Vec<Formation>>, AppError> {
    Ok(Json(catalog_service(&state).list_formations(params).await?))
}

pub async fn get_formation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Formation>, AppError> {
    Ok(Json(catalog_service(&state).get_formation(id).await?))
}

pub async fn list_academies(
    State(state): State<AppState>,
) -> Result<Json<Vec<AcademieSummary>>, AppError> {
    Ok(Json(catalog_service(&state).list_academies().await?))
}

pub async fn get_academie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AcademieDetailResponse>, AppError> {
    Ok(Json(catalog_service(&state).get_academie(id).await?))
}

/// `GET /academies/{id}/etablissements?city&track&sector&skip&limit`
pub async fn list_etablissements(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<EtablissementQueryParams>,
) -> Result<Json<Vec<Etablissement>>, AppError> {
    Ok(Json(
        catalog_service(&state)
            .list_etablissements(id, params)
            .await?,
    ))
}
