//! Academie and Etablissement entities.
//!
//! Maps to the `academies` and `etablissements` tables: a read-only school
//! directory where each académie lists its établissements.

use async_trait::async_trait;
use serde::Serialize;

use crate::shared::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Academie {
    pub id: i64,
    /// Unique name, e.g. "Versailles"
    pub name: String,
    pub url: String,
}

/// Academie with the number of établissements it lists.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AcademieSummary {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub etablissement_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Etablissement {
    pub id: i64,
    pub academie_id: i64,
    /// School name
    pub etablissement: Option<String>,
    pub city: Option<String>,
    /// "Public" or "Privé"
    pub sector: Option<String>,
    /// "Général", "Technologique", ...
    pub track: Option<String>,
    pub school_url: String,
}

/// Filters for listing établissements of one académie.
#[derive(Debug, Clone, PartialEq)]
pub struct EtablissementFilter {
    pub city: Option<String>,
    pub track: Option<String>,
    pub sector: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl Default for EtablissementFilter {
    fn default() -> Self {
        Self {
            city: None,
            track: None,
            sector: None,
            skip: 0,
            limit: 50,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AcademieRepository: Send + Sync {
    /// All académies ordered by name.
    async fn list(&self) -> Result<Vec<AcademieSummary>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Academie>, AppError>;

    async fn list_etablissements(
        &self,
        academie_id: i64,
        filter: &EtablissementFilter,
    ) -> Result<Vec<Etablissement>, AppError>;
}
