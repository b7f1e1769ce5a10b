//! School directory repository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{
    Academie, AcademieRepository, AcademieSummary, Etablissement, EtablissementFilter,
};
use crate::shared::error::AppError;

#[derive(Clone)]
pub struct PgAcademieRepository {
    pool: PgPool,
}

impl PgAcademieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AcademieRepository for PgAcademieRepository {
    async fn list(&self) -> Result<Vec<AcademieSummary>, AppError> {
        let rows = sqlx::query_as::<_, AcademieSummary>(
            r#"
            SELECT a.id, a.name, a.url, COUNT(e.id) AS etablissement_count
            FROM academies a
            LEFT JOIN etablissements e ON e.academie_id = a.id
            GROUP BY a.id, a.name, a.url
            ORDER BY a.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Academie>, AppError> {
        let row = sqlx::query_as::<_, Academie>("SELECT id, name, url FROM academies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_etablissements(
        &self,
        academie_id: i64,
        filter: &EtablissementFilter,
    ) -> Result<Vec<Etablissement>, AppError> {
        // City matches case-insensitively; track and sector are exact labels
        let rows = sqlx::query_as::<_, Etablissement>(
            r#"
            SELECT id, academie_id, etablissement, city, sector, track, school_url
            FROM etablissements
            WHERE academie_id = $1
              AND ($2::TEXT IS NULL OR lower(city) = lower($2))
              AND ($3::TEXT IS NULL OR track = $3)
              AND ($4::TEXT IS NULL OR sector = $4)
            ORDER BY etablissement, id
            OFFSET $5
            LIMIT $6
            "#,
        )
        .bind(academie_id)
        .bind(&filter.city)
        .bind(&filter.track)
        .bind(&filter.sector)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
