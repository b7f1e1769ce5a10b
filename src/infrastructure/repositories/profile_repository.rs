//! Location and grades repository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Location, Moyenne, ProfileRepository};
use crate::shared::error::AppError;

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn find_location(&self, user_id: i64) -> Result<Option<Location>, AppError> {
        let row = sqlx::query_as::<_, Location>(
            r#"
            SELECT user_id, adresse, distance, latitude, longitude, etablissement, academie
            FROM locations
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn replace_location(&self, location: &Location) -> Result<Location, AppError> {
        let row = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (user_id, adresse, distance, latitude, longitude,
                                   etablissement, academie)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                adresse = EXCLUDED.adresse,
                distance = EXCLUDED.distance,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                etablissement = EXCLUDED.etablissement,
                academie = EXCLUDED.academie
            RETURNING user_id, adresse, distance, latitude, longitude, etablissement, academie
            "#,
        )
        .bind(location.user_id)
        .bind(&location.adresse)
        .bind(location.distance)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(&location.etablissement)
        .bind(&location.academie)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_moyenne(&self, user_id: i64) -> Result<Option<Moyenne>, AppError> {
        let row = sqlx::query_as::<_, Moyenne>(
            r#"
            SELECT user_id, moyenne_generale, moyenne_francais, moyenne_philo, moyenne_math,
                   moyenne_svt, moyenne_physique, moyenne_anglais
            FROM moyennes
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn replace_moyenne(&self, moyenne: &Moyenne) -> Result<Moyenne, AppError> {
        let row = sqlx::query_as::<_, Moyenne>(
            r#"
            INSERT INTO moyennes (user_id, moyenne_generale, moyenne_francais, moyenne_philo,
                                  moyenne_math, moyenne_svt, moyenne_physique, moyenne_anglais)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE SET
                moyenne_generale = EXCLUDED.moyenne_generale,
                moyenne_francais = EXCLUDED.moyenne_francais,
                moyenne_philo = EXCLUDED.moyenne_philo,
                moyenne_math = EXCLUDED.moyenne_math,
                moyenne_svt = EXCLUDED.moyenne_svt,
                moyenne_physique = EXCLUDED.moyenne_physique,
                moyenne_anglais = EXCLUDED.moyenne_anglais
            RETURNING user_id, moyenne_generale, moyenne_francais, moyenne_philo, moyenne_math,
                      moyenne_svt, moyenne_physique, moyenne_anglais
            "#,
        )
        .bind(moyenne.user_id)
        .bind(moyenne.moyenne_generale)
        .bind(moyenne.moyenne_francais)
        .bind(moyenne.moyenne_philo)
        .bind(moyenne.moyenne_math)
        .bind(moyenne.moyenne_svt)
        .bind(moyenne.moyenne_physique)
        .bind(moyenne.moyenne_anglais)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
