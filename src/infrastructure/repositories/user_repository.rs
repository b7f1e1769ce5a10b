//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.
//! Maps between the database schema and domain User entity.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{
    AuthProvider, Location, LocationPatch, Moyenne, MoyennePatch, NewUser, User, UserPatch,
    UserProfile, UserRepository,
};
use crate::shared::error::{conflict_on_unique, AppError};

/// Database row representation matching the users table schema.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: Option<String>,
    auth_provider: String,
    nom: String,
    prenom: String,
    sexe: Option<String>,
    date_naissance: Option<NaiveDate>,
    profile_picture: Option<String>,
    objectif: Option<String>,
    niveau_scolaire: Option<String>,
    voie: Option<String>,
    specialites: Option<Vec<String>>,
    filiere: Option<Vec<String>>,
    telephone: Option<String>,
    budget: Option<String>,
    est_boursier: bool,
    plan_action_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert database row to domain User entity.
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            auth_provider: AuthProvider::from_str(&self.auth_provider),
            nom: self.nom,
            prenom: self.prenom,
            sexe: self.sexe,
            date_naissance: self.date_naissance,
            profile_picture: self.profile_picture,
            objectif: self.objectif,
            niveau_scolaire: self.niveau_scolaire,
            voie: self.voie,
            specialites: self.specialites,
            filiere: self.filiere,
            telephone: self.telephone,
            budget: self.budget,
            est_boursier: self.est_boursier,
            plan_action_id: self.plan_action_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, auth_provider, nom, prenom, sexe, date_naissance,
                   profile_picture, objectif, niveau_scolaire, voie, specialites, filiere,
                   telephone, budget, est_boursier, plan_action_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, auth_provider, nom, prenom, sexe, date_naissance,
                   profile_picture, objectif, niveau_scolaire, voie, specialites, filiere,
                   telephone, budget, est_boursier, plan_action_id, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn find_profile(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        let Some(user) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let moyenne = sqlx::query_as::<_, Moyenne>(
            r#"
            SELECT user_id, moyenne_generale, moyenne_francais, moyenne_philo, moyenne_math,
                   moyenne_svt, moyenne_physique, moyenne_anglais
            FROM moyennes
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT user_id, adresse, distance, latitude, longitude, etablissement, academie
            FROM locations
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let plan_steps = match user.plan_action_id {
            Some(plan_id) => {
                sqlx::query_scalar::<_, String>(
                    "SELECT titre FROM plan_steps WHERE plan_action_id = $1 ORDER BY position",
                )
                .bind(plan_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => Vec::new(),
        };

        Ok(Some(UserProfile {
            user,
            moyenne,
            location,
            plan_steps,
        }))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, auth_provider, nom, prenom, sexe,
                               date_naissance, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, email, password_hash, auth_provider, nom, prenom, sexe, date_naissance,
                      profile_picture, objectif, niveau_scolaire, voie, specialites, filiere,
                      telephone, budget, est_boursier, plan_action_id, created_at, updated_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.auth_provider.as_str())
        .bind(&user.nom)
        .bind(&user.prenom)
        .bind(&user.sexe)
        .bind(user.date_naissance)
        .bind(&user.profile_picture)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email déjà utilisé"))?;

        Ok(row.into_user())
    }

    async fn update_profile(
        &self,
        id: i64,
        user: &UserPatch,
        moyenne: &MoyennePatch,
        location: &LocationPatch,
    ) -> Result<(), AppError> {
        // Dropped without commit on any error below, which rolls back
        let mut tx = self.pool.begin().await?;

        let result = profile_update_query(id, user)
            .build()
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Utilisateur non trouvé".to_string()));
        }

        if !moyenne.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO moyennes (user_id, moyenne_generale, moyenne_francais, moyenne_philo,
                                      moyenne_math, moyenne_svt, moyenne_physique, moyenne_anglais)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (user_id) DO UPDATE SET
                    moyenne_generale = COALESCE(EXCLUDED.moyenne_generale, moyennes.moyenne_generale),
                    moyenne_francais = COALESCE(EXCLUDED.moyenne_francais, moyennes.moyenne_francais),
                    moyenne_philo = COALESCE(EXCLUDED.moyenne_philo, moyennes.moyenne_philo),
                    moyenne_math = COALESCE(EXCLUDED.moyenne_math, moyennes.moyenne_math),
                    moyenne_svt = COALESCE(EXCLUDED.moyenne_svt, moyennes.moyenne_svt),
                    moyenne_physique = COALESCE(EXCLUDED.moyenne_physique, moyennes.moyenne_physique),
                    moyenne_anglais = COALESCE(EXCLUDED.moyenne_anglais, moyennes.moyenne_anglais)
                "#,
            )
            .bind(id)
            .bind(moyenne.moyenne_generale)
            .bind(moyenne.moyenne_francais)
            .bind(moyenne.moyenne_philo)
            .bind(moyenne.moyenne_math)
            .bind(moyenne.moyenne_svt)
            .bind(moyenne.moyenne_physique)
            .bind(moyenne.moyenne_anglais)
            .execute(&mut *tx)
            .await?;
        }

        if !location.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO locations (user_id, adresse, distance, latitude, longitude,
                                       etablissement, academie)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (user_id) DO UPDATE SET
                    adresse = COALESCE(EXCLUDED.adresse, locations.adresse),
                    distance = COALESCE(EXCLUDED.distance, locations.distance),
                    latitude = COALESCE(EXCLUDED.latitude, locations.latitude),
                    longitude = COALESCE(EXCLUDED.longitude, locations.longitude),
                    etablissement = COALESCE(EXCLUDED.etablissement, locations.etablissement),
                    academie = COALESCE(EXCLUDED.academie, locations.academie)
                "#,
            )
            .bind(id)
            .bind(&location.adresse)
            .bind(location.distance)
            .bind(location.latitude)
            .bind(location.longitude)
            .bind(&location.etablissement)
            .bind(&location.academie)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Utilisateur non trouvé".to_string()));
        }

        Ok(())
    }

    /// Hard delete; owned rows go with it through ON DELETE CASCADE.
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Utilisateur non trouvé".to_string()));
        }

        Ok(())
    }
}

/// `UPDATE users` touching only the columns present in the patch.
///
/// `updated_at` is always set so an empty patch still detects a missing row.
fn profile_update_query(id: i64, patch: &UserPatch) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("UPDATE users SET updated_at = NOW()");

    macro_rules! set {
        ($($column:ident),+ $(,)?) => {
            $(if let Some(value) = &patch.$column {
                query
                    .push(concat!(", ", stringify!($column), " = "))
                    .push_bind(value.clone());
            })+
        };
    }
    set!(
        nom,
        prenom,
        sexe,
        date_naissance,
        profile_picture,
        objectif,
        niveau_scolaire,
        voie,
        specialites,
        filiere,
        telephone,
        budget,
        est_boursier,
    );

    query.push(" WHERE id = ").push_bind(id);
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_patch_only_touches_timestamp() {
        let query = profile_update_query(7, &UserPatch::default());
        assert_eq!(query.sql(), "UPDATE users SET updated_at = NOW() WHERE id = $1");
    }

    #[test]
    fn test_patch_writes_only_present_columns() {
        let patch = UserPatch {
            telephone: Some(Some("0611223344".into())),
            ..UserPatch::default()
        };
        let query = profile_update_query(7, &patch);

        assert_eq!(
            query.sql(),
            "UPDATE users SET updated_at = NOW(), telephone = $1 WHERE id = $2"
        );
    }

    #[test]
    fn test_explicit_null_is_written() {
        let patch = UserPatch {
            prenom: Some("Lou".into()),
            objectif: Some(None),
            est_boursier: Some(true),
            ..UserPatch::default()
        };
        let sql = profile_update_query(7, &patch).sql().to_string();

        assert_eq!(
            sql,
            "UPDATE users SET updated_at = NOW(), prenom = $1, objectif = $2, est_boursier = $3 WHERE id = $4"
        );
        assert!(!sql.contains("telephone"));
        assert!(!sql.contains(", nom = "));
    }
}
