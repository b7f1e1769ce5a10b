//! Location and grade averages attached to a user.
//!
//! Map to the `locations` and `moyennes` tables (one row per user).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Where the student lives and studies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub user_id: i64,
    pub adresse: Option<String>,
    pub distance: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub etablissement: Option<String>,
    pub academie: Option<String>,
}

/// Grade averages, each on a 0-20 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Moyenne {
    pub user_id: i64,
    pub moyenne_generale: Option<f64>,
    pub moyenne_francais: Option<f64>,
    pub moyenne_philo: Option<f64>,
    pub moyenne_math: Option<f64>,
    pub moyenne_svt: Option<f64>,
    pub moyenne_physique: Option<f64>,
    pub moyenne_anglais: Option<f64>,
}

/// Partial grade update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoyennePatch {
    pub moyenne_generale: Option<f64>,
    pub moyenne_francais: Option<f64>,
    pub moyenne_philo: Option<f64>,
    pub moyenne_math: Option<f64>,
    pub moyenne_svt: Option<f64>,
    pub moyenne_physique: Option<f64>,
    pub moyenne_anglais: Option<f64>,
}

impl MoyennePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Partial location update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationPatch {
    pub adresse: Option<String>,
    pub distance: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub etablissement: Option<String>,
    pub academie: Option<String>,
}

impl LocationPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Repository trait for the per-user location and grades rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_location(&self, user_id: i64) -> Result<Option<Location>, AppError>;

    /// Insert or overwrite every column of the user's location.
    async fn replace_location(&self, location: &Location) -> Result<Location, AppError>;

    async fn find_moyenne(&self, user_id: i64) -> Result<Option<Moyenne>, AppError>;

    /// Insert or overwrite every column of the user's grades.
    async fn replace_moyenne(&self, moyenne: &Moyenne) -> Result<Moyenne, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patches() {
        assert!(MoyennePatch::default().is_empty());
        assert!(LocationPatch::default().is_empty());

        let patch = MoyennePatch {
            moyenne_math: Some(14.5),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
