//! User Service
//!
//! Profile, password, location and grades of the authenticated user.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::auth_service::{hash_password, verify_password};
use crate::application::dto::request::{LocationRequest, MoyenneRequest, UpdateProfileRequest};
use crate::domain::{
    Location, LocationPatch, Moyenne, MoyennePatch, ProfileRepository, User, UserPatch,
    UserProfile, UserRepository,
};
use crate::shared::error::AppError;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Profile with grades, location and plan step titles
    async fn get_me(&self, user_id: i64) -> Result<UserProfile, UserError>;

    /// Apply a partial update and return the refreshed profile
    async fn update_me(
        &self,
        user_id: i64,
        update: UpdateProfileRequest,
    ) -> Result<UserProfile, UserError>;

    /// Delete the account and everything it owns
    async fn delete_me(&self, user_id: i64) -> Result<(), UserError>;

    async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError>;

    async fn get_location(&self, user_id: i64) -> Result<Location, UserError>;

    async fn put_location(&self, user_id: i64, request: LocationRequest)
        -> Result<Location, UserError>;

    async fn get_moyenne(&self, user_id: i64) -> Result<Moyenne, UserError>;

    async fn put_moyenne(&self, user_id: i64, request: MoyenneRequest)
        -> Result<Moyenne, UserError>;
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Current password is wrong")]
    WrongPassword,

    #[error("Location not found")]
    LocationNotFound,

    #[error("Grades not found")]
    MoyenneNotFound,

    #[error(transparent)]
    Repository(#[from] AppError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => AppError::NotFound("Utilisateur non trouvé".into()),
            UserError::WrongPassword => {
                AppError::Unauthorized("Mot de passe actuel incorrect".into())
            }
            UserError::LocationNotFound => AppError::NotFound("Localisation non trouvée".into()),
            UserError::MoyenneNotFound => AppError::NotFound("Moyennes non trouvées".into()),
            UserError::Repository(e) => e,
            UserError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Split a profile update into the column patches of each table.
///
/// Fields absent from the request stay `None` and are never written.
pub fn split_profile_update(update: UpdateProfileRequest) -> (UserPatch, MoyennePatch, LocationPatch) {
    let UpdateProfileRequest {
        nom,
        prenom,
        sexe,
        date_naissance,
        profile_picture,
        niveau_scolaire,
        objectif,
        voie,
        specialites,
        filiere,
        telephone,
        budget,
        est_boursier,
        moyenne_generale,
        moyenne_francais,
        moyenne_philo,
        moyenne_math,
        moyenne_svt,
        moyenne_physique,
        moyenne_anglais,
        adresse,
        distance,
        academie,
        etablissement,
    } = update;

    let user = UserPatch {
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
    };
    let moyenne = MoyennePatch {
        moyenne_generale,
        moyenne_francais,
        moyenne_philo,
        moyenne_math,
        moyenne_svt,
        moyenne_physique,
        moyenne_anglais,
    };
    let location = LocationPatch {
        adresse,
        distance,
        latitude: None,
        longitude: None,
        etablissement,
        academie,
    };

    (user, moyenne, location)
}

/// UserService implementation
pub struct UserServiceImpl<U, P>
where
    U: UserRepository,
    P: ProfileRepository,
{
    user_repo: Arc<U>,
    profile_repo: Arc<P>,
}

impl<U, P> UserServiceImpl<U, P>
where
    U: UserRepository,
    P: ProfileRepository,
{
    pub fn new(user_repo: Arc<U>, profile_repo: Arc<P>) -> Self {
        Self {
            user_repo,
            profile_repo,
        }
    }

    async fn find_user(&self, user_id: i64) -> Result<User, UserError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }
}

#[async_trait]
impl<U, P> UserService for UserServiceImpl<U, P>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
{
    async fn get_me(&self, user_id: i64) -> Result<UserProfile, UserError> {
        self.user_repo
            .find_profile(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    #[instrument(skip(self, update))]
    async fn update_me(
        &self,
        user_id: i64,
        update: UpdateProfileRequest,
    ) -> Result<UserProfile, UserError> {
        let (user, moyenne, location) = split_profile_update(update);

        self.user_repo
            .update_profile(user_id, &user, &moyenne, &location)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => UserError::NotFound,
                e => UserError::Repository(e),
            })?;

        self.get_me(user_id).await
    }

    #[instrument(skip(self))]
    async fn delete_me(&self, user_id: i64) -> Result<(), UserError> {
        self.user_repo.delete(user_id).await.map_err(|e| match e {
            AppError::NotFound(_) => UserError::NotFound,
            e => UserError::Repository(e),
        })?;
        info!(user_id, "Account deleted");
        Ok(())
    }

    #[instrument(skip(self, current_password, new_password))]
    async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        let user = self.find_user(user_id).await?;

        let matches = match user.password_hash.as_deref() {
            Some(hash) => verify_password(current_password, hash)
                .map_err(|e| UserError::Internal(e.to_string()))?,
            None => false,
        };
        if !matches {
            return Err(UserError::WrongPassword);
        }

        let password_hash =
            hash_password(new_password).map_err(|e| UserError::Internal(e.to_string()))?;
        self.user_repo
            .update_password(user_id, &password_hash)
            .await?;
        Ok(())
    }

    async fn get_location(&self, user_id: i64) -> Result<Location, UserError> {
        self.profile_repo
            .find_location(user_id)
            .await?
            .ok_or(UserError::LocationNotFound)
    }

    #[instrument(skip(self, request))]
    async fn put_location(
        &self,
        user_id: i64,
        request: LocationRequest,
    ) -> Result<Location, UserError> {
        self.find_user(user_id).await?;

        let location = Location {
            user_id,
            adresse: Some(request.adresse),
            distance: request.distance,
            latitude: Some(request.latitude),
            longitude: Some(request.longitude),
            etablissement: Some(request.etablissement),
            academie: Some(request.academie),
        };
        Ok(self.profile_repo.replace_location(&location).await?)
    }

    async fn get_moyenne(&self, user_id: i64) -> Result<Moyenne, UserError> {
        self.profile_repo
            .find_moyenne(user_id)
            .await?
            .ok_or(UserError::MoyenneNotFound)
    }

    #[instrument(skip(self, request))]
    async fn put_moyenne(
        &self,
        user_id: i64,
        request: MoyenneRequest,
    ) -> Result<Moyenne, UserError> {
        self.find_user(user_id).await?;

        let moyenne = Moyenne {
            user_id,
            moyenne_generale: Some(request.moyenne_generale),
            moyenne_francais: request.moyenne_francais,
            moyenne_philo: request.moyenne_philo,
            moyenne_math: request.moyenne_math,
            moyenne_svt: request.moyenne_svt,
            moyenne_physique: request.moyenne_physique,
            moyenne_anglais: request.moyenne_anglais,
        };
        Ok(self.profile_repo.replace_moyenne(&moyenne).await?)
    }
}
