//! Response DTOs
//!
//! Data structures for API response bodies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::application::services::AuthTokens;
use crate::domain::{Academie, AuthProvider, Etablissement, UserProfile};

/// Authentication tokens response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// Login / verification response (includes user and tokens)
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl AuthResponse {
    pub fn new(profile: UserProfile, tokens: AuthTokens) -> Self {
        Self {
            user: UserResponse::from(profile),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Flattened user profile: account columns, grades, location and plan steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub auth_provider: AuthProvider,
    pub nom: String,
    pub prenom: String,
    pub sexe: Option<String>,
    pub date_naissance: Option<NaiveDate>,
    pub profile_picture: Option<String>,

    pub niveau_scolaire: Option<String>,
    pub objectif: Option<String>,
    pub voie: Option<String>,
    pub specialites: Option<Vec<String>>,
    pub filiere: Option<Vec<String>>,

    pub moyenne_generale: Option<f64>,
    pub moyenne_francais: Option<f64>,
    pub moyenne_philo: Option<f64>,
    pub moyenne_math: Option<f64>,
    pub moyenne_svt: Option<f64>,
    pub moyenne_physique: Option<f64>,
    pub moyenne_anglais: Option<f64>,

    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub distance: Option<f64>,
    pub budget: Option<String>,
    pub academie: Option<String>,
    pub etablissement: Option<String>,
    pub est_boursier: bool,

    /// Step titles of the assigned action plan
    pub plan_action: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        let UserProfile {
            user,
            moyenne,
            location,
            plan_steps,
        } = profile;
        let moyenne = moyenne.as_ref();
        let location = location.as_ref();

        Self {
            id: user.id,
            email: user.email,
            auth_provider: user.auth_provider,
            nom: user.nom,
            prenom: user.prenom,
            sexe: user.sexe,
            date_naissance: user.date_naissance,
            profile_picture: user.profile_picture,
            niveau_scolaire: user.niveau_scolaire,
            objectif: user.objectif,
            voie: user.voie,
            specialites: user.specialites,
            filiere: user.filiere,
            moyenne_generale: moyenne.and_then(|m| m.moyenne_generale),
            moyenne_francais: moyenne.and_then(|m| m.moyenne_francais),
            moyenne_philo: moyenne.and_then(|m| m.moyenne_philo),
            moyenne_math: moyenne.and_then(|m| m.moyenne_math),
            moyenne_svt: moyenne.and_then(|m| m.moyenne_svt),
            moyenne_physique: moyenne.and_then(|m| m.moyenne_physique),
            moyenne_anglais: moyenne.and_then(|m| m.moyenne_anglais),
            telephone: user.telephone,
            adresse: location.and_then(|l| l.adresse.clone()),
            distance: location.and_then(|l| l.distance),
            budget: user.budget,
            academie: location.and_then(|l| l.academie.clone()),
            etablissement: location.and_then(|l| l.etablissement.clone()),
            est_boursier: user.est_boursier,
            plan_action: plan_steps,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanQuestionResponse {
    pub id: i64,
    pub contenu: String,
    pub reponse: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStepResponse {
    pub id: i64,
    pub titre: String,
    pub position: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-text answer for the whole step
    pub answer: Option<String>,
    pub questions: Vec<PlanQuestionResponse>,
}

/// A user's action plan with answers and progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResponse {
    pub id: i64,
    pub nom: String,
    pub steps: Vec<PlanStepResponse>,
    pub completed_steps: usize,
    pub total_steps: usize,
    /// Rounded down, 0 for an empty plan
    pub progress_percent: u8,
}

/// Academie with its etablissements
#[derive(Debug, Serialize)]
pub struct AcademieDetailResponse {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub etablissements: Vec<Etablissement>,
}

impl AcademieDetailResponse {
    pub fn new(academie: Academie, etablissements: Vec<Etablissement>) -> Self {
        Self {
            id: academie.id,
            name: academie.name,
            url: academie.url,
            etablissements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Location, Moyenne, User};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_user_response_flattens_profile() {
        let profile = UserProfile {
            user: User {
                id: 7,
                email: "eleve@example.com".into(),
                nom: "Durand".into(),
                prenom: "Léa".into(),
                ..User::default()
            },
            moyenne: Some(Moyenne {
                user_id: 7,
                moyenne_generale: Some(15.0),
                moyenne_francais: None,
                moyenne_philo: None,
                moyenne_math: Some(17.5),
                moyenne_svt: None,
                moyenne_physique: None,
                moyenne_anglais: None,
            }),
            location: Some(Location {
                user_id: 7,
                adresse: Some("1 rue de la Paix".into()),
                distance: Some(12.0),
                latitude: None,
                longitude: None,
                etablissement: None,
                academie: Some("Versailles".into()),
            }),
            plan_steps: vec!["Mieux se connaître".into()],
        };

        let response = UserResponse::from(profile);

        assert_eq!(response.id, 7);
        assert_eq!(response.moyenne_generale, Some(15.0));
        assert_eq!(response.moyenne_math, Some(17.5));
        assert_eq!(response.moyenne_svt, None);
        assert_eq!(response.adresse.as_deref(), Some("1 rue de la Paix"));
        assert_eq!(response.academie.as_deref(), Some("Versailles"));
        assert_eq!(response.plan_action, vec!["Mieux se connaître".to_string()]);
    }

    #[test]
    fn test_user_response_without_satellites() {
        let profile = UserProfile {
            user: User::default(),
            moyenne: None,
            location: None,
            plan_steps: Vec::new(),
        };

        let json = serde_json::to_value(UserResponse::from(profile)).unwrap();
        assert!(json["moyenne_generale"].is_null());
        assert!(json["adresse"].is_null());
        assert!(json.get("password_hash").is_none());
    }
}
