//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::shared::serde_helpers::deserialize_some;

/// Registration request. Nothing is persisted until the emailed code is confirmed.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,

    #[validate(length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"))]
    pub password: String,

    #[validate(length(min = 1, max = 200, message = "Le nom est requis"))]
    pub nom: String,

    #[validate(length(min = 1, max = 200, message = "Le prénom est requis"))]
    pub prenom: String,

    #[validate(length(min = 1, max = 20, message = "Le sexe est requis"))]
    pub sexe: String,

    pub date_naissance: NaiveDate,
}

/// Email-only request (resend code, forgot password)
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,
}

/// Email + code (verify registration, verify reset code)
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,

    #[validate(length(min = 1, max = 16, message = "Le code est requis"))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,

    #[validate(length(min = 1, max = 16, message = "Le code est requis"))]
    pub code: String,

    #[validate(length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"))]
    pub new_password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,

    #[validate(length(min = 1, message = "Le mot de passe est requis"))]
    pub password: String,
}

/// Refresh token request (also used by logout)
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Le refresh token est requis"))]
    pub refresh_token: String,
}

/// Google sign-in with an ID token obtained by the client
#[derive(Debug, Deserialize, Validate)]
pub struct GoogleLoginRequest {
    #[validate(length(min = 1, message = "Le token Google est requis"))]
    pub id_token: String,
}

/// Partial profile update.
///
/// A field absent from the body is left unchanged. For nullable text fields,
/// an explicit `null` clears the stored value (`Some(None)`).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 200, message = "Le nom ne peut pas être vide"))]
    pub nom: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Le prénom ne peut pas être vide"))]
    pub prenom: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub sexe: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub date_naissance: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub profile_picture: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub niveau_scolaire: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub objectif: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub voie: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub specialites: Option<Option<Vec<String>>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub filiere: Option<Option<Vec<String>>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub telephone: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub budget: Option<Option<String>>,

    pub est_boursier: Option<bool>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_generale: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_francais: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_philo: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_math: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_svt: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_physique: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_anglais: Option<f64>,

    pub adresse: Option<String>,

    #[validate(range(min = 0.0, message = "La distance doit être positive"))]
    pub distance: Option<f64>,

    pub academie: Option<String>,

    pub etablissement: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Le mot de passe actuel est requis"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"))]
    pub new_password: String,
}

/// Full replacement of the user's location
///
/// Only `distance` may be omitted.
#[derive(Debug, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(length(min = 1, max = 255, message = "L'adresse est requise"))]
    pub adresse: String,

    #[validate(range(min = 0.0, message = "La distance doit être positive"))]
    pub distance: Option<f64>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude invalide"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude invalide"))]
    pub longitude: f64,

    #[validate(length(min = 1, max = 255, message = "L'établissement est requis"))]
    pub etablissement: String,

    #[validate(length(min = 1, max = 255, message = "L'académie est requise"))]
    pub academie: String,
}

/// Full replacement of the user's grades; the overall average is required
#[derive(Debug, Deserialize, Validate)]
pub struct MoyenneRequest {
    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_generale: f64,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_francais: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_philo: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_math: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_svt: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_physique: Option<f64>,

    #[validate(range(min = 0.0, max = 20.0, message = "La moyenne doit être comprise entre 0 et 20"))]
    pub moyenne_anglais: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question_id: i64,
    pub reponse: Option<String>,
}

/// Answers to plan questions
#[derive(Debug, Deserialize, Validate)]
pub struct SaveResponsesRequest {
    #[validate(length(min = 1, message = "Au moins une réponse est requise"))]
    pub reponses: Vec<QuestionAnswer>,
}

/// Free-text answer of a plan step
#[derive(Debug, Deserialize, Validate)]
pub struct StepAnswerRequest {
    #[validate(length(max = 10000, message = "Réponse trop longue"))]
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StepProgressRequest {
    pub is_completed: bool,
}

/// Formation list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct FormationQueryParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// Etablissement list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct EtablissementQueryParams {
    pub city: Option<String>,
    pub track: Option<String>,
    pub sector: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_update_profile_distinguishes_null_from_absent() {
        let req: UpdateProfileRequest = serde_json::from_value(json!({
            "telephone": null,
            "objectif": "Devenir ingénieure"
        }))
        .unwrap();

        assert_eq!(req.telephone, Some(None));
        assert_eq!(req.objectif, Some(Some("Devenir ingénieure".to_string())));
        assert_eq!(req.budget, None);
        assert_eq!(req.nom, None);
    }

    #[test_case(json!({"moyenne_math": 14.5}), true ; "valid grade")]
    #[test_case(json!({"moyenne_math": 20.0}), true ; "upper bound")]
    #[test_case(json!({"moyenne_math": 21.0}), false ; "above twenty")]
    #[test_case(json!({"moyenne_generale": -1.0}), false ; "negative")]
    #[test_case(json!({"nom": ""}), false ; "empty nom")]
    fn test_update_profile_validation(body: serde_json::Value, valid: bool) {
        let req: UpdateProfileRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.validate().is_ok(), valid);
    }

    fn location(latitude: f64, longitude: f64) -> LocationRequest {
        LocationRequest {
            adresse: "12 rue des Écoles, Paris".into(),
            distance: None,
            latitude,
            longitude,
            etablissement: "Lycée Henri-IV".into(),
            academie: "Paris".into(),
        }
    }

    #[test_case(45.0, 2.0, true ; "paris-ish")]
    #[test_case(91.0, 2.0, false ; "latitude out of range")]
    #[test_case(45.0, -181.0, false ; "longitude out of range")]
    fn test_location_validation(latitude: f64, longitude: f64, valid: bool) {
        assert_eq!(location(latitude, longitude).validate().is_ok(), valid);
    }

    #[test]
    fn test_location_rejects_blank_text_fields() {
        let req = LocationRequest {
            academie: String::new(),
            ..location(48.85, 2.35)
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("academie"));
    }

    #[test_case(json!({}) ; "empty body")]
    #[test_case(json!({"adresse": "12 rue des Écoles", "latitude": 48.85, "longitude": 2.35}) ; "missing etablissement and academie")]
    #[test_case(json!({"adresse": "12 rue des Écoles", "etablissement": "Lycée", "academie": "Paris"}) ; "missing coordinates")]
    #[test_case(json!({"adresse": null, "latitude": 48.85, "longitude": 2.35, "etablissement": "Lycée", "academie": "Paris"}) ; "null adresse")]
    fn test_location_requires_every_mandatory_field(body: serde_json::Value) {
        assert!(serde_json::from_value::<LocationRequest>(body).is_err());
    }

    #[test]
    fn test_location_distance_is_optional() {
        let req: LocationRequest = serde_json::from_value(json!({
            "adresse": "12 rue des Écoles",
            "latitude": 48.85,
            "longitude": 2.35,
            "etablissement": "Lycée Henri-IV",
            "academie": "Paris"
        }))
        .unwrap();

        assert_eq!(req.distance, None);
        assert!(req.validate().is_ok());
    }

    #[test_case(json!({}) ; "empty body")]
    #[test_case(json!({"moyenne_math": 15.0, "moyenne_svt": 12.0}) ; "subjects without overall average")]
    #[test_case(json!({"moyenne_generale": null}) ; "null overall average")]
    fn test_moyenne_requires_overall_average(body: serde_json::Value) {
        assert!(serde_json::from_value::<MoyenneRequest>(body).is_err());
    }

    #[test]
    fn test_moyenne_subjects_are_optional() {
        let req: MoyenneRequest =
            serde_json::from_value(json!({"moyenne_generale": 13.5})).unwrap();

        assert_eq!(req.moyenne_generale, 13.5);
        assert_eq!(req.moyenne_math, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_save_responses_requires_one_answer() {
        let req: SaveResponsesRequest = serde_json::from_value(json!({"reponses": []})).unwrap();
        assert!(req.validate().is_err());

        let req: SaveResponsesRequest = serde_json::from_value(json!({
            "reponses": [{"question_id": 3, "reponse": "Oui"}]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_short_password() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "email": "eleve@example.com",
            "password": "court",
            "nom": "Durand",
            "prenom": "Léa",
            "sexe": "F",
            "date_naissance": "2007-03-14"
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
