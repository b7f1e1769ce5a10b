//! Formation (school program) entity and its satellite records.
//!
//! A formation is stored as one row in `formations` plus up to eighteen
//! satellite tables keyed by `formation_id`. One-to-one satellites become
//! `Option`s, one-to-many satellites become `Vec`s. Every scalar is optional:
//! the catalog is scraped and fields are routinely missing.

use async_trait::async_trait;
use serde::Serialize;

use crate::shared::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Formation {
    pub id: i64,
    pub timestamp: Option<String>,
    pub url: Option<String>,
    pub titre: Option<String>,
    pub etablissement: Option<String>,
    pub type_formation: Option<String>,
    pub type_etablissement: Option<String>,
    pub formation_controlee_par_etat: Option<bool>,
    pub apprentissage: Option<String>,
    pub prix_annuel: Option<f64>,
    pub salaire_moyen: Option<f64>,
    pub poursuite_etudes: Option<String>,
    pub taux_insertion: Option<String>,
    pub lien_onisep: Option<String>,
    pub resume_programme: Option<String>,
    pub duree: Option<String>,
    pub formation_selective: Option<bool>,
    pub taux_passage_2e_annee: Option<String>,
    pub acces_formation: Option<String>,
    pub pre_bac_admission_percentage: Option<f64>,
    pub female_percentage: Option<f64>,
    pub new_bac_students_count: Option<i32>,
    pub total_admitted_count: Option<i32>,
    pub complementary_phase_acceptance_percentage: Option<f64>,
    pub taux_reussite_3_4_ans: Option<String>,

    pub lieu: Option<Lieu>,
    pub salaire_bornes: Option<SalaireBornes>,
    pub badges: Vec<Badge>,
    pub filieres_bac: Vec<FiliereBac>,
    pub specialites_favorisees: Vec<SpecialiteFavorisee>,
    pub matieres_enseignees: Vec<MatiereEnseignee>,
    pub debouches_metiers: Vec<DeboucheMetier>,
    pub debouches_secteurs: Vec<DeboucheSecteur>,
    pub ts_taux_par_bac: Vec<TsTauxParBac>,
    pub intervalles_admis: Vec<IntervalleAdmis>,
    pub criteres_candidature: Vec<CritereCandidature>,
    pub boursiers: Option<Boursiers>,
    pub profils_admis: Vec<ProfilAdmis>,
    pub promo_characteristics: Option<PromoCharacteristics>,
    pub post_formation_outcomes: Option<PostFormationOutcomes>,
    pub voie_generale: Option<Voie>,
    pub voie_pro: Option<Voie>,
    pub voie_technologique: Option<Voie>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Lieu {
    #[serde(skip)]
    pub formation_id: i64,
    pub ville: Option<String>,
    pub region: Option<String>,
    pub departement: Option<String>,
    pub academy: Option<String>,
    pub gps_coordinates: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SalaireBornes {
    #[serde(skip)]
    pub formation_id: i64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Badge {
    #[serde(skip)]
    pub formation_id: i64,
    pub badge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FiliereBac {
    #[serde(skip)]
    pub formation_id: i64,
    pub filiere: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SpecialiteFavorisee {
    #[serde(skip)]
    pub formation_id: i64,
    pub specialite: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MatiereEnseignee {
    #[serde(skip)]
    pub formation_id: i64,
    pub matiere: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DeboucheMetier {
    #[serde(skip)]
    pub formation_id: i64,
    pub metier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DeboucheSecteur {
    #[serde(skip)]
    pub formation_id: i64,
    pub secteur: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TsTauxParBac {
    #[serde(skip)]
    pub formation_id: i64,
    pub bac_type: Option<String>,
    pub taux: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct IntervalleAdmis {
    #[serde(skip)]
    pub formation_id: i64,
    pub interval_type: Option<String>,
    pub tle_generale: Option<String>,
    pub tle_techno: Option<String>,
    pub tle_pro: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CritereCandidature {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub formation_id: i64,
    pub categorie: Option<String>,
    pub poids: Option<f64>,
    #[sqlx(skip)]
    pub sous_criteres: Vec<SousCritere>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SousCritere {
    #[serde(skip)]
    pub criteres_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub titre: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Boursiers {
    #[serde(skip)]
    pub formation_id: i64,
    pub taux_minimum_boursiers: Option<String>,
    pub pourcentage_boursiers_neo_bacheliers: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ProfilAdmis {
    #[serde(skip)]
    pub formation_id: i64,
    pub bac_type: Option<String>,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PromoCharacteristics {
    #[serde(skip)]
    pub formation_id: i64,
    pub new_bac_students_count: Option<i32>,
    pub female_percentage: Option<f64>,
    pub total_admitted_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PostFormationOutcomes {
    #[serde(skip)]
    pub formation_id: i64,
    pub poursuivent_etudes: Option<String>,
    pub en_emploi: Option<String>,
    pub autre_situation: Option<String>,
}

/// Admission route (voie générale, professionnelle or technologique).
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Voie {
    #[serde(skip)]
    pub formation_id: i64,
    pub filieres: Option<String>,
    pub specialities: Option<String>,
}

/// Paging and filtering of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct FormationQuery {
    pub skip: i64,
    pub limit: i64,
    /// Case-insensitive match on titre or etablissement
    pub search: Option<String>,
}

impl Default for FormationQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 10,
            search: None,
        }
    }
}

/// Read-only catalog access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormationRepository: Send + Sync {
    /// A page of formations with every satellite loaded.
    async fn list(&self, query: &FormationQuery) -> Result<Vec<Formation>, AppError>;

    /// One formation with every satellite loaded.
    async fn find_by_id(&self, id: i64) -> Result<Option<Formation>, AppError>;
}
