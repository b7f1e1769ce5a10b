//! Formation catalog repository.
//!
//! A page of formations is loaded with one query on `formations`, then one
//! `WHERE formation_id = ANY($1)` query per satellite table for the whole
//! page. Satellite rows are grouped by formation id and attached in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use crate::domain::{
    Badge, Boursiers, CritereCandidature, DeboucheMetier, DeboucheSecteur, FiliereBac, Formation,
    FormationQuery, FormationRepository, IntervalleAdmis, Lieu, MatiereEnseignee,
    PostFormationOutcomes, ProfilAdmis, PromoCharacteristics, SalaireBornes, SousCritere,
    SpecialiteFavorisee, TsTauxParBac, Voie,
};
use crate::infrastructure::database::like_pattern;
use crate::shared::error::AppError;

/// Scalar columns of the formations table.
#[derive(Debug, sqlx::FromRow)]
struct FormationRow {
    id: i64,
    timestamp: Option<String>,
    url: Option<String>,
    titre: Option<String>,
    etablissement: Option<String>,
    type_formation: Option<String>,
    type_etablissement: Option<String>,
    formation_controlee_par_etat: Option<bool>,
    apprentissage: Option<String>,
    prix_annuel: Option<f64>,
    salaire_moyen: Option<f64>,
    poursuite_etudes: Option<String>,
    taux_insertion: Option<String>,
    lien_onisep: Option<String>,
    resume_programme: Option<String>,
    duree: Option<String>,
    formation_selective: Option<bool>,
    taux_passage_2e_annee: Option<String>,
    acces_formation: Option<String>,
    pre_bac_admission_percentage: Option<f64>,
    female_percentage: Option<f64>,
    new_bac_students_count: Option<i32>,
    total_admitted_count: Option<i32>,
    complementary_phase_acceptance_percentage: Option<f64>,
    taux_reussite_3_4_ans: Option<String>,
}

impl FormationRow {
    /// Convert to a domain Formation with no satellites attached yet.
    fn into_formation(self) -> Formation {
        Formation {
            id: self.id,
            timestamp: self.timestamp,
            url: self.url,
            titre: self.titre,
            etablissement: self.etablissement,
            type_formation: self.type_formation,
            type_etablissement: self.type_etablissement,
            formation_controlee_par_etat: self.formation_controlee_par_etat,
            apprentissage: self.apprentissage,
            prix_annuel: self.prix_annuel,
            salaire_moyen: self.salaire_moyen,
            poursuite_etudes: self.poursuite_etudes,
            taux_insertion: self.taux_insertion,
            lien_onisep: self.lien_onisep,
            resume_programme: self.resume_programme,
            duree: self.duree,
            formation_selective: self.formation_selective,
            taux_passage_2e_annee: self.taux_passage_2e_annee,
            acces_formation: self.acces_formation,
            pre_bac_admission_percentage: self.pre_bac_admission_percentage,
            female_percentage: self.female_percentage,
            new_bac_students_count: self.new_bac_students_count,
            total_admitted_count: self.total_admitted_count,
            complementary_phase_acceptance_percentage: self
                .complementary_phase_acceptance_percentage,
            taux_reussite_3_4_ans: self.taux_reussite_3_4_ans,
            ..Formation::default()
        }
    }
}

const FORMATION_COLUMNS: &str = r#"
    id, "timestamp", url, titre, etablissement, type_formation, type_etablissement,
    formation_controlee_par_etat, apprentissage, prix_annuel, salaire_moyen,
    poursuite_etudes, taux_insertion, lien_onisep, resume_programme, duree,
    formation_selective, taux_passage_2e_annee, acces_formation,
    pre_bac_admission_percentage, female_percentage, new_bac_students_count,
    total_admitted_count, complementary_phase_acceptance_percentage, taux_reussite_3_4_ans
"#;

/// Group rows by a key, preserving row order within each group.
fn group_by<T>(rows: Vec<T>, key: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut groups: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        groups.entry(key(&row)).or_default().push(row);
    }
    groups
}

/// First row of a group, for one-to-one satellites.
fn take_one<T>(groups: &mut HashMap<i64, Vec<T>>, id: i64) -> Option<T> {
    groups.remove(&id).and_then(|rows| rows.into_iter().next())
}

fn take_all<T>(groups: &mut HashMap<i64, Vec<T>>, id: i64) -> Vec<T> {
    groups.remove(&id).unwrap_or_default()
}

#[derive(Clone)]
pub struct PgFormationRepository {
    pool: PgPool,
}

impl PgFormationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_for<T>(&self, sql: &str, ids: &[i64]) -> Result<Vec<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let rows = sqlx::query_as::<_, T>(sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Attach every satellite to the given formations.
    async fn load_satellites(&self, formations: &mut [Formation]) -> Result<(), AppError> {
        if formations.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = formations.iter().map(|f| f.id).collect();

        let mut lieux = group_by(
            self.fetch_for::<Lieu>(
                "SELECT formation_id, ville, region, departement, academy, gps_coordinates \
                 FROM lieu WHERE formation_id = ANY($1)",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut salaires = group_by(
            self.fetch_for::<SalaireBornes>(
                "SELECT formation_id, min, max FROM salaire_bornes WHERE formation_id = ANY($1)",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut badges = group_by(
            self.fetch_for::<Badge>(
                "SELECT formation_id, badge FROM badges WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut filieres = group_by(
            self.fetch_for::<FiliereBac>(
                "SELECT formation_id, filiere FROM filieres_bac \
                 WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut specialites = group_by(
            self.fetch_for::<SpecialiteFavorisee>(
                "SELECT formation_id, specialite FROM specialites_favorisees \
                 WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut matieres = group_by(
            self.fetch_for::<MatiereEnseignee>(
                "SELECT formation_id, matiere FROM matieres_enseignees \
                 WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut metiers = group_by(
            self.fetch_for::<DeboucheMetier>(
                "SELECT formation_id, metier FROM debouches_metiers \
                 WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut secteurs = group_by(
            self.fetch_for::<DeboucheSecteur>(
                "SELECT formation_id, secteur FROM debouches_secteurs \
                 WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut taux = group_by(
            self.fetch_for::<TsTauxParBac>(
                "SELECT formation_id, bac_type, taux FROM ts_taux_par_bac \
                 WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut intervalles = group_by(
            self.fetch_for::<IntervalleAdmis>(
                "SELECT formation_id, interval_type, tle_generale, tle_techno, tle_pro \
                 FROM intervalles_admis WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut criteres = group_by(self.load_criteres(&ids).await?, |r| r.formation_id);
        let mut boursiers = group_by(
            self.fetch_for::<Boursiers>(
                "SELECT formation_id, taux_minimum_boursiers, pourcentage_boursiers_neo_bacheliers \
                 FROM boursiers WHERE formation_id = ANY($1)",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut profils = group_by(
            self.fetch_for::<ProfilAdmis>(
                "SELECT formation_id, bac_type, percentage FROM profils_admis \
                 WHERE formation_id = ANY($1) ORDER BY id",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut promos = group_by(
            self.fetch_for::<PromoCharacteristics>(
                "SELECT formation_id, new_bac_students_count, female_percentage, \
                 total_admitted_count FROM promo_characteristics WHERE formation_id = ANY($1)",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut outcomes = group_by(
            self.fetch_for::<PostFormationOutcomes>(
                "SELECT formation_id, poursuivent_etudes, en_emploi, autre_situation \
                 FROM post_formation_outcomes WHERE formation_id = ANY($1)",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut voies_generales = group_by(
            self.fetch_for::<Voie>(
                "SELECT formation_id, filieres, specialities FROM voie_generale \
                 WHERE formation_id = ANY($1)",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut voies_pro = group_by(
            self.fetch_for::<Voie>(
                "SELECT formation_id, filieres, specialities FROM voie_pro \
                 WHERE formation_id = ANY($1)",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );
        let mut voies_techno = group_by(
            self.fetch_for::<Voie>(
                "SELECT formation_id, filieres, specialities FROM voie_technologique \
                 WHERE formation_id = ANY($1)",
                &ids,
            )
            .await?,
            |r| r.formation_id,
        );

        for formation in formations.iter_mut() {
            let id = formation.id;
            formation.lieu = take_one(&mut lieux, id);
            formation.salaire_bornes = take_one(&mut salaires, id);
            formation.badges = take_all(&mut badges, id);
            formation.filieres_bac = take_all(&mut filieres, id);
            formation.specialites_favorisees = take_all(&mut specialites, id);
            formation.matieres_enseignees = take_all(&mut matieres, id);
            formation.debouches_metiers = take_all(&mut metiers, id);
            formation.debouches_secteurs = take_all(&mut secteurs, id);
            formation.ts_taux_par_bac = take_all(&mut taux, id);
            formation.intervalles_admis = take_all(&mut intervalles, id);
            formation.criteres_candidature = take_all(&mut criteres, id);
            formation.boursiers = take_one(&mut boursiers, id);
            formation.profils_admis = take_all(&mut profils, id);
            formation.promo_characteristics = take_one(&mut promos, id);
            formation.post_formation_outcomes = take_one(&mut outcomes, id);
            formation.voie_generale = take_one(&mut voies_generales, id);
            formation.voie_pro = take_one(&mut voies_pro, id);
            formation.voie_technologique = take_one(&mut voies_techno, id);
        }

        Ok(())
    }

    /// Application criteria with their sub-criteria nested.
    async fn load_criteres(&self, ids: &[i64]) -> Result<Vec<CritereCandidature>, AppError> {
        let mut criteres = self
            .fetch_for::<CritereCandidature>(
                "SELECT id, formation_id, categorie, poids FROM criteres_candidature \
                 WHERE formation_id = ANY($1) ORDER BY id",
                ids,
            )
            .await?;
        if criteres.is_empty() {
            return Ok(criteres);
        }

        let critere_ids: Vec<i64> = criteres.iter().map(|c| c.id).collect();
        let mut sous = group_by(
            self.fetch_for::<SousCritere>(
                r#"SELECT criteres_id, "type", titre, description FROM sous_criteres
                   WHERE criteres_id = ANY($1) ORDER BY id"#,
                &critere_ids,
            )
            .await?,
            |r| r.criteres_id,
        );

        for critere in criteres.iter_mut() {
            critere.sous_criteres = take_all(&mut sous, critere.id);
        }

        Ok(criteres)
    }
}

#[async_trait]
impl FormationRepository for PgFormationRepository {
    async fn list(&self, query: &FormationQuery) -> Result<Vec<Formation>, AppError> {
        let sql = format!(
            "SELECT {FORMATION_COLUMNS} FROM formations \
             WHERE ($1::TEXT IS NULL OR titre ILIKE $1 OR etablissement ILIKE $1) \
             ORDER BY id OFFSET $2 LIMIT $3"
        );

        let rows = sqlx::query_as::<_, FormationRow>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(query.skip)
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;

        let mut formations: Vec<Formation> = rows.into_iter().map(|r| r.into_formation()).collect();
        self.load_satellites(&mut formations).await?;

        Ok(formations)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Formation>, AppError> {
        let sql = format!("SELECT {FORMATION_COLUMNS} FROM formations WHERE id = $1");

        let Some(row) = sqlx::query_as::<_, FormationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut formations = vec![row.into_formation()];
        self.load_satellites(&mut formations).await?;

        Ok(formations.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn badge(formation_id: i64, label: &str) -> Badge {
        Badge {
            formation_id,
            badge: Some(label.to_string()),
        }
    }

    #[test]
    fn test_group_by_keeps_order() {
        let rows = vec![badge(1, "a"), badge(2, "b"), badge(1, "c")];
        let mut groups = group_by(rows, |r| r.formation_id);

        assert_eq!(take_all(&mut groups, 1), vec![badge(1, "a"), badge(1, "c")]);
        assert_eq!(take_all(&mut groups, 2), vec![badge(2, "b")]);
        assert!(take_all(&mut groups, 3).is_empty());
    }

    #[test]
    fn test_take_one_returns_first_row() {
        let mut groups = group_by(vec![badge(7, "x"), badge(7, "y")], |r| r.formation_id);
        assert_eq!(take_one(&mut groups, 7), Some(badge(7, "x")));
        assert_eq!(take_one(&mut groups, 7), None);
    }
}
