//! Scale staffing suggestions.
//!
//! Scores candidate members against the roles a department needs for one
//! service occurrence and ranks them. The heuristic is a weighted sum:
//!
//! | Component         | Contribution                               |
//! |-------------------|--------------------------------------------|
//! | Confirmation rate | `rate × 30`                                |
//! | Experience        | `min(total_scales / 50, 1) × 25`           |
//! | Preferred time    | `+20` when the requested time is preferred |
//! | Rest              | `+15` when the last scale was > 7 days ago |
//! | Skill             | `+10` / `+5` / `+2` (advanced / mid / new) |
//!
//! Everything here is pure and deterministic: the caller loads candidate
//! statistics and passes them in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const WEIGHT_CONFIRMATION: f64 = 30.0;
pub const WEIGHT_EXPERIENCE: f64 = 25.0;

/// Number of past scales after which experience stops adding score.
pub const EXPERIENCE_CAP_SCALES: f64 = 50.0;

pub const BONUS_PREFERRED_TIME: f64 = 20.0;
pub const BONUS_RESTED: f64 = 15.0;

/// A member counts as rested when strictly more days than this have passed.
pub const REST_THRESHOLD_DAYS: i64 = 7;

pub const MAX_SUGGESTIONS_PER_ROLE: usize = 3;

/// Fixed department → role lookup table.
const DEPARTMENT_ROLES: &[(&str, &[&str])] = &[
    (
        "Louvor",
        &["Ministro", "Vocal", "Violão", "Guitarra", "Baixo", "Bateria", "Teclado"],
    ),
    ("Mídia", &["Projeção", "Transmissão", "Fotografia", "Redes Sociais"]),
    ("Som", &["Mesa de Som", "Iluminação"]),
    ("Recepção", &["Recepcionista", "Acolhimento"]),
    ("Infantil", &["Professor", "Auxiliar"]),
    ("Diaconia", &["Diácono", "Portaria"]),
    ("Intercessão", &["Intercessor"]),
];

// ---------------------------------------------------------------------------
// Skill level
// ---------------------------------------------------------------------------

/// Self-declared proficiency stored on the member profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    #[serde(rename = "iniciante")]
    Beginner,
    #[serde(rename = "intermediário")]
    Intermediate,
    #[serde(rename = "avançado")]
    Advanced,
}

impl SkillLevel {
    /// Parse the database value. Unaccented spellings are accepted too.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "iniciante" => Ok(Self::Beginner),
            "intermediário" | "intermediario" => Ok(Self::Intermediate),
            "avançado" | "avancado" => Ok(Self::Advanced),
            other => Err(CoreError::Validation(format!(
                "Invalid skill level '{other}'. Must be one of: iniciante, intermediário, avançado"
            ))),
        }
    }

    /// The database value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "iniciante",
            Self::Intermediate => "intermediário",
            Self::Advanced => "avançado",
        }
    }

    /// Flat score bonus for this level.
    pub fn bonus(self) -> f64 {
        match self {
            Self::Advanced => 10.0,
            Self::Intermediate => 5.0,
            Self::Beginner => 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// What needs staffing: one department at one service occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleRequirement {
    pub department: String,
    /// `HH:MM`.
    pub time: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub service_type: Option<String>,
    /// Explicit role list; when absent the fixed department table is used.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// A member as seen by the heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub member_id: DbId,
    pub name: String,
    /// Functions the member can perform (e.g. `Bateria`, `Vocal`).
    pub functions: Vec<String>,
    pub skill_level: Option<SkillLevel>,
    /// `HH:MM` entries.
    pub preferred_times: Vec<String>,
    /// Confirmed / responded assignments, between 0 and 1.
    pub confirmation_rate: f64,
    pub total_scales: i64,
    pub last_participation: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Per-component contributions before rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub confirmation: f64,
    pub experience: f64,
    pub preferred_time: f64,
    pub rest: f64,
    pub skill: f64,
}

impl ScoreBreakdown {
    /// Rounded total (half away from zero).
    pub fn total(&self) -> i32 {
        let raw =
            self.confirmation + self.experience + self.preferred_time + self.rest + self.skill;
        // Trim float noise so x.5 sums round the same way every time.
        let raw = (raw * 1e6).round() / 1e6;
        raw.round() as i32
    }
}

/// One candidate ranked for one role.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub member_id: DbId,
    pub name: String,
    pub role: String,
    pub score: i32,
    pub breakdown: ScoreBreakdown,
    pub reasons: Vec<String>,
}

/// Ranked suggestions for a single role.
#[derive(Debug, Clone, Serialize)]
pub struct RoleSuggestions {
    pub role: String,
    pub candidates: Vec<ScoredCandidate>,
}

/// The chosen member for one role in a balanced team.
#[derive(Debug, Clone, Serialize)]
pub struct TeamAssignment {
    pub role: String,
    pub member_id: DbId,
    pub name: String,
    pub score: i32,
}

// ---------------------------------------------------------------------------
// Role lookup
// ---------------------------------------------------------------------------

/// Roles a department needs, from the fixed table. Matching is
/// case-insensitive; unknown departments need no roles.
pub fn department_roles(department: &str) -> &'static [&'static str] {
    let wanted = department.trim().to_lowercase();
    DEPARTMENT_ROLES
        .iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

/// Names of every department present in the lookup table.
pub fn known_departments() -> Vec<&'static str> {
    DEPARTMENT_ROLES.iter().map(|(name, _)| *name).collect()
}

fn required_roles(requirement: &ScaleRequirement) -> Vec<String> {
    match &requirement.roles {
        Some(roles) => roles.clone(),
        None => department_roles(&requirement.department)
            .iter()
            .map(|r| r.to_string())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Compute the score components for a candidate against a requirement.
pub fn score_breakdown(
    requirement: &ScaleRequirement,
    candidate: &CandidateProfile,
) -> ScoreBreakdown {
    let rate = candidate.confirmation_rate.clamp(0.0, 1.0);
    let experience_ratio =
        (candidate.total_scales.max(0) as f64 / EXPERIENCE_CAP_SCALES).min(1.0);

    let preferred_time = if candidate.preferred_times.iter().any(|t| *t == requirement.time) {
        BONUS_PREFERRED_TIME
    } else {
        0.0
    };

    let rest = if is_rested(requirement.date, candidate.last_participation) {
        BONUS_RESTED
    } else {
        0.0
    };

    ScoreBreakdown {
        confirmation: rate * WEIGHT_CONFIRMATION,
        experience: experience_ratio * WEIGHT_EXPERIENCE,
        preferred_time,
        rest,
        skill: candidate.skill_level.map(SkillLevel::bonus).unwrap_or(0.0),
    }
}

/// Rounded score of a candidate against a requirement.
pub fn score_candidate(requirement: &ScaleRequirement, candidate: &CandidateProfile) -> i32 {
    score_breakdown(requirement, candidate).total()
}

/// Whether more than [`REST_THRESHOLD_DAYS`] have passed since the last
/// participation. Members who never served count as rested.
fn is_rested(on: NaiveDate, last_participation: Option<NaiveDate>) -> bool {
    match last_participation {
        Some(last) => (on - last).num_days() > REST_THRESHOLD_DAYS,
        None => true,
    }
}

fn reasons_for(
    requirement: &ScaleRequirement,
    candidate: &CandidateProfile,
    b: &ScoreBreakdown,
) -> Vec<String> {
    let mut reasons = Vec::new();
    if candidate.confirmation_rate >= 0.8 {
        reasons.push("Alta taxa de confirmação".to_string());
    }
    if candidate.total_scales >= 20 {
        reasons.push(format!("Experiente ({} escalas)", candidate.total_scales));
    }
    if b.preferred_time > 0.0 {
        reasons.push(format!("Prefere o horário das {}", requirement.time));
    }
    if b.rest > 0.0 {
        match candidate.last_participation {
            Some(_) => reasons.push(format!(
                "Não participa há mais de {REST_THRESHOLD_DAYS} dias"
            )),
            None => reasons.push("Ainda não participou de escalas".to_string()),
        }
    }
    if candidate.skill_level == Some(SkillLevel::Advanced) {
        reasons.push("Nível avançado".to_string());
    }
    reasons
}

/// Score every eligible candidate for `role`, best first.
///
/// Ties keep input order.
fn rank_for_role(
    requirement: &ScaleRequirement,
    role: &str,
    candidates: &[CandidateProfile],
) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = candidates
        .iter()
        .filter(|c| c.functions.iter().any(|f| f == role))
        .map(|c| {
            let breakdown = score_breakdown(requirement, c);
            ScoredCandidate {
                member_id: c.member_id,
                name: c.name.clone(),
                role: role.to_string(),
                score: breakdown.total(),
                reasons: reasons_for(requirement, c, &breakdown),
                breakdown,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Top [`MAX_SUGGESTIONS_PER_ROLE`] candidates for every role the
/// requirement needs. Roles without eligible candidates are returned with an
/// empty list so callers can flag them.
pub fn generate_scale_suggestions(
    requirement: &ScaleRequirement,
    candidates: &[CandidateProfile],
) -> Vec<RoleSuggestions> {
    required_roles(requirement)
        .into_iter()
        .map(|role| {
            let mut ranked = rank_for_role(requirement, &role, candidates);
            ranked.truncate(MAX_SUGGESTIONS_PER_ROLE);
            RoleSuggestions {
                role,
                candidates: ranked,
            }
        })
        .collect()
}

/// The single best candidate per role. Roles nobody can fill are omitted.
pub fn generate_balanced_team(
    requirement: &ScaleRequirement,
    candidates: &[CandidateProfile],
) -> Vec<TeamAssignment> {
    required_roles(requirement)
        .into_iter()
        .filter_map(|role| {
            rank_for_role(requirement, &role, candidates)
                .into_iter()
                .next()
                .map(|best| TeamAssignment {
                    role,
                    member_id: best.member_id,
                    name: best.name,
                    score: best.score,
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sample roster
// ---------------------------------------------------------------------------

/// Demonstration roster for the worship department, with participation
/// dates relative to `reference`.
///
/// Member ids are negative so they can never collide with real rows.
pub fn sample_roster(reference: NaiveDate) -> Vec<CandidateProfile> {
    let days_ago = |n: i64| Some(reference - chrono::Duration::days(n));
    let times = |ts: &[&str]| ts.iter().map(|t| t.to_string()).collect::<Vec<_>>();
    let functions = |fs: &[&str]| fs.iter().map(|f| f.to_string()).collect::<Vec<_>>();

    vec![
        CandidateProfile {
            member_id: -1,
            name: "João Silva".into(),
            functions: functions(&["Bateria"]),
            skill_level: Some(SkillLevel::Intermediate),
            preferred_times: times(&["09:00", "19:00"]),
            confirmation_rate: 0.85,
            total_scales: 32,
            last_participation: days_ago(1),
        },
        CandidateProfile {
            member_id: -2,
            name: "Maria Santos".into(),
            functions: functions(&["Vocal", "Ministro"]),
            skill_level: Some(SkillLevel::Advanced),
            preferred_times: times(&["19:00"]),
            confirmation_rate: 0.95,
            total_scales: 48,
            last_participation: days_ago(14),
        },
        CandidateProfile {
            member_id: -3,
            name: "Pedro Oliveira".into(),
            functions: functions(&["Guitarra", "Violão"]),
            skill_level: Some(SkillLevel::Advanced),
            preferred_times: times(&["09:00"]),
            confirmation_rate: 0.78,
            total_scales: 25,
            last_participation: days_ago(3),
        },
        CandidateProfile {
            member_id: -4,
            name: "Ana Costa".into(),
            functions: functions(&["Teclado", "Vocal"]),
            skill_level: Some(SkillLevel::Intermediate),
            preferred_times: times(&["09:00", "19:00"]),
            confirmation_rate: 0.9,
            total_scales: 18,
            last_participation: days_ago(10),
        },
        CandidateProfile {
            member_id: -5,
            name: "Lucas Ferreira".into(),
            functions: functions(&["Baixo"]),
            skill_level: Some(SkillLevel::Beginner),
            preferred_times: times(&["19:00"]),
            confirmation_rate: 0.7,
            total_scales: 6,
            last_participation: None,
        },
        CandidateProfile {
            member_id: -6,
            name: "Carla Mendes".into(),
            functions: functions(&["Bateria", "Vocal"]),
            skill_level: Some(SkillLevel::Beginner),
            preferred_times: times(&["09:00"]),
            confirmation_rate: 0.6,
            total_scales: 9,
            last_participation: days_ago(21),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn louvor_at_nine() -> ScaleRequirement {
        ScaleRequirement {
            department: "Louvor".into(),
            time: "09:00".into(),
            date: date("2026-03-08"),
            service_type: Some("Culto de Domingo".into()),
            roles: None,
        }
    }

    fn candidate(id: DbId, functions: &[&str], rate: f64, scales: i64) -> CandidateProfile {
        CandidateProfile {
            member_id: id,
            name: format!("Membro {id}"),
            functions: functions.iter().map(|f| f.to_string()).collect(),
            skill_level: None,
            preferred_times: vec![],
            confirmation_rate: rate,
            total_scales: scales,
            last_participation: Some(date("2026-03-07")),
        }
    }

    #[test]
    fn drummer_example_scores_67() {
        let req = louvor_at_nine();
        let drummer = CandidateProfile {
            member_id: 1,
            name: "João".into(),
            functions: vec!["Bateria".into()],
            skill_level: Some(SkillLevel::Intermediate),
            preferred_times: vec!["09:00".into(), "19:00".into()],
            confirmation_rate: 0.85,
            total_scales: 32,
            last_participation: Some(date("2026-03-07")),
        };

        let b = score_breakdown(&req, &drummer);
        assert_eq!(b.rest, 0.0);
        assert_eq!(b.preferred_time, 20.0);
        assert_eq!(b.skill, 5.0);
        assert_eq!(score_candidate(&req, &drummer), 67);
    }

    #[test]
    fn rest_bonus_needs_more_than_seven_days() {
        let req = louvor_at_nine();
        let mut c = candidate(1, &["Bateria"], 0.0, 0);

        c.last_participation = Some(date("2026-03-01"));
        assert_eq!(score_breakdown(&req, &c).rest, 0.0);

        c.last_participation = Some(date("2026-02-28"));
        assert_eq!(score_breakdown(&req, &c).rest, BONUS_RESTED);

        c.last_participation = None;
        assert_eq!(score_breakdown(&req, &c).rest, BONUS_RESTED);
    }

    #[test]
    fn experience_is_capped() {
        let req = louvor_at_nine();
        let veteran = candidate(1, &["Baixo"], 0.0, 500);
        assert_eq!(score_breakdown(&req, &veteran).experience, WEIGHT_EXPERIENCE);
    }

    #[test]
    fn suggestions_are_sorted_and_capped() {
        let req = louvor_at_nine();
        let candidates: Vec<_> = (1..=6)
            .map(|i| candidate(i, &["Vocal"], i as f64 / 10.0, i * 5))
            .collect();

        let suggestions = generate_scale_suggestions(&req, &candidates);
        let vocal = suggestions.iter().find(|s| s.role == "Vocal").unwrap();

        assert_eq!(vocal.candidates.len(), MAX_SUGGESTIONS_PER_ROLE);
        assert!(vocal
            .candidates
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
        assert_eq!(vocal.candidates[0].member_id, 6);
    }

    #[test]
    fn candidates_without_the_role_are_never_suggested() {
        let req = louvor_at_nine();
        let candidates = vec![
            candidate(1, &["Bateria"], 1.0, 50),
            candidate(2, &["Teclado"], 0.2, 1),
        ];

        for role in generate_scale_suggestions(&req, &candidates) {
            for c in &role.candidates {
                let profile = candidates.iter().find(|p| p.member_id == c.member_id).unwrap();
                assert!(profile.functions.contains(&role.role));
            }
        }
    }

    #[test]
    fn suggestions_are_deterministic() {
        let req = louvor_at_nine();
        let roster = sample_roster(req.date);
        let first = generate_scale_suggestions(&req, &roster);
        let second = generate_scale_suggestions(&req, &roster);

        let ids = |s: &[RoleSuggestions]| {
            s.iter()
                .map(|r| {
                    (
                        r.role.clone(),
                        r.candidates.iter().map(|c| (c.member_id, c.score)).collect::<Vec<_>>(),
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn ties_keep_input_order() {
        let req = louvor_at_nine();
        let candidates = vec![
            candidate(7, &["Baixo"], 0.5, 10),
            candidate(3, &["Baixo"], 0.5, 10),
        ];
        let suggestions = generate_scale_suggestions(&req, &candidates);
        let baixo = suggestions.iter().find(|s| s.role == "Baixo").unwrap();
        assert_eq!(baixo.candidates[0].member_id, 7);
        assert_eq!(baixo.candidates[1].member_id, 3);
    }

    #[test]
    fn balanced_team_takes_the_top_candidate_per_role() {
        let req = louvor_at_nine();
        let roster = sample_roster(req.date);
        let team = generate_balanced_team(&req, &roster);
        let suggestions = generate_scale_suggestions(&req, &roster);

        let mut seen_roles = std::collections::HashSet::new();
        for member in &team {
            assert!(seen_roles.insert(member.role.clone()), "one member per role");
            let top = suggestions
                .iter()
                .find(|s| s.role == member.role)
                .and_then(|s| s.candidates.first())
                .unwrap();
            assert_eq!(top.member_id, member.member_id);
            assert_eq!(top.score, member.score);
        }
    }

    #[test]
    fn balanced_team_omits_unfillable_roles() {
        let req = louvor_at_nine();
        let team = generate_balanced_team(&req, &[candidate(1, &["Bateria"], 0.5, 5)]);
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].role, "Bateria");
    }

    #[test]
    fn role_override_replaces_department_table() {
        let mut req = louvor_at_nine();
        req.department = "Departamento Novo".into();
        assert!(generate_scale_suggestions(&req, &[]).is_empty());

        req.roles = Some(vec!["Cozinha".into()]);
        let suggestions =
            generate_scale_suggestions(&req, &[candidate(1, &["Cozinha"], 0.5, 5)]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].candidates.len(), 1);
    }

    #[test]
    fn department_lookup_ignores_case() {
        assert!(department_roles("louvor").contains(&"Bateria"));
        assert!(department_roles("MÍDIA").contains(&"Projeção"));
        assert!(department_roles("Cozinha").is_empty());
        assert!(known_departments().contains(&"Recepção"));
    }

    #[test]
    fn skill_levels_round_trip_database_values() {
        for level in [SkillLevel::Beginner, SkillLevel::Intermediate, SkillLevel::Advanced] {
            assert_eq!(SkillLevel::from_str_value(level.as_str()).unwrap(), level);
        }
        assert_eq!(
            SkillLevel::from_str_value("avancado").unwrap(),
            SkillLevel::Advanced
        );
        assert!(SkillLevel::from_str_value("expert").is_err());
    }

    #[test]
    fn reasons_explain_bonuses() {
        let req = louvor_at_nine();
        let roster = sample_roster(req.date);
        let suggestions = generate_scale_suggestions(&req, &roster);
        let bass = suggestions.iter().find(|s| s.role == "Baixo").unwrap();
        let lucas = &bass.candidates[0];
        assert!(lucas
            .reasons
            .iter()
            .any(|r| r == "Ainda não participou de escalas"));
    }
}
