//! Keyword and role heuristics.
//!
//! Every row is scored against three flat tables:
//!
//! - keywords: each matching pattern adds 1 to its status,
//! - role affinity: a matching role adds a heavier weight to its statuses,
//! - role caps: a matching role bounds how far the row may advance.
//!
//! The built-in tables are compiled once on first use. A config file may
//! replace any of them through [`SignalOverrides`].

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::order::StatusOrder;
use super::row::{FieldMap, Row};
use crate::error::{ConfigError, IstatusError};

/// Score contributed by one matching keyword pattern.
pub const KEYWORD_WEIGHT: f64 = 1.0;

const FIELD_ROLE: &str =
    r"(?i)\b(field tech\w*|survey tech\w*|party chief|crew chief|crew member|instrument ?man|rod ?man)\b";
const DRAFTING_ROLE: &str = r"(?i)\b(drafter|draftsman|draftsperson|cad tech\w*|designer)\b";
const ESTIMATING_ROLE: &str = r"(?i)\b(estimator|business development|sales)\b";
const OFFICE_ROLE: &str = r"(?i)\b(admin\w*|coordinator|office manager)\b";
const REVIEW_ROLE: &str = r"(?i)\b(project manager|principal|licensed surveyor|pls|pe)\b";

const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Estimating",
        &[r"\bestimat", r"\bproposal", r"\bquot(e|ed|ing)\b", r"\bbid\b", r"\bfee\b"],
    ),
    (
        "Job Setup",
        &[
            r"\bset ?up\b",
            r"\bkick-?off\b",
            r"\bcontract (signed|executed)\b",
            r"\bresearch\b",
            r"\bdeeds?\b",
        ],
    ),
    (
        "Field Work in Progress",
        &[
            r"\bfield\b",
            r"\bsurvey",
            r"\bscan",
            r"\bsite\b",
            r"\bstak(e|ed|ing)\b",
            r"\bcrew\b",
        ],
    ),
    (
        "Drafting",
        &[r"\bdraft", r"\bcad\b", r"\bdrawings?\b", r"\bplat\b", r"\bmodel(ing|led)?\b"],
    ),
    (
        "QA/QC Review",
        &[r"\bqa\b", r"\bqc\b", r"\breview", r"\bcheck(ed|ing)?\b", r"\bredlines?\b"],
    ),
    (
        "Complete",
        &[
            r"\bfinal\b",
            r"\bcomplete(d)?\b",
            r"\bdeliver(ed|y)\b",
            r"\bissued\b",
            r"\bclosed?\b",
        ],
    ),
];

const ROLE_AFFINITY: &[(&str, &[&str], f64)] = &[
    (FIELD_ROLE, &["Field Work in Progress"], 3.0),
    (DRAFTING_ROLE, &["Drafting"], 2.5),
    (ESTIMATING_ROLE, &["Estimating"], 3.0),
    (OFFICE_ROLE, &["Job Setup"], 2.5),
    (REVIEW_ROLE, &["QA/QC Review", "Complete"], 2.5),
];

const ROLE_CAPS: &[(&str, &str)] = &[
    (FIELD_ROLE, "Field Work in Progress"),
    (DRAFTING_ROLE, "Drafting"),
    (ESTIMATING_ROLE, "Job Setup"),
];

static BUILTIN: LazyLock<SignalTables> = LazyLock::new(|| {
    SignalTables::compile(
        &builtin_keywords(),
        &builtin_affinities(),
        &builtin_caps(),
    )
    .expect("built-in signal patterns are valid")
});

/// Role pattern that adds `weight` to each of `statuses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityRule {
    pub pattern: String,
    pub statuses: Vec<String>,
    pub weight: f64,
}

/// Role pattern that bounds progression at `max_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapRule {
    pub pattern: String,
    pub max_status: String,
}

/// Replacement tables read from the `[signals]` config section. An empty
/// table keeps the built-in one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalOverrides {
    pub keywords: BTreeMap<String, Vec<String>>,
    pub role_affinity: Vec<AffinityRule>,
    pub role_caps: Vec<CapRule>,
}

#[derive(Debug, Clone)]
struct KeywordRule {
    status: String,
    patterns: Vec<Regex>,
}

#[derive(Debug, Clone)]
struct RoleAffinity {
    pattern: Regex,
    statuses: Vec<String>,
    weight: f64,
}

#[derive(Debug, Clone)]
struct RoleCap {
    pattern: Regex,
    max_status: String,
}

/// Per-status scores of one row, indexed by rank.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusScores(Vec<f64>);

impl StatusScores {
    pub fn get(&self, rank: usize) -> f64 {
        self.0.get(rank).copied().unwrap_or(0.0)
    }

    /// `(rank, score)` pairs with a positive score.
    pub fn positive(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, score)| score > 0.0)
    }

    /// Highest score in `[floor, cap]`, ties going to the later stage.
    pub fn pick(&self, floor: usize, cap: usize) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (rank, score) in self.positive() {
            if rank < floor || rank > cap {
                continue;
            }
            match best {
                Some((_, top)) if score < top => {}
                _ => best = Some((rank, score)),
            }
        }
        best.map(|(rank, _)| rank)
    }
}

/// Compiled keyword, affinity and cap tables.
#[derive(Debug, Clone)]
pub struct SignalTables {
    keywords: Vec<KeywordRule>,
    affinities: Vec<RoleAffinity>,
    caps: Vec<RoleCap>,
}

impl Default for SignalTables {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl SignalTables {
    /// Compiles raw tables. Keyword patterns are matched case-insensitively;
    /// role patterns are used as written and carry their own `(?i)` flag.
    pub fn compile(
        keywords: &BTreeMap<String, Vec<String>>,
        affinities: &[AffinityRule],
        caps: &[CapRule],
    ) -> Result<Self, IstatusError> {
        let keywords = keywords
            .iter()
            .map(|(status, patterns)| -> Result<KeywordRule, IstatusError> {
                let patterns = patterns
                    .iter()
                    .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(KeywordRule {
                    status: status.clone(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let affinities = affinities
            .iter()
            .map(|rule| -> Result<RoleAffinity, IstatusError> {
                if !rule.weight.is_finite() || rule.weight <= KEYWORD_WEIGHT {
                    return Err(ConfigError::WeakRoleWeight {
                        pattern: rule.pattern.clone(),
                        weight: rule.weight,
                    }
                    .into());
                }
                Ok(RoleAffinity {
                    pattern: Regex::new(&rule.pattern)?,
                    statuses: rule.statuses.clone(),
                    weight: rule.weight,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let caps = caps
            .iter()
            .map(|rule| -> Result<RoleCap, IstatusError> {
                Ok(RoleCap {
                    pattern: Regex::new(&rule.pattern)?,
                    max_status: rule.max_status.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            keywords,
            affinities,
            caps,
        })
    }

    /// Built-in tables with any non-empty override swapped in.
    pub fn with_overrides(overrides: &SignalOverrides) -> Result<Self, IstatusError> {
        let keywords = if overrides.keywords.is_empty() {
            builtin_keywords()
        } else {
            overrides.keywords.clone()
        };
        let affinities = if overrides.role_affinity.is_empty() {
            builtin_affinities()
        } else {
            overrides.role_affinity.clone()
        };
        let caps = if overrides.role_caps.is_empty() {
            builtin_caps()
        } else {
            overrides.role_caps.clone()
        };
        Self::compile(&keywords, &affinities, &caps)
    }

    /// Status names referenced by the tables that are not in `known`.
    /// They are never scored; callers log them.
    pub fn unknown_statuses<'a>(&'a self, known: &HashSet<&str>) -> BTreeSet<&'a str> {
        let keyword = self.keywords.iter().map(|k| k.status.as_str());
        let affinity = self
            .affinities
            .iter()
            .flat_map(|a| a.statuses.iter().map(String::as_str));
        let cap = self.caps.iter().map(|c| c.max_status.as_str());
        keyword
            .chain(affinity)
            .chain(cap)
            .filter(|status| !known.contains(*status))
            .collect()
    }

    /// Scores every stage of `order` for `row`.
    pub fn score(&self, row: &Row, order: &StatusOrder, fields: &FieldMap) -> StatusScores {
        let mut scores = vec![0.0; order.len()];

        let text = row.signal_text(fields);
        for rule in &self.keywords {
            let Some(rank) = order.rank(&rule.status) else {
                continue;
            };
            let hits = rule.patterns.iter().filter(|p| p.is_match(&text)).count();
            scores[rank] += hits as f64 * KEYWORD_WEIGHT;
        }

        // A missing role is matched as "", so patterns like `^$` still apply.
        let role = row.get(&fields.role);
        for affinity in self.affinities.iter().filter(|a| a.pattern.is_match(role)) {
            for status in &affinity.statuses {
                if let Some(rank) = order.rank(status) {
                    scores[rank] += affinity.weight;
                }
            }
        }

        StatusScores(scores)
    }

    /// Highest rank `row` may reach. The most restrictive matching cap wins,
    /// no match means the terminal stage, and the result never drops below
    /// `floor`.
    pub fn cap_rank(
        &self,
        row: &Row,
        order: &StatusOrder,
        fields: &FieldMap,
        floor: usize,
    ) -> usize {
        let role = row.get(&fields.role);
        self.caps
            .iter()
            .filter(|c| c.pattern.is_match(role))
            .filter_map(|c| order.rank(&c.max_status))
            .min()
            .unwrap_or_else(|| order.last_rank())
            .max(floor)
    }
}

fn builtin_keywords() -> BTreeMap<String, Vec<String>> {
    KEYWORDS
        .iter()
        .map(|(status, patterns)| {
            (
                status.to_string(),
                patterns.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect()
}

fn builtin_affinities() -> Vec<AffinityRule> {
    ROLE_AFFINITY
        .iter()
        .map(|(pattern, statuses, weight)| AffinityRule {
            pattern: pattern.to_string(),
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
            weight: *weight,
        })
        .collect()
}

fn builtin_caps() -> Vec<CapRule> {
    ROLE_CAPS
        .iter()
        .map(|(pattern, max_status)| CapRule {
            pattern: pattern.to_string(),
            max_status: max_status.to_string(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn lifecycle() -> StatusOrder {
        StatusOrder::new([
            "Estimating",
            "Job Setup",
            "Field Work in Progress",
            "Drafting",
            "QA/QC Review",
            "Complete",
        ])
        .unwrap()
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(0, pairs.iter().copied())
    }

    #[test]
    fn keywords_score_one_point_per_pattern() {
        let order = lifecycle();
        let tables = SignalTables::default();
        let scores = tables.score(
            &row(&[("description", "Site survey and field scan today")]),
            &order,
            &FieldMap::default(),
        );
        assert_eq!(scores.get(order.rank("Field Work in Progress").unwrap()), 4.0);
        assert_eq!(scores.positive().count(), 1);
    }

    #[test]
    fn role_affinity_outweighs_a_keyword() {
        let order = lifecycle();
        let tables = SignalTables::default();
        let scores = tables.score(
            &row(&[("role", "Drafter"), ("description", "final")]),
            &order,
            &FieldMap::default(),
        );
        let drafting = order.rank("Drafting").unwrap();
        let complete = order.rank("Complete").unwrap();
        // "draft" keyword from the role text plus the drafting role weight.
        assert_eq!(scores.get(drafting), 3.5);
        assert_eq!(scores.get(complete), 1.0);
    }

    #[test]
    fn statuses_missing_from_order_are_ignored() {
        let order = StatusOrder::new(["Estimating", "Complete"]).unwrap();
        let tables = SignalTables::default();
        let scores = tables.score(
            &row(&[("role", "Party Chief"), ("description", "field survey")]),
            &order,
            &FieldMap::default(),
        );
        assert_eq!(scores.positive().count(), 0);
        let unknown = tables.unknown_statuses(&order.status_set());
        assert!(unknown.contains("Drafting"));
        assert!(!unknown.contains("Complete"));
    }

    #[test]
    fn most_restrictive_cap_wins() {
        let order = lifecycle();
        let tables = SignalTables::compile(
            &BTreeMap::new(),
            &[],
            &[
                CapRule {
                    pattern: "(?i)tech".into(),
                    max_status: "Drafting".into(),
                },
                CapRule {
                    pattern: "(?i)field".into(),
                    max_status: "Job Setup".into(),
                },
            ],
        )
        .unwrap();
        let fields = FieldMap::default();
        let r = row(&[("role", "Field Tech")]);
        assert_eq!(tables.cap_rank(&r, &order, &fields, 0), 1);
        // Never below the floor.
        assert_eq!(tables.cap_rank(&r, &order, &fields, 4), 4);
        // No matching role: unbounded.
        let r = row(&[("role", "Principal")]);
        assert_eq!(tables.cap_rank(&r, &order, &fields, 0), order.last_rank());
    }

    #[test]
    fn role_patterns_use_raw_case() {
        let order = lifecycle();
        let tables = SignalTables::compile(
            &BTreeMap::new(),
            &[AffinityRule {
                pattern: "Chief".into(),
                statuses: vec!["Drafting".into()],
                weight: 3.0,
            }],
            &[],
        )
        .unwrap();
        let fields = FieldMap::default();
        let upper = tables.score(&row(&[("role", "Party Chief")]), &order, &fields);
        let lower = tables.score(&row(&[("role", "party chief")]), &order, &fields);
        assert_eq!(upper.get(3), 3.0);
        assert_eq!(lower.get(3), 0.0);
    }

    #[test]
    fn pick_prefers_later_stage_on_tie() {
        let scores = StatusScores(vec![0.0, 2.0, 2.0, 1.0]);
        assert_eq!(scores.pick(0, 3), Some(2));
        assert_eq!(scores.pick(0, 1), Some(1));
        assert_eq!(scores.pick(3, 3), Some(3));
        assert_eq!(StatusScores(vec![0.0, 0.0]).pick(0, 1), None);
    }

    #[test]
    fn weak_role_weight_is_rejected() {
        let err = SignalTables::compile(
            &BTreeMap::new(),
            &[AffinityRule {
                pattern: "x".into(),
                statuses: vec![],
                weight: 1.0,
            }],
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IstatusError::Config(ConfigError::WeakRoleWeight { .. })
        ));
    }

    #[test]
    fn non_finite_role_weight_is_rejected() {
        for weight in [f64::NAN, f64::INFINITY] {
            let err = SignalTables::compile(
                &BTreeMap::new(),
                &[AffinityRule {
                    pattern: "x".into(),
                    statuses: vec!["Drafting".into()],
                    weight,
                }],
                &[],
            )
            .unwrap_err();
            assert!(
                matches!(err, IstatusError::Config(ConfigError::WeakRoleWeight { .. })),
                "{weight}"
            );
        }
    }

    #[test]
    fn blank_role_matches_empty_patterns() {
        let order = lifecycle();
        let tables = SignalTables::compile(
            &BTreeMap::new(),
            &[AffinityRule {
                pattern: "^$".into(),
                statuses: vec!["Job Setup".into()],
                weight: 2.5,
            }],
            &[CapRule {
                pattern: "^$".into(),
                max_status: "Job Setup".into(),
            }],
        )
        .unwrap();
        let fields = FieldMap::default();
        let r = row(&[("description", "site visit")]);
        assert_eq!(tables.score(&r, &order, &fields).get(1), 2.5);
        assert_eq!(tables.cap_rank(&r, &order, &fields, 0), 1);

        // Built-in role patterns never match a blank role.
        let builtin = SignalTables::default();
        assert_eq!(builtin.cap_rank(&r, &order, &fields, 0), order.last_rank());
    }

    #[test]
    fn invalid_override_pattern_is_an_error() {
        let overrides = SignalOverrides {
            role_caps: vec![CapRule {
                pattern: "(unclosed".into(),
                max_status: "Drafting".into(),
            }],
            ..Default::default()
        };
        assert!(matches!(
            SignalTables::with_overrides(&overrides),
            Err(IstatusError::Regex(_))
        ));
    }
}
