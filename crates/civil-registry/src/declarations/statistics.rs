use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{Declaration, SEX_FEMALE, SEX_MALE};

/// Share of declarations falling into one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticShare {
    pub label: &'static str,
    pub value: usize,
    pub percent: String,
}

/// Births declared in one month, split by sex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBirths {
    pub month: String,
    pub boys: usize,
    pub girls: usize,
}

/// Dashboard figures computed from a snapshot of declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationStatistics {
    pub total: usize,
    pub by_sex: Vec<StatisticShare>,
    pub by_parents_status: Vec<StatisticShare>,
    pub monthly_births: Vec<MonthlyBirths>,
}

impl DeclarationStatistics {
    pub fn from_declarations(declarations: &[Declaration]) -> Self {
        let total = declarations.len();
        let boys = count(declarations, |d| d.draft.sexe == SEX_MALE);
        let girls = count(declarations, |d| d.draft.sexe == SEX_FEMALE);
        let married = count(declarations, |d| d.draft.parents_maries);

        let mut months: BTreeMap<String, MonthlyBirths> = BTreeMap::new();
        for declaration in declarations {
            let Some(month) = birth_month(&declaration.draft.date_naissance) else {
                continue;
            };
            let is_boy = declaration.draft.sexe == SEX_MALE;
            let is_girl = declaration.draft.sexe == SEX_FEMALE;
            if !is_boy && !is_girl {
                continue;
            }
            let entry = months.entry(month.to_string()).or_insert_with(|| MonthlyBirths {
                month: month.to_string(),
                boys: 0,
                girls: 0,
            });
            if is_boy {
                entry.boys += 1;
            } else {
                entry.girls += 1;
            }
        }

        Self {
            total,
            by_sex: vec![
                share("Garçons", boys, total),
                share("Filles", girls, total),
            ],
            by_parents_status: vec![
                share("Parents mariés", married, total),
                share("Parents non mariés", total - married, total),
            ],
            monthly_births: months.into_values().collect(),
        }
    }
}

fn count(declarations: &[Declaration], predicate: impl Fn(&Declaration) -> bool) -> usize {
    declarations.iter().filter(|d| predicate(d)).count()
}

fn share(label: &'static str, value: usize, total: usize) -> StatisticShare {
    let percent = if total > 0 {
        format!("{:.1}%", value as f64 * 100.0 / total as f64)
    } else {
        "0%".to_string()
    };
    StatisticShare {
        label,
        value,
        percent,
    }
}

/// First seven characters of a birth date (`YYYY-MM`). Shorter values bucket as-is;
/// only an empty date is left out.
fn birth_month(date: &str) -> Option<&str> {
    if date.is_empty() {
        return None;
    }
    let end = date.char_indices().nth(7).map_or(date.len(), |(index, _)| index);
    Some(&date[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::domain::{DeclarationDraft, DeclarationId};

    fn declaration(id: &str, sexe: &str, born: &str, married: bool) -> Declaration {
        let mut draft = DeclarationDraft::default();
        draft.sexe = sexe.to_string();
        draft.date_naissance = born.to_string();
        draft.parents_maries = married;
        Declaration {
            id: DeclarationId(id.to_string()),
            draft,
            date_declaration: None,
        }
    }

    #[test]
    fn empty_snapshot_reports_zero_percent() {
        let stats = DeclarationStatistics::from_declarations(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.by_sex.iter().all(|share| share.percent == "0%"));
        assert!(stats.monthly_births.is_empty());
    }

    #[test]
    fn splits_by_sex_status_and_month() {
        let declarations = vec![
            declaration("a", "M", "2024-01-05", true),
            declaration("b", "F", "2024-01-20", false),
            declaration("c", "M", "2024-03-02", false),
        ];
        let stats = DeclarationStatistics::from_declarations(&declarations);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_sex[0].value, 2);
        assert_eq!(stats.by_sex[0].percent, "66.7%");
        assert_eq!(stats.by_sex[1].percent, "33.3%");
        assert_eq!(stats.by_parents_status[0].value, 1);
        assert_eq!(stats.by_parents_status[1].value, 2);
        assert_eq!(
            stats.monthly_births,
            vec![
                MonthlyBirths {
                    month: "2024-01".to_string(),
                    boys: 1,
                    girls: 1
                },
                MonthlyBirths {
                    month: "2024-03".to_string(),
                    boys: 1,
                    girls: 0
                },
            ]
        );
    }

    #[test]
    fn partial_birth_dates_bucket_under_their_prefix() {
        let declarations = vec![
            declaration("a", "F", "2024", false),
            declaration("b", "M", "2024-02-29T06:00:00Z", false),
            declaration("c", "M", "", false),
        ];
        let stats = DeclarationStatistics::from_declarations(&declarations);

        assert_eq!(stats.total, 3);
        let months: Vec<&str> = stats
            .monthly_births
            .iter()
            .map(|entry| entry.month.as_str())
            .collect();
        assert_eq!(months, vec!["2024", "2024-02"]);
        assert_eq!(stats.monthly_births[0].girls, 1);
    }
}
