//! Normalized person records
//!
//! A [`RawNode`] carries the advisor list in its flat, sentinel-separated
//! page form. [`NodeRecord::from_raw`] converts it into one [`Dissertation`]
//! per group, each owning its ordered advisor list, so nothing downstream
//! ever sees the sentinel.

use crate::types::{PersonId, RawNode, ADVISOR_SENTINEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Person row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: PersonId,
    pub name: String,
    pub online_descendants: u32,
}

/// One dissertation with the advisors credited for it, first advisor first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dissertation {
    pub title: Option<String>,
    pub university: Option<String>,
    pub year: Option<i32>,
    pub advisors: Vec<PersonId>,
}

/// Advisor identifiers grouped per dissertation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisorGroups(Vec<Vec<PersonId>>);

impl AdvisorGroups {
    /// Split a flat advisor sequence at every sentinel.
    ///
    /// `n` sentinels always yield `n + 1` groups, so `[3, 0, 5]` becomes
    /// `[[3], [5]]`, `[]` becomes one empty group and `[0, 5]` gives the first
    /// dissertation no advisors. Advisors after the last sentinel form the
    /// final group.
    pub fn from_sentinel_sequence(sequence: &[PersonId]) -> Self {
        let groups = sequence
            .split(|id| *id == ADVISOR_SENTINEL)
            .map(<[PersonId]>::to_vec)
            .collect();
        Self(groups)
    }

    pub fn into_inner(self) -> Vec<Vec<PersonId>> {
        self.0
    }
}

/// A fully normalized record ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub person: PersonRecord,
    pub dissertations: Vec<Dissertation>,
    pub students: BTreeSet<PersonId>,
}

impl NodeRecord {
    /// Normalize a raw page record.
    ///
    /// Dissertation lists of unequal length are padded with nulls. Advisor
    /// groups are matched to dissertations in order; a surplus non-empty group
    /// gets a placeholder dissertation rather than being dropped, and
    /// dissertations without a group get no advisors.
    pub fn from_raw(raw: RawNode) -> Self {
        let RawNode {
            id,
            name,
            universities,
            years,
            titles,
            advisor_sequence,
            students,
            online_descendants,
        } = raw;

        let count = universities.len().max(years.len()).max(titles.len());
        if universities.len() != count || years.len() != count || titles.len() != count {
            warn!(
                id,
                universities = universities.len(),
                years = years.len(),
                titles = titles.len(),
                "Dissertation lists differ in length, padding with empty values"
            );
        }

        let mut universities = universities.into_iter();
        let mut years = years.into_iter();
        let mut titles = titles.into_iter();
        let mut groups = AdvisorGroups::from_sentinel_sequence(&advisor_sequence)
            .into_inner()
            .into_iter();

        let mut dissertations = Vec::with_capacity(count);
        for index in 0..count {
            let advisors = match groups.next() {
                Some(group) => group,
                None => {
                    warn!(
                        id,
                        dissertation = index + 1,
                        "Fewer advisor groups than dissertations"
                    );
                    Vec::new()
                }
            };
            dissertations.push(Dissertation {
                title: titles.next().flatten(),
                university: universities.next().flatten(),
                year: years.next().flatten(),
                advisors,
            });
        }

        for surplus in groups.filter(|group| !group.is_empty()) {
            warn!(
                id,
                advisors = ?surplus,
                "Advisor group without a dissertation, keeping it under a placeholder"
            );
            dissertations.push(Dissertation {
                advisors: surplus,
                ..Dissertation::default()
            });
        }

        Self {
            person: PersonRecord {
                id,
                name,
                online_descendants,
            },
            dissertations,
            students,
        }
    }

    pub fn id(&self) -> PersonId {
        self.person.id
    }

    /// All advisors over all dissertations, in page order (may repeat)
    pub fn advisors(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.dissertations
            .iter()
            .flat_map(|d| d.advisors.iter().copied())
    }

    /// University of the first dissertation, for summary lines
    pub fn first_university(&self) -> Option<&str> {
        self.dissertations
            .first()
            .and_then(|d| d.university.as_deref())
    }

    /// Year of the first dissertation, for summary lines
    pub fn first_year(&self) -> Option<i32> {
        self.dissertations.first().and_then(|d| d.year)
    }
}
