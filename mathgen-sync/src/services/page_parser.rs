//! Mathematics Genealogy Project page parsing
//!
//! Turns the HTML of a record page (`id.php?id=N`) into a [`RawNode`] and
//! the HTML of a search result page (`query-prep.php`) into a
//! [`SearchOutcome`].
//!
//! Record page layout, top to bottom:
//! - `<h2>` with the person's name
//! - one block per degree: university/year span, optional
//!   `<span id="thesisTitle">`, then `Advisor N: <a href="id.php?id=…">` links
//! - `Students:` followed by a table of student links, or `No students known.`
//! - `… has N students and M descendants.`
//!
//! A page missing its name or its descendant statistics is treated as
//! truncated and reported as [`FetchError::Parse`], which callers retry.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::types::{FetchError, PersonId, RawNode, SearchHit, SearchOutcome, ADVISOR_SENTINEL};

const NOT_FOUND_TEXT: &str = "You have specified an ID that does not exist in the database";
const NO_STUDENTS_TEXT: &str = "No students known";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h2[^>]*>(.*?)</h2>").expect("valid name regex"));

static DEGREE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span style="color:\s*#006633;\s*margin-left:\s*0\.5em">(.*?)</span>([^<]*)"#)
        .expect("valid degree regex")
});

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span id="thesisTitle"[^>]*>(.*?)</span>"#).expect("valid title regex")
});

static ADVISOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)Advisor[^:<]*:\s*<a href="id\.php\?id=(\d+)""#)
        .expect("valid advisor regex")
});

static STUDENTS_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Students:|No students known").expect("valid students marker regex")
});

static DESCENDANTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)has\s+([\d,]+)\s+students?\s+and\s+([\d,]+)\s+descendants?")
        .expect("valid descendants regex")
});

static ID_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"id\.php\?id=(\d+)"#).expect("valid id link regex"));

static TOO_MANY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)too many (records|results|matches)").expect("valid too-many regex")
});

static SEARCH_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<tr[^>]*>\s*<td[^>]*>\s*<a href="id\.php\?id=(\d+)"[^>]*>(.*?)</a>\s*</td>(.*?)</tr>"#)
        .expect("valid search row regex")
});

static SEARCH_ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a href="id\.php\?id=(\d+)"[^>]*>(.*?)</a>"#).expect("valid anchor regex")
});

static CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<td[^>]*>(.*?)</td>").expect("valid cell regex"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));

/// Strip tags, decode entities and collapse whitespace
fn clean_text(fragment: &str) -> Option<String> {
    let without_tags = TAG_RE.replace_all(fragment, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    let collapsed = WHITESPACE_RE.replace_all(decoded.trim(), " ");

    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

fn parse_year(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

fn parse_count(text: &str) -> Option<u32> {
    text.replace(',', "").parse().ok()
}

fn parse_id(text: &str) -> Option<PersonId> {
    text.parse().ok().filter(|id| *id != ADVISOR_SENTINEL)
}

/// One degree block of a record page
#[derive(Debug, Default)]
struct DegreeBlock {
    university: Option<String>,
    year: Option<i32>,
    title: Option<String>,
    advisors: Vec<PersonId>,
}

fn parse_degree_blocks(region: &str) -> Vec<DegreeBlock> {
    let degrees: Vec<_> = DEGREE_RE.captures_iter(region).collect();

    if degrees.is_empty() {
        // Some records carry advisors or a title without any degree line
        let advisors: Vec<PersonId> = ADVISOR_RE
            .captures_iter(region)
            .filter_map(|caps| parse_id(&caps[1]))
            .collect();
        let title = TITLE_RE.captures(region).and_then(|caps| clean_text(&caps[1]));
        if advisors.is_empty() && title.is_none() {
            return Vec::new();
        }
        return vec![DegreeBlock {
            title,
            advisors,
            ..DegreeBlock::default()
        }];
    }

    let starts: Vec<usize> = degrees
        .iter()
        .map(|caps| caps.get(0).map_or(0, |m| m.start()))
        .collect();

    degrees
        .iter()
        .enumerate()
        .map(|(index, caps)| {
            let end = starts.get(index + 1).copied().unwrap_or(region.len());
            let block = &region[starts[index]..end];

            DegreeBlock {
                university: clean_text(&caps[1]),
                year: parse_year(&caps[2]),
                title: TITLE_RE.captures(block).and_then(|t| clean_text(&t[1])),
                advisors: ADVISOR_RE
                    .captures_iter(block)
                    .filter_map(|a| parse_id(&a[1]))
                    .collect(),
            }
        })
        .collect()
}

/// Parse a record page for `id`
pub fn parse_node(id: PersonId, html: &str) -> Result<RawNode, FetchError> {
    if html.contains(NOT_FOUND_TEXT) {
        return Err(FetchError::NotFound(id));
    }

    let name_match = NAME_RE
        .captures(html)
        .ok_or_else(|| FetchError::Parse(format!("record {}: no name heading", id)))?;
    let name = clean_text(&name_match[1])
        .ok_or_else(|| FetchError::Parse(format!("record {}: empty name", id)))?;
    let body_start = name_match.get(0).map_or(0, |m| m.end());
    let body = &html[body_start..];

    // Descendant statistics close the record; their absence means truncation
    let (stats_at, direct_count, online_descendants) = if let Some(caps) = DESCENDANTS_RE.captures(body) {
        let at = caps.get(0).map_or(body.len(), |m| m.start());
        let direct = parse_count(&caps[1]).unwrap_or(0);
        let total = parse_count(&caps[2])
            .ok_or_else(|| FetchError::Parse(format!("record {}: bad descendant count", id)))?;
        (at, direct, total)
    } else if let Some(at) = body.find(NO_STUDENTS_TEXT) {
        (at, 0, 0)
    } else {
        return Err(FetchError::Parse(format!(
            "record {}: descendant statistics missing (truncated page?)",
            id
        )));
    };

    let students_at = STUDENTS_MARKER_RE
        .find(body)
        .map(|m| m.start())
        .filter(|at| *at <= stats_at)
        .unwrap_or(stats_at);

    let students: BTreeSet<PersonId> = ID_LINK_RE
        .captures_iter(&body[students_at..stats_at])
        .filter_map(|caps| parse_id(&caps[1]))
        .collect();

    if (students.len() as u32) < direct_count {
        return Err(FetchError::Parse(format!(
            "record {}: page lists {} of {} students (truncated page?)",
            id,
            students.len(),
            direct_count
        )));
    }

    let blocks = parse_degree_blocks(&body[..students_at]);

    let mut universities = Vec::with_capacity(blocks.len());
    let mut years = Vec::with_capacity(blocks.len());
    let mut titles = Vec::with_capacity(blocks.len());
    let mut advisor_sequence = Vec::new();

    for (index, block) in blocks.into_iter().enumerate() {
        if index > 0 {
            advisor_sequence.push(ADVISOR_SENTINEL);
        }
        universities.push(block.university);
        years.push(block.year);
        titles.push(block.title);
        advisor_sequence.extend(block.advisors);
    }

    Ok(RawNode {
        id,
        name,
        universities,
        years,
        titles,
        advisor_sequence,
        students,
        online_descendants,
    })
}

/// Parse a name search result page
pub fn parse_search(html: &str) -> Result<SearchOutcome, FetchError> {
    if TOO_MANY_RE.is_match(html) {
        return Ok(SearchOutcome::TooMany);
    }

    let mut hits: Vec<SearchHit> = SEARCH_ROW_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let id = parse_id(&caps[1])?;
            let cells: Vec<Option<String>> = CELL_RE
                .captures_iter(&caps[3])
                .map(|cell| clean_text(&cell[1]))
                .collect();

            Some(SearchHit {
                id,
                name: clean_text(&caps[2]),
                university: cells.first().cloned().flatten(),
                year: cells
                    .get(1)
                    .and_then(|cell| cell.as_deref())
                    .and_then(parse_year),
            })
        })
        .collect();

    if hits.is_empty() {
        hits = SEARCH_ANCHOR_RE
            .captures_iter(html)
            .filter_map(|caps| {
                Some(SearchHit {
                    id: parse_id(&caps[1])?,
                    name: clean_text(&caps[2]),
                    university: None,
                    year: None,
                })
            })
            .collect();
    }

    let mut seen = BTreeSet::new();
    hits.retain(|hit| seen.insert(hit.id));

    Ok(SearchOutcome::Candidates(hits))
}
