//! Act citation matching
//!
//! Act names mentioned in retrieved passages or answers are matched against
//! the IndiaCode Act table so answers can link to the official PDFs.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;
use serde::Serialize;

use super::ActRecord;
use crate::knowledge::KnowledgeStore;

/// Common abbreviations and the titles they stand for
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("IPC", "Indian Penal Code"),
    ("CrPC", "Code of Criminal Procedure"),
    ("CPC", "Code of Civil Procedure"),
    ("BNS", "Bharatiya Nyaya Sanhita"),
    ("BNSS", "Bharatiya Nagarik Suraksha Sanhita"),
    ("BSA", "Bharatiya Sakshya Adhiniyam"),
];

fn act_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b((?:[A-Z][A-Za-z().'-]*\s+(?:(?:of|and|the|for|from|to|on|in|with|against|under)\s+)*)*?(?:Act|Code|Constitution))\b(?:,?\s+(\d{4})\b)?",
        )
        .expect("valid act name regex")
    })
}

fn abbreviation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(IPC|CrPC|CPC|BNSS|BNS|BSA)\b").expect("valid abbreviation regex"))
}

/// Titles that start with their keyword, which the general pattern cannot see
fn fixed_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(Code of Criminal Procedure|Code of Civil Procedure|Constitution of India)\b")
            .expect("valid fixed name regex")
    })
}

fn year_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",?\s*\d{4}\s*$").expect("valid year regex"))
}

// ============================================================================
// Name Extraction
// ============================================================================

/// Act names mentioned in `text`, with an optional year, in order of appearance
///
/// Abbreviations (IPC, CrPC, ...) are expanded to full titles.
pub fn extract_act_names(text: &str) -> Vec<(String, Option<String>)> {
    let mut found: Vec<(usize, String, Option<String>)> = Vec::new();

    for cap in act_name_re().captures_iter(text) {
        let Some(name) = cap.get(1) else { continue };
        let name_str = name.as_str().trim();
        // a bare keyword at a sentence start is not a name
        if matches!(name_str, "Act" | "Code" | "Constitution" | "The Act" | "The Code") {
            continue;
        }
        let year = cap.get(2).map(|y| y.as_str().to_string());
        found.push((name.start(), name_str.to_string(), year));
    }

    for m in fixed_name_re().find_iter(text) {
        found.push((m.start(), m.as_str().to_string(), None));
    }

    for cap in abbreviation_re().captures_iter(text) {
        let abbr = &cap[1];
        if let Some((_, full)) = ABBREVIATIONS.iter().find(|(a, _)| *a == abbr) {
            found.push((cap.get(1).map(|m| m.start()).unwrap_or(0), full.to_string(), None));
        }
    }

    found.sort_by_key(|(pos, _, _)| *pos);

    let mut names: Vec<(String, Option<String>)> = Vec::new();
    for (_, name, year) in found {
        if !names
            .iter()
            .any(|(n, y)| normalize_act_name(n) == normalize_act_name(&name) && *y == year)
        {
            names.push((name, year));
        }
    }
    names
}

/// Lowercase, drop punctuation, a leading "the", and a trailing year
pub fn normalize_act_name(name: &str) -> String {
    let without_year = year_suffix_re().replace(name, "");
    let cleaned: String = without_year
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let words = match words.first() {
        Some(&"the") => &words[1..],
        _ => &words[..],
    };
    words.join(" ")
}

/// Similarity in [0.0, 1.0]
///
/// Only identical names score 1.0. A name contained in the other on word
/// boundaries scores the ratio of their word counts, so "police act" is a
/// weaker match for "delhi police act" than the exact title.
fn name_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let edit = strsim::normalized_levenshtein(a, b);
    if contains_words(a, b) || contains_words(b, a) {
        let (wa, wb) = (a.split(' ').count(), b.split(' ').count());
        let ratio = wa.min(wb) as f64 / wa.max(wb) as f64;
        return ratio.max(edit);
    }
    edit
}

/// `needle` appears in `haystack` on word boundaries
fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}

/// Lowercase words that may join a preceding phrase to an Act name
const CONNECTORS: &[&str] = &[
    "of", "and", "the", "for", "from", "to", "on", "in", "with", "against", "under",
];

/// `name` followed by each tail that starts after a lowercase connector
///
/// "Offence under the Coinage Act" yields itself, "the Coinage Act" and
/// "Coinage Act". Tails shorter than two words are left out.
fn name_candidates(name: &str) -> Vec<String> {
    let words: Vec<&str> = name.split_whitespace().collect();
    let mut candidates = vec![name.to_string()];
    for (i, word) in words.iter().enumerate() {
        if CONNECTORS.contains(word) && words.len() - (i + 1) >= 2 {
            candidates.push(words[i + 1..].join(" "));
        }
    }
    candidates
}

// ============================================================================
// ActCatalog
// ============================================================================

/// A matched Act with its score
#[derive(Debug, Clone)]
pub struct ActMatch<'a> {
    pub act: &'a ActRecord,
    pub score: f64,
}

/// Citation attached to an answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActCitation {
    pub title: String,
    pub year: String,
    pub pdf_links: Vec<String>,
    pub score: f64,
}

/// IndiaCode Act table prepared for fuzzy lookup
pub struct ActCatalog {
    acts: Vec<ActRecord>,
    /// (normalized title, normalized short title) per act
    keys: Vec<(String, String)>,
    threshold: f64,
}

impl ActCatalog {
    pub fn new(acts: Vec<ActRecord>, threshold: f64) -> Self {
        let keys = acts
            .iter()
            .map(|a| (normalize_act_name(&a.title), normalize_act_name(&a.short_title)))
            .collect();
        Self {
            acts,
            keys,
            threshold,
        }
    }

    pub fn from_store(store: &KnowledgeStore, threshold: f64) -> Result<Self> {
        Ok(Self::new(store.list_acts()?, threshold))
    }

    pub fn len(&self) -> usize {
        self.acts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acts.is_empty()
    }

    /// Best-scoring Act for `name`, if it clears the threshold
    ///
    /// The full name is tried first, then the tails after each lowercase
    /// connector, so leading words picked up from the sentence are dropped.
    /// When `year` is given, Acts with a different year are not considered.
    /// Ties keep the earlier Act.
    pub fn best_match(&self, name: &str, year: Option<&str>) -> Option<ActMatch<'_>> {
        name_candidates(name)
            .iter()
            .find_map(|candidate| self.best_match_exact(candidate, year))
    }

    fn best_match_exact(&self, name: &str, year: Option<&str>) -> Option<ActMatch<'_>> {
        let wanted = normalize_act_name(name);
        if wanted.is_empty() {
            return None;
        }

        let mut best: Option<ActMatch<'_>> = None;
        for (act, (title, short)) in self.acts.iter().zip(&self.keys) {
            if let Some(y) = year {
                if !act.act_year.is_empty() && act.act_year != y {
                    continue;
                }
            }

            let score = name_similarity(&wanted, title).max(name_similarity(&wanted, short));
            if score >= self.threshold && best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(ActMatch { act, score });
            }
        }
        best
    }

    /// Candidate matches for display, best first
    pub fn top_matches(&self, name: &str, limit: usize) -> Vec<ActMatch<'_>> {
        let wanted = normalize_act_name(name);
        let mut matches: Vec<ActMatch<'_>> = self
            .acts
            .iter()
            .zip(&self.keys)
            .map(|(act, (title, short))| ActMatch {
                act,
                score: name_similarity(&wanted, title).max(name_similarity(&wanted, short)),
            })
            .filter(|m| m.score >= self.threshold)
            .collect();
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);
        matches
    }

    /// Citations for every Act named in `texts`, deduplicated, best first
    pub fn match_citations(&self, texts: &[&str]) -> Vec<ActCitation> {
        let mut by_title: HashMap<String, ActCitation> = HashMap::new();

        for text in texts {
            for (name, year) in extract_act_names(text) {
                let Some(m) = self.best_match(&name, year.as_deref()) else {
                    continue;
                };
                let entry = by_title.entry(m.act.title.clone()).or_insert_with(|| ActCitation {
                    title: m.act.title.clone(),
                    year: m.act.act_year.clone(),
                    pdf_links: m.act.pdf_links.clone(),
                    score: m.score,
                });
                entry.score = entry.score.max(m.score);
            }
        }

        let mut citations: Vec<ActCitation> = by_title.into_values().collect();
        citations.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });
        citations
    }
}

/// Markdown block appended to answers; empty when there are no citations
pub fn citations_markdown(citations: &[ActCitation]) -> String {
    if citations.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n\n**IndiaCode Sources:**");
    for c in citations {
        let label = if c.year.is_empty() {
            c.title.clone()
        } else {
            format!("{} ({})", c.title, c.year)
        };
        match c.pdf_links.first() {
            Some(link) => out.push_str(&format!("\n- {}: {}", label, link)),
            None => out.push_str(&format!("\n- {}", label)),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
