//! Source authority assessment
//!
//! Scores search hits by the trustworthiness of their origin so that search
//! observations can tell the rule store whether a query surfaced academic,
//! journalistic, or low-authority material.

use crate::types::SearchResult;
use std::collections::HashSet;
use url::Url;

/// Authority assigned to encyclopedia articles
pub const ENCYCLOPEDIA_AUTHORITY: u8 = 7;

const ACADEMIC_DOMAINS: &[&str] = &[
    // Academic publishers
    "springer.com",
    "sciencedirect.com",
    "elsevier.com",
    "wiley.com",
    "tandfonline.com",
    "sagepub.com",
    "cambridge.org",
    "oxfordjournals.org",
    // Research databases
    "jstor.org",
    "researchgate.net",
    "academia.edu",
    "arxiv.org",
    // Academic institutions
    ".edu",
    ".ac.uk",
    ".edu.au",
    // Government and official sources
    ".gov",
    "nih.gov",
    "ncbi.nlm.nih.gov",
    // References
    "wikipedia.org",
    "britannica.com",
    // Professional organizations
    "ieee.org",
    "acm.org",
    "aaas.org",
];

const NEWS_DOMAINS: &[&str] = &[
    "nytimes.com",
    "washingtonpost.com",
    "bbc.com",
    "bbc.co.uk",
    "reuters.com",
    "apnews.com",
    "theguardian.com",
    "wsj.com",
    "economist.com",
    "npr.org",
    "ft.com",
];

const BLOG_INDICATORS: &[&str] = &["blog", "wordpress", "medium.com", "tumblr", "blogspot"];
const LOW_QUALITY_INDICATORS: &[&str] = &["listicle", "top-10", "you-wont-believe"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    AcademicJournal,
    AcademicInstitution,
    MedicalDatabase,
    Government,
    Academic,
    ReputableNews,
    Blog,
    ContentFarm,
    Professional,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    High,
    MediumHigh,
    Medium,
    Low,
    VeryLow,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceClassification {
    pub kind: SourceKind,
    pub authority: Authority,
    /// 0-10
    pub score: u8,
    pub reasoning: &'static str,
}

impl SourceClassification {
    fn new(kind: SourceKind, authority: Authority, score: u8, reasoning: &'static str) -> Self {
        Self {
            kind,
            authority,
            score,
            reasoning,
        }
    }
}

/// Classify a source by its URL.
pub fn classify_source(url: &str) -> SourceClassification {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => {
            return SourceClassification::new(
                SourceKind::Unknown,
                Authority::Unknown,
                0,
                "No usable URL provided",
            );
        }
    };

    let domain = parsed.host_str().unwrap_or_default().to_lowercase();
    let path = parsed.path().to_lowercase();

    if ACADEMIC_DOMAINS.iter().any(|d| domain.contains(d)) {
        if path.contains("journal") || path.contains("article") || path.contains("doi") {
            return SourceClassification::new(
                SourceKind::AcademicJournal,
                Authority::High,
                10,
                "Peer-reviewed academic journal",
            );
        }
        if domain.contains(".edu") || domain.contains(".ac.") {
            return SourceClassification::new(
                SourceKind::AcademicInstitution,
                Authority::High,
                9,
                "Academic institution",
            );
        }
        if domain.contains("pmc.ncbi") || domain.contains("pubmed") {
            return SourceClassification::new(
                SourceKind::MedicalDatabase,
                Authority::High,
                10,
                "Medical research database (NIH)",
            );
        }
        if domain.contains(".gov") {
            return SourceClassification::new(
                SourceKind::Government,
                Authority::High,
                9,
                "Government/official source",
            );
        }
        return SourceClassification::new(
            SourceKind::Academic,
            Authority::High,
            8,
            "Academic or research source",
        );
    }

    if NEWS_DOMAINS.iter().any(|d| domain.contains(d)) {
        return SourceClassification::new(
            SourceKind::ReputableNews,
            Authority::MediumHigh,
            7,
            "Reputable news organization",
        );
    }

    if BLOG_INDICATORS
        .iter()
        .any(|i| domain.contains(i) || path.contains(i))
    {
        return SourceClassification::new(
            SourceKind::Blog,
            Authority::Low,
            3,
            "Blog or personal website",
        );
    }

    if LOW_QUALITY_INDICATORS.iter().any(|i| path.contains(i)) {
        return SourceClassification::new(
            SourceKind::ContentFarm,
            Authority::VeryLow,
            2,
            "Low-quality content (listicle/clickbait)",
        );
    }

    SourceClassification::new(
        SourceKind::Professional,
        Authority::Medium,
        5,
        "Professional website or organization",
    )
}

/// Aggregate quality of one result set
#[derive(Debug, Clone, PartialEq)]
pub struct QualityAssessment {
    pub avg_score: f32,
    pub high_quality_count: usize,
    pub medium_quality_count: usize,
    pub low_quality_count: usize,
    pub summary: String,
}

pub fn assess_sources(results: &[SearchResult]) -> QualityAssessment {
    if results.is_empty() {
        return QualityAssessment {
            avg_score: 0.0,
            high_quality_count: 0,
            medium_quality_count: 0,
            low_quality_count: 0,
            summary: "No sources found".to_string(),
        };
    }

    let scores: Vec<u8> = results
        .iter()
        .map(|r| {
            r.authority_score
                .unwrap_or_else(|| classify_source(&r.url).score)
        })
        .collect();

    let high = scores.iter().filter(|s| **s >= 8).count();
    let medium = scores.iter().filter(|s| (5..8).contains(*s)).count();
    let low = scores.iter().filter(|s| **s < 5).count();
    let avg = scores.iter().map(|s| f32::from(*s)).sum::<f32>() / scores.len() as f32;

    let mut breakdown = Vec::new();
    if high > 0 {
        breakdown.push(format!("{} academic/high-authority", high));
    }
    if medium > 0 {
        breakdown.push(format!("{} medium-authority", medium));
    }
    if low > 0 {
        breakdown.push(format!("{} low-authority", low));
    }

    QualityAssessment {
        avg_score: (avg * 10.0).round() / 10.0,
        high_quality_count: high,
        medium_quality_count: medium,
        low_quality_count: low,
        summary: format!("Quality: {} (avg: {:.1}/10)", breakdown.join(", "), avg),
    }
}

/// Observation text describing how well a query performed, for rule learning.
pub fn search_observation(backend: &str, query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("Found 0 {} results", backend);
    }

    let quality = assess_sources(results);
    let domains: HashSet<String> = results
        .iter()
        .filter_map(|r| Url::parse(&r.url).ok())
        .filter_map(|u| u.host_str().map(str::to_string))
        .collect();

    let query_terms: HashSet<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();
    let relevance: usize = results
        .iter()
        .map(|r| {
            let head = r.snippet.chars().take(500).collect::<String>().to_lowercase();
            let terms: HashSet<&str> = head.split_whitespace().collect();
            query_terms.iter().filter(|t| terms.contains(t.as_str())).count()
        })
        .sum::<usize>()
        / results.len();

    let mut observation = format!(
        "Found {} {} results\n\
         Source quality: {}\n\
         High-authority: {}/{}, Low-authority: {}/{}\n\
         Source diversity: {} unique domains\n\
         Relevance: {}/{} query terms matched",
        results.len(),
        backend,
        quality.summary,
        quality.high_quality_count,
        results.len(),
        quality.low_quality_count,
        results.len(),
        domains.len(),
        relevance,
        query_terms.len()
    );

    if quality.avg_score >= 8.0 {
        observation.push_str("\nExcellent - strong academic/peer-reviewed sources");
    } else if quality.avg_score >= 6.0 {
        observation.push_str("\nGood but could prioritize more academic sources");
    } else {
        observation.push_str("\nLow quality - query should target academic/authoritative sources");
    }

    observation
}

/// Observation text for encyclopedia lookups, whose authority is fixed.
pub fn encyclopedia_observation(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "Found 0 Wikipedia articles".to_string();
    }

    let query_terms: HashSet<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();
    let avg_length = results.iter().map(|r| r.snippet.len()).sum::<usize>() / results.len();
    let relevance = results
        .iter()
        .map(|r| {
            let text = r.snippet.to_lowercase();
            let terms: HashSet<&str> = text.split_whitespace().collect();
            query_terms.iter().filter(|t| terms.contains(t.as_str())).count()
        })
        .sum::<usize>()
        / results.len();
    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();

    format!(
        "Found {} Wikipedia articles\n\
         Source quality: Encyclopedia (authority: medium-high, score: {}/10)\n\
         Articles: {}\n\
         Avg snippet length: {} chars\n\
         Relevance: {}/{} query terms matched\n\
         Wikipedia provides good overview but consider supplementing with peer-reviewed sources",
        results.len(),
        ENCYCLOPEDIA_AUTHORITY,
        titles.join(", "),
        avg_length,
        relevance,
        query_terms.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn result(url: &str, score: Option<u8>) -> SearchResult {
        SearchResult {
            source_id: url.to_string(),
            url: url.to_string(),
            title: "t".to_string(),
            snippet: "solar storage costs fell".to_string(),
            authority_score: score,
        }
    }

    #[rstest]
    #[case("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC123456/", SourceKind::AcademicJournal, 10)]
    #[case("https://harvard.edu/research/writing-guide", SourceKind::AcademicInstitution, 9)]
    #[case("https://www.energy.gov/eere/solar", SourceKind::Government, 9)]
    #[case("https://en.wikipedia.org/wiki/Academic_writing", SourceKind::Academic, 8)]
    #[case("https://www.nytimes.com/2024/solar", SourceKind::ReputableNews, 7)]
    #[case("https://www.proof-reading-service.com/blog/writing-tips", SourceKind::Blog, 3)]
    #[case("https://example.com/top-10-panels", SourceKind::ContentFarm, 2)]
    #[case("https://www.irena.org/publications", SourceKind::Professional, 5)]
    #[case("not a url", SourceKind::Unknown, 0)]
    fn test_classify_source(#[case] url: &str, #[case] kind: SourceKind, #[case] score: u8) {
        let classification = classify_source(url);
        assert_eq!(classification.kind, kind);
        assert_eq!(classification.score, score);
    }

    #[test]
    fn test_assess_empty() {
        let quality = assess_sources(&[]);
        assert_eq!(quality.avg_score, 0.0);
        assert_eq!(quality.summary, "No sources found");
    }

    #[test]
    fn test_assess_mixed_sources() {
        let results = vec![
            result("https://arxiv.org/abs/1234", Some(8)),
            result("https://example.com/page", Some(5)),
            result("https://someone.blogspot.com/post", Some(3)),
        ];
        let quality = assess_sources(&results);
        assert_eq!(quality.high_quality_count, 1);
        assert_eq!(quality.medium_quality_count, 1);
        assert_eq!(quality.low_quality_count, 1);
        assert!((quality.avg_score - 5.3).abs() < 0.01);
        assert!(quality.summary.contains("1 academic/high-authority"));
    }

    #[test]
    fn test_search_observation_reports_counts() {
        let results = vec![
            result("https://arxiv.org/abs/1", None),
            result("https://www.nature.com/articles/x", None),
        ];
        let observation = search_observation("web", "solar storage", &results);
        assert!(observation.starts_with("Found 2 web results"));
        assert!(observation.contains("2 unique domains"));
        assert!(observation.contains("Relevance: 2/2"));
    }

    #[test]
    fn test_search_observation_empty() {
        assert_eq!(search_observation("wikipedia", "q", &[]), "Found 0 wikipedia results");
    }

    #[test]
    fn test_encyclopedia_observation_lists_titles() {
        let mut hit = result("https://en.wikipedia.org/wiki/Solar_power", Some(7));
        hit.title = "Solar power".to_string();
        let observation = encyclopedia_observation("solar storage", &[hit]);
        assert!(observation.starts_with("Found 1 Wikipedia articles"));
        assert!(observation.contains("Articles: Solar power"));
        assert!(observation.contains("score: 7/10"));
        assert_eq!(encyclopedia_observation("q", &[]), "Found 0 Wikipedia articles");
    }
}
