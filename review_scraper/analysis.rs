//! Rating statistics and naive keyword bucketing over a fetched review list.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::feed::Review;

const COMPLAINT_KEYWORDS: &[&str] = &[
    "slow",
    "crash",
    "bug",
    "expensive",
    "confusing",
    "difficult",
    "broken",
    "poor",
    "terrible",
    "worst",
];
const PRAISE_KEYWORDS: &[&str] = &[
    "love",
    "great",
    "amazing",
    "easy",
    "best",
    "perfect",
    "excellent",
    "awesome",
];
const FEATURE_KEYWORDS: &[&str] = &[
    "wish",
    "would be nice",
    "please add",
    "need",
    "should have",
    "missing",
];

const MAX_EXAMPLES: usize = 10;
const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewAnalysis {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub rating_distribution: BTreeMap<u8, usize>,
    pub common_complaints: Vec<String>,
    pub common_praises: Vec<String>,
    pub feature_requests: Vec<String>,
}

impl Default for ReviewAnalysis {
    fn default() -> Self {
        Self {
            total_reviews: 0,
            average_rating: 0.0,
            rating_distribution: (1..=5).map(|r| (r, 0)).collect(),
            common_complaints: Vec::new(),
            common_praises: Vec::new(),
            feature_requests: Vec::new(),
        }
    }
}

pub fn analyze_reviews(reviews: &[Review]) -> ReviewAnalysis {
    let mut analysis = ReviewAnalysis {
        total_reviews: reviews.len(),
        ..Default::default()
    };
    if reviews.is_empty() {
        return analysis;
    }

    let mut total_rating = 0i64;
    for review in reviews {
        total_rating += review.rating;
        // ratings outside 1-5 have no bucket
        if let Ok(r) = u8::try_from(review.rating) {
            if let Some(bucket) = analysis.rating_distribution.get_mut(&r) {
                *bucket += 1;
            }
        }
    }
    analysis.average_rating = round2(total_rating as f64 / reviews.len() as f64);

    for review in reviews {
        let haystack = format!("{} {}", review.content, review.title).to_lowercase();
        let excerpt = || review.content.chars().take(EXCERPT_CHARS).collect::<String>();

        if is_complaint(&haystack, review.rating) {
            push_capped(&mut analysis.common_complaints, excerpt());
        }
        if is_praise(&haystack, review.rating) {
            push_capped(&mut analysis.common_praises, excerpt());
        }
        if contains_any(&haystack, FEATURE_KEYWORDS) {
            push_capped(&mut analysis.feature_requests, excerpt());
        }
    }

    analysis
}

fn is_complaint(haystack: &str, rating: i64) -> bool {
    contains_any(haystack, COMPLAINT_KEYWORDS) && rating <= 3
}

fn is_praise(haystack: &str, rating: i64) -> bool {
    contains_any(haystack, PRAISE_KEYWORDS) && rating >= 4
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn push_capped(list: &mut Vec<String>, item: String) {
    if list.len() < MAX_EXAMPLES {
        list.push(item);
    }
}

/// Two decimals, exact ties to even: 25/8 = 3.125 gives 3.12.
fn round2(x: f64) -> f64 {
    format!("{:.2}", x).parse().unwrap_or(x)
}
