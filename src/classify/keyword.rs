//! Rule-based scam classifier.
//!
//! Scores a transcript snapshot against three term lists (fraud keywords,
//! suspicious phrases, urgency triggers). Each match adds its category
//! weight; the summed score is capped at 1.0 and compared against the risk
//! threshold. No model download, no network, deterministic.

use crate::classify::classifier::{Classification, SpamClassifier};
use crate::defaults;
use crate::error::Result;
use chrono::Utc;

/// Terms that commonly appear in fraud calls (financial hooks, authority
/// impersonation, prize bait).
const FRAUD_KEYWORDS: &[&str] = &[
    "bank account",
    "credit card",
    "social security",
    "urgent",
    "verify",
    "suspended",
    "expired",
    "immediate action",
    "press 1",
    "call back",
    "refund",
    "prize",
    "winner",
    "congratulations",
    "free",
    "limited time",
    "act now",
    "final notice",
    "you've been selected",
    "confirm your identity",
    "irs",
    "tax",
    "arrest",
    "lawsuit",
    "police",
    "fbi",
    "government",
];

/// Multi-word phrases characteristic of social-engineering scripts.
const SUSPICIOUS_PHRASES: &[&str] = &[
    "don't tell anyone",
    "keep this confidential",
    "this offer expires",
    "you must act immediately",
    "your account will be closed",
    "we need to verify",
    "for security purposes",
    "this is your final warning",
    "you have been selected",
    "congratulations you've won",
    "claim your prize",
    "send money",
    "wire transfer",
    "gift cards",
    "bitcoin",
    "cryptocurrency",
];

/// Pressure language used to rush victims past their own judgment.
const URGENCY_TRIGGERS: &[&str] = &[
    "urgent",
    "emergency",
    "immediately",
    "now",
    "quickly",
    "hurry",
    "deadline",
    "expires",
    "last chance",
    "final",
    "limited time",
    "don't miss out",
    "act fast",
    "time sensitive",
];

fn matches_in(text: &str, terms: &'static [&'static str]) -> Vec<&'static str> {
    terms
        .iter()
        .filter(|term| text.contains(**term))
        .copied()
        .collect()
}

/// Keyword/phrase scoring classifier.
///
/// The default (and only built-in) `SpamClassifier` implementation. A call
/// is flagged when the weighted match score reaches `risk_threshold`.
pub struct KeywordClassifier {
    risk_threshold: f32,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            risk_threshold: defaults::RISK_THRESHOLD,
        }
    }

    /// Override the flagging threshold (still interpreted over [0, 1] scores).
    pub fn with_risk_threshold(mut self, threshold: f32) -> Self {
        self.risk_threshold = threshold;
        self
    }

    fn score(keywords: usize, phrases: usize, urgency: usize) -> f32 {
        let raw = keywords as f32 * defaults::KEYWORD_WEIGHT
            + phrases as f32 * defaults::PHRASE_WEIGHT
            + urgency as f32 * defaults::URGENCY_WEIGHT;
        raw.min(1.0)
    }

    fn reasoning(
        keywords: &[&str],
        phrases: &[&str],
        urgency: &[&str],
        score: f32,
    ) -> String {
        let mut reasons = Vec::new();
        if !keywords.is_empty() {
            reasons.push(format!(
                "{} fraud keyword(s): {}",
                keywords.len(),
                keywords.join(", ")
            ));
        }
        if !phrases.is_empty() {
            reasons.push(format!(
                "{} suspicious phrase(s): {}",
                phrases.len(),
                phrases.join(", ")
            ));
        }
        if !urgency.is_empty() {
            reasons.push(format!("{} urgency trigger(s)", urgency.len()));
        }
        if reasons.is_empty() {
            "No fraud indicators detected".to_string()
        } else {
            format!("Risk score {:.2}. {}", score, reasons.join("; "))
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SpamClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Result<Classification> {
        let lower = text.to_lowercase();

        let keywords = matches_in(&lower, FRAUD_KEYWORDS);
        let phrases = matches_in(&lower, SUSPICIOUS_PHRASES);
        let urgency = matches_in(&lower, URGENCY_TRIGGERS);

        let score = Self::score(keywords.len(), phrases.len(), urgency.len());

        Ok(Classification {
            is_suspicious: score >= self.risk_threshold,
            // Confidence tracks the score with a small floor bump so a
            // threshold-grazing verdict still clears downstream filters.
            confidence: (score + 0.1).min(1.0),
            reasoning: Self::reasoning(&keywords, &phrases, &urgency, score),
            timestamp: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "keyword-rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_benign() {
        let classifier = KeywordClassifier::new();
        let verdict = classifier
            .classify("Hi mom, just calling to say the garden looks great")
            .unwrap();

        assert!(!verdict.is_suspicious);
        assert_eq!(verdict.reasoning, "No fraud indicators detected");
    }

    #[test]
    fn test_prize_script_is_flagged() {
        let classifier = KeywordClassifier::new();
        let verdict = classifier
            .classify(
                "Congratulations you've won a free prize! Act now, \
                 this offer expires today. We need to verify your bank account.",
            )
            .unwrap();

        assert!(verdict.is_suspicious);
        assert!(verdict.confidence > 0.7);
        assert!(verdict.reasoning.contains("fraud keyword"));
        assert!(verdict.reasoning.contains("suspicious phrase"));
    }

    #[test]
    fn test_single_keyword_below_threshold() {
        let classifier = KeywordClassifier::new();
        let verdict = classifier
            .classify("I need to check on my refund from the store")
            .unwrap();

        assert!(!verdict.is_suspicious);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let classifier = KeywordClassifier::new();
        let verdict = classifier
            .classify("THIS IS THE IRS. WIRE TRANSFER immediately or face ARREST!")
            .unwrap();

        assert!(verdict.is_suspicious);
    }

    #[test]
    fn test_score_caps_at_one() {
        // 10 phrases at 0.4 each would be 4.0 uncapped
        assert_eq!(KeywordClassifier::score(0, 10, 0), 1.0);
        assert!((KeywordClassifier::score(1, 1, 1) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_custom_threshold() {
        let strict = KeywordClassifier::new().with_risk_threshold(0.2);
        let verdict = strict.classify("please send money").unwrap();
        assert!(verdict.is_suspicious);

        let lax = KeywordClassifier::new().with_risk_threshold(0.99);
        let verdict = lax.classify("please send money").unwrap();
        assert!(!verdict.is_suspicious);
    }
}
