//! Local deterministic fallbacks for completion-boundary failures.
//!
//! Every AI node degrades to one of these heuristics when the provider is
//! unreachable or over quota: a keyword-based intent classifier, canned
//! response templates keyed by intent, a lexicon-scored sentiment estimate,
//! and a plain truncation summary. Quality drops, the run never does.

use serde::{Deserialize, Serialize};

/// Intent labels the local classifier can produce.
///
/// These match the taxonomy the completion-backed classifier is prompted
/// with, so downstream condition nodes see the same vocabulary either way.
pub const INTENT_OTHER: &str = "autre";

const GREETING_WORDS: &[&str] = &["bonjour", "salut", "hello", "hi", "hey", "coucou", "bonsoir"];
const PRICE_WORDS: &[&str] = &["combien", "prix", "cout", "coût", "tarif", "cher", "promotion"];
const PRODUCT_WORDS: &[&str] = &[
    "produit",
    "article",
    "disponib",
    "stock",
    "catalog",
    "commande",
];
const COMPLAINT_WORDS: &[&str] = &[
    "problème",
    "probleme",
    "erreur",
    "bug",
    "marche pas",
    "fonctionne pas",
    "retard",
    "insatisfait",
    "mécontent",
];
const THANKS_WORDS: &[&str] = &["merci", "super", "génial", "parfait", "excellent", "top"];
const CONFIRM_WORDS: &[&str] = &["oui", "ok", "d'accord", "je confirme", "c'est bon", "exactement"];
const CANCEL_WORDS: &[&str] = &["annuler", "arrêter", "arreter", "stop", "cancel"];
const HELP_WORDS: &[&str] = &["aide", "help", "assistance", "support", "comment"];

/// Classifies the intent of an inbound message with keyword lexicons.
///
/// Order matters: greeting beats price beats product, matching the
/// precedence the prompted classifier tends to exhibit.
#[must_use]
pub fn classify_intent(message: &str) -> &'static str {
    let msg = message.trim().to_lowercase();

    if GREETING_WORDS.iter().any(|w| msg.starts_with(w)) {
        return "salutation";
    }
    if PRICE_WORDS.iter().any(|w| msg.contains(w)) {
        return "question_prix";
    }
    if PRODUCT_WORDS.iter().any(|w| msg.contains(w)) {
        return "demande_produit";
    }
    if COMPLAINT_WORDS.iter().any(|w| msg.contains(w)) {
        return "plainte";
    }
    if THANKS_WORDS.iter().any(|w| msg.contains(w)) {
        return "remerciement";
    }
    if CONFIRM_WORDS.iter().any(|w| msg == *w) {
        return "confirmation";
    }
    if CANCEL_WORDS.iter().any(|w| msg.contains(w)) {
        return "annulation";
    }
    if HELP_WORDS.iter().any(|w| msg.contains(w)) {
        return "demande_aide";
    }

    INTENT_OTHER
}

/// Returns a canned reply for the given intent.
///
/// Used by response-generating nodes when the completion boundary failed;
/// exactly one reply per failure, always.
#[must_use]
pub fn canned_response(intent: Option<&str>) -> String {
    let text = match intent {
        Some("salutation") => {
            "Bonjour ! Je suis là pour vous aider. Que puis-je faire pour vous aujourd'hui ?"
        }
        Some("question_prix") => {
            "Merci pour votre intérêt ! Pour les informations de prix, veuillez consulter notre catalogue ou nous contacter directement."
        }
        Some("demande_produit") => {
            "Merci de votre intérêt pour nos produits ! Un conseiller vous répondra très prochainement."
        }
        Some("plainte") => {
            "Je suis désolé d'apprendre que vous rencontrez un problème. Nous prenons votre retour très au sérieux."
        }
        Some("remerciement") => "Je vous en prie ! N'hésitez pas si vous avez d'autres questions.",
        Some("confirmation") => "Parfait, c'est noté ! Je continue avec votre demande.",
        Some("annulation") => "D'accord, j'ai pris note de votre demande d'annulation.",
        Some("demande_aide") => {
            "Je suis là pour vous aider ! Pouvez-vous me donner plus de détails sur votre demande ?"
        }
        _ => "Merci pour votre message ! Un conseiller vous répondra dans les plus brefs délais.",
    };
    text.to_string()
}

/// A locally computed sentiment estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentEstimate {
    /// 0 = very negative, 50 = neutral, 100 = very positive.
    pub score: u8,
    /// Coarse label: "positive", "neutral", or "negative".
    pub label: String,
    /// Dominant emotion guess.
    pub emotion: String,
    /// Urgency guess: "faible" or "haute".
    pub urgency: String,
}

const POSITIVE_WORDS: &[&str] = &[
    "merci", "super", "génial", "top", "bravo", "parfait", "excellent", "content", "heureux",
    "satisfait", "incroyable",
];
const NEGATIVE_WORDS: &[&str] = &[
    "nul",
    "mauvais",
    "problème",
    "probleme",
    "erreur",
    "déçu",
    "mécontent",
    "frustré",
    "colère",
    "arnaque",
    "honte",
    "inacceptable",
    "scandaleux",
];
const URGENT_WORDS: &[&str] = &[
    "urgent",
    "vite",
    "immédiatement",
    "rapidement",
    "asap",
    "maintenant",
    "pressé",
];

/// Scores sentiment with a word lexicon, anchored at a neutral 50.
#[must_use]
pub fn estimate_sentiment(message: &str) -> SentimentEstimate {
    let msg = message.to_lowercase();
    let mut score: i32 = 50;

    for word in POSITIVE_WORDS {
        if msg.contains(word) {
            score += 8;
        }
    }
    for word in NEGATIVE_WORDS {
        if msg.contains(word) {
            score -= 12;
        }
    }
    let score = score.clamp(0, 100) as u8;

    let label = if score >= 60 {
        "positive"
    } else if score <= 40 {
        "negative"
    } else {
        "neutral"
    };

    let emotion = if score >= 70 {
        "joie"
    } else if score >= 55 {
        "satisfaction"
    } else if score <= 30 {
        "frustration"
    } else if score <= 45 {
        "déception"
    } else {
        "neutre"
    };

    let urgency = if URGENT_WORDS.iter().any(|w| msg.contains(w)) {
        "haute"
    } else {
        "faible"
    };

    SentimentEstimate {
        score,
        label: label.to_string(),
        emotion: emotion.to_string(),
        urgency: urgency.to_string(),
    }
}

/// Truncates text to roughly `max_chars` characters on a char boundary,
/// appending an ellipsis when anything was cut.
#[must_use]
pub fn truncate_summary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_classified() {
        assert_eq!(classify_intent("Bonjour, comment ça va ?"), "salutation");
    }

    #[test]
    fn price_question_classified() {
        assert_eq!(classify_intent("quel est le prix de livraison"), "question_prix");
    }

    #[test]
    fn complaint_classified() {
        assert_eq!(classify_intent("j'ai un problème avec ma commande, erreur de taille"), "plainte");
    }

    #[test]
    fn unknown_falls_through_to_other() {
        assert_eq!(classify_intent("xyzzy"), INTENT_OTHER);
    }

    #[test]
    fn classification_is_deterministic() {
        let a = classify_intent("je veux annuler");
        let b = classify_intent("je veux annuler");
        assert_eq!(a, b);
        assert_eq!(a, "annulation");
    }

    #[test]
    fn canned_response_per_intent() {
        let greeting = canned_response(Some("salutation"));
        let complaint = canned_response(Some("plainte"));
        let unknown = canned_response(None);
        assert_ne!(greeting, complaint);
        assert!(unknown.contains("conseiller"));
    }

    #[test]
    fn sentiment_positive_message() {
        let estimate = estimate_sentiment("merci, c'est parfait, excellent travail");
        assert_eq!(estimate.label, "positive");
        assert!(estimate.score > 60);
    }

    #[test]
    fn sentiment_negative_message() {
        let estimate = estimate_sentiment("c'est nul, encore une erreur, je suis mécontent");
        assert_eq!(estimate.label, "negative");
        assert!(estimate.score < 40);
    }

    #[test]
    fn sentiment_neutral_default() {
        let estimate = estimate_sentiment("je voudrais des informations");
        assert_eq!(estimate.label, "neutral");
        assert_eq!(estimate.score, 50);
    }

    #[test]
    fn urgency_detected() {
        let estimate = estimate_sentiment("répondez vite c'est urgent");
        assert_eq!(estimate.urgency, "haute");
    }

    #[test]
    fn summary_truncation() {
        let text = "a".repeat(200);
        let summary = truncate_summary(&text, 100);
        assert_eq!(summary.chars().count(), 103);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn short_text_not_truncated() {
        assert_eq!(truncate_summary("court", 100), "court");
    }
}
