//! Emotion analysis model and the rule-based analyzer.
//!
//! The listener agent merges two sources: whatever the model returned
//! (parsed leniently, see [`extract_json`] and [`extract_from_text`]) and a
//! deterministic keyword scan ([`RuleAnalyzer`]) that always produces a
//! result.  [`merge`] combines the two, taking the more alarmed reading
//! wherever the sources disagree on intensity or urgency.

use crate::config::EmotionRules;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

/// Map a raw sentiment label (model output, any language or shorthand the
/// prompt might elicit) onto [`Sentiment`].  Total: unknown labels fold to
/// neutral with a logged warning.  Idempotent over its own output.
pub fn normalize_sentiment(raw: &str) -> Sentiment {
    let token = raw.trim().to_lowercase();
    match token.as_str() {
        "+" | "正面" | "积极" | "positive" | "pos" | "good" => Sentiment::Positive,
        "-" | "负面" | "消极" | "negative" | "neg" | "bad" => Sentiment::Negative,
        "0" | "中性" | "neutral" | "neu" | "平静" => Sentiment::Neutral,
        other => {
            if !other.is_empty() {
                warn!("unrecognised sentiment label {:?}, treating as neutral", other);
            }
            Sentiment::Neutral
        }
    }
}

/// Structured emotion reading for one user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    pub sentiment: Sentiment,
    /// How strongly the emotion comes through, 0.0..=1.0.
    pub intensity: f32,
    pub confidence: f32,
    #[serde(default)]
    pub primary_emotions: Vec<String>,
    #[serde(default)]
    pub secondary_emotions: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub psychological_needs: Vec<String>,
    /// 1 (calm) through 5 (crisis).
    pub urgency_level: u8,
    pub support_type: String,
    #[serde(default)]
    pub processing_notes: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Lenient shape for whatever the model produced.  Every field optional so a
/// partially well-formed reply still contributes.
#[derive(Debug, Default, Deserialize)]
pub struct RawAnalysis {
    pub sentiment: Option<String>,
    pub intensity: Option<f32>,
    pub confidence: Option<f32>,
    #[serde(default)]
    pub primary_emotions: Vec<String>,
    #[serde(default)]
    pub secondary_emotions: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub psychological_needs: Vec<String>,
    pub urgency_level: Option<u8>,
    pub support_type: Option<String>,
}

/// Pull the first `{ ... }` span out of a model reply and parse it.  Models
/// love wrapping JSON in prose or code fences; the greedy span skips both.
pub fn extract_json(text: &str) -> Option<RawAnalysis> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Last-resort extractor for replies with no parsable JSON: scan the free
/// text for sentiment words and known emotion vocabulary.
pub fn extract_from_text(text: &str, rules: &EmotionRules) -> Option<RawAnalysis> {
    let lowered = text.to_lowercase();

    let sentiment = if ["positive", "积极", "正面"].iter().any(|w| lowered.contains(w)) {
        Some("positive".to_string())
    } else if ["negative", "消极", "负面"].iter().any(|w| lowered.contains(w)) {
        Some("negative".to_string())
    } else if ["neutral", "中性", "平静"].iter().any(|w| lowered.contains(w)) {
        Some("neutral".to_string())
    } else {
        None
    };

    let mut primary_emotions = Vec::new();
    for emotion in rules.emotion_keywords.keys() {
        if text.contains(emotion.as_str()) {
            primary_emotions.push(emotion.clone());
        }
    }

    if sentiment.is_none() && primary_emotions.is_empty() {
        return None;
    }

    Some(RawAnalysis {
        sentiment,
        primary_emotions,
        ..RawAnalysis::default()
    })
}

/// Deterministic keyword-table analyzer.  Never fails, which is what makes
/// it a safe fallback when the model path goes dark.
pub struct RuleAnalyzer {
    rules: EmotionRules,
}

impl RuleAnalyzer {
    pub fn new(rules: EmotionRules) -> Self {
        RuleAnalyzer { rules }
    }

    pub fn rules(&self) -> &EmotionRules {
        &self.rules
    }

    pub fn analyze(&self, text: &str) -> EmotionAnalysis {
        let rules = &self.rules;

        let mut primary_emotions = Vec::new();
        let mut keywords = Vec::new();
        for (emotion, emotion_keywords) in &rules.emotion_keywords {
            let mut hit = false;
            for keyword in emotion_keywords {
                if text.contains(keyword.as_str()) {
                    hit = true;
                    if !keywords.contains(keyword) {
                        keywords.push(keyword.clone());
                    }
                }
            }
            if hit {
                primary_emotions.push(emotion.clone());
            }
        }
        primary_emotions.sort();
        keywords.sort();

        let positive_hits = rules
            .positive_indicators
            .iter()
            .filter(|w| text.contains(w.as_str()))
            .count();
        let negative_hits = rules
            .negative_indicators
            .iter()
            .filter(|w| text.contains(w.as_str()))
            .count();
        let sentiment = if positive_hits > negative_hits {
            Sentiment::Positive
        } else if negative_hits > positive_hits {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };

        let mut intensity = rules.intensity.default;
        for (mark, boost) in &rules.intensity.punctuation_boosts {
            if text.contains(mark.as_str()) {
                intensity += boost;
            }
        }
        if primary_emotions.len() > 1 {
            intensity += rules.intensity.multiple_emotions_boost;
        }
        if intensity > rules.intensity.max {
            intensity = rules.intensity.max;
        }

        let urgency = &rules.urgency;
        let urgency_level = if urgency.crisis_keywords.iter().any(|w| text.contains(w.as_str())) {
            urgency.crisis_level
        } else if urgency
            .high_urgency_keywords
            .iter()
            .any(|w| text.contains(w.as_str()))
        {
            urgency.high_level
        } else if sentiment == Sentiment::Negative && intensity >= 0.7 {
            urgency.elevated_level
        } else {
            urgency.baseline_level
        };

        let mut psychological_needs = Vec::new();
        for emotion in &primary_emotions {
            if let Some(needs) = rules.needs_mapping.get(emotion) {
                for need in needs {
                    if !psychological_needs.contains(need) {
                        psychological_needs.push(need.clone());
                    }
                }
            }
        }
        if psychological_needs.is_empty() {
            psychological_needs.push("被倾听".to_string());
        }

        let support_type = primary_emotions
            .iter()
            .find_map(|emotion| rules.support_mapping.get(emotion).cloned())
            .unwrap_or_else(|| {
                match sentiment {
                    Sentiment::Negative => "安慰陪伴",
                    Sentiment::Positive => "分享喜悦",
                    Sentiment::Neutral => "日常倾听",
                }
                .to_string()
            });

        EmotionAnalysis {
            sentiment,
            intensity,
            confidence: rules.fallback.confidence,
            primary_emotions,
            secondary_emotions: Vec::new(),
            keywords,
            topics: rules.fallback.default_topics.clone(),
            psychological_needs,
            urgency_level,
            support_type,
            processing_notes: Some("rule-based analysis".to_string()),
            analyzed_at: Utc::now(),
        }
    }
}

/// Combine a model reading with the rule-based one.
///
/// Intensity and urgency take the maximum of both sides, with model values
/// clamped into their ranges (0..=1 and 1..=5) first; emotion and keyword
/// lists are unioned; the remaining fields prefer the model when it said
/// anything.  The merged reading is never calmer than either input.
pub fn merge(model: &RawAnalysis, rule: &EmotionAnalysis) -> EmotionAnalysis {
    let sentiment = match &model.sentiment {
        Some(raw) => normalize_sentiment(raw),
        None => rule.sentiment,
    };

    // Model values are clamped into range first: a garbled reply must not
    // push the merged reading outside intensity 0..=1 or urgency 1..=5.
    let intensity = match model.intensity {
        Some(value) => value.clamp(0.0, 1.0).max(rule.intensity),
        None => rule.intensity,
    };
    let urgency_level = match model.urgency_level {
        Some(value) => value.clamp(1, 5).max(rule.urgency_level),
        None => rule.urgency_level,
    };

    let mut primary_emotions = rule.primary_emotions.clone();
    for emotion in &model.primary_emotions {
        if !primary_emotions.contains(emotion) {
            primary_emotions.push(emotion.clone());
        }
    }
    let mut keywords = rule.keywords.clone();
    for keyword in &model.keywords {
        if !keywords.contains(keyword) {
            keywords.push(keyword.clone());
        }
    }

    let pick_list = |model_side: &Vec<String>, rule_side: &Vec<String>| {
        if model_side.is_empty() {
            rule_side.clone()
        } else {
            model_side.clone()
        }
    };

    EmotionAnalysis {
        sentiment,
        intensity,
        confidence: model.confidence.unwrap_or(rule.confidence),
        primary_emotions,
        secondary_emotions: pick_list(&model.secondary_emotions, &rule.secondary_emotions),
        keywords,
        topics: pick_list(&model.topics, &rule.topics),
        psychological_needs: pick_list(&model.psychological_needs, &rule.psychological_needs),
        urgency_level,
        support_type: model
            .support_type
            .clone()
            .unwrap_or_else(|| rule.support_type.clone()),
        processing_notes: Some("merged model and rule analysis".to_string()),
        analyzed_at: Utc::now(),
    }
}
