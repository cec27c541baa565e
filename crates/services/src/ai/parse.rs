//! Lenient parsing of model output.
//!
//! Models wrap JSON in code fences, prepend prose, or ignore the format
//! entirely. Each parser tries strict JSON first and then a textual fallback.

use interview_core::model::{Difficulty, GeneratedQuestion, ResumeAnalysis};
use interview_core::scoring::Score;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::Evaluation;
use crate::error::AiError;

const QUESTION_BATCH: usize = Difficulty::BATCH.len();
const DEFAULT_RESUME_SCORE: f64 = 75.0;
const TEXT_FALLBACK_RESUME_SCORE: f64 = 50.0;
const TEXT_FALLBACK_SUMMARY_CHARS: usize = 200;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:Full Name|Name|Candidate):[ \t]*([A-Za-z][A-Za-z \t]*)").unwrap());
static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*(.+)$").unwrap());

// ─── Extraction helpers ──────────────────────────────────────────────────────

/// Removes a surrounding Markdown code fence, if any.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let t = raw.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let body = match rest.find('\n') {
        Some(nl) if rest[..nl].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[nl + 1..],
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// The first balanced `[...]` in `raw`, ignoring brackets inside strings.
#[must_use]
pub fn extract_first_json_array(raw: &str) -> Option<&str> {
    let t = strip_code_fences(raw);
    let mut start = None;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in t.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if start.is_some() => in_string = true,
            '[' => {
                start.get_or_insert(i);
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &t[s..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Text between the first `{` and the last `}`.
#[must_use]
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let t = strip_code_fences(raw);
    let start = t.find('{')?;
    let end = t.rfind('}')?;
    (end > start).then(|| &t[start..=end])
}

fn str_field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn string_list(obj: &Value, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn number_field(obj: &Value, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

// ─── Questions ───────────────────────────────────────────────────────────────

/// Parses a generated question list.
///
/// Accepts a JSON array of objects (or bare strings), falling back to the
/// first six numbered lines laid out as 2 easy, 2 medium, 2 hard.
///
/// # Errors
///
/// Returns `AiError::Parse` when neither form yields questions.
pub fn parse_questions(raw: &str) -> Result<Vec<GeneratedQuestion>, AiError> {
    if raw.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    if let Some(questions) = extract_first_json_array(raw)
        .and_then(|arr| serde_json::from_str::<Vec<Value>>(arr).ok())
        .map(|items| questions_from_json(&items))
        .filter(|qs| !qs.is_empty())
    {
        return Ok(questions);
    }

    let numbered: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            NUMBERED_RE
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|text| !text.is_empty())
        .take(QUESTION_BATCH)
        .collect();
    if numbered.len() == QUESTION_BATCH {
        return Ok(numbered
            .into_iter()
            .zip(Difficulty::BATCH)
            .map(|(text, d)| GeneratedQuestion::new(text, d))
            .collect());
    }

    Err(AiError::Parse("no question list found".into()))
}

fn questions_from_json(items: &[Value]) -> Vec<GeneratedQuestion> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            Value::String(text) => {
                let difficulty = Difficulty::BATCH.get(i).copied().unwrap_or(Difficulty::Hard);
                Some(GeneratedQuestion::new(text.trim(), difficulty))
            }
            Value::Object(_) => {
                let text = str_field(item, &["question_text", "text", "question"])?;
                let difficulty =
                    Difficulty::parse_lenient(str_field(item, &["difficulty", "level", "type"])
                        .unwrap_or_default());
                Some(GeneratedQuestion::new(text, difficulty))
            }
            _ => None,
        })
        .filter(|q| !q.text.is_empty())
        .collect()
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Parses an answer evaluation; the score is normalized once here.
///
/// # Errors
///
/// Returns `AiError::Parse` when no JSON object is present.
pub fn parse_evaluation(raw: &str) -> Result<Evaluation, AiError> {
    if raw.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    let obj = extract_json_object(raw)
        .ok_or_else(|| AiError::Parse("no JSON object in evaluation".into()))?;
    let value: Value = serde_json::from_str(obj).map_err(|e| AiError::Parse(e.to_string()))?;

    let score = number_field(&value, "score")
        .map(Score::from_raw)
        .transpose()
        .map_err(|e| AiError::Parse(e.to_string()))?
        .unwrap_or(interview_core::scoring::FALLBACK_SCORE);

    Ok(Evaluation {
        score,
        feedback: str_field(&value, &["feedback"])
            .unwrap_or("No specific feedback available")
            .to_string(),
        strengths: string_list(&value, "strengths"),
        improvements: string_list(&value, "improvements"),
        reference_answer: str_field(
            &value,
            &["concise_answer", "conciseAnswer", "reference_answer"],
        )
        .map(str::to_string),
    })
}

// ─── Resume ──────────────────────────────────────────────────────────────────

/// Parses a resume analysis, falling back to regex extraction of contact
/// details from free text.
///
/// # Errors
///
/// Returns `AiError::EmptyResponse` for blank output.
pub fn parse_resume_analysis(raw: &str) -> Result<ResumeAnalysis, AiError> {
    if raw.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    let json = extract_json_object(raw).and_then(|obj| serde_json::from_str::<Value>(obj).ok());
    match json {
        Some(value) if value.is_object() => Ok(analysis_from_json(&value)),
        _ => Ok(analysis_from_text(raw)),
    }
}

fn analysis_from_json(value: &Value) -> ResumeAnalysis {
    let raw_score = number_field(value, "score").unwrap_or(DEFAULT_RESUME_SCORE);
    ResumeAnalysis {
        name: str_field(value, &["name"]).map(str::to_string),
        email: str_field(value, &["email"]).map(str::to_string),
        phone: str_field(value, &["phone"]).map(str::to_string),
        strengths: string_list(value, "strengths"),
        weaknesses: string_list(value, "weaknesses"),
        summary: str_field(value, &["summary"]).unwrap_or_default().to_string(),
        score: Score::from_raw(raw_score).ok(),
    }
}

fn analysis_from_text(text: &str) -> ResumeAnalysis {
    let capture = |re: &Regex, group: usize| {
        re.captures(text)
            .and_then(|c| c.get(group))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let mut summary: String = text.chars().take(TEXT_FALLBACK_SUMMARY_CHARS).collect();
    summary.push_str("...");

    ResumeAnalysis {
        name: capture(&NAME_RE, 1),
        email: capture(&EMAIL_RE, 0),
        phone: capture(&PHONE_RE, 0),
        strengths: Vec::new(),
        weaknesses: Vec::new(),
        summary,
        score: Score::from_raw(TEXT_FALLBACK_RESUME_SCORE).ok(),
    }
}

/// True when an analysis carries nothing usable at all.
#[must_use]
pub fn is_blank_analysis(analysis: &ResumeAnalysis) -> bool {
    analysis.name.is_none()
        && analysis.email.is_none()
        && analysis.phone.is_none()
        && analysis.strengths.is_empty()
        && analysis.summary.trim().is_empty()
}
