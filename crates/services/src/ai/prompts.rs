//! Prompt builders for each AI operation.

use std::fmt::Write as _;

use interview_core::model::{Candidate, Difficulty, Question, ResumeAnalysis};

/// Resume text beyond this many characters is not sent to the model.
pub const RESUME_PROMPT_CHARS: usize = 12_000;

pub const SYSTEM_PROMPT: &str = "You are an experienced technical interviewer for full stack \
(React/Node.js) roles. Follow the requested output format exactly.";

const QUESTION_FORMAT: &str = r#"Return ONLY a JSON array of exactly 6 objects, ordered 2 Easy, 2 Medium, 2 Hard:
[{"difficulty": "Easy", "question_number": 1, "question_text": "..."}]"#;

#[must_use]
pub fn question_prompt(analysis: Option<&ResumeAnalysis>) -> String {
    let Some(analysis) = analysis else {
        return format!(
            "Generate 6 interview questions for a full stack developer role covering \
             JavaScript, React, Node.js, APIs and system design.\n\
             Easy questions are answerable in 20 seconds, Medium in 60 seconds and Hard in \
             120 seconds.\n\n{QUESTION_FORMAT}"
        );
    };

    let mut prompt = String::from(
        "Generate 6 personalized interview questions for this full stack developer candidate.\n\n",
    );
    if let Some(name) = analysis.name.as_deref() {
        let _ = writeln!(prompt, "Candidate: {name}");
    }
    if !analysis.strengths.is_empty() {
        let _ = writeln!(prompt, "Strengths: {}", analysis.strengths.join(", "));
    }
    if !analysis.weaknesses.is_empty() {
        let _ = writeln!(prompt, "Weaknesses: {}", analysis.weaknesses.join(", "));
    }
    if !analysis.summary.trim().is_empty() {
        let _ = writeln!(prompt, "Summary: {}", analysis.summary.trim());
    }
    let _ = write!(
        prompt,
        "\nProbe the strengths in depth and check the weaker areas. Easy questions are \
         answerable in 20 seconds, Medium in 60 seconds and Hard in 120 seconds.\n\n{QUESTION_FORMAT}"
    );
    prompt
}

#[must_use]
pub fn evaluation_prompt(question: &str, answer: &str, difficulty: Difficulty) -> String {
    format!(
        r#"Evaluate this {difficulty} interview answer strictly.

Question: {question}
Answer: {answer}

Scoring rubric (0-100):
- 0-10: no answer, "I don't know", or an irrelevant response
- 11-39: mostly incorrect with minor relevant points
- 40-60: partially correct, missing key concepts
- 61-80: correct with minor gaps
- 81-100: complete, precise and well explained

Return ONLY a JSON object:
{{"score": 0, "feedback": "...", "strengths": ["..."], "improvements": ["..."], "concise_answer": "a 1-2 sentence model answer"}}"#,
        difficulty = difficulty.as_str(),
    )
}

#[must_use]
pub fn reference_prompt(question: &str, difficulty: Difficulty) -> String {
    format!(
        "Give a concise 1-2 sentence model answer to this {} interview question. \
         Respond with the answer only.\n\nQuestion: {question}",
        difficulty.as_str(),
    )
}

#[must_use]
pub fn summary_prompt(candidate: &Candidate, questions: &[Question]) -> String {
    let mut prompt = format!(
        "Write a 2-3 paragraph interview summary for {}.\n\n",
        candidate.display_name()
    );
    for (i, q) in questions.iter().enumerate() {
        let score = q.score.map_or_else(|| "unscored".to_string(), |s| s.to_string());
        let _ = writeln!(
            prompt,
            "Q{} ({}): {}\nAnswer: {}\nScore: {score}\n",
            i + 1,
            q.difficulty.as_str(),
            q.text,
            q.answer_text(),
        );
    }
    prompt.push_str(
        "Cover overall performance, technical strengths, areas for improvement and a hiring \
         recommendation. Respond in plain text.",
    );
    prompt
}

#[must_use]
pub fn resume_prompt(resume_text: &str) -> String {
    let excerpt: String = resume_text.chars().take(RESUME_PROMPT_CHARS).collect();
    format!(
        r#"Analyze this resume for a full stack developer position.

Resume:
{excerpt}

Return ONLY a JSON object. Use null for any contact detail you cannot find:
{{"name": "...", "email": "...", "phone": "...", "strengths": ["..."], "weaknesses": ["..."], "summary": "...", "score": 0}}
The score is 0-100 for fit with the role."#
    )
}
