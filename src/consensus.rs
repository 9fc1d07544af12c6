//! Consensus generation: summarize every answer to a question with an LLM
//! agent and store the structured result on the question.

use crate::db::models::{ConsensusResult, Question};
use crate::db::question_repository::QuestionRepository;
use crate::error::AppError;
use crate::llm::client::LlmClient;

const ANSWER_DELIMITER: &str = "\n---\n";

/// Build the single prompt sent to the agent.
pub fn build_prompt(question: &Question) -> String {
    let answers = question
        .answers
        .iter()
        .map(|a| a.answer.trim())
        .collect::<Vec<_>>()
        .join(ANSWER_DELIMITER);

    format!(
        "Question title: {title}\n\
         Question description: {description}\n\
         Number of answers: {count}\n\
         Answers (separated by \"---\"):\n{answers}\n\n\
         Respond with a single JSON object with exactly these fields: \
         manager_question (string), summary_of_feedback (string), \
         approve_percentage (number between 0 and 100), \
         points_of_agreement (array of strings), points_of_disagreement (array of strings), \
         consensus_summary (string), recommendations (array of strings).",
        title = question.title.trim(),
        description = question.description.trim(),
        count = question.answers.len(),
    )
}

/// Remove a wrapping Markdown code fence (```` ```json ```` or bare ```` ``` ````).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse and validate the agent output.
pub fn parse_consensus(raw: &str) -> Result<ConsensusResult, AppError> {
    let json = strip_code_fence(raw);
    let result: ConsensusResult = serde_json::from_str(json)
        .map_err(|e| AppError::Consensus(format!("LLM output is not a valid consensus: {e}")))?;

    if !result.approve_percentage.is_finite() || !(0.0..=100.0).contains(&result.approve_percentage)
    {
        return Err(AppError::Consensus(format!(
            "approve_percentage out of range: {}",
            result.approve_percentage
        )));
    }

    Ok(result)
}

/// Generate, validate and persist the consensus for a question.
///
/// Fails with `NoAnswers` before contacting the LLM when there is nothing to
/// summarize. The question is only written once the full output has parsed.
pub async fn generate_consensus(
    questions: &dyn QuestionRepository,
    llm: &dyn LlmClient,
    question_id: &str,
) -> Result<ConsensusResult, AppError> {
    let question = questions
        .find_by_id(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question {question_id} not found")))?;

    if question.answers.is_empty() {
        return Err(AppError::NoAnswers);
    }

    let prompt = build_prompt(&question);
    tracing::info!(
        question_id,
        answers = question.answers.len(),
        "Requesting consensus from LLM"
    );

    let raw = llm.complete(&prompt).await?;
    let result = parse_consensus(&raw)?;

    if !questions.set_consensus(question_id, &result).await? {
        return Err(AppError::NotFound(format!("Question {question_id} not found")));
    }

    Ok(result)
}
