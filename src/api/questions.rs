use axum::extract::{Path, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiJson;
use crate::api::response::{created, ok, ApiSuccess};
use crate::auth::middleware::{AdminUser, AuthUser, MaybeUser};
use crate::auth::models::AuthenticatedUser;
use crate::consensus::generate_consensus;
use crate::db::models::{
    Answer, AnswerAuthor, AnswerView, ConsensusResult, Question, QuestionInput, QuestionView,
};
use crate::db::question_repository::QuestionRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::llm::client::LlmClient;
use crate::models::partition::{partition_questions, QuestionPartition};
use crate::state::AppState;

/// Header the Discord bot uses to prove it is allowed to answer on behalf of
/// a Discord member.
pub const DISCORD_SECRET_HEADER: &str = "discord_secret";

const LOCAL_CATEGORY: &str = "local";
const LOCAL_DEADLINE_HOURS: i64 = 1;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub discord_user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalQuestionRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub member_discord_ids: Vec<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalQuestionResponse {
    pub question: QuestionView,
    pub not_found_user_ids: Vec<String>,
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Question {id} not found"))
}

fn validate_input(input: &QuestionInput) -> Result<(), AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("Question title cannot be empty".into()));
    }
    Ok(())
}

/// Load a question the caller is allowed to see. Hidden questions look missing.
async fn find_visible(
    questions: &dyn QuestionRepository,
    user: &AuthenticatedUser,
    id: &str,
) -> Result<Question, AppError> {
    questions
        .find_by_id(id)
        .await?
        .filter(|q| q.is_visible_to(user))
        .ok_or_else(|| not_found(id))
}

pub async fn process_create_question(
    questions: &dyn QuestionRepository,
    admin: &AuthenticatedUser,
    input: QuestionInput,
) -> Result<QuestionView, AppError> {
    validate_input(&input)?;
    let question = Question::new(input, &admin.id);
    questions.create(question.clone()).await?;
    tracing::info!(question_id = %question.id, created_by = %admin.id, "Question created");
    Ok(question.into_view())
}

/// Questions visible to `user`, split by whether they have answered.
pub async fn process_list_questions(
    questions: &dyn QuestionRepository,
    user: &AuthenticatedUser,
) -> Result<QuestionPartition, AppError> {
    let visible = questions
        .list_all()
        .await?
        .into_iter()
        .filter(|q| q.is_visible_to(user))
        .collect();
    Ok(partition_questions(&user.id, visible))
}

pub async fn process_get_question(
    questions: &dyn QuestionRepository,
    user: &AuthenticatedUser,
    id: &str,
) -> Result<QuestionView, AppError> {
    Ok(find_visible(questions, user, id).await?.into_view())
}

pub async fn process_update_question(
    questions: &dyn QuestionRepository,
    id: &str,
    input: QuestionInput,
) -> Result<QuestionView, AppError> {
    validate_input(&input)?;
    questions
        .update(id, input)
        .await?
        .map(Question::into_view)
        .ok_or_else(|| not_found(id))
}

pub async fn process_delete_question(
    questions: &dyn QuestionRepository,
    id: &str,
) -> Result<QuestionView, AppError> {
    let deleted = questions.delete(id).await?.ok_or_else(|| not_found(id))?;
    tracing::info!(question_id = %id, "Question deleted");
    Ok(deleted.into_view())
}

/// Append an answer from a signed-in user or, with the shared secret, from a
/// Discord member.
pub async fn process_submit_answer(
    questions: &dyn QuestionRepository,
    discord_secret: &str,
    provided_secret: Option<&str>,
    caller: Option<&AuthenticatedUser>,
    question_id: &str,
    request: SubmitAnswerRequest,
) -> Result<Answer, AppError> {
    if request.discord_user_id.is_some() && provided_secret != Some(discord_secret) {
        tracing::warn!(question_id, "Discord answer without a valid shared secret");
        return Err(AppError::Auth("Unauthorized".into()));
    }

    let author = match (caller, request.discord_user_id) {
        (Some(user), _) => AnswerAuthor::User {
            user_id: user.id.clone(),
        },
        (None, Some(discord_user_id)) => AnswerAuthor::Discord { discord_user_id },
        (None, None) => return Err(AppError::Auth("Unauthorized".into())),
    };

    if request.answer.trim().is_empty() {
        return Err(AppError::BadRequest("Answer cannot be empty".into()));
    }

    let question = questions
        .find_by_id(question_id)
        .await?
        .ok_or_else(|| not_found(question_id))?;

    if question.is_past_deadline(Utc::now()) {
        return Err(AppError::DeadlinePassed);
    }

    let answer = Answer::new(question_id, request.answer, author);
    if !questions.push_answer(question_id, &answer).await? {
        return Err(not_found(question_id));
    }

    tracing::info!(question_id, answer_id = %answer.id, "Answer submitted");
    Ok(answer)
}

/// The caller's most recent answer to a question, if any.
pub async fn process_my_answer(
    questions: &dyn QuestionRepository,
    user: &AuthenticatedUser,
    question_id: &str,
) -> Result<Option<Answer>, AppError> {
    let question = find_visible(questions, user, question_id).await?;
    Ok(question
        .answers
        .into_iter()
        .rev()
        .find(|a| a.is_by_user(&user.id)))
}

pub async fn process_list_answers(
    questions: &dyn QuestionRepository,
    user: &AuthenticatedUser,
    question_id: &str,
) -> Result<Vec<AnswerView>, AppError> {
    let question = find_visible(questions, user, question_id).await?;
    Ok(question
        .answers
        .iter()
        .map(|a| AnswerView::from_answer(a, question.anonymous))
        .collect())
}

pub async fn process_generate_consensus(
    questions: &dyn QuestionRepository,
    llm: &dyn LlmClient,
    question_id: &str,
) -> Result<ConsensusResult, AppError> {
    generate_consensus(questions, llm, question_id).await
}

/// Create a question scoped to a set of Discord members.
///
/// Members with a linked account get access by user id; the rest are kept as
/// raw Discord ids and reported back. An empty member list is rejected, since
/// a question with no allow-list is open to everyone.
pub async fn process_create_local_question(
    users: &dyn UserRepository,
    questions: &dyn QuestionRepository,
    creator: &AuthenticatedUser,
    request: LocalQuestionRequest,
) -> Result<LocalQuestionResponse, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("Question title cannot be empty".into()));
    }
    if request.member_discord_ids.is_empty() {
        return Err(AppError::BadRequest(
            "A local question needs at least one member".into(),
        ));
    }

    let linked = users.find_by_discord_ids(&request.member_discord_ids).await?;
    let not_found_user_ids: Vec<String> = request
        .member_discord_ids
        .iter()
        .filter(|id| !linked.iter().any(|u| u.discord_id.as_deref() == Some(id.as_str())))
        .cloned()
        .collect();

    let input = QuestionInput {
        title: request.title,
        description: request.description,
        category: LOCAL_CATEGORY.to_string(),
        anonymous: request.anonymous,
        deadline: request
            .deadline
            .unwrap_or_else(|| Utc::now() + Duration::hours(LOCAL_DEADLINE_HOURS)),
        user_access: linked.into_iter().map(|u| u.id).collect(),
        role_access: vec![],
        discord_user_access: not_found_user_ids.clone(),
    };

    let question = Question::new(input, &creator.id);
    questions.create(question.clone()).await?;
    tracing::info!(
        question_id = %question.id,
        unlinked = not_found_user_ids.len(),
        "Local question created"
    );

    Ok(LocalQuestionResponse {
        question: question.into_view(),
        not_found_user_ids,
    })
}

/// `POST /questions/v1`
pub async fn create_question_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(input): ApiJson<QuestionInput>,
) -> Result<ApiSuccess<QuestionView>, AppError> {
    let question = process_create_question(state.question_repo.as_ref(), &admin, input).await?;
    Ok(created(question))
}

/// `GET /questions/v1`
pub async fn list_questions_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiSuccess<QuestionPartition>, AppError> {
    Ok(ok(process_list_questions(state.question_repo.as_ref(), &user).await?))
}

/// `GET /questions/v1/{id}`
pub async fn get_question_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<QuestionView>, AppError> {
    Ok(ok(process_get_question(state.question_repo.as_ref(), &user, &id).await?))
}

/// `PUT /questions/v1/{id}`
pub async fn update_question_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<QuestionInput>,
) -> Result<ApiSuccess<QuestionView>, AppError> {
    Ok(ok(process_update_question(state.question_repo.as_ref(), &id, input).await?))
}

/// `DELETE /questions/v1/{id}`
pub async fn delete_question_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<QuestionView>, AppError> {
    Ok(ok(process_delete_question(state.question_repo.as_ref(), &id).await?))
}

/// `POST /questions/v1/{id}/answer`
pub async fn submit_answer_handler(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<SubmitAnswerRequest>,
) -> Result<ApiSuccess<Answer>, AppError> {
    let provided_secret = headers
        .get(DISCORD_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    let answer = process_submit_answer(
        state.question_repo.as_ref(),
        &state.discord_secret,
        provided_secret,
        user.as_ref(),
        &id,
        request,
    )
    .await?;
    Ok(created(answer))
}

/// `GET /questions/v1/{id}/answer`
pub async fn my_answer_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Option<Answer>>, AppError> {
    Ok(ok(process_my_answer(state.question_repo.as_ref(), &user, &id).await?))
}

/// `GET /questions/v1/{id}/answers`
pub async fn list_answers_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Vec<AnswerView>>, AppError> {
    Ok(ok(process_list_answers(state.question_repo.as_ref(), &user, &id).await?))
}

/// `POST /questions/v1/{id}/concense`
pub async fn consensus_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<ConsensusResult>, AppError> {
    let result =
        process_generate_consensus(state.question_repo.as_ref(), state.llm.as_ref(), &id).await?;
    Ok(ok(result))
}

/// `POST /questions/v1/local`
pub async fn create_local_question_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<LocalQuestionRequest>,
) -> Result<ApiSuccess<LocalQuestionResponse>, AppError> {
    let response = process_create_local_question(
        state.user_repo.as_ref(),
        state.question_repo.as_ref(),
        &user,
        request,
    )
    .await?;
    Ok(created(response))
}
