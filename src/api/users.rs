use axum::extract::{Path, State};

use crate::api::response::{ok, ApiSuccess};
use crate::auth::middleware::AuthUser;
use crate::auth::models::AuthenticatedUser;
use crate::db::models::{Answer, Question, QuestionView, UserProfile};
use crate::db::question_repository::QuestionRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::state::AppState;

pub async fn process_get_profile(
    users: &dyn UserRepository,
    id: &str,
) -> Result<UserProfile, AppError> {
    users
        .find_by_id(id)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

/// Questions created by `user_id` that `caller` can see, oldest first.
pub async fn process_list_user_questions(
    questions: &dyn QuestionRepository,
    caller: &AuthenticatedUser,
    user_id: &str,
) -> Result<Vec<QuestionView>, AppError> {
    Ok(questions
        .list_by_creator(user_id)
        .await?
        .into_iter()
        .filter(|q| q.is_visible_to(caller))
        .map(Question::into_view)
        .collect())
}

/// Every answer `user_id` gave, across the questions `caller` can see.
///
/// Answers on anonymous questions are only listed for the author themselves
/// or an admin.
pub async fn process_list_user_answers(
    questions: &dyn QuestionRepository,
    caller: &AuthenticatedUser,
    user_id: &str,
) -> Result<Vec<Answer>, AppError> {
    let reveal_anonymous = caller.is_admin() || caller.id == user_id;

    Ok(questions
        .list_all()
        .await?
        .into_iter()
        .filter(|q| q.is_visible_to(caller))
        .filter(|q| reveal_anonymous || !q.anonymous)
        .flat_map(|q| q.answers)
        .filter(|a| a.is_by_user(user_id))
        .collect())
}

/// `GET /users/v1/me`
pub async fn me_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiSuccess<UserProfile>, AppError> {
    Ok(ok(process_get_profile(state.user_repo.as_ref(), &user.id).await?))
}

/// `GET /users/v1/me/questions`
pub async fn my_questions_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiSuccess<Vec<QuestionView>>, AppError> {
    let questions =
        process_list_user_questions(state.question_repo.as_ref(), &user, &user.id).await?;
    Ok(ok(questions))
}

/// `GET /users/v1/me/answers`
pub async fn my_answers_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiSuccess<Vec<Answer>>, AppError> {
    let answers = process_list_user_answers(state.question_repo.as_ref(), &user, &user.id).await?;
    Ok(ok(answers))
}

/// `GET /users/v1/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<UserProfile>, AppError> {
    Ok(ok(process_get_profile(state.user_repo.as_ref(), &id).await?))
}

/// `GET /users/v1/{id}/questions`
pub async fn user_questions_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Vec<QuestionView>>, AppError> {
    let questions = process_list_user_questions(state.question_repo.as_ref(), &user, &id).await?;
    Ok(ok(questions))
}

/// `GET /users/v1/{id}/answers`
pub async fn user_answers_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Vec<Answer>>, AppError> {
    let answers = process_list_user_answers(state.question_repo.as_ref(), &user, &id).await?;
    Ok(ok(answers))
}
