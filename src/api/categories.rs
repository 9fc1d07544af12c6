use axum::extract::{Path, State};
use chrono::Utc;

use crate::api::errors::ApiJson;
use crate::api::response::{created, ok, ApiSuccess};
use crate::auth::middleware::AdminUser;
use crate::db::category_repository::CategoryRepository;
use crate::db::models::{Category, CategoryInput};
use crate::error::AppError;
use crate::state::AppState;

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Category {id} not found"))
}

fn validate(input: &CategoryInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Category name cannot be empty".into()));
    }
    Ok(())
}

pub async fn process_create_category(
    categories: &dyn CategoryRepository,
    input: CategoryInput,
) -> Result<Category, AppError> {
    validate(&input)?;
    let now = Utc::now();
    let category = Category {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        description: input.description,
        created_at: now,
        updated_at: now,
    };
    categories.create(category.clone()).await?;
    Ok(category)
}

pub async fn process_get_category(
    categories: &dyn CategoryRepository,
    id: &str,
) -> Result<Category, AppError> {
    categories.find_by_id(id).await?.ok_or_else(|| not_found(id))
}

pub async fn process_update_category(
    categories: &dyn CategoryRepository,
    id: &str,
    input: CategoryInput,
) -> Result<Category, AppError> {
    validate(&input)?;
    let input = CategoryInput {
        name: input.name.trim().to_string(),
        ..input
    };
    categories.update(id, input).await?.ok_or_else(|| not_found(id))
}

pub async fn process_delete_category(
    categories: &dyn CategoryRepository,
    id: &str,
) -> Result<Category, AppError> {
    categories.delete(id).await?.ok_or_else(|| not_found(id))
}

/// `GET /categories/v1`
pub async fn list_categories_handler(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<Category>>, AppError> {
    Ok(ok(state.category_repo.list_all().await?))
}

/// `POST /categories/v1`
pub async fn create_category_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<ApiSuccess<Category>, AppError> {
    let category = process_create_category(state.category_repo.as_ref(), input).await?;
    Ok(created(category))
}

/// `GET /categories/v1/{id}`
pub async fn get_category_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Category>, AppError> {
    Ok(ok(process_get_category(state.category_repo.as_ref(), &id).await?))
}

/// `PUT /categories/v1/{id}`
pub async fn update_category_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<ApiSuccess<Category>, AppError> {
    Ok(ok(process_update_category(state.category_repo.as_ref(), &id, input).await?))
}

/// `DELETE /categories/v1/{id}`
pub async fn delete_category_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Category>, AppError> {
    Ok(ok(process_delete_category(state.category_repo.as_ref(), &id).await?))
}
