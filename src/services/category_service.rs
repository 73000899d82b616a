//! Category management.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::category::{Category, CategoryWithCount, CreateCategoryRequest, UpdateCategoryRequest},
    services::validation::FieldErrors,
};

const MAX_CATEGORY_NAME: usize = 60;
const MAX_CATEGORY_DESCRIPTION: usize = 500;

const CATEGORY_COLUMNS: &str = "id, name, description, icon_url, is_active, created_at, updated_at";

/// Active categories with the number of active services in each, by name.
pub async fn list_public(pool: &DbPool) -> Result<Vec<CategoryWithCount>, AppError> {
    let categories = sqlx::query_as::<_, CategoryWithCount>(
        r#"
        SELECT c.id, c.name, c.description, c.icon_url,
               COUNT(s.id) FILTER (WHERE s.is_active) AS service_count
        FROM categories c
        LEFT JOIN services s ON s.category_id = c.id
        WHERE c.is_active
        GROUP BY c.id
        ORDER BY c.name
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

/// Every category, including inactive ones, for the admin panel.
pub async fn list_all(pool: &DbPool) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn create(pool: &DbPool, request: CreateCategoryRequest) -> Result<Category, AppError> {
    let mut errors = FieldErrors::default();
    errors.require_text("name", &request.name, MAX_CATEGORY_NAME);
    errors.optional_text(
        "description",
        request.description.as_deref(),
        MAX_CATEGORY_DESCRIPTION,
    );
    errors.into_result()?;

    let category = sqlx::query_as::<_, Category>(&format!(
        r#"
        INSERT INTO categories (name, description, icon_url)
        VALUES ($1, $2, $3)
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(request.name.trim())
    .bind(request.description)
    .bind(request.icon_url)
    .fetch_one(pool)
    .await
    .map_err(duplicate_name)?;

    tracing::info!(category_id = %category.id, name = %category.name, "category_created");
    Ok(category)
}

pub async fn update(
    pool: &DbPool,
    category_id: Uuid,
    request: UpdateCategoryRequest,
) -> Result<Category, AppError> {
    let mut errors = FieldErrors::default();
    if let Some(name) = &request.name {
        errors.require_text("name", name, MAX_CATEGORY_NAME);
    }
    errors.optional_text(
        "description",
        request.description.as_deref(),
        MAX_CATEGORY_DESCRIPTION,
    );
    errors.into_result()?;

    let category = sqlx::query_as::<_, Category>(&format!(
        r#"
        UPDATE categories SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            icon_url = COALESCE($4, icon_url),
            is_active = COALESCE($5, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(category_id)
    .bind(request.name.as_deref().map(str::trim))
    .bind(request.description)
    .bind(request.icon_url)
    .bind(request.is_active)
    .fetch_optional(pool)
    .await
    .map_err(duplicate_name)?
    .ok_or(AppError::NotFound("Category"))?;

    Ok(category)
}

/// Delete a category that no service references.
pub async fn delete(pool: &DbPool, category_id: Uuid) -> Result<(), AppError> {
    let in_use: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM services WHERE category_id = $1)")
            .bind(category_id)
            .fetch_one(pool)
            .await?;

    if in_use {
        return Err(AppError::Conflict(
            "Category still has services; deactivate it instead".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(category_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category"));
    }
    Ok(())
}

/// Names are unique case-insensitively; give the conflict a useful message.
fn duplicate_name(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict("A category with this name already exists".into()),
        other => other,
    }
}
