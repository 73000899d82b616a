//! FAQ entries and static content pages.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::content::{
        ContentPage, CreateFaqRequest, Faq, PAGE_SLUGS, UpdateFaqRequest, UpsertPageRequest,
    },
    services::validation::FieldErrors,
};

const MAX_TITLE: usize = 200;
const MAX_BODY: usize = 50_000;
const MAX_QUESTION: usize = 300;
const MAX_ANSWER: usize = 5000;

const FAQ_COLUMNS: &str = "id, question, answer, position, is_active, created_at, updated_at";

fn known_slug(slug: &str) -> Result<(), AppError> {
    if PAGE_SLUGS.contains(&slug) {
        Ok(())
    } else {
        Err(AppError::NotFound("Page"))
    }
}

/// Active FAQ entries by position.
pub async fn list_faqs(pool: &DbPool) -> Result<Vec<Faq>, AppError> {
    let faqs = sqlx::query_as::<_, Faq>(&format!(
        "SELECT {FAQ_COLUMNS} FROM faqs WHERE is_active ORDER BY position, created_at"
    ))
    .fetch_all(pool)
    .await?;
    Ok(faqs)
}

/// Every FAQ entry, including hidden ones.
pub async fn list_all_faqs(pool: &DbPool) -> Result<Vec<Faq>, AppError> {
    let faqs = sqlx::query_as::<_, Faq>(&format!(
        "SELECT {FAQ_COLUMNS} FROM faqs ORDER BY position, created_at"
    ))
    .fetch_all(pool)
    .await?;
    Ok(faqs)
}

pub async fn get_page(pool: &DbPool, slug: &str) -> Result<ContentPage, AppError> {
    known_slug(slug)?;

    sqlx::query_as::<_, ContentPage>(
        "SELECT slug, title, body, updated_by, updated_at FROM content_pages WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Page"))
}

pub async fn upsert_page(
    pool: &DbPool,
    actor_id: Uuid,
    slug: &str,
    request: UpsertPageRequest,
) -> Result<ContentPage, AppError> {
    known_slug(slug)?;

    let mut errors = FieldErrors::default();
    errors.require_text("title", &request.title, MAX_TITLE);
    errors.require_text("body", &request.body, MAX_BODY);
    errors.into_result()?;

    let page = sqlx::query_as::<_, ContentPage>(
        r#"
        INSERT INTO content_pages (slug, title, body, updated_by, updated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (slug) DO UPDATE
            SET title = EXCLUDED.title, body = EXCLUDED.body,
                updated_by = EXCLUDED.updated_by, updated_at = NOW()
        RETURNING slug, title, body, updated_by, updated_at
        "#,
    )
    .bind(slug)
    .bind(request.title.trim())
    .bind(&request.body)
    .bind(actor_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(slug, by = %actor_id, "content_page_updated");
    Ok(page)
}

pub async fn create_faq(pool: &DbPool, request: CreateFaqRequest) -> Result<Faq, AppError> {
    let mut errors = FieldErrors::default();
    errors.require_text("question", &request.question, MAX_QUESTION);
    errors.require_text("answer", &request.answer, MAX_ANSWER);
    errors.into_result()?;

    let faq = sqlx::query_as::<_, Faq>(&format!(
        r#"
        INSERT INTO faqs (question, answer, position)
        VALUES ($1, $2, $3)
        RETURNING {FAQ_COLUMNS}
        "#
    ))
    .bind(request.question.trim())
    .bind(request.answer.trim())
    .bind(request.position)
    .fetch_one(pool)
    .await?;
    Ok(faq)
}

pub async fn update_faq(
    pool: &DbPool,
    faq_id: Uuid,
    request: UpdateFaqRequest,
) -> Result<Faq, AppError> {
    let mut errors = FieldErrors::default();
    if let Some(question) = &request.question {
        errors.require_text("question", question, MAX_QUESTION);
    }
    if let Some(answer) = &request.answer {
        errors.require_text("answer", answer, MAX_ANSWER);
    }
    errors.into_result()?;

    sqlx::query_as::<_, Faq>(&format!(
        r#"
        UPDATE faqs SET
            question = COALESCE($2, question),
            answer = COALESCE($3, answer),
            position = COALESCE($4, position),
            is_active = COALESCE($5, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {FAQ_COLUMNS}
        "#
    ))
    .bind(faq_id)
    .bind(request.question.as_deref().map(str::trim))
    .bind(request.answer.as_deref().map(str::trim))
    .bind(request.position)
    .bind(request.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("FAQ"))
}

pub async fn delete_faq(pool: &DbPool, faq_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
        .bind(faq_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("FAQ"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_pages_exist() {
        for slug in PAGE_SLUGS {
            assert!(known_slug(slug).is_ok());
        }
        assert!(matches!(known_slug("about"), Err(AppError::NotFound(_))));
    }
}
