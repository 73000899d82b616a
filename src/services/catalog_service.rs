//! Service catalog - listing, filtering and lifecycle of services.
//!
//! The public listing supports pagination and filters and always returns
//! the full facet sets (departments and categories over all active
//! services), so filter options do not shrink as the client pages.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::service::{
        CategoryFacet, CreateServiceRequest, SERVICE_SELECT, Service, ServiceFacets,
        ServiceFilters, ServiceListResponse, UpdateServiceRequest,
    },
    pagination::{Page, PageParams},
    services::validation::{FieldErrors, is_valid_department},
};

const MIN_TITLE: usize = 3;
const MAX_TITLE: usize = 120;
const MAX_DESCRIPTION: usize = 5000;
const MAX_PRICE_UNIT: usize = 30;
const MAX_CITY: usize = 80;
const MAX_IMAGES: usize = 10;

/// Append the `WHERE` clause for listing filters.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &ServiceFilters) {
    builder.push(" WHERE s.is_active AND c.is_active");

    if let Some(category_id) = filters.category_id {
        builder.push(" AND s.category_id = ").push_bind(category_id);
    }
    if let Some(department) = filters.department.as_deref().filter(|d| !d.is_empty()) {
        builder.push(" AND s.department = ").push_bind(department.to_string());
    }
    if let Some(min_price) = filters.min_price {
        builder.push(" AND s.price_cents >= ").push_bind(min_price);
    }
    if let Some(max_price) = filters.max_price {
        builder.push(" AND s.price_cents <= ").push_bind(max_price);
    }
    if let Some(contractor_id) = filters.contractor_id {
        builder.push(" AND s.contractor_id = ").push_bind(contractor_id);
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (s.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Public listing with filters, pagination and facets.
pub async fn list(pool: &DbPool, filters: ServiceFilters) -> Result<ServiceListResponse, AppError> {
    if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
        if min > max {
            return Err(AppError::InvalidRequest(
                "min_price cannot be greater than max_price".to_string(),
            ));
        }
    }

    let pagination = PageParams {
        page: filters.page,
        limit: filters.limit,
    }
    .normalize();

    let mut count_query = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM services s JOIN categories c ON c.id = s.category_id",
    );
    push_filters(&mut count_query, &filters);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut items_query = QueryBuilder::<Postgres>::new(SERVICE_SELECT);
    push_filters(&mut items_query, &filters);
    items_query
        .push(" ORDER BY s.created_at DESC, s.id LIMIT ")
        .push_bind(pagination.limit())
        .push(" OFFSET ")
        .push_bind(pagination.offset());
    let items = items_query
        .build_query_as::<Service>()
        .fetch_all(pool)
        .await?;

    let facets = facets(pool).await?;
    let page = Page::new(items, &pagination, total);

    Ok(ServiceListResponse {
        items: page.items,
        pagination: page.pagination,
        facets,
    })
}

/// Departments and categories that have at least one listable service.
///
/// Uses the same visibility as the listing (active service in an active
/// category), so every facet value yields results.
async fn facets(pool: &DbPool) -> Result<ServiceFacets, AppError> {
    let departments: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT s.department
        FROM services s
        JOIN categories c ON c.id = s.category_id
        WHERE s.is_active AND c.is_active
        ORDER BY s.department
        "#,
    )
    .fetch_all(pool)
    .await?;

    let categories = sqlx::query_as::<_, CategoryFacet>(
        r#"
        SELECT c.id, c.name, COUNT(s.id) AS count
        FROM categories c
        JOIN services s ON s.category_id = c.id AND s.is_active
        WHERE c.is_active
        GROUP BY c.id, c.name
        ORDER BY c.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ServiceFacets {
        departments,
        categories,
    })
}

async fn find(pool: &DbPool, service_id: Uuid) -> Result<Service, AppError> {
    sqlx::query_as::<_, Service>(&format!("{SERVICE_SELECT} WHERE s.id = $1"))
        .bind(service_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Service"))
}

/// Fetch a service; inactive ones are only visible to their owner and admins.
pub async fn get(
    pool: &DbPool,
    service_id: Uuid,
    viewer: Option<&AuthContext>,
) -> Result<Service, AppError> {
    let service = find(pool, service_id).await?;
    let can_see_inactive = viewer
        .map(|v| v.user_id == service.contractor_id || v.is_admin())
        .unwrap_or(false);

    if !service.is_active && !can_see_inactive {
        return Err(AppError::NotFound("Service"));
    }
    Ok(service)
}

/// Fetch a service the caller may modify (owner or admin).
pub async fn get_owned(
    pool: &DbPool,
    service_id: Uuid,
    auth: &AuthContext,
) -> Result<Service, AppError> {
    let service = find(pool, service_id).await?;
    auth.require_owner_or_admin(service.contractor_id)?;
    Ok(service)
}

/// The caller's services, including inactive ones.
pub async fn list_mine(
    pool: &DbPool,
    contractor_id: Uuid,
    params: PageParams,
) -> Result<Page<Service>, AppError> {
    let pagination = params.normalize();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services WHERE contractor_id = $1")
        .bind(contractor_id)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, Service>(&format!(
        "{SERVICE_SELECT} WHERE s.contractor_id = $1 ORDER BY s.created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(contractor_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(Page::new(items, &pagination, total))
}

fn validate_create(request: &CreateServiceRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    errors.require_text_between("title", &request.title, MIN_TITLE, MAX_TITLE);
    errors.require_text("description", &request.description, MAX_DESCRIPTION);
    errors.require_text("price_unit", &request.price_unit, MAX_PRICE_UNIT);
    errors.optional_text("city", request.city.as_deref(), MAX_CITY);
    if request.price_cents < 0 {
        errors.add("price_cents", "Price cannot be negative");
    }
    if !is_valid_department(&request.department) {
        errors.add("department", "Unknown department");
    }
    validate_coordinates(&mut errors, request.latitude, request.longitude);
    validate_images(&mut errors, &request.image_urls);
    errors.into_result()
}

fn validate_update(request: &UpdateServiceRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    if let Some(title) = &request.title {
        errors.require_text_between("title", title, MIN_TITLE, MAX_TITLE);
    }
    if let Some(description) = &request.description {
        errors.require_text("description", description, MAX_DESCRIPTION);
    }
    if let Some(price_unit) = &request.price_unit {
        errors.require_text("price_unit", price_unit, MAX_PRICE_UNIT);
    }
    errors.optional_text("city", request.city.as_deref(), MAX_CITY);
    if request.price_cents.is_some_and(|p| p < 0) {
        errors.add("price_cents", "Price cannot be negative");
    }
    if let Some(department) = &request.department {
        if !is_valid_department(department) {
            errors.add("department", "Unknown department");
        }
    }
    validate_coordinates(&mut errors, request.latitude, request.longitude);
    if let Some(images) = &request.image_urls {
        validate_images(&mut errors, images);
    }
    errors.into_result()
}

fn validate_coordinates(errors: &mut FieldErrors, latitude: Option<f64>, longitude: Option<f64>) {
    if latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
        errors.add("latitude", "Latitude must be between -90 and 90");
    }
    if longitude.is_some_and(|lng| !(-180.0..=180.0).contains(&lng)) {
        errors.add("longitude", "Longitude must be between -180 and 180");
    }
}

fn validate_images(errors: &mut FieldErrors, images: &[String]) {
    if images.len() > MAX_IMAGES {
        errors.add("image_urls", format!("At most {MAX_IMAGES} images"));
    } else if images.iter().any(|u| url::Url::parse(u).is_err()) {
        errors.add("image_urls", "Every image must be an absolute URL");
    }
}

/// Publish a new service owned by the caller.
pub async fn create(
    pool: &DbPool,
    auth: &AuthContext,
    request: CreateServiceRequest,
) -> Result<Service, AppError> {
    if !auth.role.can_publish() {
        return Err(AppError::Forbidden(
            "Only contractors can publish services".to_string(),
        ));
    }
    validate_create(&request)?;

    let category_active: Option<bool> =
        sqlx::query_scalar("SELECT is_active FROM categories WHERE id = $1")
            .bind(request.category_id)
            .fetch_optional(pool)
            .await?;
    if category_active != Some(true) {
        let mut errors = FieldErrors::default();
        errors.add("category_id", "Unknown category");
        return Err(AppError::Validation(errors));
    }

    let service_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO services (
            contractor_id, category_id, title, description, price_cents, price_unit,
            department, city, latitude, longitude, image_urls
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(auth.user_id)
    .bind(request.category_id)
    .bind(request.title.trim())
    .bind(request.description.trim())
    .bind(request.price_cents)
    .bind(request.price_unit.trim())
    .bind(&request.department)
    .bind(request.city)
    .bind(request.latitude)
    .bind(request.longitude)
    .bind(&request.image_urls)
    .fetch_one(pool)
    .await?;

    tracing::info!(%service_id, contractor_id = %auth.user_id, "service_created");
    find(pool, service_id).await
}

/// Partially update a service (owner or admin).
pub async fn update(
    pool: &DbPool,
    auth: &AuthContext,
    service_id: Uuid,
    request: UpdateServiceRequest,
) -> Result<Service, AppError> {
    get_owned(pool, service_id, auth).await?;
    validate_update(&request)?;

    sqlx::query(
        r#"
        UPDATE services SET
            category_id = COALESCE($2, category_id),
            title = COALESCE($3, title),
            description = COALESCE($4, description),
            price_cents = COALESCE($5, price_cents),
            price_unit = COALESCE($6, price_unit),
            department = COALESCE($7, department),
            city = COALESCE($8, city),
            latitude = COALESCE($9, latitude),
            longitude = COALESCE($10, longitude),
            image_urls = COALESCE($11, image_urls),
            is_active = COALESCE($12, is_active),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(service_id)
    .bind(request.category_id)
    .bind(request.title.as_deref().map(str::trim))
    .bind(request.description.as_deref().map(str::trim))
    .bind(request.price_cents)
    .bind(request.price_unit.as_deref().map(str::trim))
    .bind(request.department)
    .bind(request.city)
    .bind(request.latitude)
    .bind(request.longitude)
    .bind(request.image_urls)
    .bind(request.is_active)
    .execute(pool)
    .await?;

    find(pool, service_id).await
}

/// Soft delete: the service disappears from listings but history is kept.
pub async fn deactivate(
    pool: &DbPool,
    auth: &AuthContext,
    service_id: Uuid,
) -> Result<(), AppError> {
    get_owned(pool, service_id, auth).await?;

    sqlx::query("UPDATE services SET is_active = false, updated_at = NOW() WHERE id = $1")
        .bind(service_id)
        .execute(pool)
        .await?;

    tracing::info!(%service_id, by = %auth.user_id, "service_deactivated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateServiceRequest {
        CreateServiceRequest {
            category_id: Uuid::new_v4(),
            title: "Cosecha de soja".into(),
            description: "Cosechadora John Deere S680".into(),
            price_cents: 450_000,
            price_unit: "hectárea".into(),
            department: "Soriano".into(),
            city: Some("Mercedes".into()),
            latitude: Some(-33.25),
            longitude: Some(-58.03),
            image_urls: vec!["https://cdn.example.com/s680.jpg".into()],
        }
    }

    fn fields(result: Result<(), AppError>) -> FieldErrors {
        match result {
            Err(AppError::Validation(fields)) => fields,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_service_passes() {
        assert!(validate_create(&request()).is_ok());
    }

    #[test]
    fn invalid_service_reports_each_field() {
        let req = CreateServiceRequest {
            title: "ab".into(),
            price_cents: -1,
            department: "Córdoba".into(),
            latitude: Some(120.0),
            image_urls: vec!["not a url".into()],
            ..request()
        };
        let errors = fields(validate_create(&req));
        for field in ["title", "price_cents", "department", "latitude", "image_urls"] {
            assert!(errors.contains(field), "missing {field}");
        }
        assert!(!errors.contains("longitude"));
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(validate_update(&UpdateServiceRequest::default()).is_ok());
    }

    #[test]
    fn update_checks_only_present_fields() {
        let req = UpdateServiceRequest {
            department: Some("Mendoza".into()),
            ..Default::default()
        };
        let errors = fields(validate_update(&req));
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("department"));
    }

    #[test]
    fn too_many_images() {
        let req = CreateServiceRequest {
            image_urls: vec!["https://cdn.example.com/a.jpg".into(); MAX_IMAGES + 1],
            ..request()
        };
        assert!(fields(validate_create(&req)).contains("image_urls"));
    }

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("soja"), "soja");
    }

    #[test]
    fn filters_build_parameterized_sql() {
        let filters = ServiceFilters {
            department: Some("Salto".into()),
            min_price: Some(100),
            search: Some("cosecha".into()),
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM services s");
        push_filters(&mut builder, &filters);
        let sql = builder.sql();
        assert!(sql.contains("s.department = $1"));
        assert!(sql.contains("s.price_cents >= $2"));
        assert!(sql.contains("s.title ILIKE $3 OR s.description ILIKE $4"));
        assert!(!sql.contains("Salto"));
    }
}
