//! Initial data: categories, the superadmin account, default settings and
//! static content, plus optional demo listings.
//!
//! Every insert is guarded (`ON CONFLICT DO NOTHING` or an existence check),
//! so running the seed twice leaves the database unchanged.

use anyhow::{Context, bail};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    models::{setting::REGISTRATION_ENABLED, user::Role},
    services::{tokens, validation},
};

pub const CATEGORIES: [(&str, &str); 8] = [
    ("Cosecha", "Cosecha de granos con cosechadora propia"),
    ("Siembra", "Siembra directa y convencional"),
    ("Fumigación", "Aplicación terrestre y aérea de fitosanitarios"),
    ("Fertilización", "Distribución de fertilizantes sólidos y líquidos"),
    ("Enfardado", "Corte, rastrillado y enfardado de forraje"),
    ("Laboreo de suelo", "Excéntrica, cincel y nivelación"),
    ("Transporte", "Flete de granos, hacienda y maquinaria"),
    ("Veterinaria", "Sanidad animal y asistencia reproductiva"),
];

const PAGES: [(&str, &str, &str); 3] = [
    (
        "terms",
        "Términos y condiciones",
        "AgroRedUy conecta productores con contratistas de servicios agrícolas. \
         Los acuerdos de precio, fecha y ejecución se celebran directamente entre las partes.",
    ),
    (
        "privacy",
        "Política de privacidad",
        "Tus datos de contacto solo se comparten con la otra parte cuando una \
         solicitud de servicio es aceptada.",
    ),
    (
        "contact",
        "Contacto",
        "Escribinos a contacto@agrored.uy o llamanos al 2900 0000 de lunes a viernes de 9 a 18 h.",
    ),
];

const FAQS: [(&str, &str); 4] = [
    (
        "¿Cómo contrato un servicio?",
        "Elegí un servicio, seleccioná un horario disponible y enviá la solicitud. \
         El contratista la acepta o la rechaza.",
    ),
    (
        "¿Cuándo veo el teléfono del contratista?",
        "Cuando el contratista acepta tu solicitud se muestran los datos de contacto de ambas partes.",
    ),
    (
        "¿Cómo publico mis servicios?",
        "Registrate como contratista, completá tu teléfono y creá tus publicaciones desde tu panel.",
    ),
    (
        "¿Tiene costo usar AgroRedUy?",
        "Publicar y solicitar servicios es gratuito.",
    ),
];

const DEMO_CONTRACTOR_EMAIL: &str = "contratista.demo@agrored.uy";

/// What a seed run inserted.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub categories: u64,
    pub superadmin_created: bool,
    pub settings: u64,
    pub pages: u64,
    pub faqs: u64,
    pub sample_services: u64,
}

/// Superadmin credentials from the environment; there is no fallback.
pub fn superadmin_credentials(config: &Config) -> anyhow::Result<(String, String)> {
    let (Some(email), Some(password)) = (
        config.superadmin_email.as_deref(),
        config.superadmin_password.as_deref(),
    ) else {
        bail!("SUPERADMIN_EMAIL and SUPERADMIN_PASSWORD must both be set");
    };

    let email = validation::normalize_email(email);
    if !validation::is_valid_email(&email) {
        bail!("SUPERADMIN_EMAIL is not a valid email address");
    }
    if let Some(problem) = validation::password_problem(password) {
        bail!("SUPERADMIN_PASSWORD is too weak: {problem}");
    }
    Ok((email, password.to_string()))
}

pub async fn run(pool: &DbPool, config: &Config) -> anyhow::Result<SeedSummary> {
    let (email, password) = superadmin_credentials(config)?;
    let mut summary = SeedSummary::default();

    for (name, description) in CATEGORIES {
        summary.categories += sqlx::query(
            "INSERT INTO categories (name, description) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?
        .rows_affected();
    }

    let password_hash = tokens::hash_password(&password).context("hash superadmin password")?;
    summary.superadmin_created = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, 'Super', 'Admin', $3)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(&email)
    .bind(password_hash)
    .bind(Role::Superadmin)
    .execute(pool)
    .await?
    .rows_affected()
        > 0;

    summary.settings = sqlx::query(
        "INSERT INTO settings (key, value) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
    )
    .bind(REGISTRATION_ENABLED)
    .bind(serde_json::json!(true))
    .execute(pool)
    .await?
    .rows_affected();

    for (slug, title, body) in PAGES {
        summary.pages += sqlx::query(
            "INSERT INTO content_pages (slug, title, body) VALUES ($1, $2, $3) ON CONFLICT (slug) DO NOTHING",
        )
        .bind(slug)
        .bind(title)
        .bind(body)
        .execute(pool)
        .await?
        .rows_affected();
    }

    for (position, (question, answer)) in FAQS.into_iter().enumerate() {
        summary.faqs += sqlx::query(
            r#"
            INSERT INTO faqs (question, answer, position)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM faqs WHERE question = $1)
            "#,
        )
        .bind(question)
        .bind(answer)
        .bind(position as i32)
        .execute(pool)
        .await?
        .rows_affected();
    }

    if config.seed_sample_data {
        summary.sample_services = seed_samples(pool).await?;
    }

    Ok(summary)
}

/// Demo contractor with a few services and upcoming slots.
///
/// The contractor's password hash is not a valid PHC string, so the account
/// cannot sign in.
async fn seed_samples(pool: &DbPool) -> anyhow::Result<u64> {
    sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, phone, role)
        VALUES ($1, '!', 'Martín', 'Rodríguez', '099123456', $2)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(DEMO_CONTRACTOR_EMAIL)
    .bind(Role::Contractor)
    .execute(pool)
    .await?;

    let contractor_id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(DEMO_CONTRACTOR_EMAIL)
        .fetch_one(pool)
        .await?;

    let has_services: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM services WHERE contractor_id = $1)")
            .bind(contractor_id)
            .fetch_one(pool)
            .await?;
    if has_services {
        return Ok(0);
    }

    let samples = [
        ("Cosecha", "Cosecha de soja", "Cosechadora con plataforma de 30 pies y tolva", 450_000_i64, "hectárea", "Soriano", "Mercedes"),
        ("Fumigación", "Pulverización terrestre", "Pulverizadora autopropulsada de 28 metros", 90_000, "hectárea", "Colonia", "Nueva Helvecia"),
        ("Enfardado", "Enfardado de alfalfa", "Fardos prismáticos chicos, incluye rastrillado", 8_000, "fardo", "Florida", "Sarandí Grande"),
    ];

    let mut created = 0;
    for (category, title, description, price_cents, unit, department, city) in samples {
        let service_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO services (contractor_id, category_id, title, description, price_cents, price_unit, department, city)
            SELECT $1, c.id, $3, $4, $5, $6, $7, $8
            FROM categories c WHERE c.name = $2
            RETURNING id
            "#,
        )
        .bind(contractor_id)
        .bind(category)
        .bind(title)
        .bind(description)
        .bind(price_cents)
        .bind(unit)
        .bind(department)
        .bind(city)
        .fetch_one(pool)
        .await
        .with_context(|| format!("insert sample service {title}"))?;

        for day in 1..=3 {
            let starts_at = (Utc::now() + Duration::days(day * 7))
                .date_naive()
                .and_hms_opt(8, 0, 0)
                .context("valid time")?
                .and_utc();
            sqlx::query("INSERT INTO availability (service_id, starts_at, ends_at) VALUES ($1, $2, $3)")
                .bind(service_id)
                .bind(starts_at)
                .bind(starts_at + Duration::hours(10))
                .execute(pool)
                .await?;
        }
        created += 1;
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superadmin_requires_both_variables() {
        let mut config = Config::for_tests();
        assert!(superadmin_credentials(&config).is_err());

        config.superadmin_email = Some("admin@agrored.uy".into());
        assert!(superadmin_credentials(&config).is_err());
    }

    #[test]
    fn superadmin_password_must_pass_password_rule() {
        let mut config = Config::for_tests();
        config.superadmin_email = Some("admin@agrored.uy".into());

        for weak in ["short1", "password", "12345678"] {
            config.superadmin_password = Some(weak.into());
            assert!(superadmin_credentials(&config).is_err(), "{weak} accepted");
        }

        config.superadmin_password = Some("Campo2024seguro".into());
        assert!(superadmin_credentials(&config).is_ok());
    }

    #[test]
    fn email_is_normalized() {
        let mut config = Config::for_tests();
        config.superadmin_email = Some("  Admin@AgroRed.UY ".into());
        config.superadmin_password = Some("Campo2024seguro".into());
        let (email, _) = superadmin_credentials(&config).unwrap();
        assert_eq!(email, "admin@agrored.uy");
    }

    #[test]
    fn category_names_are_unique() {
        let mut names: Vec<_> = CATEGORIES.iter().map(|(n, _)| n.to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CATEGORIES.len());
    }
}
