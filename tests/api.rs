//! Router-level tests driving the full application with `oneshot`.
//!
//! Requests that fail before touching the database run against a lazily
//! connected pool that never opens a connection. Everything else needs a real
//! Postgres and only runs when `TEST_DATABASE_URL` is set.

mod common;

use std::collections::HashSet;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use common::*;

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let app = offline_app();
    let (status, body) = send(&app, get("/api/v1/auth/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "UNAUTHORIZED");

    let (status, body) = send(
        &app,
        json_request("POST", "/api/v1/schedule-requests", None, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_bearer_token_is_invalid() {
    let app = offline_app();
    let (status, body) = send(&app, authed_get("/api/v1/notifications", "not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "INVALID_TOKEN");
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let app = offline_app();
    let request = axum::http::Request::post("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"email\": "))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "INVALID_REQUEST");
}

#[tokio::test]
async fn bad_path_parameter_is_invalid_request() {
    let app = offline_app();
    let (status, body) = send(&app, get("/api/v1/services/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "INVALID_REQUEST");
}

#[tokio::test]
async fn unknown_content_page_is_not_found() {
    let app = offline_app();
    let (status, body) = send(&app, get("/api/v1/content/about")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn oauth_status_reports_configured_providers() {
    let app = offline_app();
    let (status, body) = send(&app, get("/api/v1/oauth/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": { "google": true, "facebook": false } }));
}

#[tokio::test]
async fn oauth_redirects_and_errors() {
    let app = offline_app();

    let response = app.clone().oneshot(get("/api/v1/oauth/google")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/"));
    assert!(location.contains("client_id=google-client"));
    assert!(location.contains("response_type=code"));

    let (status, body) = send(&app, get("/api/v1/oauth/facebook")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_error(&body, "PROVIDER_UNAVAILABLE");

    let (status, body) = send(&app, get("/api/v1/oauth/github")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "NOT_FOUND");
}

// Database-backed

#[tokio::test]
async fn registration_reports_every_invalid_field() {
    let Some((app, _pool)) = database_app().await else {
        return;
    };
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "email": "nope", "password": "short", "role": "CONTRACTOR" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "VALIDATION_ERROR");
    let details = &body["error"]["details"];
    for field in ["email", "password", "first_name", "last_name", "phone", "accept_terms"] {
        assert!(details.get(field).is_some(), "missing {field} in {details}");
    }
}

#[tokio::test]
async fn refresh_tokens_rotate() {
    let Some((app, _pool)) = database_app().await else {
        return;
    };
    let (_, session) = register(&app, "USER", None).await;
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let (status, body) = send(
        &app,
        json_request("POST", "/api/v1/auth/refresh", None, json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["data"]["refresh_token"], refresh_token);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/v1/auth/refresh", None, json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "INVALID_TOKEN");
}

#[tokio::test]
async fn unknown_email_and_wrong_password_fail_alike() {
    let Some((app, _pool)) = database_app().await else {
        return;
    };
    let (_, session) = register(&app, "USER", None).await;
    let email = session["user"]["email"].as_str().unwrap();

    for (email, password) in [(email, "Equivocada1"), ("nadie@test.agrored.uy", "Campo2024")] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({ "email": email, "password": password }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_error(&body, "INVALID_CREDENTIALS");
    }
}

#[tokio::test]
async fn deactivation_revokes_sessions() {
    let Some((app, pool)) = database_app().await else {
        return;
    };
    let (admin, admin_session) = staff(&app, &pool, "ADMIN").await;
    let (token, session) = register(&app, "USER", None).await;
    let target = user_id(&session);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/v1/admin/users/{}/status", user_id(&admin_session)),
            Some(&admin),
            json!({ "is_active": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "admins cannot deactivate themselves: {body}");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/v1/admin/users/{target}/status"),
            Some(&admin),
            json!({ "is_active": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["is_active"], false);

    let live: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1 AND revoked_at IS NULL",
    )
    .bind(target)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(live, 0);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": session["refresh_token"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "INVALID_TOKEN");

    let (status, body) = send(&app, authed_get("/api/v1/auth/me", &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "ACCOUNT_DISABLED");
}

#[tokio::test]
async fn category_names_and_deletion_rules() {
    let Some((app, pool)) = database_app().await else {
        return;
    };
    let (admin, _) = staff(&app, &pool, "ADMIN").await;
    let (contractor, _) = register(&app, "CONTRACTOR", Some("099111222")).await;
    let name = format!("Riego {}", Uuid::new_v4());

    let (status, body) = send(
        &app,
        json_request("POST", "/api/v1/admin/categories", Some(&admin), json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let category_id = Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/admin/categories",
            Some(&admin),
            json!({ "name": name.to_uppercase() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");

    service(&app, &contractor, category_id, "Riego por pivot", "Paysandú").await;
    let delete = format!("/api/v1/admin/categories/{category_id}");
    let (status, body) = send(&app, json_request("DELETE", &delete, Some(&admin), json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");

    let empty = category(&pool).await;
    let (status, _) = send(
        &app,
        json_request("DELETE", &format!("/api/v1/admin/categories/{empty}"), Some(&admin), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn slots_cannot_overlap_or_be_deleted_once_booked() {
    let Some((app, pool)) = database_app().await else {
        return;
    };
    let (contractor, _) = register(&app, "CONTRACTOR", Some("099111333")).await;
    let (customer, _) = register(&app, "USER", None).await;
    let service_id = service(&app, &contractor, category(&pool).await, "Siembra directa", "Durazno").await;

    let start = Utc::now() + Duration::days(5);
    let (status, body) = add_slot(&app, &contractor, &service_id, start, start + Duration::hours(4)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let booked_slot = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = add_slot(
        &app,
        &contractor,
        &service_id,
        start + Duration::hours(2),
        start + Duration::hours(6),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");

    // Back-to-back windows do not overlap
    let (status, body) = add_slot(
        &app,
        &contractor,
        &service_id,
        start + Duration::hours(4),
        start + Duration::hours(6),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let free_slot = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/schedule-requests",
            Some(&customer),
            json!({ "service_id": service_id, "availability_id": booked_slot }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let request_id = body["data"]["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/schedule-requests/{request_id}/accept"),
            Some(&contractor),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request("DELETE", &format!("/api/v1/availability/{booked_slot}"), Some(&contractor), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");

    let (status, _) = send(
        &app,
        json_request("DELETE", &format!("/api/v1/availability/{free_slot}"), Some(&contractor), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn owner_sees_slots_of_inactive_service() {
    let Some((app, pool)) = database_app().await else {
        return;
    };
    let (contractor, _) = register(&app, "CONTRACTOR", Some("099111444")).await;
    let service_id = service(&app, &contractor, category(&pool).await, "Fletes", "Rivera").await;
    let start = Utc::now() + Duration::days(4);
    add_slot(&app, &contractor, &service_id, start, start + Duration::hours(3)).await;

    let (status, _) = send(
        &app,
        json_request("DELETE", &format!("/api/v1/services/{service_id}"), Some(&contractor), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/services/{service_id}/availability");
    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, authed_get(&uri, &contractor)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn booking_flow_reveals_contact_only_after_acceptance() {
    let Some((app, pool)) = database_app().await else {
        return;
    };

    let (contractor, _) = register(&app, "CONTRACTOR", Some("099 123 456")).await;
    let (customer, _) = register(&app, "USER", None).await;
    let service_id = service(&app, &contractor, category(&pool).await, "Cosecha de soja", "Soriano").await;

    let starts_at = Utc::now() + Duration::days(3);
    let (status, body) = add_slot(&app, &contractor, &service_id, starts_at, starts_at + Duration::hours(6)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let slot_id = body["data"]["id"].as_str().unwrap().to_string();

    // Contractors cannot book their own service
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/schedule-requests",
            Some(&contractor),
            json!({ "service_id": service_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/schedule-requests",
            Some(&customer),
            json!({ "service_id": service_id, "availability_id": slot_id, "message": "120 ha" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "PENDING");
    assert!(body["data"]["contractor"]["phone"].is_null());
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    // Only the contractor may accept
    let accept = format!("/api/v1/schedule-requests/{request_id}/accept");
    let (status, _) = send(&app, json_request("POST", &accept, Some(&customer), json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        json_request("POST", &accept, Some(&contractor), json!({ "note": "Paso el martes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "ACCEPTED");
    assert_eq!(body["data"]["contractor"]["phone"], "099123456");

    // Re-accepting is a no-op, cancelling afterwards is not allowed
    let (status, body) = send(&app, json_request("POST", &accept, Some(&contractor), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["response_note"], "Paso el martes");

    let cancel = format!("/api/v1/schedule-requests/{request_id}/cancel");
    let (status, body) = send(&app, json_request("POST", &cancel, Some(&customer), json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "INVALID_TRANSITION");

    let booked: bool = sqlx::query_scalar("SELECT is_booked FROM availability WHERE id = $1")
        .bind(Uuid::parse_str(&slot_id).unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(booked);

    let (status, body) = send(&app, authed_get("/api/v1/notifications/unread-count", &customer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unread"], 1);
}

#[tokio::test]
async fn accepting_a_slot_taken_meanwhile_conflicts() {
    let Some((app, pool)) = database_app().await else {
        return;
    };
    let (contractor, _) = register(&app, "CONTRACTOR", Some("099111555")).await;
    let (first, _) = register(&app, "USER", None).await;
    let (second, _) = register(&app, "USER", None).await;
    let service_id = service(&app, &contractor, category(&pool).await, "Fumigación", "Colonia").await;
    let start = Utc::now() + Duration::days(6);
    let (_, body) = add_slot(&app, &contractor, &service_id, start, start + Duration::hours(5)).await;
    let slot_id = body["data"]["id"].as_str().unwrap().to_string();

    let mut request_ids = Vec::new();
    for customer in [&first, &second] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/schedule-requests",
                Some(customer),
                json!({ "service_id": service_id, "availability_id": slot_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        request_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/schedule-requests/{}/accept", request_ids[0]),
            Some(&contractor),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/schedule-requests/{}/accept", request_ids[1]),
            Some(&contractor),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");

    let (status, body) = send(
        &app,
        authed_get(&format!("/api/v1/schedule-requests/{}", request_ids[1]), &second),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PENDING");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_leave_one_pending() {
    let Some((app, pool)) = database_app().await else {
        return;
    };
    let (contractor, _) = register(&app, "CONTRACTOR", Some("099111666")).await;
    let (customer, session) = register(&app, "USER", None).await;
    let service_id = service(&app, &contractor, category(&pool).await, "Enfardado", "Florida").await;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            let request = json_request(
                "POST",
                "/api/v1/schedule-requests",
                Some(&customer),
                json!({ "service_id": service_id }),
            );
            tokio::spawn(async move { app.oneshot(request).await.unwrap().status() })
        })
        .collect();

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }
    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    assert_eq!(created, 1, "{statuses:?}");
    assert!(
        statuses
            .iter()
            .all(|s| *s == StatusCode::CREATED || *s == StatusCode::CONFLICT),
        "{statuses:?}"
    );

    let pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM schedule_requests WHERE requester_id = $1 AND status = 'PENDING'",
    )
    .bind(user_id(&session))
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(pending, 1);
}

#[tokio::test]
async fn closed_reports_cannot_be_resolved_again() {
    let Some((app, pool)) = database_app().await else {
        return;
    };
    let (admin, _) = staff(&app, &pool, "ADMIN").await;
    let (contractor, _) = register(&app, "CONTRACTOR", Some("099111777")).await;
    let (customer, _) = register(&app, "USER", None).await;
    let service_id = service(&app, &contractor, category(&pool).await, "Laboreo", "Tacuarembó").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/reports",
            Some(&customer),
            json!({ "service_id": service_id, "reason": "Precio engañoso" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "OPEN");
    let resolve = format!("/api/v1/admin/reports/{}/resolve", body["data"]["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        json_request("POST", &resolve, Some(&admin), json!({ "status": "RESOLVED", "note": "Corregido" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "RESOLVED");

    let (status, body) = send(
        &app,
        json_request("POST", &resolve, Some(&admin), json!({ "status": "DISMISSED" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "INVALID_TRANSITION");
}

#[tokio::test]
async fn listing_pages_filters_and_facets() {
    let Some((app, pool)) = database_app().await else {
        return;
    };
    let (admin, _) = staff(&app, &pool, "ADMIN").await;
    let (contractor, session) = register(&app, "CONTRACTOR", Some("099111888")).await;
    let contractor_id = user_id(&session);
    let listed = category(&pool).await;

    let mut expected = HashSet::new();
    for (i, department) in ["Soriano", "Soriano", "Colonia", "Soriano", "Colonia"].into_iter().enumerate() {
        expected.insert(service(&app, &contractor, listed, &format!("Servicio {i}"), department).await);
    }

    // A service whose category is later deactivated drops out of results and facets
    let hidden = category(&pool).await;
    service(&app, &contractor, hidden, "Servicio oculto", "Artigas").await;
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/v1/admin/categories/{hidden}"),
            Some(&admin),
            json!({ "is_active": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut seen = HashSet::new();
    let mut pages: Vec<Value> = Vec::new();
    for page in 1..=3 {
        let (status, body) = send(
            &app,
            get(&format!("/api/v1/services?contractor_id={contractor_id}&limit=2&page={page}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        for item in body["data"]["items"].as_array().unwrap() {
            assert!(seen.insert(item["id"].as_str().unwrap().to_string()), "duplicate id across pages");
        }
        pages.push(body["data"].clone());
    }
    assert_eq!(seen, expected);
    assert_eq!(pages[0]["pagination"]["total"], 5);
    assert_eq!(pages[0]["pagination"]["total_pages"], 3);
    assert_eq!(pages[0]["pagination"]["has_more"], true);
    assert_eq!(pages[2]["pagination"]["has_more"], false);
    assert_eq!(pages[2]["items"].as_array().unwrap().len(), 1);

    // Facets ignore hidden categories
    let departments = pages[0]["facets"]["departments"].as_array().unwrap();
    assert!(departments.contains(&json!("Colonia")));
    assert!(!departments.contains(&json!("Artigas")));
    let categories = pages[0]["facets"]["categories"].as_array().unwrap();
    assert!(categories.iter().any(|c| c["id"] == json!(listed)));
    assert!(!categories.iter().any(|c| c["id"] == json!(hidden)));

    let (status, body) = send(
        &app,
        get(&format!("/api/v1/services?contractor_id={contractor_id}&department=Colonia")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 2);
    assert!(
        body["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["department"] == "Colonia")
    );
}
