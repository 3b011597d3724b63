use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use slotbook_client::domain::repository::{
    BookingRepository, FileStorage, IdentityService, LocalStore, VolunteerRepository,
};
use slotbook_client::domain::types::{
    BookingScope, NewBooking, PhotoUpload, Session, VolunteerPatch,
};
use slotbook_client::error::ClientError;
use slotbook_client::infra::identity::{AUTH_TOKEN_KEY, GoTrueIdentity};
use slotbook_client::infra::local::MemoryLocalStore;
use slotbook_client::infra::rest::{RestBookingRepository, RestClient, RestVolunteerRepository};
use slotbook_client::infra::storage::BucketStorage;
use slotbook_domain::booking::{BookingStatus, DurationHours};
use slotbook_domain::id::VolunteerId;

use crate::helpers::{ANON_KEY, session_channel, signed_in, spawn_backend, test_config};

// ── mock backend ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Value,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

type Responder = Arc<dyn Fn(&Recorded) -> (StatusCode, Value) + Send + Sync>;

#[derive(Clone)]
struct Backend {
    log: Arc<Mutex<Vec<Recorded>>>,
    respond: Responder,
}

async fn capture(
    State(backend): State<Backend>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let recorded = Recorded {
        method,
        path: uri.path().to_owned(),
        query,
        headers,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    let (status, reply) = (backend.respond)(&recorded);
    backend.log.lock().unwrap().push(recorded);
    (status, Json(reply))
}

/// Start a backend answering every request through `respond`. Returns the
/// base URL and the request log.
async fn backend<F>(respond: F) -> (String, Arc<Mutex<Vec<Recorded>>>)
where
    F: Fn(&Recorded) -> (StatusCode, Value) + Send + Sync + 'static,
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let state = Backend {
        log: Arc::clone(&log),
        respond: Arc::new(respond),
    };
    let router = Router::new().fallback(capture).with_state(state);
    (spawn_backend(router).await, log)
}

fn client(base_url: &str, session: Session) -> RestClient {
    let (_tx, rx) = session_channel(session);
    RestClient::new(&test_config(base_url), rx).unwrap()
}

fn volunteer_row(id: Uuid) -> Value {
    json!({
        "id": id,
        "user_id": "vol",
        "name": "Asha",
        "email": "asha@example.com",
        "phone": "555",
        "bio": "Yoga",
        "hourly_rate": 500,
        "availability": "Weekends",
        "is_verified": false,
        "rating": null,
        "total_bookings": 3,
        "profile_photo": "",
        "skills": [{ "id": Uuid::new_v4(), "name": "Yoga" }],
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-02T00:00:00Z"
    })
}

// ── volunteers ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_send_keys_and_embedded_select_when_listing() {
    let id = Uuid::new_v4();
    let (base, log) = backend(move |_| (StatusCode::OK, json!([volunteer_row(id)]))).await;
    let repo = RestVolunteerRepository {
        client: client(&base, signed_in("vol")),
    };

    let listed = repo.list().await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, VolunteerId(id));
    assert_eq!(listed[0].rating, 5.0);
    assert_eq!(listed[0].profile_photo, None);
    assert!(listed[0].skills.contains("Yoga"));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.method, Method::GET);
    assert_eq!(seen.path, "/rest/v1/volunteers");
    assert_eq!(seen.query["select"], "*,skills(id,name)");
    assert_eq!(seen.query["order"], "created_at.desc");
    assert_eq!(seen.header("apikey"), Some(ANON_KEY));
    assert_eq!(seen.header("authorization"), Some("Bearer token-vol"));
}

#[tokio::test]
async fn should_fall_back_to_anon_key_when_signed_out() {
    let (base, log) = backend(|_| (StatusCode::OK, json!([]))).await;
    let repo = RestVolunteerRepository {
        client: client(&base, Session::SignedOut),
    };

    assert!(repo.find_by_user_id(&"nobody".into()).await.unwrap().is_none());

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.query["user_id"], "eq.nobody");
    assert_eq!(
        seen.header("authorization"),
        Some(format!("Bearer {ANON_KEY}").as_str())
    );
}

#[tokio::test]
async fn should_map_error_statuses() {
    let (base, _) = backend(|r| match r.query.get("user_id").map(String::as_str) {
        Some("eq.expired") => (StatusCode::UNAUTHORIZED, json!({ "message": "JWT expired" })),
        Some("eq.blocked") => (StatusCode::FORBIDDEN, json!({ "message": "denied" })),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "message": "relation \"volunteers\" does not exist" }),
        ),
    })
    .await;
    let repo = RestVolunteerRepository {
        client: client(&base, signed_in("vol")),
    };

    assert!(matches!(
        repo.find_by_user_id(&"expired".into()).await,
        Err(ClientError::Unauthenticated)
    ));
    assert!(matches!(
        repo.find_by_user_id(&"blocked".into()).await,
        Err(ClientError::Forbidden)
    ));
    let err = repo.find_by_user_id(&"other".into()).await.unwrap_err();
    assert_eq!(err.kind(), "INTERNAL");
    assert!(
        err.detail().contains("relation \"volunteers\" does not exist"),
        "unexpected detail {}",
        err.detail()
    );
}

#[tokio::test]
async fn should_report_conflict_when_version_filter_misses_existing_row() {
    let id = Uuid::new_v4();
    let (base, log) = backend(move |r| match r.method {
        Method::PATCH => (StatusCode::OK, json!([])),
        _ => (StatusCode::OK, json!([{ "id": id }])),
    })
    .await;
    let repo = RestVolunteerRepository {
        client: client(&base, signed_in("vol")),
    };
    let version = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    let patch = VolunteerPatch {
        hourly_rate: Some(700),
        expected_version: Some(version),
        ..Default::default()
    };

    let result = repo.update(VolunteerId(id), &patch).await;

    assert!(matches!(result, Err(ClientError::Conflict)));
    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.method, Method::PATCH);
    assert_eq!(seen.query["id"], format!("eq.{id}"));
    assert_eq!(seen.query["updated_at"], format!("eq.{}", version.to_rfc3339()));
    assert_eq!(seen.body["hourly_rate"], 700);
    assert!(seen.body.get("name").is_none());
}

#[tokio::test]
async fn should_report_not_found_when_row_is_gone() {
    let (base, _) = backend(|_| (StatusCode::OK, json!([]))).await;
    let repo = RestVolunteerRepository {
        client: client(&base, signed_in("vol")),
    };
    let patch = VolunteerPatch {
        hourly_rate: Some(700),
        expected_version: Some(Utc::now()),
        ..Default::default()
    };
    assert!(matches!(
        repo.update(VolunteerId(Uuid::new_v4()), &patch).await,
        Err(ClientError::VolunteerNotFound)
    ));
}

#[tokio::test]
async fn should_replace_skills_through_rpc() {
    let (base, log) = backend(|_| (StatusCode::NO_CONTENT, Value::Null)).await;
    let repo = RestVolunteerRepository {
        client: client(&base, signed_in("vol")),
    };
    let id = VolunteerId(Uuid::new_v4());

    repo.replace_skills(id, &["A".to_owned(), "B".to_owned()])
        .await
        .unwrap();

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.path, "/rest/v1/rpc/update_volunteer_skills");
    assert_eq!(
        seen.body,
        json!({ "p_volunteer_id": id.0, "p_skill_names": ["A", "B"] })
    );
}

// ── bookings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_insert_booking_and_read_back_row() {
    let volunteer_id = Uuid::new_v4();
    let (base, log) = backend(|r| {
        let mut row = r.body[0].clone();
        row["id"] = json!(Uuid::new_v4());
        row["created_at"] = json!("2025-03-01T08:00:00Z");
        (StatusCode::CREATED, json!([row]))
    })
    .await;
    let repo = RestBookingRepository {
        client: client(&base, signed_in("cli")),
    };
    let new = NewBooking {
        volunteer_id: VolunteerId(volunteer_id),
        client_id: "cli".into(),
        date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        duration: DurationHours::new(2).unwrap(),
        status: BookingStatus::Pending,
        total_amount: 1000,
        message: None,
    };

    let booking = repo.insert(&new).await.unwrap();

    assert_eq!(booking.total_amount, 1000);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.time, new.time);
    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.header("prefer"), Some("return=representation"));
    assert_eq!(seen.body[0]["time"], "10:00:00");
    assert_eq!(seen.body[0]["status"], "pending");
}

fn booking_row(duration: u8) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "volunteer_id": Uuid::new_v4(),
        "client_id": "cli",
        "date": "2025-03-01",
        "time": "10:00:00",
        "duration": duration,
        "status": "pending",
        "total_amount": 500.0 * f64::from(duration),
        "message": null,
        "created_at": "2025-03-01T08:00:00Z",
        "volunteers": { "name": "Asha", "hourly_rate": 500, "profile_photo": null }
    })
}

#[tokio::test]
async fn should_keep_readable_bookings_when_one_row_is_out_of_range() {
    let (base, log) =
        backend(|_| (StatusCode::OK, json!([booking_row(10), booking_row(2)]))).await;
    let repo = RestBookingRepository {
        client: client(&base, signed_in("cli")),
    };

    let listings = repo.list(&BookingScope::Client("cli".into()), None).await.unwrap();

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].booking.duration.get(), 2);
    assert_eq!(listings[0].booking.total_amount, 1000);
    assert_eq!(listings[0].volunteer.as_ref().unwrap().name, "Asha");
    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.query["client_id"], "eq.cli");
    assert_eq!(seen.query["order"], "created_at.desc");
}

#[tokio::test]
async fn should_filter_amounts_by_status_set() {
    let (base, log) = backend(|_| {
        (
            StatusCode::OK,
            json!([{ "total_amount": 1000.0 }, { "total_amount": 500 }]),
        )
    })
    .await;
    let repo = RestBookingRepository {
        client: client(&base, signed_in("vol")),
    };
    let id = VolunteerId(Uuid::new_v4());

    let amounts = repo
        .amounts(id, &[BookingStatus::Confirmed, BookingStatus::Completed])
        .await
        .unwrap();

    assert_eq!(amounts, vec![1000, 500]);
    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.query["status"], "in.(confirmed,completed)");
    assert_eq!(seen.query["volunteer_id"], format!("eq.{id}"));
}

#[tokio::test]
async fn should_report_missing_booking_on_status_update() {
    let (base, _) = backend(|_| (StatusCode::OK, json!([]))).await;
    let repo = RestBookingRepository {
        client: client(&base, signed_in("vol")),
    };
    let result = repo
        .update_status(Uuid::new_v4().into(), BookingStatus::Confirmed)
        .await;
    assert!(matches!(result, Err(ClientError::BookingNotFound)));
}

// ── storage ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_upload_photo_with_upsert_headers() {
    let (base, log) = backend(|_| (StatusCode::OK, json!({ "Key": "ok" }))).await;
    let storage = BucketStorage {
        client: client(&base, signed_in("vol")),
        bucket: "volunteer-photos".into(),
    };
    let upload = PhotoUpload {
        file_name: "me.png".into(),
        content_type: "image/png".into(),
        bytes: vec![1, 2, 3],
    };

    storage.upload("vol/1_me.png", &upload).await.unwrap();

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path, "/storage/v1/object/volunteer-photos/vol/1_me.png");
    assert_eq!(seen.header("x-upsert"), Some("true"));
    assert_eq!(seen.header("cache-control"), Some("max-age=3600"));
    assert_eq!(seen.header("content-type"), Some("image/png"));
    assert_eq!(
        storage.public_url("vol/1_me.png"),
        format!("{base}/storage/v1/object/public/volunteer-photos/vol/1_me.png")
    );
}

// ── identity ─────────────────────────────────────────────────────────────────

fn auth_backend(r: &Recorded) -> (StatusCode, Value) {
    let user = json!({
        "id": "user-1",
        "email": "asha@example.com",
        "user_metadata": { "full_name": "Asha Rao" }
    });
    match r.path.as_str() {
        "/auth/v1/token" if r.body["password"] == "secret" => (
            StatusCode::OK,
            json!({ "access_token": "tok-1", "refresh_token": "ref-1", "user": user }),
        ),
        "/auth/v1/token" => (
            StatusCode::BAD_REQUEST,
            json!({ "error_description": "Invalid login credentials" }),
        ),
        "/auth/v1/user" if r.header("authorization") == Some("Bearer tok-1") => {
            (StatusCode::OK, user)
        }
        "/auth/v1/logout" => (StatusCode::NO_CONTENT, Value::Null),
        _ => (StatusCode::UNAUTHORIZED, json!({ "msg": "invalid token" })),
    }
}

#[tokio::test]
async fn should_sign_in_and_restore_session_from_local_store() {
    let (base, log) = backend(auth_backend).await;
    let config = test_config(&base);
    let local = Arc::new(MemoryLocalStore::new());

    let first = GoTrueIdentity::new(&config, Arc::clone(&local)).unwrap();
    let user = first
        .sign_in_with_password("asha@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(user.display_name(), "Asha Rao");
    assert!(first.session().borrow().is_signed_in());
    assert!(local.get(AUTH_TOKEN_KEY).is_some());
    let token_call = log.lock().unwrap()[0].clone();
    assert_eq!(token_call.query["grant_type"], "password");

    let second = GoTrueIdentity::new(&config, Arc::clone(&local)).unwrap();
    assert_eq!(*second.session().borrow(), Session::Loading);
    second.restore().await.unwrap();
    assert_eq!(second.session().borrow().access_token(), Some("tok-1"));

    second.sign_out().await.unwrap();
    assert_eq!(*second.session().borrow(), Session::SignedOut);
    assert!(local.get(AUTH_TOKEN_KEY).is_none());
}

#[tokio::test]
async fn should_reject_bad_credentials() {
    let (base, _) = backend(auth_backend).await;
    let identity =
        GoTrueIdentity::new(&test_config(&base), Arc::new(MemoryLocalStore::new())).unwrap();

    let result = identity
        .sign_in_with_password("asha@example.com", "wrong")
        .await;

    assert!(matches!(result, Err(ClientError::Unauthenticated)));
}

#[tokio::test]
async fn should_drop_expired_stored_token() {
    let (base, _) = backend(auth_backend).await;
    let local = Arc::new(MemoryLocalStore::new());
    local
        .set(AUTH_TOKEN_KEY, r#"{"access_token":"stale"}"#)
        .unwrap();
    let identity = GoTrueIdentity::new(&test_config(&base), Arc::clone(&local)).unwrap();

    identity.restore().await.unwrap();

    assert_eq!(*identity.session().borrow(), Session::SignedOut);
    assert!(local.get(AUTH_TOKEN_KEY).is_none());
}
