//! PostgREST adapters for volunteers, bookings and feedback.

use anyhow::{Context as _, anyhow};
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, warn};

use slotbook_domain::booking::{Booking, BookingStatus};
use slotbook_domain::feedback::Feedback;
use slotbook_domain::id::{BookingId, UserId, VolunteerId};
use slotbook_domain::volunteer::VolunteerProfile;

use crate::config::ClientConfig;
use crate::domain::repository::{BookingRepository, FeedbackRepository, VolunteerRepository};
use crate::domain::types::{
    BookingListing, BookingScope, NewBooking, Session, VolunteerPatch, VolunteerUpsert,
};
use crate::error::ClientError;
use crate::infra::rows::{
    AmountRow, BOOKING_LIST_SELECT, BookingRow, FeedbackRow, IdRow, NewBookingRow,
    SkillReplaceArgs, StatusPatchRow, VOLUNTEER_SELECT, VolunteerPatchRow, VolunteerRow,
    VolunteerUpsertRow, status_in,
};

const PREFER: &str = "Prefer";

/// Shared HTTP plumbing for the hosted backend: base URL, anon key and the
/// caller's access token taken from the live session.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: watch::Receiver<Session>,
}

impl RestClient {
    pub fn new(
        config: &ClientConfig,
        session: watch::Receiver<Session>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.anon_key.clone(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(Url::parse(&format!("{}{path}", self.base_url))
            .with_context(|| format!("invalid URL for {path}"))?)
    }

    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self.url(&format!("/rest/v1/{table}"))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Request with `apikey` and a bearer token: the session's access token
    /// when signed in, the anon key otherwise.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self
            .session
            .borrow()
            .access_token()
            .map(str::to_owned)
            .unwrap_or_else(|| self.anon_key.clone());
        let mut req = self.http.request(method, url).header("apikey", &self.anon_key);
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            req = req.header(AUTHORIZATION, value);
        }
        req
    }

    /// Send and map non-success statuses onto client errors.
    pub async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response, ClientError> {
        let resp = req.send().await.with_context(|| format!("{what}: request failed"))?;
        let status = resp.status();
        debug!(what, status = status.as_u16(), "remote call");
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthenticated),
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden),
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(anyhow!("{}: {}", status.as_u16(), remote_message(&body))
                    .context(what.to_owned())
                    .into())
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        what: &str,
    ) -> Result<T, ClientError> {
        let resp = self.send(req, what).await?;
        Ok(resp
            .json::<T>()
            .await
            .with_context(|| format!("{what}: decode response"))?)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, &str)],
        what: &str,
    ) -> Result<Vec<T>, ClientError> {
        let url = self.table_url(table, params)?;
        self.fetch(self.request(Method::GET, url), what).await
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        prefer: &str,
        body: &B,
        what: &str,
    ) -> Result<Vec<T>, ClientError> {
        let req = self.request(method, url).header(PREFER, prefer).json(body);
        self.fetch(req, what).await
    }
}

/// Best human-readable message from a PostgREST/storage error body.
fn remote_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

// ── volunteers ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RestVolunteerRepository {
    pub client: RestClient,
}

impl RestVolunteerRepository {
    async fn find_one(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<VolunteerProfile>, ClientError> {
        let filter = format!("eq.{value}");
        let rows: Vec<VolunteerRow> = self
            .client
            .select(
                "volunteers",
                &[("select", VOLUNTEER_SELECT), (column, filter.as_str())],
                "select volunteer",
            )
            .await?;
        Ok(rows.into_iter().next().map(VolunteerProfile::from))
    }

    async fn exists(&self, id: VolunteerId) -> Result<bool, ClientError> {
        let filter = format!("eq.{id}");
        let rows: Vec<IdRow> = self
            .client
            .select(
                "volunteers",
                &[("select", "id"), ("id", filter.as_str())],
                "check volunteer",
            )
            .await?;
        Ok(!rows.is_empty())
    }
}

impl VolunteerRepository for RestVolunteerRepository {
    async fn list(&self) -> Result<Vec<VolunteerProfile>, ClientError> {
        let rows: Vec<VolunteerRow> = self
            .client
            .select(
                "volunteers",
                &[("select", VOLUNTEER_SELECT), ("order", "created_at.desc")],
                "list volunteers",
            )
            .await?;
        Ok(rows.into_iter().map(VolunteerProfile::from).collect())
    }

    async fn find_by_id(&self, id: VolunteerId) -> Result<Option<VolunteerProfile>, ClientError> {
        self.find_one("id", &id.to_string()).await
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VolunteerProfile>, ClientError> {
        self.find_one("user_id", user_id.as_str()).await
    }

    async fn upsert(&self, profile: &VolunteerUpsert) -> Result<VolunteerId, ClientError> {
        let url = self
            .client
            .table_url("volunteers", &[("on_conflict", "user_id"), ("select", "id")])?;
        let rows: Vec<IdRow> = self
            .client
            .write(
                Method::POST,
                url,
                "return=representation,resolution=merge-duplicates",
                &[VolunteerUpsertRow::new(profile, Utc::now())],
                "upsert volunteer",
            )
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("upsert volunteer: no row returned"))?;
        Ok(VolunteerId(row.id))
    }

    async fn update(&self, id: VolunteerId, patch: &VolunteerPatch) -> Result<(), ClientError> {
        let id_filter = format!("eq.{id}");
        let version_filter = patch
            .expected_version
            .map(|v| format!("eq.{}", v.to_rfc3339()));
        let mut params = vec![("id", id_filter.as_str()), ("select", "id")];
        if let Some(version) = &version_filter {
            params.push(("updated_at", version.as_str()));
        }
        let url = self.client.table_url("volunteers", &params)?;
        let rows: Vec<IdRow> = self
            .client
            .write(
                Method::PATCH,
                url,
                "return=representation",
                &VolunteerPatchRow::new(patch, Utc::now()),
                "update volunteer",
            )
            .await?;
        if !rows.is_empty() {
            return Ok(());
        }
        if version_filter.is_some() && self.exists(id).await? {
            warn!(volunteer_id = %id, "stale profile version");
            return Err(ClientError::Conflict);
        }
        Err(ClientError::VolunteerNotFound)
    }

    async fn replace_skills(&self, id: VolunteerId, names: &[String]) -> Result<(), ClientError> {
        let url = self.client.url("/rest/v1/rpc/update_volunteer_skills")?;
        let args = SkillReplaceArgs {
            p_volunteer_id: id.0,
            p_skill_names: names,
        };
        let req = self.client.request(Method::POST, url).json(&args);
        self.client.send(req, "replace skills").await?;
        Ok(())
    }
}

// ── bookings ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RestBookingRepository {
    pub client: RestClient,
}

impl BookingRepository for RestBookingRepository {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, ClientError> {
        let url = self.client.table_url("bookings", &[])?;
        let rows: Vec<BookingRow> = self
            .client
            .write(
                Method::POST,
                url,
                "return=representation",
                &[NewBookingRow::from(booking)],
                "insert booking",
            )
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("insert booking: no row returned"))?;
        Ok(Booking::try_from(row)?)
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, ClientError> {
        let filter = format!("eq.{id}");
        let rows: Vec<BookingRow> = self
            .client
            .select(
                "bookings",
                &[("select", "*"), ("id", filter.as_str())],
                "select booking",
            )
            .await?;
        rows.into_iter()
            .next()
            .map(|row| Booking::try_from(row).map_err(ClientError::from))
            .transpose()
    }

    async fn list(
        &self,
        scope: &BookingScope,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingListing>, ClientError> {
        let (column, owner) = match scope {
            BookingScope::Client(user_id) => ("client_id", format!("eq.{user_id}")),
            BookingScope::Volunteer(id) => ("volunteer_id", format!("eq.{id}")),
        };
        let status_filter = status.map(|s| format!("eq.{s}"));
        let mut params = vec![
            ("select", BOOKING_LIST_SELECT),
            (column, owner.as_str()),
            ("order", "created_at.desc"),
        ];
        if let Some(filter) = &status_filter {
            params.push(("status", filter.as_str()));
        }
        let rows: Vec<BookingRow> = self.client.select("bookings", &params, "list bookings").await?;
        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_listing() {
                Ok(listing) => listings.push(listing),
                Err(e) => {
                    warn!(booking_id = %id, error = %format!("{e:#}"), "skipping unreadable booking row");
                }
            }
        }
        Ok(listings)
    }

    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<(), ClientError> {
        let filter = format!("eq.{id}");
        let url = self
            .client
            .table_url("bookings", &[("id", filter.as_str()), ("select", "id")])?;
        let rows: Vec<IdRow> = self
            .client
            .write(
                Method::PATCH,
                url,
                "return=representation",
                &StatusPatchRow { status },
                "update booking status",
            )
            .await?;
        if rows.is_empty() {
            return Err(ClientError::BookingNotFound);
        }
        Ok(())
    }

    async fn amounts(
        &self,
        volunteer_id: VolunteerId,
        statuses: &[BookingStatus],
    ) -> Result<Vec<u64>, ClientError> {
        let owner = format!("eq.{volunteer_id}");
        let status_filter = status_in(statuses);
        let rows: Vec<AmountRow> = self
            .client
            .select(
                "bookings",
                &[
                    ("select", "total_amount"),
                    ("volunteer_id", owner.as_str()),
                    ("status", status_filter.as_str()),
                ],
                "select booking amounts",
            )
            .await?;
        Ok(rows.iter().map(AmountRow::amount).collect())
    }
}

// ── feedback ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RestFeedbackRepository {
    pub client: RestClient,
}

impl FeedbackRepository for RestFeedbackRepository {
    async fn insert(&self, feedback: &Feedback) -> Result<(), ClientError> {
        let url = self.client.table_url("feedback", &[])?;
        let req = self
            .client
            .request(Method::POST, url)
            .header(PREFER, "return=minimal")
            .json(&FeedbackRow::from(feedback));
        self.client.send(req, "insert feedback").await?;
        Ok(())
    }
}
