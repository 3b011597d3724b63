//! Terminal front-end: one subcommand per page action.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use slotbook_domain::booking::{BookingRequest, BookingStatus, DurationHours};
use slotbook_domain::id::{BookingId, VolunteerId};
use slotbook_domain::user::Role;
use slotbook_domain::volunteer::{ProfileDraft, SkillSet, VolunteerProfile};

use crate::app::App;
use crate::discovery::{HiddenVolunteers, ListingFilter, filter_listings, skill_chips};
use crate::domain::repository::{BookingFeed, IdentityService};
use crate::domain::types::{BookingListing, PhotoUpload};
use crate::error::ClientError;
use crate::guard::{Resolution, Route, navigate, resolve};
use crate::notice::Notice;
use crate::usecase::booking::{
    ChangeBookingStatusUseCase, CreateBookingUseCase, ListBookingsUseCase,
};
use crate::usecase::feedback::{SubmitFeedbackInput, SubmitFeedbackUseCase};
use crate::usecase::listing::{GetVolunteerUseCase, ListVolunteersUseCase};
use crate::usecase::profile::{EditProfileUseCase, SaveProfileInput, SaveProfileUseCase};
use crate::usecase::stats::VolunteerStatsUseCase;

#[derive(Debug, Parser)]
#[command(name = "slotbook", about = "Book volunteers and manage your listing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    SignOut,
    /// Show the signed-in user
    Whoami,
    /// Choose a role (once per user and device)
    Role { role: Role },
    /// Show where a path resolves for the current session
    Route { path: String },
    /// Browse volunteer listings
    Volunteers {
        #[arg(long, default_value = "")]
        search: String,
        /// Exact skill name
        #[arg(long)]
        category: Option<String>,
        /// Show hidden volunteers instead
        #[arg(long)]
        archived: bool,
    },
    /// Show one volunteer
    Volunteer { id: VolunteerId },
    /// Hide a volunteer from the listing on this device
    Hide { id: VolunteerId },
    Unhide { id: VolunteerId },
    /// Request a booking
    Book {
        id: VolunteerId,
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// HH:MM
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        #[arg(long, default_value_t = 1)]
        hours: u8,
        #[arg(long)]
        message: Option<String>,
    },
    /// List your bookings
    Bookings {
        #[arg(long)]
        status: Option<BookingStatus>,
    },
    Accept { id: BookingId },
    Decline { id: BookingId },
    Cancel { id: BookingId },
    Complete { id: BookingId },
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Earnings and pending requests
    Stats,
    /// Send feedback
    Feedback {
        #[arg(long)]
        message: String,
        #[arg(long, default_value_t = 5)]
        rating: u8,
    },
    /// Follow incoming booking requests until interrupted
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    Show,
    /// Post or overwrite your listing
    Save {
        #[command(flatten)]
        fields: ProfileArgs,
        /// Profile photo, at most 5 MiB
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Edit the listing you already posted
    Edit(ProfileArgs),
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub bio: String,
    /// Hourly rate in whole currency units
    #[arg(long)]
    pub rate: u32,
    #[arg(long)]
    pub availability: String,
    /// Repeat for each skill
    #[arg(long = "skill")]
    pub skills: Vec<String>,
}

impl ProfileArgs {
    fn draft(&self) -> ProfileDraft {
        ProfileDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            bio: self.bio.clone(),
            hourly_rate: self.rate,
            availability: self.availability.clone(),
            skills: SkillSet::from_names(&self.skills),
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM, got {raw:?}"))
}

impl Command {
    /// Page the command acts on. `None` for commands that bypass the guard.
    fn route(&self, role: Option<Role>) -> Option<Route> {
        let route = match self {
            Self::SignIn { .. } => Route::Auth,
            Self::SignOut | Self::Route { .. } => return None,
            Self::Whoami | Self::Profile { action: ProfileCommand::Show } => Route::Profile,
            Self::Profile { action: ProfileCommand::Edit(_) } => Route::Profile,
            Self::Profile { action: ProfileCommand::Save { .. } } => Route::VolunteerProfileEditor,
            Self::Role { .. } => Route::RoleSelection,
            Self::Volunteers { .. } | Self::Hide { .. } | Self::Unhide { .. } => {
                Route::ClientDashboard
            }
            Self::Volunteer { id } => Route::Volunteer(*id),
            Self::Book { id, .. } => Route::Book(*id),
            Self::Bookings { .. } => match role {
                Some(Role::Volunteer) => Route::VolunteerBookings,
                _ => Route::MyBookings,
            },
            Self::Cancel { .. } => Route::MyBookings,
            Self::Accept { .. } | Self::Decline { .. } | Self::Complete { .. } | Self::Watch => {
                Route::VolunteerDashboard
            }
            Self::Stats => Route::VolunteerAnalytics,
            Self::Feedback { .. } => Route::Contact,
        };
        Some(route)
    }

    fn failure_title(&self) -> &'static str {
        match self {
            Self::SignIn { .. } => "Sign-in failed",
            Self::Book { .. } => "Booking Failed",
            Self::Profile { action: ProfileCommand::Save { .. } } => "Upload Failed",
            Self::Profile { action: ProfileCommand::Edit(_) } => "Error updating profile",
            Self::Feedback { .. } => "Failed to submit feedback",
            _ => "Error",
        }
    }
}

/// Run one command and turn its outcome into a notice.
pub async fn run(app: &App, command: Command) -> Notice {
    let title = command.failure_title();
    match execute(app, command).await {
        Ok(notice) => notice,
        Err(e) => {
            if !e.is_not_found() {
                error!(kind = e.kind(), error = %e.detail(), "command failed");
            }
            failure_notice(title, &e, app.guard().role)
        }
    }
}

/// Notice for a failed command. Missing detail pages offer a single way back
/// to the role's dashboard.
pub fn failure_notice(title: &str, err: &ClientError, role: Option<Role>) -> Notice {
    if err.is_not_found() {
        let back = role.map_or(Route::Root, Route::dashboard);
        return Notice::error(title, format!("{err}. Go back with `slotbook route {back}`"));
    }
    Notice::from_error(title, err, "Something went wrong. Please try again.")
}

/// Notice explaining a guard redirect, or `None` if the page renders.
fn gate(app: &App, route: &Route) -> Option<Notice> {
    let target = match resolve(route, &app.guard()) {
        Resolution::Render(_) => return None,
        Resolution::Loading => {
            return Some(Notice::error("Loading", "Session is still loading"));
        }
        Resolution::Redirect(target) => target,
    };
    let hint = match &target {
        Route::Auth => "Sign in first: `slotbook sign-in --email .. --password ..`".to_owned(),
        Route::RoleSelection => "Choose a role first: `slotbook role <volunteer|client>`".to_owned(),
        other => format!("Nothing to do here; continue at {other}"),
    };
    info!(from = %route, to = %target, "redirected");
    Some(Notice::error(format!("{route} redirected to {target}"), hint))
}

async fn execute(app: &App, command: Command) -> Result<Notice, ClientError> {
    if let Some(route) = command.route(app.guard().role) {
        if let Some(notice) = gate(app, &route) {
            return Ok(notice);
        }
    }

    match command {
        Command::SignIn { email, password } => {
            let user = app.identity.sign_in_with_password(&email, &password).await?;
            app.sync_session().await?;
            Ok(Notice::success(
                format!("Welcome, {}", user.display_name()),
                landing(app),
            ))
        }
        Command::SignOut => {
            app.identity.sign_out().await?;
            app.sync_session().await?;
            Ok(Notice::success("Signed out", "See you soon."))
        }
        Command::Whoami => {
            let state = app.store.snapshot();
            let user = app.store.require_user()?;
            println!("id:      {}", user.id);
            println!("name:    {}", user.name);
            println!("email:   {}", user.email);
            println!("role:    {}", user.role.map_or("none", Role::as_str));
            if let Some(profile) = &state.current_profile {
                println!("listing: {} ({})", profile.name, profile.id);
            }
            Ok(Notice::success("Profile", user.name))
        }
        Command::Role { role } => {
            app.sync().select_role(role).await?;
            Ok(Notice::success(format!("You are a {role}"), landing(app)))
        }
        Command::Route { path } => {
            let description = match navigate(&path, &app.guard()) {
                Resolution::Loading => "loading".to_owned(),
                Resolution::Render(route) | Resolution::Redirect(route) => {
                    format!("renders {route}")
                }
            };
            Ok(Notice::success(path, description))
        }
        Command::Volunteers {
            search,
            category,
            archived,
        } => {
            let all = ListVolunteersUseCase {
                repo: app.volunteers(),
            }
            .execute()
            .await?;
            let hidden = HiddenVolunteers::load(&app.local);
            let filter = ListingFilter {
                search,
                category,
                archived,
            };
            let shown = filter_listings(&all, &hidden, &filter);
            for volunteer in &shown {
                println!("{}", volunteer_line(volunteer));
            }
            let chips = skill_chips(&all);
            if !chips.is_empty() {
                println!("categories: {}", chips.join(" · "));
            }
            let label = if archived { "hidden" } else { "shown" };
            Ok(Notice::success(
                "Volunteers",
                format!("{} of {} {label}", shown.len(), all.len()),
            ))
        }
        Command::Volunteer { id } => {
            let volunteer = GetVolunteerUseCase {
                repo: app.volunteers(),
            }
            .execute(id)
            .await?;
            print_profile(&volunteer);
            Ok(Notice::success(volunteer.name, "Book with `slotbook book`"))
        }
        Command::Hide { id } => {
            let mut hidden = HiddenVolunteers::load(&app.local);
            if hidden.hide(id) {
                hidden.save(&app.local)?;
            }
            Ok(Notice::success("Volunteer hidden", "Find them again with --archived"))
        }
        Command::Unhide { id } => {
            let mut hidden = HiddenVolunteers::load(&app.local);
            if hidden.unhide(id) {
                hidden.save(&app.local)?;
            }
            Ok(Notice::success("Volunteer restored", "Back in your listing"))
        }
        Command::Book {
            id,
            date,
            time,
            hours,
            message,
        } => {
            let request = BookingRequest {
                volunteer_id: id,
                date,
                time,
                duration: DurationHours::new(hours)?,
                message,
            };
            let booking = CreateBookingUseCase {
                volunteers: app.volunteers(),
                bookings: app.bookings(),
                store: app.store.clone(),
            }
            .execute(request)
            .await?;
            println!("booking {}", booking.id);
            Ok(Notice::success(
                "Booking Request Sent!",
                format!(
                    "Total ₹{}. The volunteer will respond to your request soon.",
                    booking.total_amount
                ),
            ))
        }
        Command::Bookings { status } => {
            let listings = ListBookingsUseCase {
                bookings: app.bookings(),
                store: app.store.clone(),
            }
            .execute(status)
            .await?;
            for listing in &listings {
                println!("{}", booking_line(listing));
            }
            Ok(Notice::success(
                "Bookings",
                format!("{} booking(s)", listings.len()),
            ))
        }
        Command::Accept { id } => {
            change_status(app, id, BookingStatus::Confirmed).await?;
            Ok(Notice::success(
                "Booking Accepted!",
                "The request has been removed from your queue.",
            ))
        }
        Command::Decline { id } => {
            change_status(app, id, BookingStatus::Declined).await?;
            Ok(Notice::success(
                "Booking Declined",
                "The request has been removed from your queue.",
            ))
        }
        Command::Cancel { id } => {
            change_status(app, id, BookingStatus::Cancelled).await?;
            Ok(Notice::success("Booking Cancelled", "The volunteer has been notified."))
        }
        Command::Complete { id } => {
            change_status(app, id, BookingStatus::Completed).await?;
            let sessions = app.store.require_profile()?.total_bookings;
            Ok(Notice::success(
                "Booking Completed",
                format!("{sessions} session(s) completed so far."),
            ))
        }
        Command::Profile { action } => profile(app, action).await,
        Command::Stats => {
            let stats = VolunteerStatsUseCase {
                bookings: app.bookings(),
                store: app.store.clone(),
            }
            .execute()
            .await?;
            println!("earnings:  ₹{}", stats.earnings);
            println!("sessions:  {}", stats.completed_sessions);
            println!("rating:    {:.1}", stats.rating);
            println!("pending:   {}", stats.pending.len());
            for listing in &stats.pending {
                println!("  {}", booking_line(listing));
            }
            Ok(Notice::success("Analytics", "Up to date"))
        }
        Command::Feedback { message, rating } => {
            SubmitFeedbackUseCase {
                repo: app.feedback(),
                store: app.store.clone(),
            }
            .execute(SubmitFeedbackInput { message, rating })
            .await?;
            Ok(Notice::success(
                "Feedback submitted successfully!",
                "Thank you for helping us improve.",
            ))
        }
        Command::Watch => watch(app).await,
    }
}

async fn change_status(app: &App, id: BookingId, to: BookingStatus) -> Result<(), ClientError> {
    ChangeBookingStatusUseCase {
        volunteers: app.volunteers(),
        bookings: app.bookings(),
        store: app.store.clone(),
    }
    .execute(id, to)
    .await?;
    Ok(())
}

async fn profile(app: &App, action: ProfileCommand) -> Result<Notice, ClientError> {
    match action {
        ProfileCommand::Show => {
            let profile = app.store.require_profile()?;
            print_profile(&profile);
            Ok(Notice::success("Your listing", profile.name))
        }
        ProfileCommand::Save { fields, photo } => {
            let photo = match photo {
                Some(path) => Some(read_photo(&path).await?),
                None => None,
            };
            let saved = SaveProfileUseCase {
                volunteers: app.volunteers(),
                storage: app.storage(),
                identity: Arc::clone(&app.identity),
                store: app.store.clone(),
            }
            .execute(SaveProfileInput {
                draft: fields.draft(),
                photo,
            })
            .await?;
            print_profile(&saved);
            Ok(Notice::success(
                "Profile Posted Successfully!",
                "Your profile is now live.",
            ))
        }
        ProfileCommand::Edit(fields) => {
            let saved = EditProfileUseCase {
                volunteers: app.volunteers(),
                store: app.store.clone(),
            }
            .execute(fields.draft())
            .await?;
            print_profile(&saved);
            Ok(Notice::success(
                "Profile updated successfully!",
                "Your changes are live.",
            ))
        }
    }
}

/// Print the pending queue, then re-fetch it on every insert aimed at the
/// signed-in volunteer until ctrl-c or the feed closes.
async fn watch(app: &App) -> Result<Notice, ClientError> {
    let profile = app.store.require_profile()?;
    let stats = VolunteerStatsUseCase {
        bookings: app.bookings(),
        store: app.store.clone(),
    };
    print_pending(&stats.execute().await?.pending);

    let mut subscription = app.feed().subscribe_inserts().await?;
    println!("watching for new requests, ctrl-c to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = subscription.next() => match event {
                Some(event) if event.volunteer_id == profile.id => {
                    println!("new request {}", event.booking_id);
                    print_pending(&stats.execute().await?.pending);
                }
                Some(_) => {}
                None => {
                    warn!("booking feed closed");
                    break;
                }
            },
        }
    }
    Ok(Notice::success("Stopped watching", "No longer following new requests"))
}

async fn read_photo(path: &Path) -> Result<PhotoUpload, ClientError> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_owned());
    let content_type = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    };
    Ok(PhotoUpload {
        file_name,
        content_type: content_type.to_owned(),
        bytes,
    })
}

fn landing(app: &App) -> String {
    match navigate("/", &app.guard()) {
        Resolution::Render(Route::RoleSelection) => {
            "Choose a role with `slotbook role <volunteer|client>`".to_owned()
        }
        Resolution::Render(route) | Resolution::Redirect(route) => format!("Continue at {route}"),
        Resolution::Loading => "Loading".to_owned(),
    }
}

fn volunteer_line(v: &VolunteerProfile) -> String {
    format!(
        "{}  {}  ₹{}/hour  {:.1}★  {} sessions  [{}]",
        v.id,
        v.name,
        v.hourly_rate,
        v.rating,
        v.total_bookings,
        v.skills.names().join(", ")
    )
}

fn booking_line(listing: &BookingListing) -> String {
    let b = &listing.booking;
    let with = listing
        .volunteer
        .as_ref()
        .map(|v| format!("  with {} (₹{}/hour)", v.name, v.hourly_rate))
        .unwrap_or_default();
    format!(
        "{}  {} {}  {}h  ₹{}  {}{with}",
        b.id,
        b.date,
        b.time.format("%H:%M"),
        b.duration.get(),
        b.total_amount,
        b.status
    )
}

fn print_pending(pending: &[BookingListing]) {
    if pending.is_empty() {
        println!("no pending requests");
    }
    for listing in pending {
        println!("{}", booking_line(listing));
    }
}

fn print_profile(p: &VolunteerProfile) {
    println!("{}  ({})", p.name, p.id);
    println!("  {}", p.bio);
    println!("  ₹{}/hour · {:.1}★ · {} sessions", p.hourly_rate, p.rating, p.total_bookings);
    println!("  available: {}", p.availability);
    println!("  contact:   {} · {}", p.email, p.phone);
    if !p.skills.is_empty() {
        println!("  skills:    {}", p.skills.names().join(", "));
    }
    if let Some(photo) = &p.profile_photo {
        println!("  photo:     {photo}");
    }
}
