use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use gymdesk_core::{
    booking, catalog, inbox, ledger, schedule_admin, Config, CurrentUser, EligibleAction, Error,
    GymStore, HttpStore, Level, Result, ScheduleFilter, ScheduleView, Snapshot, StoredLogin,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gymdesk")]
#[command(about = "Gym class booking and subscription ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the local data directory (login state)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the document store base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in against the store's user collection
    Login { login: String, password: String },

    /// Sign out
    Logout,

    /// Browse the class schedule
    Schedule {
        /// Only sessions on this calendar day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Only sessions of this level (beginner, intermediate, advanced)
        #[arg(long)]
        level: Option<Level>,

        /// Only sessions of this trainer
        #[arg(long)]
        trainer: Option<u64>,

        /// Search in titles and trainer names
        #[arg(long)]
        search: Option<String>,

        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Book a seat on a session
    Book { session_id: u64 },

    /// Cancel your booking on a session
    Cancel { session_id: u64 },

    /// List your subscriptions
    Subs,

    /// List the subscription type offerings
    Types,

    /// Buy a subscription from the catalog
    Buy { type_id: u64 },

    /// Show your notifications
    Notifications {
        /// Mark everything shown as read
        #[arg(long)]
        mark_read: bool,
    },

    /// Send feedback to the staff
    Feedback { subject: String, message: String },

    /// List who is booked on a session (trainers and admins)
    Roster { session_id: u64 },

    /// Update attendance on a booking (trainers and admins)
    Attendance {
        booking_id: u64,

        /// Mark the client absent instead of present
        #[arg(long)]
        absent: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    gymdesk_core::logging::init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    if let Some(base_url) = cli.base_url {
        config.store.base_url = base_url;
    }

    let store = HttpStore::new(&config.store);
    let login_path = config.login_state_path();

    match cli.command {
        Commands::Login { login, password } => cmd_login(&store, &login_path, &login, &password).await,
        Commands::Logout => cmd_logout(&login_path),
        Commands::Schedule {
            date,
            level,
            trainer,
            search,
            page,
        } => {
            let filter = ScheduleFilter {
                day: date,
                level,
                trainer_id: trainer,
                search,
            };
            cmd_schedule(&store, &login_path, filter, page, config.view.page_size).await
        }
        Commands::Book { session_id } => cmd_book(&store, &login_path, session_id).await,
        Commands::Cancel { session_id } => cmd_cancel(&store, &login_path, session_id).await,
        Commands::Subs => cmd_subs(&store, &login_path).await,
        Commands::Types => cmd_types(&store).await,
        Commands::Buy { type_id } => cmd_buy(&store, &login_path, type_id).await,
        Commands::Notifications { mark_read } => {
            cmd_notifications(&store, &login_path, mark_read).await
        }
        Commands::Feedback { subject, message } => {
            cmd_feedback(&store, &login_path, &subject, &message).await
        }
        Commands::Roster { session_id } => cmd_roster(&store, &login_path, session_id).await,
        Commands::Attendance { booking_id, absent } => {
            cmd_attendance(&store, &login_path, booking_id, absent).await
        }
    }
}

/// The signed-in user, or a sign-in prompt as an error
fn current_user(login_path: &std::path::Path) -> Result<CurrentUser> {
    StoredLogin::load(login_path)
        .map(|login| login.current_user())
        .ok_or(Error::PermissionDenied("sign in first with `gymdesk login`"))
}

async fn cmd_login(
    store: &HttpStore,
    login_path: &std::path::Path,
    login: &str,
    password: &str,
) -> Result<()> {
    let user = store
        .find_user(login, password)
        .await
        .ok_or(Error::PermissionDenied("unknown login or wrong password"))?;

    let state = StoredLogin {
        user_id: user.id,
        name: user.name.clone(),
        role: user.role,
        logged_in_at: Utc::now(),
    };
    state.save(login_path)?;

    println!("Signed in as {} ({})", user.name, user.role);
    Ok(())
}

fn cmd_logout(login_path: &std::path::Path) -> Result<()> {
    StoredLogin::clear(login_path)?;
    println!("Signed out");
    Ok(())
}

fn action_label(action: EligibleAction) -> &'static str {
    match action {
        EligibleAction::RequireLogin => "sign in to book",
        EligibleAction::ClientsOnly => "clients only",
        EligibleAction::NotOpen => "not open",
        EligibleAction::Cancel => "booked - you may cancel",
        EligibleAction::Full => "full",
        EligibleAction::Book => "book",
    }
}

async fn cmd_schedule(
    store: &HttpStore,
    login_path: &std::path::Path,
    filter: ScheduleFilter,
    page: usize,
    page_size: usize,
) -> Result<()> {
    let user = StoredLogin::load(login_path).map(|l| l.current_user());

    let snapshot = Snapshot::fetch(store).await;
    let mut view = ScheduleView::new(snapshot, page_size);
    view.set_filter(filter);
    view.set_page(page);

    let items = view.page_items();
    if items.is_empty() {
        println!("No sessions match the current filters");
        return Ok(());
    }

    for session in items {
        let snapshot = view.snapshot();
        let seats = booking::seats_left_display(session, &snapshot.bookings);
        let action = booking::eligible_action(user.as_ref(), session, &snapshot.bookings);

        println!(
            "#{:<4} {}  {}  [{}]  trainer: {}  seats: {}/{}  {}  ({})",
            session.id,
            session.starts_at.format("%Y-%m-%d %H:%M"),
            session.title,
            session.level,
            snapshot.trainer_name(session.trainer_id),
            seats,
            session.capacity,
            session.status,
            action_label(action),
        );
    }
    println!("page {}/{}", view.page(), view.total_pages());
    Ok(())
}

async fn cmd_book(store: &HttpStore, login_path: &std::path::Path, session_id: u64) -> Result<()> {
    let user = current_user(login_path)?;
    let outcome = booking::book(store, Some(&user), session_id, Utc::now()).await?;

    if let Some(gift) = &outcome.gift {
        println!(
            "Welcome gift: a free subscription with {} sessions, valid until {}",
            gift.sessions_total.unwrap_or(0),
            gift.end_date.map(|d| d.to_string()).unwrap_or_default()
        );
    }
    println!("Booked session {} (booking {})", session_id, outcome.booking.id);
    if outcome.debit_failed {
        println!("warning: your subscription balance could not be updated; it may show a stale count");
    }
    Ok(())
}

async fn cmd_cancel(store: &HttpStore, login_path: &std::path::Path, session_id: u64) -> Result<()> {
    let user = current_user(login_path)?;
    let outcome = booking::cancel(store, Some(&user), session_id).await?;

    println!("Booking cancelled");
    if let Some(sub) = &outcome.restored {
        println!(
            "Session returned to your subscription: {} left",
            sub.sessions_left
        );
    }
    if outcome.credit_failed {
        println!("warning: the session could not be returned to your subscription");
    }
    Ok(())
}

async fn cmd_subs(store: &HttpStore, login_path: &std::path::Path) -> Result<()> {
    let user = current_user(login_path)?;
    let subs = store.subscriptions_by_client(user.id).await;

    if subs.is_empty() {
        println!("You have no subscriptions");
        return Ok(());
    }

    for sub in subs {
        let left = match sub.sessions_total {
            Some(total) => format!("{} of {}", sub.sessions_left, total),
            None => "unlimited".into(),
        };
        let until = sub
            .end_date
            .map(|d| format!(", valid until {d}"))
            .unwrap_or_default();
        println!("#{:<4} {}  sessions left: {}{}", sub.id, sub.type_label, left, until);
    }
    Ok(())
}

async fn cmd_types(store: &HttpStore) -> Result<()> {
    let types = catalog::subscription_types(store).await;

    if types.is_empty() {
        println!("No subscription types on offer");
        return Ok(());
    }

    for ty in types {
        let sessions = ty
            .sessions
            .map(|n| format!("{n} sessions"))
            .unwrap_or_else(|| "unlimited".into());
        println!("#{:<4} {}  {}  price: {}", ty.id, ty.name, sessions, ty.price);
    }
    Ok(())
}

async fn cmd_buy(store: &HttpStore, login_path: &std::path::Path, type_id: u64) -> Result<()> {
    let user = current_user(login_path)?;
    if !user.is_client() {
        return Err(Error::PermissionDenied("purchases are available to clients only"));
    }

    let ty = catalog::subscription_types(store)
        .await
        .into_iter()
        .find(|t| t.id == type_id)
        .ok_or(Error::NotFound("subscription type"))?;

    let sub = ledger::purchase(store, user.id, &ty, Utc::now()).await?;
    println!(
        "Purchased {} - valid until {}",
        sub.type_label,
        sub.end_date.map(|d| d.to_string()).unwrap_or_default()
    );
    Ok(())
}

async fn cmd_notifications(
    store: &HttpStore,
    login_path: &std::path::Path,
    mark_read: bool,
) -> Result<()> {
    let user = current_user(login_path)?;
    let notifications = inbox::fetch_inbox(store, &user).await;

    if notifications.is_empty() {
        println!("No notifications");
        return Ok(());
    }

    println!("{} unread", inbox::unread_count(&notifications));
    for n in &notifications {
        let marker = if n.read { " " } else { "*" };
        println!("{} {}  {}", marker, n.sent_at.format("%Y-%m-%d %H:%M"), n.message);
    }

    if mark_read {
        for n in notifications.iter().filter(|n| !n.read) {
            inbox::mark_read(store, n.id).await?;
        }
        println!("All notifications marked as read");
    }
    Ok(())
}

async fn cmd_feedback(
    store: &HttpStore,
    login_path: &std::path::Path,
    subject: &str,
    message: &str,
) -> Result<()> {
    let user = current_user(login_path)?;
    inbox::send_feedback(store, &user, subject, message, Utc::now()).await?;
    println!("Feedback sent");
    Ok(())
}

async fn cmd_roster(store: &HttpStore, login_path: &std::path::Path, session_id: u64) -> Result<()> {
    let user = current_user(login_path)?;
    let session = store
        .session(session_id)
        .await
        .ok_or(Error::NotFound("session"))?;
    if !schedule_admin::can_edit_session(Some(&user), &session) {
        return Err(Error::PermissionDenied("not your session"));
    }

    let roster = schedule_admin::roster(store, session_id).await;
    if roster.is_empty() {
        println!("Nobody is booked on session {session_id}");
        return Ok(());
    }

    for (booking, client) in roster {
        let name = client.map(|c| c.name).unwrap_or_else(|| "unknown".into());
        println!("#{:<4} {}  ({})", booking.id, name, booking.status);
    }
    Ok(())
}

async fn cmd_attendance(
    store: &HttpStore,
    login_path: &std::path::Path,
    booking_id: u64,
    absent: bool,
) -> Result<()> {
    let user = current_user(login_path)?;
    let updated = schedule_admin::mark_attendance(store, Some(&user), booking_id, !absent).await?;
    println!("Booking {} is now {}", updated.id, updated.status);
    Ok(())
}
