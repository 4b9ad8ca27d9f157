//! Application state management for tarotdesk.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, loaded tables, the backend session, and background task
//! coordination. Bulk loads run in a spawned task and report back over a channel;
//! edits are awaited inline and followed by a reload of the current tab.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use tarotdesk_core::auth::{AuthGate, AuthState, CredentialStore, Session};
use tarotdesk_core::cache::{CacheAges, CacheManager};
use tarotdesk_core::demo;
use tarotdesk_core::models::{
    Announcement, Booking, BookingFilter, BookingStatus, BookingSummary, CardNumber, DigitalReading,
    Meditation, Member, MemberFilter, MemberStats, ModuleWithLessons, ReadingHistory, ReadingProduct,
    Resource, ResourceCategory, StatusFilter, WeeklyMessage,
};
use tarotdesk_core::readings::ReadingFlow;
use tarotdesk_core::services::announcement::ANNOUNCEMENTS_TABLE;
use tarotdesk_core::services::booking::BOOKINGS_TABLE;
use tarotdesk_core::services::course::MODULES_TABLE;
use tarotdesk_core::services::meditation::MEDITATIONS_TABLE;
use tarotdesk_core::services::member::MEMBERS_TABLE;
use tarotdesk_core::services::message::WEEKLY_MESSAGES_TABLE;
use tarotdesk_core::services::product::{self, READING_PRODUCTS_TABLE};
use tarotdesk_core::services::reading::DIGITAL_READINGS_TABLE;
use tarotdesk_core::services::resource::RESOURCES_TABLE;
use tarotdesk_core::services::{next_available_module_number, DashboardStats, LessonLocation, LessonRef};
use tarotdesk_core::utils::contains_ignore_case;
use tarotdesk_core::{Backend, Config, RestClient, ServiceResult, Services};

use crate::forms::{self, Form, FormKind};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// A full refresh sends one message per table plus completion.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Maximum length of the search query.
const MAX_SEARCH_LENGTH: usize = 50;

/// Tables kept as local snapshots. Modules are stored with their lessons.
pub const CACHED_TABLES: [&str; 9] = [
    MODULES_TABLE,
    MEMBERS_TABLE,
    BOOKINGS_TABLE,
    ANNOUNCEMENTS_TABLE,
    MEDITATIONS_TABLE,
    RESOURCES_TABLE,
    DIGITAL_READINGS_TABLE,
    WEEKLY_MESSAGES_TABLE,
    READING_PRODUCTS_TABLE,
];

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Members,
    Bookings,
    Courses,
    Meditations,
    Resources,
    Announcements,
    Readings,
    Messages,
    Products,
}

impl Tab {
    pub const ALL: [Tab; 10] = [
        Tab::Dashboard,
        Tab::Members,
        Tab::Bookings,
        Tab::Courses,
        Tab::Meditations,
        Tab::Resources,
        Tab::Announcements,
        Tab::Readings,
        Tab::Messages,
        Tab::Products,
    ];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Members => "Members",
            Tab::Bookings => "Bookings",
            Tab::Courses => "Courses",
            Tab::Meditations => "Meditations",
            Tab::Resources => "Resources",
            Tab::Announcements => "Announcements",
            Tab::Readings => "Readings",
            Tab::Messages => "Messages",
            Tab::Products => "Products",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Tabs are numbered 1-9, with 0 for the tenth.
    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '1'..='9' => Self::ALL.get(c as usize - '1' as usize).copied(),
            '0' => Some(Tab::Products),
            _ => None,
        }
    }

    pub fn shortcut(&self) -> char {
        match self.index() {
            9 => '0',
            i => char::from(b'1' + i as u8),
        }
    }

    /// Snapshot table backing this tab, for the status bar age
    pub fn table(&self) -> Option<&'static str> {
        match self {
            Tab::Dashboard => None,
            Tab::Members => Some(MEMBERS_TABLE),
            Tab::Bookings => Some(BOOKINGS_TABLE),
            Tab::Courses => Some(MODULES_TABLE),
            Tab::Meditations => Some(MEDITATIONS_TABLE),
            Tab::Resources => Some(RESOURCES_TABLE),
            Tab::Announcements => Some(ANNOUNCEMENTS_TABLE),
            Tab::Readings => Some(DIGITAL_READINGS_TABLE),
            Tab::Messages => Some(WEEKLY_MESSAGES_TABLE),
            Tab::Products => Some(READING_PRODUCTS_TABLE),
        }
    }
}

/// Current UI focus area. On the Courses tab the detail panel holds the
/// selected module's lessons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    EditingForm,
    ConfirmingDelete,
    ConfirmingQuit,
    LookingUp,
    ViewingLesson,
    AuthRequired,
    Quitting,
}

/// A record the user asked to delete, awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTarget {
    pub kind: FormKind,
    pub id: String,
    pub label: String,
}

/// Reading history shown beside a member.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberHistory {
    pub member_id: String,
    pub entries: Vec<ReadingHistory>,
}

/// Lesson viewer overlay: a `?module=N&lesson=M` query and what it found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonViewer {
    pub query: String,
    pub location: Option<LessonLocation>,
    pub error: Option<String>,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Result types from background refresh tasks.
///
/// These variants are sent through an MPSC channel from the refresh task back
/// to the main application. Each carries the full contents of one table.
enum RefreshResult {
    Stats(DashboardStats),
    /// Modules with their lessons
    Modules(Vec<ModuleWithLessons>),
    Members(Vec<Member>),
    Bookings(Vec<Booking>),
    Announcements(Vec<Announcement>),
    Meditations(Vec<Meditation>),
    Resources(Vec<Resource>),
    Readings(Vec<DigitalReading>),
    Messages(Vec<WeeklyMessage>),
    Products(Vec<ReadingProduct>),
    /// Signal that all refresh tasks have completed
    RefreshComplete,
    /// An error occurred during refresh
    Error(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub services: Services,
    auth: AuthGate,
    cache: Option<CacheManager>,
    pub demo_mode: bool,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub search_query: String,
    pub member_filter: MemberFilter,
    pub booking_filter: BookingFilter,
    pub resource_category: Option<ResourceCategory>,
    pub product_status: StatusFilter,

    // Selection indices
    pub member_selection: usize,
    pub booking_selection: usize,
    pub module_selection: usize,
    pub lesson_selection: usize,
    pub meditation_selection: usize,
    pub resource_selection: usize,
    pub announcement_selection: usize,
    pub reading_selection: usize,
    pub message_selection: usize,
    pub product_selection: usize,

    // Loaded data
    pub stats: Option<DashboardStats>,
    pub modules: Vec<ModuleWithLessons>,
    pub members: Vec<Member>,
    pub bookings: Vec<Booking>,
    pub announcements: Vec<Announcement>,
    pub meditations: Vec<Meditation>,
    pub resources: Vec<Resource>,
    pub readings: Vec<DigitalReading>,
    pub messages: Vec<WeeklyMessage>,
    pub products: Vec<ReadingProduct>,
    pub member_history: Option<MemberHistory>,

    // Overlays
    pub form: Option<Form>,
    pub delete_target: Option<DeleteTarget>,
    pub lookup: ReadingFlow,
    pub lookup_input: String,
    pub lookup_error: Option<String>,
    pub lesson_viewer: LessonViewer,

    // Session
    pub user_label: Option<String>,
    pub auth_message: Option<String>,

    // Background task channel
    refresh_rx: Option<mpsc::Receiver<RefreshResult>>,
    refresh_tx: mpsc::Sender<RefreshResult>,
    pub refreshing: bool,

    // Status line and dismissible error banner
    pub status_message: Option<String>,
    pub error_banner: Option<String>,

    // Cache ages for status bar
    pub cache_ages: CacheAges,
}

impl App {
    /// Create a new application instance.
    ///
    /// In demo mode the app runs over a seeded in-memory backend and keeps no
    /// snapshots; otherwise it talks to the configured hosted backend.
    pub async fn new(demo_mode: bool) -> Result<Self> {
        debug!(demo_mode, "App::new() starting");
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let (backend, services, auth, cache) = if demo_mode {
            let backend: Arc<dyn Backend> = Arc::new(demo::backend());
            let services = Services::new(backend.clone());
            demo::seed(&services).await.context("Failed to seed demo data")?;
            let session = Session::new(cache_dir.join("demo"));
            let mut auth = AuthGate::new(backend.clone(), session)
                .with_credentials(demo::DEMO_EMAIL, demo::DEMO_PASSWORD);
            // Tokens from an earlier demo run mean nothing to a fresh backend
            if let Err(e) = auth.sign_out() {
                debug!(error = %e, "No previous demo session to clear");
            }
            (backend, services, auth, None)
        } else {
            let (url, key) = config.backend().ok_or_else(|| {
                anyhow::anyhow!(
                    "Backend not configured. Set {} and {}, or run with --demo.",
                    tarotdesk_core::config::ENV_BACKEND_URL,
                    tarotdesk_core::config::ENV_ANON_KEY
                )
            })?;
            let backend: Arc<dyn Backend> = Arc::new(RestClient::new(url, key)?);
            let services = Services::new(backend.clone());
            // Sessions and snapshots belong to one backend project
            let project_dir = tarotdesk_core::config::project_dir_in(&cache_dir, Some(url));
            debug!(?project_dir, "Project directory configured");
            let mut auth = AuthGate::new(backend.clone(), Session::new(project_dir.clone()));
            if let Some((email, password)) = Self::admin_credentials(&config) {
                auth = auth.with_credentials(&email, &password);
            }
            let cache = match CacheManager::new(project_dir) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(error = %e, "Snapshot cache unavailable");
                    None
                }
            };
            (backend, services, auth, cache)
        };
        info!(backend = backend.backend_name(), "Backend ready");

        Ok(Self::from_parts(config, services, auth, cache, demo_mode))
    }

    fn from_parts(
        config: Config,
        services: Services,
        auth: AuthGate,
        cache: Option<CacheManager>,
        demo_mode: bool,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            services,
            auth,
            cache,
            demo_mode,

            state: AppState::Normal,
            current_tab: Tab::Dashboard,
            focus: Focus::List,
            search_query: String::new(),
            member_filter: MemberFilter::default(),
            booking_filter: BookingFilter::default(),
            resource_category: None,
            product_status: StatusFilter::All,

            member_selection: 0,
            booking_selection: 0,
            module_selection: 0,
            lesson_selection: 0,
            meditation_selection: 0,
            resource_selection: 0,
            announcement_selection: 0,
            reading_selection: 0,
            message_selection: 0,
            product_selection: 0,

            stats: None,
            modules: Vec::new(),
            members: Vec::new(),
            bookings: Vec::new(),
            announcements: Vec::new(),
            meditations: Vec::new(),
            resources: Vec::new(),
            readings: Vec::new(),
            messages: Vec::new(),
            products: Vec::new(),
            member_history: None,

            form: None,
            delete_target: None,
            lookup: ReadingFlow::new(),
            lookup_input: String::new(),
            lookup_error: None,
            lesson_viewer: LessonViewer::default(),

            user_label: None,
            auth_message: None,

            refresh_rx: Some(rx),
            refresh_tx: tx,
            refreshing: false,

            status_message: None,
            error_banner: None,
            cache_ages: CacheAges::default(),
        }
    }

    /// Admin email and password from the environment, else the keychain.
    fn admin_credentials(config: &Config) -> Option<(String, String)> {
        let email = config.admin_email.clone()?;
        let password = match &config.admin_password {
            Some(p) => p.clone(),
            None => match CredentialStore::for_backend(config.backend_url.as_deref()).get_password(&email) {
                Ok(p) => p,
                Err(e) => {
                    debug!(error = %e, "No stored admin password");
                    return None;
                }
            },
        };
        Some((email, password))
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Establish a session before anything is loaded. On failure the
    /// "Authentication Required" screen is shown.
    pub async fn authenticate(&mut self) -> bool {
        match self.auth.ensure_session().await {
            AuthState::Authenticated(data) => {
                info!(user = %data.display_name(), "Authenticated");
                self.user_label = Some(data.display_name());
                self.auth_message = None;
                self.state = AppState::Normal;
                true
            }
            AuthState::Required(message) => {
                warn!(%message, "Authentication required");
                self.user_label = None;
                self.auth_message = Some(message);
                self.state = AppState::AuthRequired;
                false
            }
        }
    }

    /// Retry from the "Authentication Required" screen
    pub async fn retry_authentication(&mut self) {
        if self.authenticate().await {
            self.refresh_all_background();
        }
    }

    pub fn session_minutes_left(&self) -> Option<i64> {
        self.auth.session().data.as_ref().map(|d| d.minutes_until_expiry())
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Load all tables from local snapshots
    pub fn load_from_cache(&mut self) {
        let Some(cache) = &self.cache else {
            return;
        };

        if let Ok(Some(cached)) = cache.load_table(MODULES_TABLE) {
            self.modules = cached.data;
        }
        if let Ok(Some(cached)) = cache.load_table(MEMBERS_TABLE) {
            self.members = cached.data;
        }
        if let Ok(Some(cached)) = cache.load_table(BOOKINGS_TABLE) {
            self.bookings = cached.data;
        }
        if let Ok(Some(cached)) = cache.load_table(ANNOUNCEMENTS_TABLE) {
            self.announcements = cached.data;
        }
        if let Ok(Some(cached)) = cache.load_table(MEDITATIONS_TABLE) {
            self.meditations = cached.data;
        }
        if let Ok(Some(cached)) = cache.load_table(RESOURCES_TABLE) {
            self.resources = cached.data;
        }
        if let Ok(Some(cached)) = cache.load_table(DIGITAL_READINGS_TABLE) {
            self.readings = cached.data;
        }
        if let Ok(Some(cached)) = cache.load_table(WEEKLY_MESSAGES_TABLE) {
            self.messages = cached.data;
        }
        if let Ok(Some(cached)) = cache.load_table(READING_PRODUCTS_TABLE) {
            self.products = cached.data;
        }

        if !self.modules.is_empty() || !self.members.is_empty() {
            self.stats = Some(self.local_stats());
        }
        self.cache_ages = cache.get_cache_ages(&CACHED_TABLES);
        debug!(members = self.members.len(), modules = self.modules.len(), "Loaded snapshots");
    }

    /// Check if any snapshot is missing or stale
    pub fn is_cache_stale(&self) -> bool {
        self.cache
            .as_ref()
            .map_or(true, |c| c.any_stale(&CACHED_TABLES))
    }

    fn store<T: Serialize>(&self, table: &str, rows: &[T]) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_table(table, rows) {
                warn!(error = %e, table, "Failed to cache table");
            }
        }
    }

    /// Dashboard counts computed from snapshot data
    fn local_stats(&self) -> DashboardStats {
        DashboardStats {
            modules: self.modules.len(),
            lessons: self.modules.iter().map(|m| m.lessons.len()).sum(),
            members: self.members.len(),
            active_members: self.members.iter().filter(|m| m.is_active).count(),
            meditations: self.meditations.len(),
            resources: self.resources.len(),
        }
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    /// Spawn a background task to refresh all data
    pub fn refresh_all_background(&mut self) {
        info!("Starting background refresh of all tables");
        let services = self.services.clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            Self::execute_background_refresh(tx, services).await;
        });

        self.refreshing = true;
        self.status_message = Some("Refreshing data...".to_string());
    }

    /// Helper to send refresh results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    /// Helper to send a successful fetch result or an error
    async fn send_fetch_result<T, F>(
        tx: &mpsc::Sender<RefreshResult>,
        name: &str,
        result: ServiceResult<T>,
        wrapper: F,
    ) where
        F: FnOnce(T) -> RefreshResult,
    {
        match result {
            Ok(data) => {
                debug!("{} fetched successfully", name);
                Self::send_result(tx, wrapper(data)).await;
            }
            Err(e) => {
                error!(error = %e, "{} fetch failed", name);
                Self::send_result(tx, RefreshResult::Error(format!("{}: {}", name, e))).await;
            }
        }
    }

    /// Fetch every table concurrently and post each result back.
    async fn execute_background_refresh(tx: mpsc::Sender<RefreshResult>, services: Services) {
        info!("Background refresh task started");

        let (stats, modules, members, bookings, announcements, meditations, resources, readings, messages, products) = tokio::join!(
            services.dashboard.stats(),
            services.courses.modules_with_lessons(),
            services.members.list(),
            services.bookings.list(),
            services.announcements.list(),
            services.meditations.list(),
            services.resources.list(),
            services.readings.list(),
            services.messages.list(),
            services.products.list(),
        );

        Self::send_fetch_result(&tx, "Dashboard", stats, RefreshResult::Stats).await;
        Self::send_fetch_result(&tx, "Modules", modules, RefreshResult::Modules).await;
        Self::send_fetch_result(&tx, "Members", members, RefreshResult::Members).await;
        Self::send_fetch_result(&tx, "Bookings", bookings, RefreshResult::Bookings).await;
        Self::send_fetch_result(&tx, "Announcements", announcements, RefreshResult::Announcements).await;
        Self::send_fetch_result(&tx, "Meditations", meditations, RefreshResult::Meditations).await;
        Self::send_fetch_result(&tx, "Resources", resources, RefreshResult::Resources).await;
        Self::send_fetch_result(&tx, "Readings", readings, RefreshResult::Readings).await;
        Self::send_fetch_result(&tx, "Messages", messages, RefreshResult::Messages).await;
        Self::send_fetch_result(&tx, "Products", products, RefreshResult::Products).await;

        Self::send_result(&tx, RefreshResult::RefreshComplete).await;
        info!("Background refresh task finished");
    }

    /// Reload only the tables behind the current tab, plus the dashboard counts
    pub fn refresh_current_tab(&mut self) {
        let services = self.services.clone();
        let tx = self.refresh_tx.clone();
        let tab = self.current_tab;

        tokio::spawn(async move {
            match tab {
                Tab::Dashboard => {
                    Self::send_fetch_result(&tx, "Bookings", services.bookings.list().await, RefreshResult::Bookings)
                        .await;
                    Self::send_fetch_result(&tx, "Messages", services.messages.list().await, RefreshResult::Messages)
                        .await;
                }
                Tab::Members => {
                    Self::send_fetch_result(&tx, "Members", services.members.list().await, RefreshResult::Members)
                        .await;
                }
                Tab::Bookings => {
                    Self::send_fetch_result(&tx, "Bookings", services.bookings.list().await, RefreshResult::Bookings)
                        .await;
                    Self::send_fetch_result(&tx, "Members", services.members.list().await, RefreshResult::Members)
                        .await;
                }
                Tab::Courses => {
                    let modules = services.courses.modules_with_lessons().await;
                    Self::send_fetch_result(&tx, "Modules", modules, RefreshResult::Modules).await;
                }
                Tab::Meditations => {
                    let meditations = services.meditations.list().await;
                    Self::send_fetch_result(&tx, "Meditations", meditations, RefreshResult::Meditations).await;
                }
                Tab::Resources => {
                    let resources = services.resources.list().await;
                    Self::send_fetch_result(&tx, "Resources", resources, RefreshResult::Resources).await;
                }
                Tab::Announcements => {
                    let announcements = services.announcements.list().await;
                    Self::send_fetch_result(&tx, "Announcements", announcements, RefreshResult::Announcements)
                        .await;
                }
                Tab::Readings => {
                    Self::send_fetch_result(&tx, "Readings", services.readings.list().await, RefreshResult::Readings)
                        .await;
                }
                Tab::Messages => {
                    Self::send_fetch_result(&tx, "Messages", services.messages.list().await, RefreshResult::Messages)
                        .await;
                }
                Tab::Products => {
                    Self::send_fetch_result(&tx, "Products", services.products.list().await, RefreshResult::Products)
                        .await;
                }
            }
            Self::send_fetch_result(&tx, "Dashboard", services.dashboard.stats().await, RefreshResult::Stats).await;
            Self::send_result(&tx, RefreshResult::RefreshComplete).await;
        });

        self.refreshing = true;
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        // Collect all pending results first to avoid borrow conflicts
        let results: Vec<RefreshResult> = {
            if let Some(ref mut rx) = self.refresh_rx {
                let mut results = Vec::new();
                while let Ok(result) = rx.try_recv() {
                    results.push(result);
                }
                results
            } else {
                Vec::new()
            }
        };

        for result in results {
            self.process_refresh_result(result);
        }
    }

    /// Process a single refresh result from the background task.
    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Stats(stats) => {
                self.stats = Some(stats);
            }
            RefreshResult::Modules(data) => {
                self.store(MODULES_TABLE, &data);
                self.modules = data;
            }
            RefreshResult::Members(data) => {
                self.store(MEMBERS_TABLE, &data);
                self.members = data;
            }
            RefreshResult::Bookings(data) => {
                self.store(BOOKINGS_TABLE, &data);
                self.bookings = data;
            }
            RefreshResult::Announcements(data) => {
                self.store(ANNOUNCEMENTS_TABLE, &data);
                self.announcements = data;
            }
            RefreshResult::Meditations(data) => {
                self.store(MEDITATIONS_TABLE, &data);
                self.meditations = data;
            }
            RefreshResult::Resources(data) => {
                self.store(RESOURCES_TABLE, &data);
                self.resources = data;
            }
            RefreshResult::Readings(data) => {
                self.store(DIGITAL_READINGS_TABLE, &data);
                self.readings = data;
            }
            RefreshResult::Messages(data) => {
                self.store(WEEKLY_MESSAGES_TABLE, &data);
                self.messages = data;
            }
            RefreshResult::Products(data) => {
                self.store(READING_PRODUCTS_TABLE, &data);
                self.products = data;
            }
            RefreshResult::RefreshComplete => {
                self.refreshing = false;
                if let Some(cache) = &self.cache {
                    self.cache_ages = cache.get_cache_ages(&CACHED_TABLES);
                }
                // Only clear progress messages, keep action results
                if self.status_message.as_deref() == Some("Refreshing data...") {
                    self.status_message = None;
                }
            }
            RefreshResult::Error(msg) => {
                error!(error = %msg, "Background task error");
                let lower = msg.to_lowercase();
                if lower.contains("unauthorized") || lower.contains("401") {
                    self.auth_message = Some("Session expired. Please sign in again.".to_string());
                    self.state = AppState::AuthRequired;
                } else {
                    self.error_banner = Some(simplify_error(&msg));
                }
            }
        }
        self.clamp_selections();
    }

    // =========================================================================
    // Filtered Views
    // =========================================================================

    pub fn visible_members(&self) -> Vec<&Member> {
        let filter = MemberFilter {
            search: self.search_query.clone(),
            ..self.member_filter.clone()
        };
        filter.apply(&self.members)
    }

    pub fn visible_bookings(&self) -> Vec<&Booking> {
        let filter = BookingFilter {
            search: self.search_query.clone(),
            ..self.booking_filter.clone()
        };
        filter.apply(&self.bookings, &self.members)
    }

    pub fn visible_modules(&self) -> Vec<&ModuleWithLessons> {
        self.modules
            .iter()
            .filter(|m| self.matches_search(&m.module.title))
            .collect()
    }

    pub fn visible_meditations(&self) -> Vec<&Meditation> {
        self.meditations
            .iter()
            .filter(|m| self.matches_search(&m.title))
            .collect()
    }

    pub fn visible_resources(&self) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| self.resource_category.map_or(true, |c| r.category == c))
            .filter(|r| self.matches_search(&r.title))
            .collect()
    }

    pub fn visible_announcements(&self) -> Vec<&Announcement> {
        self.announcements
            .iter()
            .filter(|a| self.matches_search(&a.title))
            .collect()
    }

    pub fn visible_readings(&self) -> Vec<&DigitalReading> {
        let mut readings: Vec<&DigitalReading> = self
            .readings
            .iter()
            .filter(|r| self.matches_search(&r.card_name) || self.search_query.trim() == r.card_number.to_string())
            .collect();
        readings.sort_by_key(|r| (r.category.as_str(), r.card_number));
        readings
    }

    pub fn visible_messages(&self) -> Vec<&WeeklyMessage> {
        self.messages
            .iter()
            .filter(|m| self.matches_search(&m.title))
            .collect()
    }

    pub fn visible_products(&self) -> Vec<&ReadingProduct> {
        self.products
            .iter()
            .filter(|p| self.product_status.matches(p.is_active))
            .filter(|p| self.matches_search(&p.title))
            .collect()
    }

    fn matches_search(&self, text: &str) -> bool {
        let query = self.search_query.trim();
        query.is_empty() || contains_ignore_case(text, query)
    }

    pub fn member_stats(&self) -> MemberStats {
        MemberStats::from_members(&self.members)
    }

    pub fn booking_summary(&self) -> BookingSummary {
        BookingSummary::from_bookings(&self.bookings)
    }

    pub fn current_message(&self) -> Option<&WeeklyMessage> {
        self.messages.iter().find(|m| m.is_current)
    }

    pub fn member_name(&self, member_id: &str) -> &str {
        self.members
            .iter()
            .find(|m| m.id == member_id)
            .map(|m| m.full_name.as_str())
            .unwrap_or("Unknown member")
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selected_member(&self) -> Option<&Member> {
        self.visible_members().get(self.member_selection).copied()
    }

    pub fn selected_booking(&self) -> Option<&Booking> {
        self.visible_bookings().get(self.booking_selection).copied()
    }

    pub fn selected_module(&self) -> Option<&ModuleWithLessons> {
        self.visible_modules().get(self.module_selection).copied()
    }

    pub fn selected_lesson(&self) -> Option<&tarotdesk_core::models::CourseLesson> {
        self.selected_module()
            .and_then(|m| m.lessons.get(self.lesson_selection))
    }

    pub fn selected_meditation(&self) -> Option<&Meditation> {
        self.visible_meditations().get(self.meditation_selection).copied()
    }

    pub fn selected_resource(&self) -> Option<&Resource> {
        self.visible_resources().get(self.resource_selection).copied()
    }

    pub fn selected_announcement(&self) -> Option<&Announcement> {
        self.visible_announcements().get(self.announcement_selection).copied()
    }

    pub fn selected_reading(&self) -> Option<&DigitalReading> {
        self.visible_readings().get(self.reading_selection).copied()
    }

    pub fn selected_message(&self) -> Option<&WeeklyMessage> {
        self.visible_messages().get(self.message_selection).copied()
    }

    pub fn selected_product(&self) -> Option<&ReadingProduct> {
        self.visible_products().get(self.product_selection).copied()
    }

    /// Length of the list that currently has focus
    fn focused_len(&self) -> usize {
        match self.current_tab {
            Tab::Dashboard => 0,
            Tab::Members => self.visible_members().len(),
            Tab::Bookings => self.visible_bookings().len(),
            Tab::Courses => match self.focus {
                Focus::List => self.visible_modules().len(),
                Focus::Detail => self.selected_module().map_or(0, |m| m.lessons.len()),
            },
            Tab::Meditations => self.visible_meditations().len(),
            Tab::Resources => self.visible_resources().len(),
            Tab::Announcements => self.visible_announcements().len(),
            Tab::Readings => self.visible_readings().len(),
            Tab::Messages => self.visible_messages().len(),
            Tab::Products => self.visible_products().len(),
        }
    }

    fn focused_selection_mut(&mut self) -> Option<&mut usize> {
        match self.current_tab {
            Tab::Dashboard => None,
            Tab::Members => Some(&mut self.member_selection),
            Tab::Bookings => Some(&mut self.booking_selection),
            Tab::Courses => match self.focus {
                Focus::List => Some(&mut self.module_selection),
                Focus::Detail => Some(&mut self.lesson_selection),
            },
            Tab::Meditations => Some(&mut self.meditation_selection),
            Tab::Resources => Some(&mut self.resource_selection),
            Tab::Announcements => Some(&mut self.announcement_selection),
            Tab::Readings => Some(&mut self.reading_selection),
            Tab::Messages => Some(&mut self.message_selection),
            Tab::Products => Some(&mut self.product_selection),
        }
    }

    /// Move the focused selection by `delta`, clamped to the list
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.focused_len();
        let module_before = self.module_selection;
        if let Some(selection) = self.focused_selection_mut() {
            *selection = step(*selection, delta, len);
        }
        if self.module_selection != module_before {
            self.lesson_selection = 0;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(selection) = self.focused_selection_mut() {
            *selection = 0;
        }
    }

    pub fn select_last(&mut self) {
        let len = self.focused_len();
        if let Some(selection) = self.focused_selection_mut() {
            *selection = len.saturating_sub(1);
        }
    }

    fn clamp_selections(&mut self) {
        self.member_selection = clamp(self.member_selection, self.visible_members().len());
        self.booking_selection = clamp(self.booking_selection, self.visible_bookings().len());
        self.module_selection = clamp(self.module_selection, self.visible_modules().len());
        let lessons = self.selected_module().map_or(0, |m| m.lessons.len());
        self.lesson_selection = clamp(self.lesson_selection, lessons);
        self.meditation_selection = clamp(self.meditation_selection, self.visible_meditations().len());
        self.resource_selection = clamp(self.resource_selection, self.visible_resources().len());
        self.announcement_selection = clamp(self.announcement_selection, self.visible_announcements().len());
        self.reading_selection = clamp(self.reading_selection, self.visible_readings().len());
        self.message_selection = clamp(self.message_selection, self.visible_messages().len());
        self.product_selection = clamp(self.product_selection, self.visible_products().len());
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        if self.current_tab != tab {
            self.current_tab = tab;
            self.focus = Focus::List;
            self.search_query.clear();
            self.clamp_selections();
        }
    }

    pub fn toggle_focus(&mut self) {
        if self.current_tab == Tab::Courses {
            self.focus = match self.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
        }
    }

    // =========================================================================
    // Search and Filters
    // =========================================================================

    pub fn push_search_char(&mut self, c: char) {
        if can_add_search_char(self.search_query.chars().count(), c) {
            self.search_query.push(c);
            self.select_first();
        }
    }

    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
        self.select_first();
    }

    pub fn cycle_member_tier(&mut self) {
        self.member_filter.cycle_tier();
        self.member_selection = 0;
    }

    pub fn cycle_member_status(&mut self) {
        self.member_filter.status = self.member_filter.status.next();
        self.member_selection = 0;
    }

    pub fn cycle_booking_status(&mut self) {
        self.booking_filter.cycle_status();
        self.booking_selection = 0;
    }

    pub fn cycle_booking_tier(&mut self) {
        let mut filter = MemberFilter {
            tier: self.booking_filter.tier,
            ..MemberFilter::default()
        };
        filter.cycle_tier();
        self.booking_filter.tier = filter.tier;
        self.booking_selection = 0;
    }

    pub fn cycle_resource_category(&mut self) {
        self.resource_category = match self.resource_category {
            None => ResourceCategory::ALL.first().copied(),
            Some(current) => ResourceCategory::ALL
                .iter()
                .skip_while(|c| **c != current)
                .nth(1)
                .copied(),
        };
        self.resource_selection = 0;
    }

    pub fn cycle_product_status(&mut self) {
        self.product_status = self.product_status.next();
        self.product_selection = 0;
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// Open a blank form for the current tab
    pub fn open_new_form(&mut self) {
        let form = match self.current_tab {
            Tab::Dashboard => None,
            Tab::Members => Some(forms::member_form(None)),
            Tab::Bookings => Some(forms::booking_form(None, &self.members)),
            Tab::Courses => match self.focus {
                Focus::List => {
                    let modules: Vec<_> = self.modules.iter().map(|m| m.module.clone()).collect();
                    Some(forms::module_form(None, next_available_module_number(&modules)))
                }
                Focus::Detail => {
                    let modules: Vec<_> = self.modules.iter().map(|m| m.module.clone()).collect();
                    let selected = self.selected_module();
                    let next_lesson = selected
                        .and_then(|m| m.lessons.iter().map(|l| l.lesson_number).max())
                        .map_or(1, |n| n + 1);
                    Some(forms::lesson_form(
                        None,
                        &modules,
                        selected.map(|m| m.module.id.as_str()),
                        next_lesson,
                    ))
                }
            },
            Tab::Meditations => Some(forms::meditation_form(None)),
            Tab::Resources => Some(forms::resource_form(None)),
            Tab::Announcements => Some(forms::announcement_form(None)),
            Tab::Readings => Some(forms::reading_form(None)),
            Tab::Messages => Some(forms::message_form(None, Utc::now().date_naive())),
            Tab::Products => Some(forms::product_form(None, product::next_sort_order(&self.products))),
        };
        self.show_form(form);
    }

    /// Open the selected record in a form
    pub fn open_edit_form(&mut self) {
        let form = match self.current_tab {
            Tab::Dashboard => None,
            Tab::Members => self.selected_member().map(|m| forms::member_form(Some(m))),
            Tab::Bookings => self
                .selected_booking()
                .map(|b| forms::booking_form(Some(b), &self.members)),
            Tab::Courses => match self.focus {
                Focus::List => self
                    .selected_module()
                    .map(|m| forms::module_form(Some(&m.module), m.module.module_number)),
                Focus::Detail => {
                    let modules: Vec<_> = self.modules.iter().map(|m| m.module.clone()).collect();
                    self.selected_lesson()
                        .map(|l| forms::lesson_form(Some(l), &modules, None, l.lesson_number))
                }
            },
            Tab::Meditations => self.selected_meditation().map(|m| forms::meditation_form(Some(m))),
            Tab::Resources => self.selected_resource().map(|r| forms::resource_form(Some(r))),
            Tab::Announcements => self
                .selected_announcement()
                .map(|a| forms::announcement_form(Some(a))),
            Tab::Readings => self.selected_reading().map(|r| forms::reading_form(Some(r))),
            Tab::Messages => self
                .selected_message()
                .map(|m| forms::message_form(Some(m), Utc::now().date_naive())),
            Tab::Products => self
                .selected_product()
                .map(|p| forms::product_form(Some(p), p.sort_order)),
        };
        self.show_form(form);
    }

    fn show_form(&mut self, form: Option<Form>) {
        if let Some(form) = form {
            debug!(title = %form.title(), "Opening form");
            self.form = Some(form);
            self.state = AppState::EditingForm;
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    /// Save the open form. On failure the form stays open with the message.
    pub async fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        let services = self.services.clone();

        match save_form(&services, &form).await {
            Ok(label) => {
                info!(kind = form.kind.noun(), %label, "Saved");
                self.form = None;
                self.state = AppState::Normal;
                self.error_banner = None;
                self.status_message = Some(format!("{} saved: {}", form.kind.noun(), label));
                self.refresh_current_tab();
            }
            Err(message) => {
                warn!(kind = form.kind.noun(), error = %message, "Save rejected");
                if let Some(open) = self.form.as_mut() {
                    open.error = Some(message);
                }
            }
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Ask for confirmation before deleting the selected record
    pub fn request_delete(&mut self) {
        let target = match self.current_tab {
            Tab::Dashboard => None,
            Tab::Members => self
                .selected_member()
                .map(|m| delete_target(FormKind::Member, &m.id, &m.full_name)),
            Tab::Bookings => self.selected_booking().map(|b| {
                let label = format!("{} for {}", b.reading_type.label(), self.member_name(&b.member_id));
                delete_target(FormKind::Booking, &b.id, &label)
            }),
            Tab::Courses => match self.focus {
                Focus::List => self.selected_module().map(|m| {
                    let label = format!("{} and its {} lessons", m.module.label(), m.lessons.len());
                    delete_target(FormKind::Module, &m.module.id, &label)
                }),
                Focus::Detail => self
                    .selected_lesson()
                    .map(|l| delete_target(FormKind::Lesson, &l.id, &l.title)),
            },
            Tab::Meditations => self
                .selected_meditation()
                .map(|m| delete_target(FormKind::Meditation, &m.id, &m.title)),
            Tab::Resources => self
                .selected_resource()
                .map(|r| delete_target(FormKind::Resource, &r.id, &r.title)),
            Tab::Announcements => self
                .selected_announcement()
                .map(|a| delete_target(FormKind::Announcement, &a.id, &a.title)),
            Tab::Readings => self.selected_reading().map(|r| {
                let label = format!("{} ({})", r.card_name, r.category);
                delete_target(FormKind::Reading, &r.id, &label)
            }),
            Tab::Messages => self
                .selected_message()
                .map(|m| delete_target(FormKind::Message, &m.id, &m.title)),
            Tab::Products => self
                .selected_product()
                .map(|p| delete_target(FormKind::Product, &p.id, &p.title)),
        };

        if let Some(target) = target {
            self.delete_target = Some(target);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.delete_target = None;
        self.state = AppState::Normal;
    }

    pub async fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(target) = self.delete_target.take() else {
            return;
        };
        let services = self.services.clone();
        let id = target.id.as_str();

        let result = match target.kind {
            FormKind::Module => services.courses.delete_module(id).await,
            FormKind::Lesson => services.courses.delete_lesson(id).await,
            FormKind::Member => services.members.delete(id).await,
            FormKind::Booking => services.bookings.delete(id).await,
            FormKind::Announcement => services.announcements.delete(id).await,
            FormKind::Meditation => services.meditations.delete(id).await,
            FormKind::Resource => services.resources.delete(id).await,
            FormKind::Reading => services.readings.delete(id).await,
            FormKind::Message => services.messages.delete(id).await,
            FormKind::Product => services.products.delete(id).await,
        };
        self.finish(result, format!("Deleted {}", target.label));
    }

    // =========================================================================
    // Toggles and Row Actions
    // =========================================================================

    /// Report an action's outcome and reload the tab on success
    fn finish<T>(&mut self, result: ServiceResult<T>, success: String) {
        match result {
            Ok(_) => {
                info!(%success, "Action completed");
                self.error_banner = None;
                self.status_message = Some(success);
                self.refresh_current_tab();
            }
            Err(e) => {
                error!(error = %e, "Action failed");
                self.error_banner = Some(e.to_string());
            }
        }
    }

    /// Publish or unpublish the selected module, lesson, meditation,
    /// resource, or announcement
    pub async fn toggle_published(&mut self) {
        let services = self.services.clone();
        match self.current_tab {
            Tab::Courses => match self.focus {
                Focus::List => {
                    if let Some(m) = self.selected_module().map(|m| m.module.clone()) {
                        let result = services.courses.set_module_published(&m.id, !m.is_published).await;
                        self.finish(result, format!("{} {}", publish_verb(!m.is_published), m.label()));
                    }
                }
                Focus::Detail => {
                    if let Some(l) = self.selected_lesson().cloned() {
                        let result = services.courses.set_lesson_published(&l.id, !l.is_published).await;
                        self.finish(result, format!("{} {}", publish_verb(!l.is_published), l.title));
                    }
                }
            },
            Tab::Meditations => {
                if let Some(m) = self.selected_meditation().cloned() {
                    let result = services.meditations.toggle_published(&m).await;
                    self.finish(result, format!("{} {}", publish_verb(!m.is_published), m.title));
                }
            }
            Tab::Resources => {
                if let Some(r) = self.selected_resource().cloned() {
                    let result = services.resources.toggle_published(&r).await;
                    self.finish(result, format!("{} {}", publish_verb(!r.is_published), r.title));
                }
            }
            Tab::Announcements => {
                if let Some(a) = self.selected_announcement().cloned() {
                    let result = services.announcements.set_published(&a.id, !a.is_published).await;
                    self.finish(result, format!("{} {}", publish_verb(!a.is_published), a.title));
                }
            }
            _ => {}
        }
    }

    pub async fn toggle_featured(&mut self) {
        let services = self.services.clone();
        match self.current_tab {
            Tab::Meditations => {
                if let Some(m) = self.selected_meditation().cloned() {
                    let result = services.meditations.toggle_featured(&m).await;
                    self.finish(result, format!("{} {}", feature_verb(!m.is_featured), m.title));
                }
            }
            Tab::Resources => {
                if let Some(r) = self.selected_resource().cloned() {
                    let result = services.resources.toggle_featured(&r).await;
                    self.finish(result, format!("{} {}", feature_verb(!r.is_featured), r.title));
                }
            }
            _ => {}
        }
    }

    /// Activate or deactivate the selected member or product
    pub async fn toggle_active(&mut self) {
        let services = self.services.clone();
        match self.current_tab {
            Tab::Members => {
                if let Some(m) = self.selected_member().cloned() {
                    let result = services.members.set_active(&m.id, !m.is_active).await;
                    self.finish(result, format!("{} {}", activate_verb(!m.is_active), m.full_name));
                }
            }
            Tab::Products => {
                if let Some(p) = self.selected_product().cloned() {
                    let result = services.products.toggle_active(&p).await;
                    self.finish(result, format!("{} {}", activate_verb(!p.is_active), p.title));
                }
            }
            _ => {}
        }
    }

    /// Move the selected booking along pending → confirmed → completed
    pub async fn advance_booking_status(&mut self) {
        let Some(booking) = self.selected_booking().cloned() else {
            return;
        };
        let Some(next) = next_booking_status(booking.status) else {
            self.status_message = Some(format!("Booking is already {}", booking.status));
            return;
        };
        let result = self.services.clone().bookings.set_status(&booking.id, next).await;
        self.finish(result, format!("Booking marked {}", next));
    }

    pub async fn cancel_booking(&mut self) {
        let Some(booking) = self.selected_booking().cloned() else {
            return;
        };
        if booking.status == BookingStatus::Cancelled {
            return;
        }
        let result = self
            .services
            .clone()
            .bookings
            .set_status(&booking.id, BookingStatus::Cancelled)
            .await;
        self.finish(result, "Booking cancelled".to_string());
    }

    pub async fn mark_announcement_sent(&mut self) {
        let Some(announcement) = self.selected_announcement().cloned() else {
            return;
        };
        if !announcement.can_mark_sent() {
            self.status_message = Some(if announcement.is_sent {
                "Announcement was already sent".to_string()
            } else {
                "Publish the announcement before marking it sent".to_string()
            });
            return;
        }
        let result = self.services.clone().announcements.mark_sent(&announcement.id).await;
        self.finish(result, format!("Marked sent: {}", announcement.title));
    }

    pub async fn set_current_message(&mut self) {
        let Some(message) = self.selected_message().cloned() else {
            return;
        };
        let result = self.services.clone().messages.set_current(&message.id).await;
        self.finish(result, format!("Current message: {}", message.title));
    }

    /// Show or hide the selected member's reading history
    pub async fn toggle_member_history(&mut self) {
        let Some(member) = self.selected_member().cloned() else {
            return;
        };
        if self
            .member_history
            .as_ref()
            .is_some_and(|h| h.member_id == member.id)
        {
            self.member_history = None;
            return;
        }

        match self.services.bookings.reading_history(&member.id).await {
            Ok(entries) => {
                debug!(member = %member.id, count = entries.len(), "Loaded reading history");
                self.member_history = Some(MemberHistory {
                    member_id: member.id,
                    entries,
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to load reading history");
                self.error_banner = Some(e.to_string());
            }
        }
    }

    // =========================================================================
    // Digital Reading Lookup
    // =========================================================================

    pub fn open_lookup(&mut self) {
        self.lookup = ReadingFlow::new();
        self.lookup_input.clear();
        self.lookup_error = None;
        self.state = AppState::LookingUp;
    }

    pub fn push_lookup_digit(&mut self, c: char) {
        if c.is_ascii_digit() && self.lookup_input.len() < 2 {
            self.lookup_input.push(c);
        }
    }

    /// Look up the typed card number in the loaded readings
    pub fn submit_lookup(&mut self) {
        let card = self
            .lookup_input
            .trim()
            .parse::<i32>()
            .map_err(|_| "Enter a card number from 0 to 21".to_string())
            .and_then(CardNumber::try_from);

        match card {
            Ok(card) => {
                self.lookup.select_number(card, &self.readings);
                self.lookup_input.clear();
                self.lookup_error = None;
            }
            Err(message) => self.lookup_error = Some(message),
        }
    }

    // =========================================================================
    // Lesson Viewer
    // =========================================================================

    /// Open the viewer, prefilled with the selected lesson's address
    pub fn open_lesson_viewer(&mut self) {
        let query = self
            .selected_module()
            .zip(self.selected_lesson())
            .map(|(m, l)| {
                LessonRef {
                    module_number: m.module.module_number,
                    lesson_number: l.lesson_number,
                }
                .to_query_string()
            })
            .unwrap_or_else(|| "?module=1&lesson=1".to_string());
        self.lesson_viewer = LessonViewer {
            query,
            location: None,
            error: None,
        };
        self.state = AppState::ViewingLesson;
    }

    pub async fn submit_lesson_query(&mut self) {
        let query = self.lesson_viewer.query.clone();
        let result = self.services.courses.find_lesson_by_query(&query).await;
        self.show_lesson(result);
    }

    /// Follow the previous or next link of the shown lesson
    pub async fn step_lesson(&mut self, forward: bool) {
        let target = self.lesson_viewer.location.as_ref().and_then(|l| {
            if forward {
                l.next
            } else {
                l.previous
            }
        });
        if let Some(lesson_ref) = target {
            self.lesson_viewer.query = lesson_ref.to_query_string();
            let result = self.services.courses.find_lesson(lesson_ref).await;
            self.show_lesson(result);
        }
    }

    fn show_lesson(&mut self, result: ServiceResult<LessonLocation>) {
        match result {
            Ok(location) => {
                self.lesson_viewer.location = Some(location);
                self.lesson_viewer.error = None;
            }
            Err(e) => {
                debug!(error = %e, "Lesson lookup failed");
                self.lesson_viewer.location = None;
                self.lesson_viewer.error = Some(e.to_string());
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Save a form through the matching service. Returns a label for the saved
/// record, or a message for the form.
async fn save_form(services: &Services, form: &Form) -> Result<String, String> {
    let id = form.id.as_deref();
    let saved = match (form.kind, id) {
        (FormKind::Module, None) => services
            .courses
            .create_module(&forms::new_module(form)?)
            .await
            .map(|m| m.label()),
        (FormKind::Module, Some(id)) => services
            .courses
            .update_module(id, &forms::module_update(form)?)
            .await
            .map(|m| m.label()),
        (FormKind::Lesson, None) => services
            .courses
            .create_lesson(&forms::new_lesson(form)?)
            .await
            .map(|l| l.title),
        (FormKind::Lesson, Some(id)) => services
            .courses
            .update_lesson(id, &forms::lesson_update(form)?)
            .await
            .map(|l| l.title),
        (FormKind::Member, None) => services
            .members
            .create(&forms::new_member(form)?)
            .await
            .map(|m| m.full_name),
        (FormKind::Member, Some(id)) => services
            .members
            .update(id, &forms::member_update(form)?)
            .await
            .map(|m| m.full_name),
        (FormKind::Booking, None) => services
            .bookings
            .create(&forms::new_booking(form)?)
            .await
            .map(|b| b.formatted_date()),
        (FormKind::Booking, Some(id)) => services
            .bookings
            .update(id, &forms::booking_update(form)?)
            .await
            .map(|b| b.formatted_date()),
        (FormKind::Announcement, None) => services
            .announcements
            .create(&forms::new_announcement(form)?)
            .await
            .map(|a| a.title),
        (FormKind::Announcement, Some(id)) => services
            .announcements
            .update(id, &forms::announcement_update(form)?)
            .await
            .map(|a| a.title),
        (FormKind::Meditation, None) => services
            .meditations
            .create(&forms::new_meditation(form)?)
            .await
            .map(|m| m.title),
        (FormKind::Meditation, Some(id)) => services
            .meditations
            .update(id, &forms::meditation_update(form)?)
            .await
            .map(|m| m.title),
        (FormKind::Resource, None) => services
            .resources
            .create(&forms::new_resource(form)?)
            .await
            .map(|r| r.title),
        (FormKind::Resource, Some(id)) => services
            .resources
            .update(id, &forms::resource_update(form)?)
            .await
            .map(|r| r.title),
        (FormKind::Reading, None) => services
            .readings
            .create(&forms::new_reading(form)?)
            .await
            .map(|r| r.card_name),
        (FormKind::Reading, Some(id)) => services
            .readings
            .update(id, &forms::reading_update(form)?)
            .await
            .map(|r| r.card_name),
        (FormKind::Message, None) => services
            .messages
            .create(&forms::new_message(form)?)
            .await
            .map(|m| m.title),
        (FormKind::Message, Some(id)) => services
            .messages
            .update(id, &forms::message_update(form)?)
            .await
            .map(|m| m.title),
        (FormKind::Product, None) => services
            .products
            .create(&forms::new_product(form)?)
            .await
            .map(|p| p.title),
        (FormKind::Product, Some(id)) => services
            .products
            .update(id, &forms::product_update(form)?)
            .await
            .map(|p| p.title),
    };
    saved.map_err(|e| e.to_string())
}

fn delete_target(kind: FormKind, id: &str, label: &str) -> DeleteTarget {
    DeleteTarget {
        kind,
        id: id.to_string(),
        label: label.to_string(),
    }
}

fn publish_verb(publish: bool) -> &'static str {
    if publish {
        "Published"
    } else {
        "Unpublished"
    }
}

fn feature_verb(feature: bool) -> &'static str {
    if feature {
        "Featured"
    } else {
        "Unfeatured"
    }
}

fn activate_verb(activate: bool) -> &'static str {
    if activate {
        "Activated"
    } else {
        "Deactivated"
    }
}

fn next_booking_status(status: BookingStatus) -> Option<BookingStatus> {
    match status {
        BookingStatus::Pending => Some(BookingStatus::Confirmed),
        BookingStatus::Confirmed => Some(BookingStatus::Completed),
        BookingStatus::Completed | BookingStatus::Cancelled => None,
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = current as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}

fn clamp(selection: usize, len: usize) -> usize {
    selection.min(len.saturating_sub(1))
}

/// Simplify common error messages for the user
fn simplify_error(msg: &str) -> String {
    let lower = msg.to_lowercase();
    if lower.contains("rate limit") {
        "Server is busy. Please wait a moment and try again.".to_string()
    } else if lower.contains("network") || lower.contains("connect") {
        "Network error. Check your connection.".to_string()
    } else {
        format!("Error: {}", msg)
    }
}

// ============================================================================
// Input Validation
// ============================================================================

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_search_char(current_len: usize, c: char) -> bool {
    current_len < MAX_SEARCH_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_next() {
        assert_eq!(Tab::Dashboard.next(), Tab::Members);
        assert_eq!(Tab::Messages.next(), Tab::Products);
        assert_eq!(Tab::Products.next(), Tab::Dashboard);
    }

    #[test]
    fn test_tab_prev() {
        assert_eq!(Tab::Dashboard.prev(), Tab::Products);
        assert_eq!(Tab::Members.prev(), Tab::Dashboard);
    }

    #[test]
    fn test_tab_digits() {
        assert_eq!(Tab::from_digit('1'), Some(Tab::Dashboard));
        assert_eq!(Tab::from_digit('4'), Some(Tab::Courses));
        assert_eq!(Tab::from_digit('9'), Some(Tab::Messages));
        assert_eq!(Tab::from_digit('0'), Some(Tab::Products));
        assert_eq!(Tab::from_digit('x'), None);
        for tab in Tab::ALL {
            assert_eq!(Tab::from_digit(tab.shortcut()), Some(tab));
        }
    }

    #[test]
    fn test_step_clamps() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(3, 10, 5), 4);
        assert_eq!(step(2, 1, 0), 0);
        assert_eq!(clamp(7, 3), 2);
        assert_eq!(clamp(7, 0), 0);
    }

    #[test]
    fn test_booking_status_progression() {
        assert_eq!(next_booking_status(BookingStatus::Pending), Some(BookingStatus::Confirmed));
        assert_eq!(next_booking_status(BookingStatus::Confirmed), Some(BookingStatus::Completed));
        assert_eq!(next_booking_status(BookingStatus::Completed), None);
        assert_eq!(next_booking_status(BookingStatus::Cancelled), None);
    }

    #[test]
    fn test_simplify_error() {
        assert_eq!(
            simplify_error("Members: Rate limited - please wait before retrying"),
            "Server is busy. Please wait a moment and try again."
        );
        assert_eq!(
            simplify_error("Network error: connection refused"),
            "Network error. Check your connection."
        );
        assert_eq!(simplify_error("Title is required"), "Error: Title is required");
    }

    #[test]
    fn test_can_add_search_char() {
        assert!(can_add_search_char(0, 'a'));
        assert!(can_add_search_char(MAX_SEARCH_LENGTH - 1, 'z'));
        assert!(!can_add_search_char(MAX_SEARCH_LENGTH, 'a'));
        assert!(!can_add_search_char(0, '\t'));
    }

    // ------------------------------------------------------------------------
    // App over the seeded in-memory backend
    // ------------------------------------------------------------------------

    async fn demo_app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn Backend> = Arc::new(demo::backend());
        let services = Services::new(backend.clone());
        demo::seed(&services).await.unwrap();
        let auth = AuthGate::new(backend, Session::new(dir.path().to_path_buf()))
            .with_credentials(demo::DEMO_EMAIL, demo::DEMO_PASSWORD);
        (App::from_parts(Config::default(), services, auth, None, true), dir)
    }

    async fn wait_for_refresh(app: &mut App) {
        for _ in 0..200 {
            app.check_background_tasks();
            if !app.refreshing {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("refresh did not complete");
    }

    async fn loaded_app() -> (App, tempfile::TempDir) {
        let (mut app, dir) = demo_app().await;
        assert!(app.authenticate().await);
        app.refresh_all_background();
        wait_for_refresh(&mut app).await;
        (app, dir)
    }

    fn set_field(app: &mut App, key: &str, value: &str) {
        let form = app.form.as_mut().unwrap();
        let field = form.fields.iter_mut().find(|f| f.key == key).unwrap();
        field.value = value.to_string();
    }

    #[tokio::test]
    async fn test_authenticate_and_refresh() {
        let (app, _dir) = loaded_app().await;
        assert_eq!(app.user_label.as_deref(), Some(demo::DEMO_EMAIL));
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.modules.len(), 3);
        assert_eq!(app.members.len(), 3);
        assert_eq!(app.stats.map(|s| s.lessons), Some(5));
        assert!(app.current_message().is_some());
        assert!(app.status_message.is_none());
        assert!(app.error_banner.is_none());
    }

    #[tokio::test]
    async fn test_search_and_filters() {
        let (mut app, _dir) = loaded_app().await;
        app.switch_tab(Tab::Members);
        for c in "iris".chars() {
            app.push_search_char(c);
        }
        let names: Vec<&str> = app.visible_members().iter().map(|m| m.full_name.as_str()).collect();
        assert_eq!(names, vec!["Iris Vale"]);

        // Switching tabs drops the query
        app.switch_tab(Tab::Bookings);
        assert!(app.search_query.is_empty());
        assert_eq!(app.visible_bookings().len(), 5);
        app.cycle_booking_status();
        assert_eq!(app.booking_filter.status, Some(BookingStatus::Pending));
        assert_eq!(app.visible_bookings().len(), 1);
    }

    #[tokio::test]
    async fn test_selection_stays_in_bounds() {
        let (mut app, _dir) = loaded_app().await;
        app.switch_tab(Tab::Members);
        app.move_selection(PAGE_SCROLL_SIZE as isize);
        assert_eq!(app.member_selection, 2);
        app.cycle_member_status();
        app.cycle_member_status();
        // Only one inactive member left in view
        assert_eq!(app.visible_members().len(), 1);
        app.move_selection(1);
        assert_eq!(app.member_selection, 0);
    }

    #[tokio::test]
    async fn test_new_module_form_saves() {
        let (mut app, _dir) = loaded_app().await;
        app.switch_tab(Tab::Courses);
        app.open_new_form();
        assert_eq!(app.state, AppState::EditingForm);
        assert_eq!(app.form.as_ref().map(|f| f.kind), Some(FormKind::Module));

        set_field(&mut app, "title", "Reversals");
        app.submit_form().await;
        assert_eq!(app.state, AppState::Normal);
        assert!(app.form.is_none());
        assert_eq!(
            app.status_message.as_deref(),
            Some("Module saved: Module 4: Reversals")
        );

        wait_for_refresh(&mut app).await;
        assert_eq!(app.modules.len(), 4);
    }

    #[tokio::test]
    async fn test_rejected_form_stays_open() {
        let (mut app, _dir) = loaded_app().await;
        app.switch_tab(Tab::Courses);
        app.open_new_form();
        set_field(&mut app, "title", "Duplicate");
        set_field(&mut app, "module_number", "1");
        app.submit_form().await;

        assert_eq!(app.state, AppState::EditingForm);
        let error = app.form.as_ref().and_then(|f| f.error.clone());
        assert!(error.is_some());
    }

    #[tokio::test]
    async fn test_delete_after_confirmation() {
        let (mut app, _dir) = loaded_app().await;
        app.switch_tab(Tab::Messages);
        app.request_delete();
        assert_eq!(app.state, AppState::ConfirmingDelete);
        app.cancel_delete();
        assert_eq!(app.messages.len(), 2);

        app.request_delete();
        app.confirm_delete().await;
        wait_for_refresh(&mut app).await;
        assert_eq!(app.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_sent_requires_published() {
        let (mut app, _dir) = loaded_app().await;
        app.switch_tab(Tab::Announcements);
        let draft = app
            .visible_announcements()
            .iter()
            .position(|a| !a.is_published)
            .unwrap();
        app.announcement_selection = draft;
        app.mark_announcement_sent().await;
        assert_eq!(
            app.status_message.as_deref(),
            Some("Publish the announcement before marking it sent")
        );
    }

    #[tokio::test]
    async fn test_lookup_flow() {
        let (mut app, _dir) = loaded_app().await;
        app.open_lookup();
        app.lookup.select_category(tarotdesk_core::models::ReadingCategory::General);

        app.push_lookup_digit('4');
        app.push_lookup_digit('2');
        app.submit_lookup();
        assert_eq!(
            app.lookup_error.as_deref(),
            Some("Card number must be between 0 and 21, got 42")
        );

        app.lookup_input.clear();
        app.push_lookup_digit('0');
        app.submit_lookup();
        assert!(matches!(
            app.lookup.step(),
            tarotdesk_core::readings::ReadingStep::VideoResult { .. }
        ));
    }

    #[tokio::test]
    async fn test_lesson_viewer_navigation() {
        let (mut app, _dir) = loaded_app().await;
        app.switch_tab(Tab::Courses);
        app.open_lesson_viewer();
        assert_eq!(app.lesson_viewer.query, "?module=1&lesson=1");

        app.submit_lesson_query().await;
        let location = app.lesson_viewer.location.clone().unwrap();
        assert_eq!(location.lesson.title, "Meeting your deck");
        assert!(location.previous.is_none());

        app.step_lesson(true).await;
        assert_eq!(app.lesson_viewer.query, "?module=1&lesson=2");

        app.lesson_viewer.query = "?module=9&lesson=1".to_string();
        app.submit_lesson_query().await;
        assert!(app.lesson_viewer.error.is_some());
    }
}
