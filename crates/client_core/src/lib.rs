use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use shared::{
    domain::{Course, CourseId, EnrollmentRole, SessionId, UserId},
    error::ApiError,
    protocol::{
        AuthResponse, JoinCourseRequest, JoinCourseResponse, RosterChangeBroadcast, ServerEvent,
        SignInRequest, SignUpHttpRequest, SignUpProfile,
    },
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

pub mod cache;
pub mod course_code;
pub mod majors;

pub use cache::{CacheLookup, CourseListCache};
pub use course_code::{normalize_course_code, EnrollmentRequest, ValidationError};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const REALTIME_FEED_PATH: &str = "/realtime";

/// What the course directory reports for one join call. Produced exactly
/// once per successful call; a duplicate join surfaces here as
/// `already_joined = true`, never as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentResult {
    pub course_id: CourseId,
    pub already_joined: bool,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no course matches code \"{code}\"")]
    InvalidCourseCode { code: String },
    #[error("{message}")]
    Authorization { message: String },
    #[error("course directory unreachable: {message}")]
    Transient { message: String },
    #[error("{message}")]
    Unknown { message: String },
}

#[async_trait]
pub trait CourseDirectory: Send + Sync {
    /// Ordered course list for the user, as the directory stores it.
    async fn list_courses(&self, user_id: &UserId) -> Result<Vec<Course>, DirectoryError>;

    /// Joins the user to the course identified by a normalized code. The
    /// directory's (user, course) uniqueness constraint is the authority
    /// on duplicates.
    async fn join_course(
        &self,
        code: &str,
        role: EnrollmentRole,
        user_id: &UserId,
    ) -> Result<EnrollmentResult, DirectoryError>;
}

pub struct MissingCourseDirectory;

#[async_trait]
impl CourseDirectory for MissingCourseDirectory {
    async fn list_courses(&self, _user_id: &UserId) -> Result<Vec<Course>, DirectoryError> {
        Err(DirectoryError::Transient {
            message: "course directory unavailable".into(),
        })
    }

    async fn join_course(
        &self,
        _code: &str,
        _role: EnrollmentRole,
        _user_id: &UserId,
    ) -> Result<EnrollmentResult, DirectoryError> {
        Err(DirectoryError::Transient {
            message: "course directory unavailable".into(),
        })
    }
}

/// Fire-and-forget broadcast to the user's other active sessions.
/// At-least-once; receivers tolerate duplicates, so callers never retry
/// and never fail a join over a lost broadcast.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn notify(&self, change: RosterChangeBroadcast) -> Result<()>;
}

pub struct MissingChangeNotifier;

#[async_trait]
impl ChangeNotifier for MissingChangeNotifier {
    async fn notify(&self, _change: RosterChangeBroadcast) -> Result<()> {
        Err(anyhow!("change notifier unavailable"))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("signup rejected: {0}")]
    Rejected(String),
    #[error("auth service unreachable: {0}")]
    Transient(String),
    #[error("{0}")]
    Unknown(String),
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: UserId,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub handle: String,
    /// Major catalog slug; validated against [`majors::MAJORS`].
    pub major: String,
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthSession, AuthError>;
}

pub struct MissingAuthGateway;

#[async_trait]
impl AuthGateway for MissingAuthGateway {
    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<AuthSession, AuthError> {
        Err(AuthError::Transient("auth gateway unavailable".into()))
    }

    async fn sign_up(&self, _request: &SignUpRequest) -> Result<AuthSession, AuthError> {
        Err(AuthError::Transient("auth gateway unavailable".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// User-visible toast content handed to the presentation shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Everything one join attempt hands back to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub notice: Notice,
    /// Present iff the pre-join course count was zero: a first enrollment
    /// redirects into the new course.
    pub navigate_to: Option<CourseId>,
    pub enrollment: Option<EnrollmentResult>,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Notice(Notice),
    NavigateToCourse(CourseId),
    CourseListInvalidated {
        user_id: UserId,
    },
    CourseListRefreshed {
        user_id: UserId,
        courses: Vec<Course>,
    },
    Error(String),
}

#[derive(Debug, Clone)]
struct ActiveSession {
    user_id: UserId,
    session_id: SessionId,
    #[allow(dead_code)]
    access_token: String,
}

struct ClientState {
    session: Option<ActiveSession>,
    cache: CourseListCache,
    feed_started: bool,
}

/// One client instance per authenticated session. Holds the course-list
/// cache, drives the enrollment flow, and feeds the presentation shell
/// through a broadcast channel.
pub struct StudyHubClient {
    directory: Arc<dyn CourseDirectory>,
    notifier: Arc<dyn ChangeNotifier>,
    auth: Arc<dyn AuthGateway>,
    /// Base http(s) URL for the realtime feed; `None` disables the feed.
    feed_url: Option<String>,
    inner: Mutex<ClientState>,
    events: broadcast::Sender<ClientEvent>,
}

impl StudyHubClient {
    pub fn new(server_url: impl Into<String>) -> Arc<Self> {
        let server_url = server_url.into();
        Self::build(
            Arc::new(HttpCourseDirectory::new(server_url.clone())),
            Arc::new(HttpChangeNotifier::new(server_url.clone())),
            Arc::new(HttpAuthGateway::new(server_url.clone())),
            Some(server_url),
        )
    }

    pub fn new_with_dependencies(
        directory: Arc<dyn CourseDirectory>,
        notifier: Arc<dyn ChangeNotifier>,
        auth: Arc<dyn AuthGateway>,
    ) -> Arc<Self> {
        Self::build(directory, notifier, auth, None)
    }

    fn build(
        directory: Arc<dyn CourseDirectory>,
        notifier: Arc<dyn ChangeNotifier>,
        auth: Arc<dyn AuthGateway>,
        feed_url: Option<String>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            directory,
            notifier,
            auth,
            feed_url,
            inner: Mutex::new(ClientState {
                session: None,
                cache: CourseListCache::default(),
                feed_started: false,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    async fn session(&self) -> Result<ActiveSession> {
        self.inner
            .lock()
            .await
            .session
            .clone()
            .ok_or_else(|| anyhow!("not signed in"))
    }

    async fn session_is_current(&self, session_id: SessionId) -> bool {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|active| active.session_id)
            == Some(session_id)
    }

    /// The enrollment coordinator. `current_course_count` is the count the
    /// shell observed before submitting, read from the possibly stale
    /// cache; first-course detection is deliberately based on that
    /// snapshot rather than a post-join re-fetch.
    pub async fn join_course(
        &self,
        request: EnrollmentRequest,
        current_course_count: usize,
    ) -> JoinOutcome {
        let active = match self.session().await {
            Ok(active) => active,
            Err(err) => {
                let notice = Notice::error(format!("Error joining course: {err}"));
                let _ = self.events.send(ClientEvent::Notice(notice.clone()));
                return JoinOutcome {
                    notice,
                    navigate_to: None,
                    enrollment: None,
                };
            }
        };

        let code = request.normalized_code();
        let result = match self
            .directory
            .join_course(&code, request.role, &active.user_id)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                let notice = match err {
                    DirectoryError::Unknown { .. } => {
                        Notice::error("An unknown error occurred while joining course.")
                    }
                    known => Notice::error(format!("Error joining course: {known}")),
                };
                let _ = self.events.send(ClientEvent::Notice(notice.clone()));
                return JoinOutcome {
                    notice,
                    navigate_to: None,
                    enrollment: None,
                };
            }
        };

        let notice = if result.already_joined {
            Notice::info("Course already joined.")
        } else {
            Notice::success("Course joined.")
        };

        if !self.session_is_current(active.session_id).await {
            info!(
                user_id = %active.user_id,
                code = %code,
                "enroll: session ended mid-join; dropping broadcast and cache write"
            );
            return JoinOutcome {
                notice,
                navigate_to: None,
                enrollment: Some(result),
            };
        }

        let _ = self.events.send(ClientEvent::Notice(notice.clone()));

        // Store mutation has resolved; broadcast first, then mark the
        // cached list stale so the next read re-fetches.
        if let Err(err) = self
            .notifier
            .notify(RosterChangeBroadcast {
                user_id: active.user_id.clone(),
                origin_session: active.session_id,
                occurred_at: Utc::now(),
            })
            .await
        {
            warn!(user_id = %active.user_id, "enroll: roster-change broadcast failed: {err}");
        }

        {
            let mut guard = self.inner.lock().await;
            let still_current = guard
                .session
                .as_ref()
                .is_some_and(|current| current.session_id == active.session_id);
            if still_current {
                guard.cache.invalidate(&active.user_id);
            }
        }
        let _ = self.events.send(ClientEvent::CourseListInvalidated {
            user_id: active.user_id.clone(),
        });

        // Navigation is decided last, from the pre-join snapshot, and is
        // independent of already_joined.
        let navigate_to = (current_course_count == 0).then(|| result.course_id.clone());
        if let Some(course_id) = &navigate_to {
            let _ = self
                .events
                .send(ClientEvent::NavigateToCourse(course_id.clone()));
        }

        JoinOutcome {
            notice,
            navigate_to,
            enrollment: Some(result),
        }
    }

    /// Fetch-through read of the session user's course list. Serves the
    /// cache only while the entry is fresh; a stale or missing entry goes
    /// back to the directory.
    pub async fn course_list(&self) -> Result<Vec<Course>> {
        let active = self.session().await?;
        {
            let guard = self.inner.lock().await;
            if let CacheLookup::Fresh(courses) = guard.cache.get(&active.user_id) {
                return Ok(courses);
            }
        }

        let courses = self.directory.list_courses(&active.user_id).await?;

        let mut guard = self.inner.lock().await;
        let still_current = guard
            .session
            .as_ref()
            .is_some_and(|current| current.session_id == active.session_id);
        if still_current {
            guard.cache.put(active.user_id.clone(), courses.clone());
        }
        Ok(courses)
    }

    /// Last known list for immediate rendering, possibly stale. `None`
    /// when signed out or nothing has been fetched yet.
    pub async fn cached_courses(&self) -> Option<Vec<Course>> {
        let guard = self.inner.lock().await;
        let active = guard.session.as_ref()?;
        match guard.cache.get(&active.user_id) {
            CacheLookup::Fresh(courses) | CacheLookup::Stale(courses) => Some(courses),
            CacheLookup::Miss => None,
        }
    }

    pub async fn login(self: &Arc<Self>, email: &str, password: &str) -> Result<UserId> {
        let auth_session = self.auth.sign_in_with_password(email, password).await?;
        self.start_session(auth_session).await
    }

    pub async fn sign_up(self: &Arc<Self>, request: SignUpRequest) -> Result<UserId> {
        if !majors::is_known_major(&request.major) {
            return Err(anyhow!("unknown major slug: {}", request.major));
        }
        let auth_session = self.auth.sign_up(&request).await?;
        self.start_session(auth_session).await
    }

    async fn start_session(self: &Arc<Self>, auth_session: AuthSession) -> Result<UserId> {
        let session_id = SessionId::generate();
        let user_id = auth_session.user_id.clone();
        {
            let mut guard = self.inner.lock().await;
            guard.session = Some(ActiveSession {
                user_id: user_id.clone(),
                session_id,
                access_token: auth_session.access_token,
            });
            guard.cache.clear();
            guard.feed_started = false;
        }

        if let Some(feed_url) = self.feed_url.clone() {
            if let Err(err) = self.spawn_change_feed(&feed_url, user_id.clone()).await {
                let mut guard = self.inner.lock().await;
                guard.session = None;
                guard.cache.clear();
                guard.feed_started = false;
                return Err(err);
            }
            self.inner.lock().await.feed_started = true;
        }

        // Prime the sidebar. A failed prime degrades to an event rather
        // than failing the login; the list re-fetches on next read.
        if let Err(err) = self.course_list().await {
            let _ = self.events.send(ClientEvent::Error(format!(
                "initial course list fetch failed: {err}"
            )));
        }

        Ok(user_id)
    }

    pub async fn logout(&self) {
        let mut guard = self.inner.lock().await;
        guard.session = None;
        guard.cache.clear();
        guard.feed_started = false;
    }

    async fn spawn_change_feed(self: &Arc<Self>, server_url: &str, user_id: UserId) -> Result<()> {
        let ws_url = if server_url.starts_with("https://") {
            server_url.replacen("https://", "wss://", 1)
        } else if server_url.starts_with("http://") {
            server_url.replacen("http://", "ws://", 1)
        } else {
            return Err(anyhow!("server_url must start with http:// or https://"));
        };
        let ws_url = format!("{ws_url}{REALTIME_FEED_PATH}?user_id={user_id}");
        let (ws_stream, _) = connect_async(ws_url.as_str())
            .await
            .with_context(|| format!("failed to connect realtime feed: {ws_url}"))?;
        let (_, mut ws_reader) = ws_stream.split();

        let client = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => client.handle_server_event(event).await,
                        Err(err) => {
                            let _ = client
                                .events
                                .send(ClientEvent::Error(format!("invalid server event: {err}")));
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        let _ = client.events.send(ClientEvent::Error(format!(
                            "realtime feed receive failed: {err}"
                        )));
                        break;
                    }
                }
            }
            client.inner.lock().await.feed_started = false;
        });

        Ok(())
    }

    async fn handle_server_event(&self, event: ServerEvent) {
        match event {
            ServerEvent::CourseRosterChanged {
                user_id,
                origin_session,
            } => self.handle_roster_change(user_id, origin_session).await,
            ServerEvent::CourseUpdated { course } => {
                let Some(active) = self.inner.lock().await.session.clone() else {
                    return;
                };
                info!(course_id = %course.course_id, "realtime: course metadata changed");
                self.inner.lock().await.cache.invalidate(&active.user_id);
                let _ = self.events.send(ClientEvent::CourseListInvalidated {
                    user_id: active.user_id,
                });
            }
            ServerEvent::Error(api_error) => {
                let _ = self.events.send(ClientEvent::Error(api_error.message));
            }
        }
    }

    /// Inbound half of the change-notification loop: another session of
    /// this user changed the roster, so drop freshness and re-fetch.
    /// Duplicate deliveries just repeat the idempotent refresh.
    async fn handle_roster_change(&self, user_id: UserId, origin_session: SessionId) {
        let Some(active) = self.inner.lock().await.session.clone() else {
            return;
        };
        if active.user_id != user_id {
            return;
        }
        if active.session_id == origin_session {
            // Our own broadcast echoed back; the join path already
            // invalidated the cache.
            return;
        }

        {
            let mut guard = self.inner.lock().await;
            let still_current = guard
                .session
                .as_ref()
                .is_some_and(|current| current.session_id == active.session_id);
            if !still_current {
                return;
            }
            guard.cache.invalidate(&user_id);
        }
        let _ = self.events.send(ClientEvent::CourseListInvalidated {
            user_id: user_id.clone(),
        });

        match self.course_list().await {
            Ok(courses) => {
                let _ = self
                    .events
                    .send(ClientEvent::CourseListRefreshed { user_id, courses });
            }
            Err(err) => {
                let _ = self.events.send(ClientEvent::Error(format!(
                    "course list refresh failed: {err}"
                )));
            }
        }
    }
}

pub struct HttpCourseDirectory {
    http: Client,
    server_url: String,
}

impl HttpCourseDirectory {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }
}

#[async_trait]
impl CourseDirectory for HttpCourseDirectory {
    async fn list_courses(&self, user_id: &UserId) -> Result<Vec<Course>, DirectoryError> {
        let response = self
            .http
            .get(format!("{}/courses", self.server_url))
            .query(&[("user_id", user_id.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(directory_error_for_status(status, read_api_message(response).await, None));
        }
        response.json().await.map_err(|err| DirectoryError::Unknown {
            message: format!("invalid course list payload: {err}"),
        })
    }

    async fn join_course(
        &self,
        code: &str,
        role: EnrollmentRole,
        user_id: &UserId,
    ) -> Result<EnrollmentResult, DirectoryError> {
        let response = self
            .http
            .post(format!("{}/courses/join", self.server_url))
            .json(&JoinCourseRequest {
                user_id: user_id.clone(),
                code: code.to_string(),
                role,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(directory_error_for_status(
                status,
                read_api_message(response).await,
                Some(code),
            ));
        }

        let body: JoinCourseResponse =
            response.json().await.map_err(|err| DirectoryError::Unknown {
                message: format!("invalid join response payload: {err}"),
            })?;
        Ok(EnrollmentResult {
            course_id: body.course_id,
            already_joined: body.already_joined,
        })
    }
}

fn transport_error(err: reqwest::Error) -> DirectoryError {
    if err.is_connect() || err.is_timeout() {
        DirectoryError::Transient {
            message: err.to_string(),
        }
    } else {
        DirectoryError::Unknown {
            message: err.to_string(),
        }
    }
}

async fn read_api_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    }
}

fn directory_error_for_status(
    status: StatusCode,
    message: String,
    code: Option<&str>,
) -> DirectoryError {
    match status {
        StatusCode::NOT_FOUND => match code {
            Some(code) => DirectoryError::InvalidCourseCode {
                code: code.to_string(),
            },
            None => DirectoryError::Unknown { message },
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DirectoryError::Authorization { message }
        }
        status if status.is_server_error() => DirectoryError::Transient { message },
        _ => DirectoryError::Unknown { message },
    }
}

pub struct HttpChangeNotifier {
    http: Client,
    server_url: String,
}

impl HttpChangeNotifier {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }
}

#[async_trait]
impl ChangeNotifier for HttpChangeNotifier {
    async fn notify(&self, change: RosterChangeBroadcast) -> Result<()> {
        self.http
            .post(format!("{}/realtime/roster-change", self.server_url))
            .json(&change)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct HttpAuthGateway {
    http: Client,
    server_url: String,
}

impl HttpAuthGateway {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }

    async fn auth_session_from(response: reqwest::Response) -> Result<AuthSession, AuthError> {
        let body: AuthResponse = response
            .json()
            .await
            .map_err(|err| AuthError::Unknown(format!("invalid auth payload: {err}")))?;
        Ok(AuthSession {
            user_id: body.user_id,
            access_token: body.access_token,
        })
    }
}

fn auth_transport_error(err: reqwest::Error) -> AuthError {
    if err.is_connect() || err.is_timeout() {
        AuthError::Transient(err.to_string())
    } else {
        AuthError::Unknown(err.to_string())
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let response = self
            .http
            .post(format!("{}/auth/sign-in", self.server_url))
            .json(&SignInRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(auth_transport_error)?;

        match response.status() {
            status if status.is_success() => Self::auth_session_from(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidCredentials),
            status if status.is_server_error() => {
                Err(AuthError::Transient(read_api_message(response).await))
            }
            _ => Err(AuthError::Unknown(read_api_message(response).await)),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthSession, AuthError> {
        let response = self
            .http
            .post(format!("{}/auth/sign-up", self.server_url))
            .json(&SignUpHttpRequest {
                email: request.email.clone(),
                password: request.password.clone(),
                profile: SignUpProfile {
                    name: request.name.clone(),
                    handle: request.handle.clone(),
                    major: request.major.clone(),
                },
            })
            .send()
            .await
            .map_err(auth_transport_error)?;

        match response.status() {
            status if status.is_success() => Self::auth_session_from(response).await,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
                Err(AuthError::Rejected(read_api_message(response).await))
            }
            status if status.is_server_error() => {
                Err(AuthError::Transient(read_api_message(response).await))
            }
            _ => Err(AuthError::Unknown(read_api_message(response).await)),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
