use rsvp_backend::{
    api::{extractors::auth::ACCESS_TOKEN_COOKIE, router::create_router},
    state::AppState,
    config::{Config, RsvpSettings},
    infra::{
        factory::connect_sqlite,
        repositories::{sqlite_event_repo::SqliteEventRepo, sqlite_rsvp_repo::SqliteRsvpRepo},
    },
    domain::{
        models::{
            auth::Claims,
            event::{Event, NewEventParams},
            notification::{NotificationPayload, NotificationType},
        },
        ports::NotificationEmitter,
        services::clock::Clock,
    },
    error::AppError,
};
use sqlx::{Pool, Sqlite};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;
use serde_json::Value;

pub const JWT_SECRET: &str = "test-secret";
pub const AUDIENCE: &str = "rsvp-frontend";

/// A clock that only moves when the test says so.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Records every emitted notification; can be switched to fail on demand.
#[derive(Default)]
pub struct RecordingEmitter {
    sent: Mutex<Vec<NotificationPayload>>,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl RecordingEmitter {
    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, user_id: &str) -> Vec<NotificationType> {
        self.sent().into_iter().filter(|n| n.user_id == user_id).map(|n| n.kind).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationEmitter for RecordingEmitter {
    async fn emit(&self, notification: &NotificationPayload) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("notification backend unavailable".into()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
    pub emitter: Arc<RecordingEmitter>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(RsvpSettings {
            cooldown_secs: 600,
            max_tx_attempts: 5,
            retry_base_ms: 5,
        }).await
    }

    pub async fn with_settings(settings: RsvpSettings) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let pool = connect_sqlite(&db_url).await.expect("Failed to open test db");

        let config = Config {
            database_url: db_url,
            port: 0,
            jwt_secret: JWT_SECRET.to_string(),
            auth_audience: AUDIENCE.to_string(),
            rsvp: settings,
        };

        let clock = Arc::new(ManualClock::new(Utc::now().trunc_subsecs(0)));
        let emitter = Arc::new(RecordingEmitter::default());

        let state = Arc::new(AppState::new(
            config,
            Arc::new(SqliteEventRepo::new(pool.clone())),
            Arc::new(SqliteRsvpRepo::new(pool.clone())),
            emitter.clone(),
            clock.clone(),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            clock,
            emitter,
        }
    }

    pub fn token_for(&self, user_id: &str) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            aud: AUDIENCE.to_string(),
            exp: now + 3600,
            iat: now,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
    }

    /// Sends a request as `user` (anonymous when `None`) and returns status plus JSON body.
    pub async fn request(&self, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value, axum::http::HeaderMap) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user {
            builder = builder.header(header::COOKIE, format!("{}={}", ACCESS_TOKEN_COOKIE, self.token_for(user_id)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json, headers)
    }

    /// Inserts an active event directly through the repository.
    pub async fn seed_event(&self, creator_id: &str, max_participants: Option<i32>, organizers: &[&str]) -> Event {
        let event = Event::new(NewEventParams {
            title: "Community dinner".into(),
            description: Some("Bring a dish".into()),
            max_participants,
            creator_id: creator_id.into(),
            organizers: organizers.iter().map(|o| o.to_string()).collect(),
        });
        self.state.event_repo.create(&event).await.unwrap()
    }

    pub async fn participants(&self, event_id: &str) -> Vec<String> {
        let ledger = self.state.event_repo.find_ledger(event_id).await.unwrap().unwrap();
        ledger.participants.into_iter().collect()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
