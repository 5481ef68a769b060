//! In-memory stand-ins for the database, object storage and Google, plus request helpers
//! for driving the router in tests.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
};
use bytes::Bytes;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    admin::repo::{Admin, AdminRepo},
    appointments::repo::{Appointment, AppointmentRepo, NewAppointment},
    auth::{
        claims::IdentityDomain,
        extractors::AUTH_HEADER,
        google::{ExternalIdentity, IdentityVerifier},
        jwt::JwtKeys,
        repo::UserRepo,
        repo_types::{NewUser, User, UserPatch},
    },
    config::{AppConfig, JwtConfig, StorageConfig},
    db::{RepoError, RepoResult},
    feedback::repo::{Feedback, FeedbackRepo},
    properties::{
        repo::PropertyRepo,
        repo_types::{City, NewProperty, Property, PropertyFilter, PropertyPatch},
        workflow::ApprovalWorkflow,
    },
    state::AppState,
    storage::StorageClient,
};

#[derive(Default)]
pub struct MemoryUserRepo {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict);
        }
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            contact: user.contact,
            address: user.address,
            photo: user.photo,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_profile(&self, id: Uuid, patch: UserPatch) -> RepoResult<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(email) = &patch.email {
            if rows.iter().any(|u| &u.email == email && u.id != id) {
                return Err(RepoError::Conflict);
            }
        }
        let Some(user) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = patch.name {
            user.name = v;
        }
        if let Some(v) = patch.email {
            user.email = v;
        }
        if let Some(v) = patch.contact {
            user.contact = v;
        }
        if let Some(v) = patch.address {
            user.address = v;
        }
        if let Some(v) = patch.photo {
            user.photo = Some(v);
        }
        Ok(Some(user.clone()))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = Some(password_hash.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn new_admin(username: &str, passkey_hash: &str) -> Admin {
    Admin {
        id: Uuid::new_v4(),
        username: username.to_string(),
        passkey_hash: passkey_hash.to_string(),
        created_at: OffsetDateTime::now_utc(),
    }
}

#[derive(Default)]
pub struct MemoryAdminRepo {
    rows: Mutex<Vec<Admin>>,
}

#[async_trait]
impl AdminRepo for MemoryAdminRepo {
    async fn create(&self, username: &str, passkey_hash: &str) -> RepoResult<Admin> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|a| a.username == username) {
            return Err(RepoError::Conflict);
        }
        let admin = new_admin(username, passkey_hash);
        rows.push(admin.clone());
        Ok(admin)
    }

    async fn create_first(&self, username: &str, passkey_hash: &str) -> RepoResult<Option<Admin>> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.is_empty() {
            return Ok(None);
        }
        let admin = new_admin(username, passkey_hash);
        rows.push(admin.clone());
        Ok(Some(admin))
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Admin>> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Admin>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Admin>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.len() <= 1 {
            return Ok(false);
        }
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() != before)
    }
}

fn filter_matches(f: &PropertyFilter, p: &Property) -> bool {
    f.approved.map_or(true, |a| p.approved == a)
        && f.owner.map_or(true, |o| p.user_id == o)
        && f.id.map_or(true, |id| p.id == id)
        && f.city.as_ref().map_or(true, |c| &p.city == c)
        && f.kind.as_ref().map_or(true, |k| &p.kind == k)
        && f.categories.as_ref().map_or(true, |c| &p.categories == c)
}

#[derive(Default)]
pub struct MemoryPropertyRepo {
    rows: Mutex<Vec<Property>>,
    cities: Vec<City>,
}

impl MemoryPropertyRepo {
    pub fn with_cities(cities: Vec<City>) -> Self {
        Self {
            rows: Mutex::default(),
            cities,
        }
    }
}

#[async_trait]
impl PropertyRepo for MemoryPropertyRepo {
    async fn insert(&self, listing: NewProperty) -> RepoResult<Property> {
        let row = Property {
            id: Uuid::new_v4(),
            user_id: listing.user_id,
            image: listing.image,
            image_key: listing.image_key,
            name: listing.name,
            kind: listing.kind,
            categories: listing.categories,
            size: listing.size,
            address: listing.address,
            city: listing.city,
            condition: listing.condition,
            approved: false,
            last_updated: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Property>> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, id: Uuid, patch: PropertyPatch) -> RepoResult<Option<Property>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(p) = rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let fields = [
            (patch.name, &mut p.name),
            (patch.kind, &mut p.kind),
            (patch.categories, &mut p.categories),
            (patch.size, &mut p.size),
            (patch.address, &mut p.address),
            (patch.city, &mut p.city),
            (patch.condition, &mut p.condition),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
        p.approved = false;
        p.last_updated = OffsetDateTime::now_utc();
        Ok(Some(p.clone()))
    }

    async fn set_approved(&self, id: Uuid) -> RepoResult<Option<Property>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|p| p.id == id).map(|p| {
            p.approved = true;
            p.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> RepoResult<Option<Property>> {
        let mut rows = self.rows.lock().unwrap();
        let idx = rows.iter().position(|p| p.id == id);
        Ok(idx.map(|i| rows.remove(i)))
    }

    async fn list(&self, filter: &PropertyFilter) -> RepoResult<Vec<Property>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter_matches(filter, p))
            .cloned()
            .collect())
    }

    async fn cities(&self) -> RepoResult<Vec<City>> {
        Ok(self.cities.clone())
    }
}

#[derive(Default)]
pub struct MemoryAppointmentRepo {
    pub rows: Mutex<Vec<Appointment>>,
}

#[async_trait]
impl AppointmentRepo for MemoryAppointmentRepo {
    async fn insert(&self, appt: NewAppointment) -> RepoResult<Appointment> {
        let row = Appointment {
            id: Uuid::new_v4(),
            user_id: appt.user_id,
            property_id: appt.property_id,
            name: appt.name,
            email: appt.email,
            mobile: appt.mobile,
            appointment_date: appt.appointment_date,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

#[derive(Default)]
pub struct MemoryFeedbackRepo {
    pub rows: Mutex<Vec<Feedback>>,
}

#[async_trait]
impl FeedbackRepo for MemoryFeedbackRepo {
    async fn insert(&self, name: &str, email: &str, feedback: &str) -> RepoResult<Feedback> {
        let row = Feedback {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            feedback: feedback.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

/// Object storage kept in a map. Public URLs are `/<key>`.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl FakeStorage {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("/{key}")
    }
}

/// Accepts tokens of the form `google:<email>`.
pub struct FakeVerifier;

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, id_token: &str) -> anyhow::Result<ExternalIdentity> {
        let email = id_token
            .strip_prefix("google:")
            .ok_or_else(|| anyhow::anyhow!("bad google token"))?;
        Ok(ExternalIdentity {
            email: email.to_string(),
            name: "Google User".into(),
            picture: Some("https://lh3.example/p.png".into()),
        })
    }
}

pub fn test_config() -> AppConfig {
    let jwt = |audience: &str, secret: &str, ttl| JwtConfig {
        secret: secret.into(),
        issuer: "sarvavyapi-test".into(),
        audience: audience.into(),
        ttl_minutes: ttl,
    };
    AppConfig {
        database_url: "postgres://unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        user_jwt: jwt("sarvavyapi-users", "user-secret", Some(60)),
        admin_jwt: jwt("sarvavyapi-admins", "admin-secret", Some(60)),
        google_client_id: Some("test-client".into()),
        storage: StorageConfig::Local {
            root: PathBuf::from("./target/test-uploads"),
            public_base: String::new(),
        },
        max_upload_bytes: 1024 * 1024,
    }
}

/// State wired to in-memory backends, plus a handle on the fake storage.
pub fn fake_state_with_storage() -> (AppState, Arc<FakeStorage>) {
    let config = test_config();
    let storage = Arc::new(FakeStorage::default());
    let state = AppState {
        user_tokens: Arc::new(JwtKeys::new(&config.user_jwt, IdentityDomain::User)),
        admin_tokens: Arc::new(JwtKeys::new(&config.admin_jwt, IdentityDomain::Admin)),
        users: Arc::new(MemoryUserRepo::default()),
        admins: Arc::new(MemoryAdminRepo::default()),
        listings: ApprovalWorkflow::new(Arc::new(MemoryPropertyRepo::with_cities(vec![City {
            id: Uuid::new_v4(),
            name: "Pune".into(),
            state: "Maharashtra".into(),
            kind: "city".into(),
        }]))),
        appointments: Arc::new(MemoryAppointmentRepo::default()),
        feedback: Arc::new(MemoryFeedbackRepo::default()),
        storage: storage.clone(),
        identity: Arc::new(FakeVerifier),
        config: Arc::new(config),
    };
    (state, storage)
}

pub fn fake_state() -> AppState {
    fake_state_with_storage().0
}

/// Stores an admin and returns a token for it.
pub async fn seeded_admin_token(state: &AppState, username: &str) -> String {
    let admin = state.admins.create(username, "unused-hash").await.unwrap();
    state.admin_tokens.issue(admin.id, &admin.username).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        req = req.header(AUTH_HEADER, t);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method(Method::GET).uri(uri);
    if let Some(t) = token {
        req = req.header(AUTH_HEADER, t);
    }
    req.body(Body::empty()).unwrap()
}

/// File part for [`multipart_request`].
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
}

const BOUNDARY: &str = "X-SARVAVYAPI-TEST-BOUNDARY";

pub fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<FilePart<'_>>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(f) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                f.field, f.file_name, f.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(f.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut req = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(t) = token {
        req = req.header(AUTH_HEADER, t);
    }
    req.body(Body::from(body)).unwrap()
}

pub async fn body_json(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
