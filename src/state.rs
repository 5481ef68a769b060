use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    admin::repo::{AdminRepo, PgAdminRepo},
    appointments::repo::{AppointmentRepo, PgAppointmentRepo},
    auth::{
        claims::IdentityDomain,
        google::{GoogleVerifier, IdentityVerifier},
        jwt::JwtKeys,
        repo::{PgUserRepo, UserRepo},
    },
    config::AppConfig,
    feedback::repo::{FeedbackRepo, PgFeedbackRepo},
    properties::{repo::PgPropertyRepo, workflow::ApprovalWorkflow},
    storage::{self, StorageClient},
};

/// Shared, read-only request context. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub user_tokens: Arc<JwtKeys>,
    pub admin_tokens: Arc<JwtKeys>,
    pub users: Arc<dyn UserRepo>,
    pub admins: Arc<dyn AdminRepo>,
    pub listings: ApprovalWorkflow,
    pub appointments: Arc<dyn AppointmentRepo>,
    pub feedback: Arc<dyn FeedbackRepo>,
    pub storage: Arc<dyn StorageClient>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub async fn init(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let storage = storage::from_config(&config.storage).await?;
        let identity = Arc::new(GoogleVerifier::new(config.google_client_id.clone()))
            as Arc<dyn IdentityVerifier>;

        Ok(Self {
            user_tokens: Arc::new(JwtKeys::new(&config.user_jwt, IdentityDomain::User)),
            admin_tokens: Arc::new(JwtKeys::new(&config.admin_jwt, IdentityDomain::Admin)),
            users: Arc::new(PgUserRepo::new(db.clone())),
            admins: Arc::new(PgAdminRepo::new(db.clone())),
            listings: ApprovalWorkflow::new(Arc::new(PgPropertyRepo::new(db.clone()))),
            appointments: Arc::new(PgAppointmentRepo::new(db.clone())),
            feedback: Arc::new(PgFeedbackRepo::new(db)),
            storage,
            identity,
            config: Arc::new(config),
        })
    }
}
