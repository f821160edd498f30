use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::TokenService;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, AuthService, Mailer, SeaOrmAccountService, SeaOrmAuthService,
    SeaOrmTwoFactorService, TwoFactorService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    /// Session token issuer/verifier; the signing secret is read once at
    /// startup and immutable afterwards.
    pub tokens: Arc<TokenService>,

    pub mailer: Arc<Mailer>,

    pub auth_service: Arc<dyn AuthService>,

    pub account_service: Arc<dyn AccountService>,

    pub two_factor_service: Arc<dyn TwoFactorService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = Arc::new(TokenService::new(&config.auth));
        let mailer = Arc::new(Mailer::new(
            config.email.clone(),
            config.auth.app_name.clone(),
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        ));
        let account_service: Arc<dyn AccountService> =
            Arc::new(SeaOrmAccountService::new(store.clone()));
        let two_factor_service: Arc<dyn TwoFactorService> = Arc::new(SeaOrmTwoFactorService::new(
            store.clone(),
            config.auth.app_name.clone(),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            tokens,
            mailer,
            auth_service,
            account_service,
            two_factor_service,
        })
    }
}
