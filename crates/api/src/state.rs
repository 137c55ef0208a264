use sqlx::PgPool;

use crate::auth::{AuthConfig, JwtService};
use crate::config::LeagueSettings;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    jwt_service: JwtService,
    league: LeagueSettings,
}

impl AppState {
    pub fn new(db: PgPool, league: LeagueSettings) -> anyhow::Result<Self> {
        let auth_config = AuthConfig::from_env()?;
        Ok(Self::with_auth(db, auth_config, league))
    }

    pub fn with_auth(db: PgPool, auth_config: AuthConfig, league: LeagueSettings) -> Self {
        let jwt_service = JwtService::new(&auth_config);

        Self {
            db,
            jwt_service,
            league,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn league(&self) -> &LeagueSettings {
        &self.league
    }
}
