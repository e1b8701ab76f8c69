use color_eyre::Result;

use crate::db::models::AuthUser;
use crate::db::Db;
use crate::models::ProfilePatch;

// ---------------------------------------------------------------------------
// AuthRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn login_exists(&self, login: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        login: &str,
        password: &str,
        name: Option<String>,
        surname: Option<String>,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn verify_user_password(
        &self,
        login: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn find_user_by_login(
        &self,
        login: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn create_user_session(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> impl std::future::Future<Output = Result<AuthUser>> + Send;
}

impl AuthRepository for Db {
    async fn login_exists(&self, login: &str) -> Result<bool> {
        Db::login_exists(self, login).await
    }

    async fn create_user(
        &self,
        login: &str,
        password: &str,
        name: Option<String>,
        surname: Option<String>,
    ) -> Result<String> {
        Db::create_user(self, login, password, name.as_deref(), surname.as_deref()).await
    }

    async fn verify_user_password(&self, login: &str, password: &str) -> Result<bool> {
        Db::verify_user_password(self, login, password).await
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<AuthUser>> {
        Db::find_user_by_login(self, login).await
    }

    async fn create_user_session(&self, user_id: &str) -> Result<String> {
        Db::create_user_session(self, user_id).await
    }

    async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        Db::delete_user_session(self, session_id).await
    }

    async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<AuthUser> {
        Db::update_profile(self, user_id, &patch).await
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

pub enum RegisterOutcome {
    /// User created. Contains the new user id.
    Created(String),
    /// Login or password was empty.
    EmptyFields,
    /// Login already in use.
    LoginTaken,
}

pub enum LoginOutcome {
    /// Login succeeded. Contains the session token and the user.
    Success { token: String, user: AuthUser },
    /// Password was incorrect (or login not found).
    InvalidCredentials,
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
}

impl<R: AuthRepository + Clone> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn register(
        &self,
        login: &str,
        password: &str,
        name: Option<String>,
        surname: Option<String>,
    ) -> Result<RegisterOutcome> {
        if login.trim().is_empty() || password.is_empty() {
            return Ok(RegisterOutcome::EmptyFields);
        }

        if self.repo.login_exists(login).await? {
            return Ok(RegisterOutcome::LoginTaken);
        }

        let user_id = self.repo.create_user(login, password, name, surname).await?;
        Ok(RegisterOutcome::Created(user_id))
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<LoginOutcome> {
        let verified = self.repo.verify_user_password(login, password).await?;

        if !verified {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let user = self.repo.find_user_by_login(login).await?.ok_or_else(|| {
            color_eyre::eyre::eyre!("user not found after password verification")
        })?;

        let token = self.repo.create_user_session(&user.id).await?;

        Ok(LoginOutcome::Success { token, user })
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_user_session(session_id).await
    }

    pub async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<AuthUser> {
        self.repo.update_profile(user_id, patch).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
