use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::Result;

use super::models::AuthUser;
use super::{new_id, Db, StoreError};
use crate::models::ProfilePatch;

impl Db {
    pub async fn create_user(
        &self,
        login: &str,
        password: &str,
        name: Option<&str>,
        surname: Option<&str>,
    ) -> Result<String> {
        let password_hash = hash_password(password)?;
        let user_id = new_id();

        let result = sqlx::query(
            "INSERT INTO users (id, login, password_hash, name, surname) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user_id)
        .bind(login)
        .bind(&password_hash)
        .bind(name)
        .bind(surname)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(StoreError::Conflict(format!("login already exists: {login}")).into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("new user created: id={user_id}, login={login}");
        Ok(user_id)
    }

    pub async fn login_exists(&self, login: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE login = ?)")
            .bind(login)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    pub async fn find_user_by_login(&self, login: &str) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(
            "SELECT id, login, name, surname, score FROM users WHERE login = ?",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn user(&self, user_id: &str) -> Result<AuthUser> {
        sqlx::query_as::<_, AuthUser>("SELECT id, login, name, surname, score FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("user", user_id).into())
    }

    pub async fn verify_user_password(&self, login: &str, password: &str) -> Result<bool> {
        let stored_hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE login = ?")
                .bind(login)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match stored_hash {
            Some(hash) => verify_password(password, &hash),
            None => false,
        })
    }

    pub async fn create_user_session(&self, user_id: &str) -> Result<String> {
        let session = new_id();

        sqlx::query("INSERT INTO user_sessions (id, user_id) VALUES (?, ?)")
            .bind(&session)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("user session created for user_id={user_id}");
        Ok(session)
    }

    pub async fn get_user_by_session(&self, session_id: &str) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(
            r#"
            SELECT u.id, u.login, u.name, u.surname, u.score
            FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Partial profile update; the login is immutable.
    pub async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<AuthUser> {
        let password_hash = match patch.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let updated = sqlx::query(
            r#"
            UPDATE users SET
              name = COALESCE(?, name),
              surname = COALESCE(?, surname),
              password_hash = COALESCE(?, password_hash)
            WHERE id = ?
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.surname)
        .bind(&password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("user", user_id).into());
        }

        tracing::info!("profile updated for user_id={user_id}");
        self.user(user_id).await
    }
}

/// Run argon2 hashing on a dedicated thread with a large stack to avoid
/// stack overflow in debug builds.
fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024) // 4 MB stack
        .spawn(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| color_eyre::eyre::eyre!("failed to hash password: {e}"))
        })?
        .join()
        .map_err(|_| color_eyre::eyre::eyre!("hash thread panicked"))?
}

fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let parsed_hash = match PasswordHash::new(&hash) {
                Ok(h) => h,
                Err(_) => return false,
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .map(|h| h.join().unwrap_or(false))
        .unwrap_or(false)
}
