// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<(User, String), AppError> {
        let email = normalize_email(email);

        // Hashing em thread separada: bcrypt é CPU-bound
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .user_repo
            .create_user(&email, full_name.map(str::trim), &hashed_password)
            .await?;

        tracing::info!("👤 Novo usuário registrado: {}", user.id);

        let token = self.create_token(user.id)?;
        Ok((user, token))
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(User, String), AppError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(user.id)?;
        Ok((user, token))
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        // Token válido de um usuário que não existe mais também é rejeitado
        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub(crate) fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Repositories;

    fn service() -> AuthService {
        AuthService::new(Repositories::in_memory().users, "test-secret".to_string())
    }

    #[tokio::test]
    async fn register_then_login_issues_valid_tokens() {
        let auth = service();

        let (user, token) = auth
            .register_user("Recruiter@Example.com", "s3cret!", Some("Test User"))
            .await
            .unwrap();
        assert_eq!(user.email, "recruiter@example.com");
        assert_eq!(auth.validate_token(&token).await.unwrap().id, user.id);

        let (same, _) = auth.login_user("recruiter@example.com", "s3cret!").await.unwrap();
        assert_eq!(same.id, user.id);
    }

    #[tokio::test]
    async fn rejects_wrong_password_and_duplicate_email() {
        let auth = service();
        auth.register_user("a@example.com", "s3cret!", None).await.unwrap();

        let err = auth.login_user("a@example.com", "wrong-pass").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = auth.register_user("a@example.com", "another", None).await.unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn rejects_tampered_and_foreign_tokens() {
        let auth = service();
        assert!(matches!(auth.validate_token("not-a-jwt").await, Err(AppError::InvalidToken)));

        let other = AuthService::new(Repositories::in_memory().users, "other-secret".to_string());
        let (_, token) = other.register_user("b@example.com", "s3cret!", None).await.unwrap();
        assert!(matches!(auth.validate_token(&token).await, Err(AppError::InvalidToken)));
    }
}
