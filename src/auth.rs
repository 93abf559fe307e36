//! Authentication service: signup, login, and session tokens

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use validator::Validate;

use crate::error::validation_message;
use crate::models::{normalize_email, Claims, LoginRequest, NewUser, SignupRequest, User};
use crate::store::{StoreError, UserStore};

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Unauthorized: Invalid token")]
    InvalidToken,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Token signing failed: {0}")]
    Signing(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// One-way password hashing
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError>;
}

/// bcrypt-backed hasher
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError> {
        bcrypt::verify(plaintext, digest).map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

/// Issues and checks session tokens
pub trait SessionTokens: Send + Sync {
    fn issue(&self, user_id: Uuid) -> Result<String, AuthError>;
    fn verify(&self, token: &str) -> Result<Uuid, AuthError>;
}

/// HS256 JWT session tokens
pub struct JwtSessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtSessionTokens {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

impl SessionTokens for JwtSessionTokens {
    fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn SessionTokens>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn SessionTokens>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Register a new user and issue their first session token
    ///
    /// The user is persisted before the token is issued. If issuing fails the
    /// account remains and the caller can simply log in.
    pub async fn signup(&self, request: SignupRequest) -> Result<(User, String), AuthError> {
        let request = SignupRequest {
            full_name: request.full_name.trim().to_string(),
            email: normalize_email(&request.email),
            password: request.password,
        };
        request
            .validate()
            .map_err(|e| AuthError::Validation(validation_message(&e)))?;

        if self.users.find_user_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_blocking(request.password).await?;
        let user = self
            .users
            .insert_user(NewUser {
                full_name: request.full_name,
                email: request.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailTaken,
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "user signed up");

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Check credentials and issue a session token
    pub async fn login(&self, request: LoginRequest) -> Result<(User, String), AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::Validation(validation_message(&e)))?;

        let Some(user) = self
            .users
            .find_user_by_email(&normalize_email(&request.email))
            .await?
        else {
            tracing::debug!("login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_blocking(request.password, user.password_hash.clone())
            .await?
        {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Resolve a session token to its user id
    pub fn verify_token(&self, token: &str) -> Result<Uuid, AuthError> {
        self.tokens.verify(token)
    }

    async fn hash_blocking(&self, password: String) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_blocking(&self, password: String, digest: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service(store: Arc<MemoryStore>, tokens: Arc<dyn SessionTokens>) -> AuthService {
        AuthService::new(store, Arc::new(BcryptHasher::new(4)), tokens)
    }

    fn jwt() -> Arc<dyn SessionTokens> {
        Arc::new(JwtSessionTokens::new("test-secret", Duration::days(7)))
    }

    fn signup(email: &str) -> SignupRequest {
        SignupRequest {
            full_name: "Ana Lima".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_then_login_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(store, jwt());

        let (user, token) = auth.signup(signup(" Ana@Example.com ")).await.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_ne!(user.password_hash, "secret1");
        assert_eq!(auth.verify_token(&token).unwrap(), user.id);

        let (logged_in, _) = auth
            .login(LoginRequest {
                email: "ANA@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_and_bad_credentials_are_rejected() {
        let auth = service(Arc::new(MemoryStore::new()), jwt());
        auth.signup(signup("ana@example.com")).await.unwrap();

        assert!(matches!(
            auth.signup(signup("ana@example.com")).await,
            Err(AuthError::EmailTaken)
        ));

        for (email, password) in [("ana@example.com", "wrong-pw"), ("nobody@example.com", "secret1")] {
            let result = auth
                .login(LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }
    }

    #[tokio::test]
    async fn signup_validates_fields() {
        let auth = service(Arc::new(MemoryStore::new()), jwt());

        let mut short = signup("ana@example.com");
        short.password = "12345".to_string();
        assert!(matches!(auth.signup(short).await, Err(AuthError::Validation(_))));

        let mut unnamed = signup("ana@example.com");
        unnamed.full_name = "   ".to_string();
        assert!(matches!(auth.signup(unnamed).await, Err(AuthError::Validation(_))));

        assert!(matches!(
            auth.signup(signup("not-an-email")).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let ours = JwtSessionTokens::new("ours", Duration::days(1));
        let theirs = JwtSessionTokens::new("theirs", Duration::days(1));
        let token = theirs.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(ours.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(ours.verify("garbage"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = JwtSessionTokens::new("secret", Duration::days(-1));
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken)));
    }

    struct FailingTokens;

    impl SessionTokens for FailingTokens {
        fn issue(&self, _user_id: Uuid) -> Result<String, AuthError> {
            Err(AuthError::Signing("key unavailable".to_string()))
        }
        fn verify(&self, _token: &str) -> Result<Uuid, AuthError> {
            Err(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn user_persists_when_token_issuance_fails() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(store.clone(), Arc::new(FailingTokens));

        let result = auth.signup(signup("ana@example.com")).await;
        assert!(matches!(result, Err(AuthError::Signing(_))));
        assert!(store
            .find_user_by_email("ana@example.com")
            .await
            .unwrap()
            .is_some());
    }
}
