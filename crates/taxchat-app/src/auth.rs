//! Account state: the logged-in user and the bearer token kept in the store.

use regex::Regex;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use taxchat_api::{ApiError, AuthApi};
use taxchat_logging::{debug_line, warn_line};
use taxchat_types::{ProfileUpdate, Registration, RecentChat, User};

use crate::storage::{SharedStore, StoreError, ACTIVE_SESSION_KEY, AUTH_TOKEN_KEY, RECENT_CHATS_KEY};

pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 50;
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_PASSWORD_CHARS: usize = 128;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("invalid email pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

fn email_regex() -> Result<&'static Regex, regex::Error> {
    static EMAIL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN)).as_ref().map_err(Clone::clone)
}

pub fn validate_email(email: &str) -> AuthResult<()> {
    if email_regex()?.is_match(email.trim()) {
        Ok(())
    } else {
        Err(AuthError::Validation(format!("'{}' is not a valid email address", email)))
    }
}

pub fn validate_username(username: &str) -> AuthResult<()> {
    let chars = username.chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&chars) {
        return Err(AuthError::Validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AuthError::Validation(
            "Username must contain only letters and numbers".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> AuthResult<()> {
    let chars = password.chars().count();
    if chars < MIN_PASSWORD_CHARS {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    if chars > MAX_PASSWORD_CHARS {
        return Err(AuthError::Validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_CHARS
        )));
    }
    Ok(())
}

pub struct AuthSession<A: AuthApi + ?Sized> {
    api: Arc<A>,
    store: SharedStore,
    user: Option<User>,
    token: Option<String>,
    verbose: bool,
}

impl<A: AuthApi + ?Sized> AuthSession<A> {
    pub fn new(api: Arc<A>, store: SharedStore) -> Self {
        Self {
            api,
            store,
            user: None,
            token: None,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Pick up a stored token and check it is still accepted.
    ///
    /// A rejected token is removed from the store; that is not an error.
    pub async fn restore(&mut self) -> AuthResult<Option<&User>> {
        let stored = self.store.lock().await.get(AUTH_TOKEN_KEY);
        let Some(token) = stored.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        self.api.set_token(Some(token.clone()));
        match self.api.me().await {
            Ok(user) => {
                debug_line(self.verbose, format!("👤 Signed in as {}", user.email));
                self.token = Some(token);
                self.user = Some(user);
            }
            Err(e) => {
                debug_line(self.verbose, format!("🔒 Stored token rejected: {}", e));
                self.clear().await?;
            }
        }
        Ok(self.user.as_ref())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> AuthResult<&User> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        let tokens = self.api.login(email.trim(), password).await?;
        self.adopt(tokens.access_token, tokens.user).await
    }

    pub async fn register(&mut self, registration: &Registration) -> AuthResult<&User> {
        validate_email(&registration.email)?;
        validate_username(&registration.username)?;
        validate_password(&registration.password)?;

        let tokens = self.api.register(registration).await?;
        self.adopt(tokens.access_token, tokens.user).await
    }

    async fn adopt(&mut self, token: String, user: User) -> AuthResult<&User> {
        self.store.lock().await.set(AUTH_TOKEN_KEY, &token)?;
        self.api.set_token(Some(token.clone()));
        self.token = Some(token);
        debug_line(self.verbose, format!("👤 Signed in as {}", user.email));
        self.user = Some(user);
        self.link_anonymous_chats().await?;
        self.user.as_ref().ok_or(AuthError::NotAuthenticated)
    }

    /// Detach the anonymous active session so the next chat request opens
    /// one that belongs to the account. Recent chats are kept.
    pub async fn link_anonymous_chats(&self) -> AuthResult<bool> {
        let mut store = self.store.lock().await;
        let anonymous = store.get(ACTIVE_SESSION_KEY).is_some();
        let recent = match store.get_json::<Vec<RecentChat>>(RECENT_CHATS_KEY) {
            Ok(chats) => chats.unwrap_or_default(),
            Err(e) => {
                warn_line(format!("Ignoring stored recent chats: {}", e));
                Vec::new()
            }
        };

        if !anonymous && recent.is_empty() {
            return Ok(false);
        }

        debug_line(self.verbose, "🔗 Linking anonymous chats to user account...");
        store.remove(ACTIVE_SESSION_KEY)?;
        Ok(true)
    }

    /// Sign out locally even when the backend call fails
    pub async fn logout(&mut self) -> AuthResult<()> {
        if let Err(e) = self.api.logout().await {
            debug_line(self.verbose, format!("Logout cleanup: {}", e));
        }
        self.clear().await
    }

    pub async fn update_profile(&mut self, full_name: Option<String>) -> AuthResult<&User> {
        self.require_login()?;
        let updated = self.api.update_profile(&ProfileUpdate { full_name }).await?;
        Ok(self.user.insert(updated.user))
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> AuthResult<Option<String>> {
        self.require_login()?;
        validate_password(new_password)?;
        let ack = self.api.change_password(current_password, new_password).await?;
        Ok(ack.message)
    }

    /// Request a reset link; development backends also hand back the token
    pub async fn forgot_password(&self, email: &str) -> AuthResult<Option<String>> {
        validate_email(email)?;
        let requested = self.api.forgot_password(email.trim()).await?;
        Ok(requested.demo_token)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<Option<String>> {
        if token.trim().is_empty() {
            return Err(AuthError::Validation("Reset token is required".to_string()));
        }
        validate_password(new_password)?;
        let ack = self.api.reset_password(token.trim(), new_password).await?;
        Ok(ack.message)
    }

    fn require_login(&self) -> AuthResult<()> {
        if self.token.is_some() {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated)
        }
    }

    async fn clear(&mut self) -> AuthResult<()> {
        self.api.set_token(None);
        self.token = None;
        self.user = None;
        self.store.lock().await.remove(AUTH_TOKEN_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use taxchat_api::ApiResult;
    use taxchat_types::{
        Acknowledgement, PasswordResetRequested, ProfileUpdated, TokenResponse,
    };
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeAuth {
        token: Mutex<Option<String>>,
        fail_logout: bool,
        calls: Mutex<Vec<String>>,
    }

    fn user(email: &str) -> User {
        User {
            id: 1,
            email: email.to_string(),
            username: "ada".to_string(),
            full_name: None,
            is_verified: false,
            created_at: "2024-07-01T10:00:00".to_string(),
        }
    }

    fn unauthorized() -> ApiError {
        ApiError::Http { status: 401, body: "{\"detail\":\"Could not validate credentials\"}".to_string() }
    }

    impl FakeAuth {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn current_token(&self) -> Option<String> {
            self.token.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn register(&self, registration: &Registration) -> ApiResult<TokenResponse> {
            self.record("register");
            Ok(TokenResponse {
                access_token: "tok-new".to_string(),
                token_type: "bearer".to_string(),
                expires_in: 1800,
                user: user(&registration.email),
            })
        }

        async fn login(&self, email: &str, password: &str) -> ApiResult<TokenResponse> {
            self.record("login");
            if password != "secret123" {
                return Err(unauthorized());
            }
            Ok(TokenResponse {
                access_token: "tok-123".to_string(),
                token_type: "bearer".to_string(),
                expires_in: 1800,
                user: user(email),
            })
        }

        async fn me(&self) -> ApiResult<User> {
            self.record("me");
            match self.current_token().as_deref() {
                Some("tok-123") => Ok(user("ada@example.ng")),
                _ => Err(unauthorized()),
            }
        }

        async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<ProfileUpdated> {
            self.record("update_profile");
            let mut updated = user("ada@example.ng");
            updated.full_name = update.full_name.clone();
            Ok(ProfileUpdated { message: None, user: updated })
        }

        async fn change_password(&self, _current: &str, _new: &str) -> ApiResult<Acknowledgement> {
            self.record("change_password");
            Ok(Acknowledgement { message: Some("Password changed successfully".to_string()) })
        }

        async fn forgot_password(&self, _email: &str) -> ApiResult<PasswordResetRequested> {
            self.record("forgot_password");
            Ok(PasswordResetRequested {
                message: None,
                demo_token: Some("reset-abc".to_string()),
            })
        }

        async fn reset_password(&self, _token: &str, _new: &str) -> ApiResult<Acknowledgement> {
            self.record("reset_password");
            Ok(Acknowledgement::default())
        }

        async fn logout(&self) -> ApiResult<Acknowledgement> {
            self.record("logout");
            if self.fail_logout {
                return Err(ApiError::Http { status: 500, body: String::new() });
            }
            Ok(Acknowledgement::default())
        }

        fn set_token(&self, token: Option<String>) {
            *self.token.lock().unwrap() = token;
        }
    }

    fn setup(api: FakeAuth) -> (TempDir, SharedStore, Arc<FakeAuth>, AuthSession<FakeAuth>) {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(temp.path()).unwrap().shared();
        let api = Arc::new(api);
        let session = AuthSession::new(api.clone(), store.clone());
        (temp, store, api, session)
    }

    #[test]
    fn test_email_pattern_compiles() {
        assert!(email_regex().is_ok());
    }

    #[test]
    fn test_validators() {
        assert!(validate_email("ada@example.ng").is_ok());
        assert!(validate_email("first.last+tag@mail.example.com").is_ok());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("not an email").is_err());

        assert!(validate_username("ada").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("ada_l").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());

        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[tokio::test]
    async fn test_login_stores_token_and_unlinks_anonymous_session() {
        let (_temp, store, api, mut auth) = setup(FakeAuth::default());
        store.lock().await.set(ACTIVE_SESSION_KEY, "anon-1").unwrap();

        let user = auth.login("ada@example.ng", "secret123").await.unwrap();
        assert_eq!(user.email, "ada@example.ng");

        assert!(auth.is_authenticated());
        assert_eq!(auth.token(), Some("tok-123"));
        assert_eq!(api.current_token().as_deref(), Some("tok-123"));

        let store = store.lock().await;
        assert_eq!(store.get(AUTH_TOKEN_KEY).as_deref(), Some("tok-123"));
        assert_eq!(store.get(ACTIVE_SESSION_KEY), None);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state_untouched() {
        let (_temp, store, _api, mut auth) = setup(FakeAuth::default());
        store.lock().await.set(ACTIVE_SESSION_KEY, "anon-1").unwrap();

        let err = auth.login("ada@example.ng", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AuthError::Api(ref e) if e.is_unauthorized()));
        assert!(!auth.is_authenticated());
        assert_eq!(store.lock().await.get(ACTIVE_SESSION_KEY).as_deref(), Some("anon-1"));
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_backend() {
        let (_temp, _store, api, mut auth) = setup(FakeAuth::default());

        let err = auth.login("nobody", "secret123").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let registration = Registration {
            email: "ada@example.ng".to_string(),
            username: "a!".to_string(),
            password: "secret123".to_string(),
            full_name: None,
        };
        assert!(matches!(auth.register(&registration).await, Err(AuthError::Validation(_))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let (_temp, store, _api, mut auth) = setup(FakeAuth::default());
        let registration = Registration {
            email: "grace@example.ng".to_string(),
            username: "grace".to_string(),
            password: "secret123".to_string(),
            full_name: Some("Grace Hopper".to_string()),
        };

        let user = auth.register(&registration).await.unwrap();
        assert_eq!(user.email, "grace@example.ng");
        assert_eq!(store.lock().await.get(AUTH_TOKEN_KEY).as_deref(), Some("tok-new"));
    }

    #[tokio::test]
    async fn test_link_without_anonymous_state_is_a_no_op() {
        let (_temp, _store, _api, auth) = setup(FakeAuth::default());
        assert!(!auth.link_anonymous_chats().await.unwrap());
    }

    #[tokio::test]
    async fn test_restore_with_valid_token() {
        let (_temp, store, _api, mut auth) = setup(FakeAuth::default());
        store.lock().await.set(AUTH_TOKEN_KEY, "tok-123").unwrap();

        let restored = auth.restore().await.unwrap().cloned();
        assert_eq!(restored.map(|u| u.email).as_deref(), Some("ada@example.ng"));
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_drops_rejected_token() {
        let (_temp, store, api, mut auth) = setup(FakeAuth::default());
        store.lock().await.set(AUTH_TOKEN_KEY, "expired").unwrap();

        assert!(auth.restore().await.unwrap().is_none());
        assert!(!auth.is_authenticated());
        assert_eq!(api.current_token(), None);
        assert_eq!(store.lock().await.get(AUTH_TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_restore_without_token_skips_backend() {
        let (_temp, _store, api, mut auth) = setup(FakeAuth::default());
        assert!(auth.restore().await.unwrap().is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_token_even_when_backend_fails() {
        let (_temp, store, api, mut auth) = setup(FakeAuth { fail_logout: true, ..Default::default() });
        auth.login("ada@example.ng", "secret123").await.unwrap();

        auth.logout().await.unwrap();

        assert!(!auth.is_authenticated());
        assert_eq!(auth.token(), None);
        assert_eq!(api.current_token(), None);
        assert_eq!(store.lock().await.get(AUTH_TOKEN_KEY), None);
        assert_eq!(api.calls(), vec!["login", "logout"]);
    }

    #[tokio::test]
    async fn test_profile_and_password_require_login() {
        let (_temp, _store, _api, mut auth) = setup(FakeAuth::default());
        assert!(matches!(
            auth.update_profile(Some("Ada".to_string())).await,
            Err(AuthError::NotAuthenticated)
        ));
        assert!(matches!(
            auth.change_password("secret123", "newsecret").await,
            Err(AuthError::NotAuthenticated)
        ));

        auth.login("ada@example.ng", "secret123").await.unwrap();
        let updated = auth.update_profile(Some("Ada Lovelace".to_string())).await.unwrap();
        assert_eq!(updated.display_name(), "Ada Lovelace");
        assert_eq!(auth.user().map(|u| u.display_name()), Some("Ada Lovelace"));

        let message = auth.change_password("secret123", "newsecret").await.unwrap();
        assert_eq!(message.as_deref(), Some("Password changed successfully"));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (_temp, _store, _api, auth) = setup(FakeAuth::default());
        let demo = auth.forgot_password("ada@example.ng").await.unwrap();
        assert_eq!(demo.as_deref(), Some("reset-abc"));

        assert!(auth.reset_password("reset-abc", "newsecret").await.is_ok());
        assert!(matches!(
            auth.reset_password("", "newsecret").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.reset_password("reset-abc", "123").await,
            Err(AuthError::Validation(_))
        ));
    }
}
