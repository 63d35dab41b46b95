use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::accounts::{
    dto::{LoginCredential, PublicUser, UserPayload},
    jwt::SessionIssuer,
    password::CredentialHasher,
    repo::UserRepository,
    repo_types::{NewUser, User},
};
use crate::config::AccountPolicy;
use crate::error::AccountError;

const MAX_NAME_LEN: usize = 255;
const MAX_HANDLE_LEN: usize = 255;
const MAX_PHOTO_LEN: usize = 5000;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validated, normalized user fields.
struct UserFields {
    name: String,
    login_handle: String,
    password: String,
    photo_url: Option<String>,
}

/// Registration, update, login and lookup rules for blog accounts.
///
/// Caches no user records: every call re-reads the repository.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    sessions: Arc<dyn SessionIssuer>,
    policy: AccountPolicy,
    // Checked against on logins with an unknown handle.
    decoy_hash: Arc<OnceCell<String>>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<dyn SessionIssuer>,
        policy: AccountPolicy,
    ) -> Self {
        Self {
            users,
            hasher,
            sessions,
            policy,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    fn normalize_handle(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if self.policy.handle_case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        }
    }

    fn check_fields(&self, payload: UserPayload) -> Result<UserFields, AccountError> {
        let name = payload.name.trim().to_string();
        if name.is_empty() {
            return Err(AccountError::invalid("nome is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AccountError::invalid("nome is too long"));
        }

        let login_handle = self.normalize_handle(&payload.login_handle);
        if login_handle.is_empty() {
            return Err(AccountError::invalid("usuario is required"));
        }
        if login_handle.chars().count() > MAX_HANDLE_LEN || !is_valid_email(&login_handle) {
            return Err(AccountError::invalid("usuario must be an email address"));
        }

        if payload.password.chars().count() < self.policy.min_password_len {
            return Err(AccountError::invalid(format!(
                "senha must have at least {} characters",
                self.policy.min_password_len
            )));
        }

        let photo_url = payload
            .photo_url
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if photo_url
            .as_ref()
            .is_some_and(|p| p.chars().count() > MAX_PHOTO_LEN)
        {
            return Err(AccountError::invalid("foto is too long"));
        }

        Ok(UserFields {
            name,
            login_handle,
            password: payload.password,
            photo_url,
        })
    }

    async fn hash_password(&self, plain: String) -> Result<String, AccountError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AccountError::Unavailable(e.into()))?
            .map_err(AccountError::Unavailable)
    }

    async fn verify_password(&self, plain: String, hash: String) -> Result<bool, AccountError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .map_err(|e| AccountError::Unavailable(e.into()))?
            .map_err(AccountError::Unavailable)
    }

    /// Create a user. The handle pre-check is an early exit; the store's own
    /// uniqueness constraint decides concurrent registrations.
    #[instrument(skip(self, candidate))]
    pub async fn register(&self, candidate: UserPayload) -> Result<PublicUser, AccountError> {
        let fields = self.check_fields(candidate).inspect_err(|e| {
            warn!(error = %e, "registration rejected");
        })?;

        if self.users.find_by_handle(&fields.login_handle).await?.is_some() {
            warn!(login_handle = %fields.login_handle, "login handle already registered");
            return Err(AccountError::DuplicateUser);
        }

        let password_hash = self.hash_password(fields.password).await?;
        let user = self
            .users
            .insert(NewUser {
                name: fields.name,
                login_handle: fields.login_handle,
                password_hash,
                photo_url: fields.photo_url,
            })
            .await?;

        info!(user_id = user.id, login_handle = %user.login_handle, "user registered");
        Ok(user.into())
    }

    /// Replace every field of an existing user. The password is always re-hashed.
    #[instrument(skip(self, record), fields(user_id = record.id))]
    pub async fn update(&self, record: UserPayload) -> Result<PublicUser, AccountError> {
        let current = self
            .users
            .find_by_id(record.id)
            .await?
            .ok_or(AccountError::NotFound)?;

        let fields = self.check_fields(record).inspect_err(|e| {
            warn!(error = %e, "update rejected");
        })?;

        if let Some(holder) = self.users.find_by_handle(&fields.login_handle).await? {
            if holder.id != current.id {
                warn!(login_handle = %fields.login_handle, "login handle held by another user");
                return Err(AccountError::DuplicateUser);
            }
        }

        let password_hash = self.hash_password(fields.password).await?;
        let replacement = User {
            id: current.id,
            name: fields.name,
            login_handle: fields.login_handle,
            password_hash,
            photo_url: fields.photo_url,
            created_at: current.created_at,
        };

        let stored = self
            .users
            .replace(&replacement)
            .await?
            .ok_or(AccountError::NotFound)?;

        info!(user_id = stored.id, "user updated");
        Ok(stored.into())
    }

    /// Check a login. Unknown handle and wrong password fail the same way.
    #[instrument(skip(self, credential))]
    pub async fn authenticate(
        &self,
        credential: LoginCredential,
    ) -> Result<LoginCredential, AccountError> {
        let login_handle = self.normalize_handle(&credential.login_handle);
        if login_handle.is_empty() || credential.password.is_empty() {
            return Err(AccountError::invalid("usuario and senha are required"));
        }

        let Some(user) = self.users.find_by_handle(&login_handle).await? else {
            let decoy = self
                .decoy_hash
                .get_or_try_init(|| self.hash_password("decoy-password".to_string()))
                .await?
                .clone();
            // Result ignored: the outcome is AuthFailed either way.
            let _ = self.verify_password(credential.password, decoy).await;
            warn!(login_handle = %login_handle, "login unknown handle");
            return Err(AccountError::AuthFailed);
        };

        let ok = self
            .verify_password(credential.password, user.password_hash)
            .await?;
        if !ok {
            warn!(user_id = user.id, "login invalid password");
            return Err(AccountError::AuthFailed);
        }

        let token = self
            .sessions
            .issue(user.id)
            .map_err(AccountError::Unavailable)?;

        info!(user_id = user.id, "user logged in");
        Ok(LoginCredential {
            id: user.id,
            name: user.name,
            login_handle: user.login_handle,
            password: String::new(),
            photo_url: user.photo_url,
            token,
        })
    }

    pub async fn list_all(&self) -> Result<Vec<PublicUser>, AccountError> {
        let users = self.users.list().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<PublicUser, AccountError> {
        self.users
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or(AccountError::NotFound)
    }
}
