#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Credential of the operator allowed to call the protected user routes.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub username: String,
    pub password: String,
}

/// Account rules that vary per deployment.
#[derive(Debug, Clone, Copy)]
pub struct AccountPolicy {
    pub min_password_len: usize,
    /// When false, login handles are lowercased before they are stored or looked up.
    pub handle_case_sensitive: bool,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            min_password_len: 8,
            handle_case_sensitive: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub operator: OperatorConfig,
    pub policy: AccountPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "blog-accounts".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "blog-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let operator = OperatorConfig {
            username: std::env::var("OPERATOR_USER").unwrap_or_else(|_| "root".into()),
            password: std::env::var("OPERATOR_PASSWORD")?,
        };
        let defaults = AccountPolicy::default();
        let policy = AccountPolicy {
            min_password_len: std::env::var("PASSWORD_MIN_LEN")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.min_password_len),
            handle_case_sensitive: std::env::var("HANDLE_CASE_SENSITIVE")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.handle_case_sensitive),
        };
        Ok(Self {
            database_url,
            jwt,
            operator,
            policy,
        })
    }
}
