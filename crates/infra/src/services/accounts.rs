//! Accounts: registration by e-mail confirmation, login, user administration.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use stockroom_auth::{
    LoginLog, LoginStatus, NewUser, PasswordHasher, RegistrationClaims, TokenIssuer, User, UserChanges,
    UserRole, normalize_email,
};
use stockroom_core::{DomainError, UserId};
use stockroom_purchasing::Purchase;
use stockroom_sales::Order;

use crate::error::{ServiceError, ServiceResult};
use crate::mailer::{Mail, Mailer};
use crate::store::{Filter, Store, UnitOfWork, Value};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Where a login attempt came from, as recorded in the login log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AccountService<S: Store> {
    store: S,
    tokens: TokenIssuer,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    backend_url: String,
}

impl<S: Store> AccountService<S> {
    pub fn new(
        store: S,
        tokens: TokenIssuer,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        backend_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
            mailer,
            backend_url: backend_url.into(),
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Start a registration. Nothing is stored until the mailed link is
    /// confirmed.
    #[instrument(skip(self, registration), fields(username = %registration.username), err)]
    pub async fn register(&self, registration: Registration) -> ServiceResult<()> {
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let email = normalize_email(&registration.email)?;
        let username = registration.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty").into());
        }

        {
            let mut tx = self.store.begin().await?;
            ensure_identity_free(&mut tx, &username, &email, None).await?;
        }

        let claims = RegistrationClaims {
            username,
            email: email.clone(),
            password_hash: self.hasher.hash(&registration.password),
            phone: registration.phone,
            address: registration.address,
            iat: 0,
            exp: 0,
        };
        let token = self.tokens.issue_registration(claims, Utc::now())?;
        let link = format!("{}/auth/confirm?token={token}", self.backend_url);

        self.mailer
            .send(Mail {
                to: email,
                subject: "Confirm your account".to_string(),
                body: format!("Follow this link within the hour to activate your account:\n{link}"),
            })
            .await
            .map_err(|e| ServiceError::Store(e.to_string()))?;
        Ok(())
    }

    /// Create the customer account carried by a confirmation token.
    #[instrument(skip_all, err)]
    pub async fn confirm(&self, token: &str) -> ServiceResult<User> {
        let claims = self.tokens.verify_registration(token, Utc::now())?;
        let now = Utc::now();
        let user = User::create(
            UserId::new(),
            NewUser {
                username: claims.username,
                email: claims.email,
                password_hash: claims.password_hash,
                role: UserRole::Customer,
                phone: claims.phone,
                address: claims.address,
            },
            now,
        )?;

        let mut tx = self.store.begin().await?;
        ensure_identity_free(&mut tx, &user.username, &user.email, None).await?;
        tx.create(&user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "account confirmed");
        Ok(user)
    }

    /// Check credentials and issue an access token. Every attempt is logged.
    #[instrument(skip(self, credentials, client), fields(ip = %client.ip), err)]
    pub async fn login(&self, credentials: Credentials, client: ClientInfo) -> ServiceResult<LoginOutcome> {
        let now = Utc::now();
        let email = credentials.email.trim().to_ascii_lowercase();

        let mut tx = self.store.begin().await?;
        let user = tx
            .find::<User>(Filter::eq("email", email.as_str()))
            .await?
            .into_iter()
            .next();

        let known = user.as_ref().map(|u| (u.id, u.role));
        let verified = user.filter(|u| self.hasher.verify(&credentials.password, &u.password_hash));
        let Some(user) = verified else {
            tx.create(&LoginLog::record(
                known,
                client.ip,
                client.user_agent,
                LoginStatus::Failed,
                "invalid credentials",
                now,
            ))
            .await?;
            tx.commit().await?;
            warn!(known_account = known.is_some(), "login rejected");
            return Err(ServiceError::Unauthorized);
        };

        let token = self.tokens.issue_access(user.id, user.role, now)?;
        tx.create(&LoginLog::record(
            Some((user.id, user.role)),
            client.ip,
            client.user_agent,
            LoginStatus::Success,
            "login ok",
            now,
        ))
        .await?;
        tx.commit().await?;

        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(LoginOutcome { token, user })
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find(Filter::All).await?)
    }

    pub async fn get_user(&self, id: UserId) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        Ok(tx.require::<User>(id).await?)
    }

    pub async fn update_user(&self, id: UserId, changes: UserChanges) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        let mut user = tx.require_for_update::<User>(id).await?;
        user.revise(changes, Utc::now())?;
        ensure_identity_free(&mut tx, &user.username, &user.email, Some(id)).await?;
        tx.save(&user).await?;
        tx.commit().await?;
        info!(user_id = %id, role = %user.role, "user updated");
        Ok(user)
    }

    /// Refused while orders or purchases still point at the account.
    pub async fn delete_user(&self, id: UserId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        tx.require_for_update::<User>(id).await?;

        let as_customer = Filter::eq("customer_id", Value::id(id));
        let as_staff = Filter::eq("staff_id", Value::id(id));
        if tx.exists::<Order>(as_customer).await?
            || tx.exists::<Order>(as_staff.clone()).await?
            || tx.exists::<Purchase>(as_staff).await?
        {
            return Err(ServiceError::conflict(format!("user {id} is referenced by orders or purchases")));
        }

        tx.delete::<User>(id).await?;
        tx.commit().await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Most recent first.
    pub async fn login_logs(&self) -> ServiceResult<Vec<LoginLog>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find(Filter::All).await?)
    }

    /// Create the startup admin account unless one with that e-mail exists.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = normalize_email(email)?;
        let mut tx = self.store.begin().await?;
        if let Some(existing) = tx
            .find::<User>(Filter::eq("email", email.as_str()))
            .await?
            .into_iter()
            .next()
        {
            return Ok(existing);
        }

        let username = email.split('@').next().unwrap_or("admin").to_string();
        let user = User::create(
            UserId::new(),
            NewUser {
                username,
                email,
                password_hash: self.hasher.hash(password),
                role: UserRole::Admin,
                phone: String::new(),
                address: String::new(),
            },
            Utc::now(),
        )?;
        tx.create(&user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "bootstrap admin created");
        Ok(user)
    }
}

async fn ensure_identity_free<U: UnitOfWork>(
    tx: &mut U,
    username: &str,
    email: &str,
    except: Option<UserId>,
) -> ServiceResult<()> {
    let scoped = |filter: Filter| match except {
        Some(id) => filter.and(Filter::ne("id", Value::id(id))),
        None => filter,
    };
    if tx.exists::<User>(scoped(Filter::eq("username", username))).await? {
        return Err(ServiceError::conflict(format!("username '{username}' is taken")));
    }
    if tx.exists::<User>(scoped(Filter::eq("email", email))).await? {
        return Err(ServiceError::conflict(format!("e-mail '{email}' is already registered")));
    }
    Ok(())
}
