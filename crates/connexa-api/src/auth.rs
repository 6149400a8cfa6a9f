// Authentication endpoints: login, current user, password change and
// two-factor enrollment.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::{ApiClient, encode};
use crate::nodes::path_segment;
use crate::error::{self, Error, GENERIC_FAILURE};
use crate::types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, TwoFactorSetupResponse,
    UserResponse,
};

/// Marker the server puts in `detail` when a TOTP code is missing.
const TWO_FACTOR_MARKER: &str = "2FA";

/// Outcome of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The server wants the password changed before anything else.
    pub require_password_change: bool,
}

impl ApiClient {
    /// Exchange credentials for a bearer token and store it in the session.
    ///
    /// Login failures are reported as [`Error::Authentication`] rather than
    /// [`Error::SessionExpired`]: a 401 here means bad credentials. When no
    /// TOTP code was sent and the `detail` mentions "2FA", the result is
    /// [`Error::TwoFactorRequired`] so the caller can ask for a code and retry.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        totp_token: Option<&str>,
    ) -> Result<LoginOutcome, Error> {
        let body = encode(&LoginRequest {
            username: username.to_owned(),
            password: password.expose_secret().to_owned(),
            totp_token: totp_token.map(str::to_owned),
        })?;

        let (status, raw) = self.send(Method::POST, "auth/login", Some(&body), None).await?;
        let detail = error::extract_detail(&raw);

        // A rejected code also mentions 2FA; that one is a plain auth failure.
        if totp_token.is_none() && detail.as_deref().is_some_and(|d| d.contains(TWO_FACTOR_MARKER)) {
            debug!("login requires a second factor");
            return Err(Error::TwoFactorRequired);
        }

        if !status.is_success() {
            return Err(Error::Authentication {
                message: detail.unwrap_or_else(|| GENERIC_FAILURE.to_owned()),
            });
        }

        let parsed: LoginResponse = serde_json::from_str(&raw).unwrap_or_default();
        let Some(token) = parsed.access_token.filter(|t| !t.is_empty()) else {
            return Err(Error::Authentication {
                message: parsed.detail.unwrap_or_else(|| GENERIC_FAILURE.to_owned()),
            });
        };

        self.session().set_token(SecretString::from(token));
        Ok(LoginOutcome {
            require_password_change: parsed.require_password_change,
        })
    }

    /// `GET /auth/me`
    pub async fn me(&self) -> Result<UserResponse, Error> {
        self.get("auth/me").await
    }

    /// `POST /auth/change-password`
    pub async fn change_password(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<MessageResponse, Error> {
        let body = encode(&ChangePasswordRequest {
            old_password: old_password.expose_secret().to_owned(),
            new_password: new_password.expose_secret().to_owned(),
        })?;
        self.post("auth/change-password", Some(&body)).await
    }

    /// `POST /auth/setup-2fa`: issue a fresh TOTP secret for the current
    /// user. Two-factor login stays off until the secret is verified.
    pub async fn setup_two_factor(&self) -> Result<TwoFactorSetupResponse, Error> {
        self.post("auth/setup-2fa", None).await
    }

    /// `POST /auth/verify-2fa?totp_token={code}`: confirm the secret with
    /// a current code and turn two-factor login on.
    pub async fn verify_two_factor(&self, code: &str) -> Result<MessageResponse, Error> {
        self.post(
            &format!("auth/verify-2fa?totp_token={}", path_segment(code)),
            None,
        )
        .await
    }
}
