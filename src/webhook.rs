//! One-shot webhook reconciliation at startup.

use anyhow::{Context, Result};
use tracing::{error, info};
use url::Url;

use crate::bot::AppState;
use crate::platform::ChatPlatform;

/// Path the webhook receiver is mounted on.
pub const WEBHOOK_PATH: &str = "/bot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    AlreadySet,
    Registered,
    /// Same URL, re-registered so the platform holds the configured secret.
    SecretRefreshed,
    Replaced { previous: String },
}

/// `public_url` with one trailing slash removed, plus [`WEBHOOK_PATH`].
pub fn target_url(public_url: &str) -> Result<Url> {
    let base = public_url.strip_suffix('/').unwrap_or(public_url);
    let target = format!("{base}{WEBHOOK_PATH}");
    Url::parse(&target).with_context(|| format!("Invalid webhook URL: {target}"))
}

/// Point the platform's webhook at `target`.
///
/// The platform never reports the registered secret, so with a secret
/// configured the webhook is always re-registered to make sure it carries it.
pub async fn reconcile(
    platform: &dyn ChatPlatform,
    target: &Url,
    secret_token: Option<&str>,
) -> Result<Reconciled> {
    let current = platform
        .webhook_url()
        .await
        .context("getWebhookInfo failed")?
        .filter(|url| !url.is_empty());

    let outcome = match current {
        Some(previous) if previous == target.as_str() => {
            if secret_token.is_none() {
                info!("Webhook already set to {}", target);
                return Ok(Reconciled::AlreadySet);
            }
            info!(
                "Webhook already set to {}; re-registering to apply the secret token",
                target
            );
            Reconciled::SecretRefreshed
        }
        Some(previous) => {
            info!("Replacing existing webhook: {}", previous);
            platform
                .delete_webhook()
                .await
                .context("deleteWebhook failed")?;
            Reconciled::Replaced { previous }
        }
        None => Reconciled::Registered,
    };

    info!("Setting webhook to {}", target);
    platform
        .set_webhook(target, secret_token)
        .await
        .context("setWebhook failed")?;

    Ok(outcome)
}

/// Identity check followed by webhook reconciliation. Failures are logged and
/// leave the server running.
pub async fn run_startup(state: &AppState, public_url: &str) {
    let me = match state.platform.identity().await {
        Ok(me) => me,
        Err(e) => {
            error!("Webhook setup failed: identity check: {:#}", e);
            return;
        }
    };
    info!("Authenticated as @{} (id {})", me.username, me.id);
    state.set_bot_username(me.username).await;

    let result = match target_url(public_url) {
        Ok(target) => {
            reconcile(
                state.platform.as_ref(),
                &target,
                state.webhook_secret.as_deref(),
            )
            .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(Reconciled::Replaced { previous }) => {
            info!("Webhook moved off {}", previous);
        }
        Ok(_) => {}
        Err(e) => error!("Webhook setup failed: {:#}", e),
    }
}
