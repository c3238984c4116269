use tracing::{info, warn};

use crate::accounts::Credential;
use crate::api::{ApiResult, GameApi};

/// A logged-in account. The token lives as long as the process.
#[derive(Debug, Clone)]
pub struct Session {
    pub credential: Credential,
    pub token: String,
}

impl Session {
    pub fn account(&self) -> usize {
        self.credential.account
    }
}

/// Log in a single account.
pub async fn login<A: GameApi>(api: &A, credential: &Credential) -> ApiResult<Session> {
    let token = api.login(credential).await?;
    Ok(Session {
        credential: credential.clone(),
        token,
    })
}

/// Log in every account one after another, keeping only the ones that succeed.
///
/// Order of the returned sessions follows `credentials`. Accounts whose login
/// fails are logged and dropped for the rest of the run.
pub async fn bootstrap<A: GameApi>(api: &A, credentials: &[Credential]) -> Vec<Session> {
    let mut sessions = Vec::with_capacity(credentials.len());

    for credential in credentials {
        match login(api, credential).await {
            Ok(session) => {
                info!("Account {} logged in", credential.account);
                sessions.push(session);
            }
            Err(e) => {
                warn!(
                    "Login failed for account {} ({}): {e}",
                    credential.account,
                    credential.preview()
                );
            }
        }
    }

    info!(
        "{}/{} account(s) logged in",
        sessions.len(),
        credentials.len()
    );
    sessions
}
