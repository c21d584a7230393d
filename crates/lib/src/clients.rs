//! Shared outbound HTTP clients: one for the completion provider, one for the Graph API.
//!
//! Both are built once by [`ClientManager::start`] and handed out as cheap [`ClientHandle`] clones.
//! `reqwest::Client` pools connections internally, so every in-flight request reuses the same pool.
//! [`ClientManager::release`] runs once at shutdown; afterwards neither the manager nor any
//! outstanding handle will hand out the underlying client again.

use crate::config::ClientsConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("building http client failed: {0}")]
    Build(#[from] reqwest::Error),
    #[error("{0} client used after release")]
    Released(&'static str),
}

/// Handle to a shared client. Clone freely; all clones share one connection pool and one release flag.
#[derive(Clone)]
pub struct ClientHandle {
    name: &'static str,
    client: reqwest::Client,
    released: Arc<AtomicBool>,
}

impl ClientHandle {
    /// Name of the outbound service this client talks to ("completion" or "messaging").
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The underlying client, or `Released` once the manager has been shut down.
    pub fn client(&self) -> Result<&reqwest::Client, ClientError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(ClientError::Released(self.name));
        }
        Ok(&self.client)
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("name", &self.name)
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish()
    }
}

/// Owner of the process-wide outbound clients.
pub struct ClientManager {
    completion: reqwest::Client,
    messaging: reqwest::Client,
    released: Arc<AtomicBool>,
}

impl ClientManager {
    /// Build both clients. Called once at startup, before the server accepts requests.
    pub fn start(settings: &ClientsConfig) -> Result<Self, ClientError> {
        let completion = build_client(settings)?;
        let messaging = build_client(settings)?;
        log::info!(
            "outbound clients created (connect timeout {:?}, request timeout {:?})",
            settings.connect_timeout(),
            settings.request_timeout()
        );
        Ok(Self {
            completion,
            messaging,
            released: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle for the completion provider client.
    pub fn acquire_completion(&self) -> Result<ClientHandle, ClientError> {
        self.acquire("completion", &self.completion)
    }

    /// Handle for the messaging platform (Graph API) client.
    pub fn acquire_messaging(&self) -> Result<ClientHandle, ClientError> {
        self.acquire("messaging", &self.messaging)
    }

    fn acquire(
        &self,
        name: &'static str,
        client: &reqwest::Client,
    ) -> Result<ClientHandle, ClientError> {
        if self.is_released() {
            return Err(ClientError::Released(name));
        }
        Ok(ClientHandle {
            name,
            client: client.clone(),
            released: self.released.clone(),
        })
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Mark both clients released. Returns true only for the call that performed the release.
    /// Pools are closed once the last handle clone is dropped.
    pub fn release(&self) -> bool {
        let first = !self.released.swap(true, Ordering::SeqCst);
        if first {
            log::info!("outbound clients released");
        } else {
            log::warn!("outbound clients already released");
        }
        first
    }
}

fn build_client(settings: &ClientsConfig) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(settings.user_agent.clone())
        .connect_timeout(settings.connect_timeout());
    if let Some(timeout) = settings.request_timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}
