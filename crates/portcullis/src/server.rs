//! `PortcullisServer` builder and server loop.
//!
//! This is the entry point for running the join endpoint. It ties
//! together all the layers: HTTP → session → orchestration → membership.

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use portcullis_protocol::JsonCodec;
use portcullis_room::MembershipService;
use portcullis_session::{Authenticator, ProfileService};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::handler::join_room;
use crate::{JoinConfig, JoinOrchestrator, PortcullisError};

/// Shared server state passed to each request.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<A, M, P> {
    pub(crate) auth: A,
    pub(crate) orchestrator: JoinOrchestrator<M, P>,
    pub(crate) codec: JsonCodec,
}

/// Builds the HTTP routes for the join endpoint.
///
/// Serves the current `v3` path and the legacy `r0` one. Useful on its
/// own for driving the endpoint in-process.
pub fn router<A, M, P>(auth: A, orchestrator: JoinOrchestrator<M, P>) -> Router
where
    A: Authenticator,
    M: MembershipService,
    P: ProfileService,
{
    let state = Arc::new(ServerState {
        auth,
        orchestrator,
        codec: JsonCodec,
    });

    Router::new()
        .route(
            "/_matrix/client/v3/join/{room_id_or_alias}",
            post(join_room::<A, M, P>),
        )
        .route(
            "/_matrix/client/r0/join/{room_id_or_alias}",
            post(join_room::<A, M, P>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builder for configuring and starting a Portcullis server.
///
/// # Example
///
/// ```rust,ignore
/// use portcullis::prelude::*;
///
/// let server = PortcullisServer::builder()
///     .bind("0.0.0.0:8008")
///     .build(tokens, membership, profiles)
///     .await?;
/// server.run().await
/// ```
pub struct PortcullisServerBuilder {
    bind_addr: String,
    join_config: JoinConfig,
}

impl PortcullisServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8008".to_string(),
            join_config: JoinConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the join configuration.
    pub fn join_config(mut self, config: JoinConfig) -> Self {
        self.join_config = config;
        self
    }

    /// Binds the listener and wires up the collaborators.
    ///
    /// # Errors
    /// [`PortcullisError::Bind`] if the address can't be bound.
    pub async fn build<A, M, P>(
        self,
        auth: A,
        membership: Arc<M>,
        profiles: Arc<P>,
    ) -> Result<PortcullisServer, PortcullisError>
    where
        A: Authenticator,
        M: MembershipService,
        P: ProfileService,
    {
        let listener = TcpListener::bind(&self.bind_addr).await.map_err(|source| {
            PortcullisError::Bind {
                addr: self.bind_addr.clone(),
                source,
            }
        })?;

        let orchestrator = JoinOrchestrator::new(membership, profiles, self.join_config);
        let router = router(auth, orchestrator);

        Ok(PortcullisServer { listener, router })
    }
}

impl Default for PortcullisServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Portcullis server.
///
/// Call [`run()`](Self::run) to start accepting requests.
pub struct PortcullisServer {
    listener: TcpListener,
    router: Router,
}

impl PortcullisServer {
    /// Creates a new builder.
    pub fn builder() -> PortcullisServerBuilder {
        PortcullisServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), PortcullisError> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "Portcullis server running");
        }
        axum::serve(self.listener, self.router)
            .await
            .map_err(PortcullisError::Serve)
    }
}
