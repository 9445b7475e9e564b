//! Service supervisor (C11): runs a fixed set of long-lived services
//! concurrently and tears all of them down the moment any one fails.

use crate::error::ServerError;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

type ServiceFuture = Pin<Box<dyn Future<Output = Result<(), ServerError>> + Send>>;

pub struct Supervisor {
    services: Vec<ServiceFuture>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self { services: Vec::new() }
    }

    pub fn add<F>(mut self, service: F) -> Self
    where
        F: Future<Output = Result<(), ServerError>> + Send + 'static,
    {
        self.services.push(Box::pin(service));
        self
    }

    /// Spawns every service on its own task. The first failure signals
    /// `cancel` to the rest; returns once all services have exited, joining
    /// every error that occurred.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), Vec<ServerError>> {
        if self.services.is_empty() {
            return Err(vec![ServerError::NoServices]);
        }

        let mut set = tokio::task::JoinSet::new();
        for service in self.services {
            set.spawn(service);
        }

        let mut errors = Vec::new();
        while let Some(result) = set.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "service failed, signalling shutdown");
                    cancel.cancel();
                    errors.push(e);
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "service task panicked");
                    cancel.cancel();
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
