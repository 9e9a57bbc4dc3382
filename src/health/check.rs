//! The probe interface components register with the monitor.

use async_trait::async_trait;
use std::future::Future;

use super::{HealthCheckError, HealthProbe};

/// A health probe for one component.
///
/// Returning `Err` counts as a failed attempt and is retried; a returned
/// probe is taken as the component's status.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> Result<HealthProbe, HealthCheckError>;
}

/// Adapts an async closure into a [`HealthCheck`].
///
/// ```
/// use dualroute::health::{FnHealthCheck, HealthCheckError, HealthProbe};
///
/// let check = FnHealthCheck::new(|| async { Ok::<_, HealthCheckError>(HealthProbe::healthy()) });
/// # let _ = check;
/// ```
pub struct FnHealthCheck<F> {
    probe: F,
}

impl<F> FnHealthCheck<F> {
    pub fn new(probe: F) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl<F, Fut> HealthCheck for FnHealthCheck<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<HealthProbe, HealthCheckError>> + Send,
{
    async fn check(&self) -> Result<HealthProbe, HealthCheckError> {
        (self.probe)().await
    }
}
