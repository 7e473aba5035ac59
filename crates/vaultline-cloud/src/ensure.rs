//! Idempotency building blocks
//!
//! - [`probe`] / [`exists`]: existence check, absence is not an error
//! - [`ensure_created`]: check-then-create, tolerating a late "already exists"
//! - [`apply_config`]: overwrite-style configuration, no existence check

use crate::error::{CloudError, Result};
use crate::provider::ResourceClient;
use crate::resource::{ResourceKind, ResourceSpec};
use std::future::Future;

/// Look a resource up, mapping an absence-classified error to `None`.
///
/// Every other error propagates unchanged.
pub async fn probe<C>(client: &C, name: &str) -> Result<Option<C::Handle>>
where
    C: ResourceClient + ?Sized,
{
    let kind = <C::Spec as ResourceSpec>::KIND;
    match client.describe(name).await {
        Ok(handle) => {
            tracing::debug!(%kind, name, "Resource found");
            Ok(Some(handle))
        }
        Err(e) if e.is_absent() => {
            tracing::debug!(%kind, name, "Resource not found");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Whether the resource currently exists
pub async fn exists<C>(client: &C, name: &str) -> Result<bool>
where
    C: ResourceClient + ?Sized,
{
    Ok(probe(client, name).await?.is_some())
}

/// Outcome of [`ensure_created`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ensured<H> {
    /// This call created the resource
    Created(H),
    /// The resource already existed
    Reused(H),
}

impl<H> Ensured<H> {
    pub fn was_created(&self) -> bool {
        matches!(self, Ensured::Created(_))
    }

    pub fn handle(&self) -> &H {
        match self {
            Ensured::Created(h) | Ensured::Reused(h) => h,
        }
    }

    pub fn into_handle(self) -> H {
        match self {
            Ensured::Created(h) | Ensured::Reused(h) => h,
        }
    }
}

/// Create the resource described by `spec` unless it already exists.
///
/// A create call rejected as a duplicate means someone else created the
/// resource between the check and the create; the existing handle is fetched
/// and returned as [`Ensured::Reused`].
pub async fn ensure_created<C>(client: &C, spec: &C::Spec) -> Result<Ensured<C::Handle>>
where
    C: ResourceClient + ?Sized,
{
    let kind = <C::Spec as ResourceSpec>::KIND;
    let name = spec.name();

    if let Some(existing) = probe(client, name).await? {
        tracing::info!("{} {} already exists, reusing", kind, name);
        return Ok(Ensured::Reused(existing));
    }

    tracing::info!("Creating {} {}", kind, name);
    match client.create(spec).await {
        Ok(handle) => Ok(Ensured::Created(handle)),
        Err(e) if e.is_duplicate() => {
            tracing::warn!("{} {} was created concurrently, fetching it", kind, name);
            let handle = client
                .describe(name)
                .await
                .map_err(CloudError::into_fatal)?;
            Ok(Ensured::Reused(handle))
        }
        Err(e) => Err(e),
    }
}

/// Issue an overwrite-style configuration call.
///
/// A duplicate-classified rejection means the configuration is already in
/// place and is not an error. The resource was ensured before the call, so
/// an absence here is fatal.
pub async fn apply_config<F>(kind: ResourceKind, name: &str, what: &str, call: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tracing::info!("Applying {} on {} {}", what, kind, name);
    match call.await {
        Ok(()) => Ok(()),
        Err(e) if e.is_duplicate() => {
            tracing::warn!("{} on {} {} already in place: {}", what, kind, name, e);
            Ok(())
        }
        Err(e) => Err(e.into_fatal()),
    }
}

/// Map a missing field in a remote response to an error
pub fn require<T>(value: Option<T>, kind: ResourceKind, name: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        CloudError::api(
            kind,
            name,
            "MissingField",
            format!("response did not include `{}`", field),
        )
    })
}
