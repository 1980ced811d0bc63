//! Error types for the location network interface

use locnet_shared::CallType;
use thiserror::Error;

use crate::service::{SessionError, VendorError};

/// Errors returned by the public manager API
#[derive(Debug, Error)]
pub enum LocNetError {
    #[error("Not registered with the connectivity service")]
    ServiceUnavailable,

    #[error("Unsupported call type configured: {0:?}")]
    UnsupportedCallType(CallType),

    #[error("Data call stop pending, can't start now")]
    StopPending,

    #[error("No APN configured for data call setup")]
    MissingApn,

    #[error("No clients hold a backhaul request")]
    NoBackhaulClients,

    #[error("Session library returned no handle")]
    NoSessionHandle,

    #[error("{op} failed: {source}")]
    Vendor {
        op: &'static str,
        #[source]
        source: VendorError,
    },

    #[error("{op} failed: {source}")]
    Session {
        op: &'static str,
        #[source]
        source: SessionError,
    },
}

impl LocNetError {
    pub(crate) fn vendor(op: &'static str) -> impl FnOnce(VendorError) -> Self {
        move |source| LocNetError::Vendor { op, source }
    }

    pub(crate) fn session(op: &'static str) -> impl FnOnce(SessionError) -> Self {
        move |source| LocNetError::Session { op, source }
    }
}

pub type Result<T> = std::result::Result<T, LocNetError>;
