//! Connectivity service indications: boundary decode, routing and handlers

mod dispatcher;
mod handlers;

pub(crate) use dispatcher::{dispatch, IndicationDispatcher};
pub(crate) use handlers::HandlerContext;
pub use handlers::IndicationResult;
