//! Collaborators the manager drives: the connectivity service (Wi-Fi AP/station
//! and backhaul control) and the cellular data session library.

pub mod sim;
mod traits;

pub use sim::{SimConnectivityService, SimSessionLibrary};
pub use traits::{
    CallParam, ConnectivityClient, ConnectivityService, IndicationSink, RadioTech, SessionError,
    SessionEventSink, SessionLibrary, VendorError,
};
