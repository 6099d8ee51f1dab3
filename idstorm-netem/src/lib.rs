//! Network impairment for idstorm runs
//!
//! Degrades a link with the Linux `tc` netem queueing discipline so that a
//! run can be observed under delay and packet loss. The controller
//! implements [`idstorm_core::ImpairmentController`]; [`ClearGuard`] removes
//! the rule synchronously if the process unwinds past the async scope.

pub mod controller;
pub mod errors;
pub mod guard;
pub mod interface;

pub use controller::NetemController;
pub use errors::ImpairmentError;
pub use guard::ClearGuard;
pub use interface::{
    choose_interface, detect_interface, list_interfaces, parse_default_route_dev,
    warn_if_unprivileged, SYS_CLASS_NET,
};
