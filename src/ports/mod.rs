//! Port traits for the host collaborators the selection engine talks to.

pub mod broker_port;
pub mod config_port;
pub mod data_port;
pub mod history_port;
pub mod report_port;
