//! Client provisioning against remote panels

pub mod link;
pub mod load;
pub mod panel;
pub mod provision;
pub mod session;

pub use load::ServerLoad;
pub use panel::PanelClient;
pub use provision::Provisioner;
pub use session::Session;
