pub mod tariff;
pub mod transaction;
pub mod user;
pub mod user_link;
pub mod vpn_server;

pub use transaction::TransactionStatus;
pub use user::UserStatus;
