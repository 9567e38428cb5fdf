pub mod link;
pub mod server;
pub mod tariff;
pub mod transaction;
pub mod user;

pub use link::Link;
pub use server::Server;
pub use tariff::Tariff;
pub use transaction::Transaction;
pub use user::User;
