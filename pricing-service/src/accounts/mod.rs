//! User accounts: roles, storage, registration and login

pub mod handlers;
pub mod model;
pub mod repository;
pub mod role;
pub mod service;

pub use model::{Account, NewAccount};
pub use repository::{AccountRepository, MemoryAccountRepository, PgAccountRepository};
pub use role::Role;
pub use service::AccountService;
