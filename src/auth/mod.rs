pub mod chain;
pub mod credentials;
pub mod profile;

pub use chain::DefaultCredentialChain;
pub use credentials::{CredentialSource, Credentials};
