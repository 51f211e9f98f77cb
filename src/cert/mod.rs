pub mod files;
pub mod parser;

pub use files::{load_certificate_file, read_certificate_file};
pub use parser::{CertificateParser, CertificateSummary};
