use crate::utils::errors::{Result, RotatorError};
use std::fs;

/// Read a PEM file given by path.
pub fn read_certificate_file(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(RotatorError::EmptyCertificatePath);
    }

    fs::read_to_string(path).map_err(|source| RotatorError::CertificateRead {
        path: path.to_string(),
        source,
    })
}

/// Read a PEM file, logging a warning and returning empty content on failure.
pub fn load_certificate_file(path: &str, label: &str) -> String {
    match read_certificate_file(path) {
        Ok(content) => {
            tracing::debug!("Loaded {label} from {path} ({} bytes)", content.len());
            content
        }
        Err(e) => {
            tracing::warn!("read {label}: {e}");
            String::new()
        }
    }
}
