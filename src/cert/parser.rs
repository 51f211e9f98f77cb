use crate::utils::errors::{Result, RotatorError};
use chrono::{DateTime, Utc};
use std::fmt;
use x509_parser::prelude::*;

/// What gets logged about the certificate before it is uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateSummary {
    pub cn: String,
    pub issuer: String,
    pub sans: Vec<String>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateSummary {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.not_after < now
    }
}

impl fmt::Display for CertificateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CN={}, issuer={}, valid {} to {}",
            self.cn,
            self.issuer,
            self.not_before.format("%Y-%m-%d %H:%M:%S UTC"),
            self.not_after.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        if !self.sans.is_empty() {
            write!(f, ", SANs={}", self.sans.join(","))?;
        }
        Ok(())
    }
}

pub struct CertificateParser;

impl CertificateParser {
    /// Parse the leaf (first) certificate of a PEM bundle.
    pub fn parse_pem(pem_data: &str) -> Result<CertificateSummary> {
        let (_, pem) = parse_x509_pem(pem_data.as_bytes())
            .map_err(|e| RotatorError::CertParsing(format!("PEM parsing error: {e}")))?;

        if pem.label != "CERTIFICATE" {
            return Err(RotatorError::CertParsing(format!(
                "expected CERTIFICATE block, found {}",
                pem.label
            )));
        }

        let (_, cert) = X509Certificate::from_der(&pem.contents)
            .map_err(|e| RotatorError::CertParsing(format!("DER parsing error: {e}")))?;

        Ok(Self::summarize(&cert))
    }

    fn summarize(cert: &X509Certificate) -> CertificateSummary {
        let not_before = DateTime::from_timestamp(cert.validity().not_before.timestamp(), 0)
            .unwrap_or_else(Utc::now);
        let not_after = DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .unwrap_or_else(Utc::now);

        let mut sans = Vec::new();
        if let Ok(Some(san)) = cert.subject_alternative_name() {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => sans.push(dns.to_string()),
                    GeneralName::IPAddress(ip) if ip.len() == 4 => {
                        sans.push(format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]))
                    }
                    _ => {}
                }
            }
        }

        CertificateSummary {
            cn: Self::common_name(cert.subject()),
            issuer: Self::common_name(cert.issuer()),
            sans,
            not_before,
            not_after,
        }
    }

    fn common_name(name: &X509Name) -> String {
        name.iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Log the certificate about to be uploaded. Never fails: a bad or empty
    /// file is reported and the upload proceeds with it anyway.
    pub fn log_summary(pem_data: &str) -> Option<CertificateSummary> {
        match Self::parse_pem(pem_data) {
            Ok(summary) => {
                tracing::info!("Certificate to upload: {summary}");
                if summary.is_expired_at(Utc::now()) {
                    tracing::warn!("Certificate expired at {}", summary.not_after);
                }
                Some(summary)
            }
            Err(e) => {
                tracing::warn!("Cannot inspect certificate to upload: {e}");
                None
            }
        }
    }
}
