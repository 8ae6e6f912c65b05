//! Certificate ids, lookup and verification.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::CertificateApi;
use crate::error::{LecternError, Result};
use crate::model::{Certificate, CertificateVerification, UserRef, UserSummary};

static CERT_ANYWHERE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)CERT-[A-Z0-9]+").ok());

static CERT_EXACT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^CERT-[A-Z0-9]+$").ok());

/// Number of hex characters in an id issued by the backend.
pub const CANONICAL_SUFFIX_LEN: usize = 12;

/// A certificate id such as `CERT-3BE755FC96B9`, normalised to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(String);

impl CertificateId {
    /// Parses an id that must consist of nothing but the id itself.
    ///
    /// Leading and trailing whitespace is ignored and letters are upper-cased.
    ///
    /// # Examples
    ///
    /// ```
    /// use lectern_core::certificate::CertificateId;
    ///
    /// let id = CertificateId::parse(" cert-3be755fc96b9 ").unwrap();
    /// assert_eq!(id.as_str(), "CERT-3BE755FC96B9");
    /// assert!(CertificateId::parse("CERT 123").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let upper = raw.trim().to_uppercase();
        let ok = CERT_EXACT.as_ref().is_some_and(|re| re.is_match(&upper));
        if ok {
            Ok(Self(upper))
        } else {
            Err(LecternError::invalid_certificate_id(raw.trim()))
        }
    }

    /// Finds the first certificate id inside free text (a pasted URL, an email).
    #[must_use]
    pub fn extract(text: &str) -> Option<Self> {
        let re = CERT_ANYWHERE.as_ref()?;
        re.find(text).map(|m| Self(m.as_str().to_uppercase()))
    }

    /// Returns `true` for the `CERT-` + 12 hex characters shape the backend issues.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.0
            .strip_prefix("CERT-")
            .is_some_and(|s| s.len() == CANONICAL_SUFFIX_LEN && s.chars().all(|c| c.is_ascii_hexdigit()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CertificateId {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Verifies a certificate id typed or pasted by a user.
///
/// Never fails: malformed input, unknown ids and backend errors all come
/// back as `valid: false` with a reason.
pub async fn verify(api: &dyn CertificateApi, raw: &str) -> CertificateVerification {
    let Some(id) = CertificateId::extract(raw) else {
        debug!(input = raw, "No certificate id found in input");
        return CertificateVerification::invalid(format!(
            "'{}' does not contain a certificate ID",
            raw.trim()
        ));
    };

    match api.verify_certificate(&id).await {
        Ok(v) if v.valid && v.certificate.is_none() => {
            CertificateVerification::invalid("Backend reported a valid certificate without details")
        }
        Ok(v) if !v.valid && v.error.is_none() => {
            CertificateVerification::invalid(format!("Certificate {id} not found"))
        }
        Ok(v) => v,
        Err(LecternError::NotFound { .. }) => {
            CertificateVerification::invalid(format!("Certificate {id} not found"))
        }
        Err(e) => {
            warn!(certificate_id = %id, error = %e, "Certificate verification failed");
            CertificateVerification::invalid(e.to_string())
        }
    }
}

/// What a certificate download produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateFile {
    /// The backend has a rendered PDF.
    Pdf {
        /// Where to fetch it.
        url: String,
        /// `Certificate-{certificate_id}.pdf`
        file_name: String,
    },
    /// Plain-text rendition built locally.
    Text {
        /// `Certificate-{certificate_id}.txt`
        file_name: String,
        /// Document body.
        contents: String,
    },
}

impl CertificateFile {
    /// The suggested file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::Pdf { file_name, .. } | Self::Text { file_name, .. } => file_name,
        }
    }
}

/// Resolves the file to save for a certificate.
///
/// Uses the backend's PDF when it has one. A missing PDF or a failed
/// download call both fall back to [`text_file`].
pub async fn download(api: &dyn CertificateApi, certificate: &Certificate) -> CertificateFile {
    match api.download_certificate(certificate.id).await {
        Ok(download) => {
            if let Some(url) = download.pdf_file.filter(|u| !u.trim().is_empty()) {
                return CertificateFile::Pdf {
                    url,
                    file_name: format!("Certificate-{}.pdf", certificate.certificate_id),
                };
            }
            debug!(certificate_id = %certificate.certificate_id, "No rendered PDF, using text");
        }
        Err(e) => {
            warn!(certificate_id = %certificate.certificate_id, error = %e, "Certificate download failed");
        }
    }
    text_file(certificate)
}

/// The plain-text fallback for a certificate.
#[must_use]
pub fn text_file(certificate: &Certificate) -> CertificateFile {
    CertificateFile::Text {
        file_name: text_file_name(certificate),
        contents: render_text(certificate),
    }
}

/// `Certificate-{certificate_id}.txt`
#[must_use]
pub fn text_file_name(certificate: &Certificate) -> String {
    format!("Certificate-{}.txt", certificate.certificate_id)
}

/// Renders a certificate as a short plain-text document.
#[must_use]
pub fn render_text(certificate: &Certificate) -> String {
    let issued = certificate
        .issued_at
        .map_or_else(|| "unknown".to_string(), |at| at.format("%Y-%m-%d").to_string());
    let instructor = certificate
        .course
        .instructor
        .as_ref()
        .and_then(UserRef::summary)
        .map_or_else(|| "unknown".to_string(), UserSummary::display_name);

    format!(
        "Certificate of Completion\n\n\
         This certifies that\n\
         {student}\n\n\
         has successfully completed the course\n\
         \"{course}\"\n\n\
         Certificate ID: {id}\n\
         Issued: {issued}\n\
         Instructor: {instructor}\n",
        student = certificate.student.display_name(),
        course = certificate.course.title,
        id = certificate.certificate_id,
    )
}

/// Case-insensitive search over id, course title and student name.
#[must_use]
pub fn matches(certificate: &Certificate, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    [
        certificate.certificate_id.as_str(),
        certificate.course.title.as_str(),
        certificate.student.first_name.as_str(),
        certificate.student.last_name.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

/// Filters certificates by a search term.
#[must_use]
pub fn search<'a>(certificates: &'a [Certificate], term: &str) -> Vec<&'a Certificate> {
    certificates.iter().filter(|c| matches(c, term)).collect()
}
