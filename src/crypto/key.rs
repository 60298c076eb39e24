//! # Public Key Loading
//!
//! Loads the platform's RSA public key from a caller-supplied source. The key
//! is read and parsed on every call; callers that need to amortize the cost
//! should load once with [`load_public_key`] and hold on to the
//! [`RsaPublicKey`].

use crate::error::{Result, SdkError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs8::spki;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// PEM label of a SubjectPublicKeyInfo document
pub const PUBLIC_KEY_PEM_LABEL: &str = "PUBLIC KEY";

const PEM_BEGIN: &str = "-----BEGIN ";
const PEM_END: &str = "-----END ";
const PEM_DASHES: &str = "-----";

/// Where the platform public key comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeySource {
    /// PEM file on disk
    Path(PathBuf),
    /// PEM text held in memory
    Pem(String),
}

impl KeySource {
    /// Key read from a PEM file
    pub fn path<P: AsRef<Path>>(path: P) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    /// Key given as PEM text
    pub fn pem<S: Into<String>>(pem: S) -> Self {
        Self::Pem(pem.into())
    }

    fn read_pem(&self) -> Result<String> {
        match self {
            Self::Path(path) => std::fs::read_to_string(path).map_err(|e| {
                SdkError::key_error(
                    format!("failed to read public key file {}: {e}", path.display()),
                    Some(Box::new(e)),
                )
            }),
            Self::Pem(pem) => Ok(pem.clone()),
        }
    }
}

impl Default for KeySource {
    fn default() -> Self {
        Self::Path(PathBuf::from(crate::DEFAULT_PUBLIC_KEY_PATH))
    }
}

/// Read and parse an RSA public key
///
/// ## Errors
/// `SdkError::KeyError` when the source is unreadable, holds no PEM block,
/// holds a block not labelled `PUBLIC KEY`, holds a DER payload that is not
/// a SubjectPublicKeyInfo, or holds a key for an algorithm other than RSA.
pub fn load_public_key(source: &KeySource) -> Result<RsaPublicKey> {
    let pem = source.read_pem()?;
    parse_public_key_pem(&pem)
}

/// Parse an RSA public key from PEM text
///
/// Text before the first `BEGIN` line is ignored, as are encapsulated
/// headers. The base64 body may be wrapped at any width, or not at all.
pub fn parse_public_key_pem(pem: &str) -> Result<RsaPublicKey> {
    let (label, der) = decode_pem_block(pem)?;

    if label != PUBLIC_KEY_PEM_LABEL {
        return Err(SdkError::key_error(
            format!("expected a `{PUBLIC_KEY_PEM_LABEL}` PEM block, found `{label}`"),
            None,
        ));
    }

    let key = RsaPublicKey::from_public_key_der(&der).map_err(|e| match e {
        spki::Error::OidUnknown { .. } => {
            SdkError::key_error("public key is not an RSA key", Some(Box::new(e)))
        }
        other => SdkError::key_error(
            format!("failed to parse public key: {other}"),
            Some(Box::new(other)),
        ),
    })?;

    let bits = key.size() * 8;
    if bits < crate::MIN_RSA_KEY_SIZE {
        warn!(
            "Loaded {} bit RSA public key, below the recommended {} bits",
            bits,
            crate::MIN_RSA_KEY_SIZE
        );
    }
    debug!("Loaded {} bit RSA public key", bits);

    Ok(key)
}

/// Label and decoded body of the first PEM block in `pem`
fn decode_pem_block(pem: &str) -> Result<(&str, Vec<u8>)> {
    let mut lines = pem.lines().map(str::trim);

    let label = lines
        .by_ref()
        .find_map(|line| line.strip_prefix(PEM_BEGIN)?.strip_suffix(PEM_DASHES))
        .ok_or_else(|| SdkError::key_error("no public key PEM block found", None))?;

    let mut body = String::new();
    let mut closed = false;
    for line in lines {
        if let Some(end_label) = line
            .strip_prefix(PEM_END)
            .and_then(|rest| rest.strip_suffix(PEM_DASHES))
        {
            if end_label != label {
                return Err(SdkError::key_error(
                    format!("PEM block `{label}` closed by `{end_label}`"),
                    None,
                ));
            }
            closed = true;
            break;
        }
        // Encapsulated headers such as `Proc-Type: 4,ENCRYPTED`
        if line.contains(':') {
            continue;
        }
        body.extend(line.chars().filter(|c| !c.is_ascii_whitespace()));
    }

    if !closed {
        return Err(SdkError::key_error(
            format!("no public key PEM block found: missing END line for `{label}`"),
            None,
        ));
    }

    let der = BASE64.decode(&body).map_err(|e| {
        SdkError::key_error(
            format!("no public key PEM block found: invalid base64 body: {e}"),
            Some(Box::new(e)),
        )
    })?;

    Ok((label, der))
}
