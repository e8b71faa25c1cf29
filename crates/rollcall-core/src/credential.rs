//! Credential decoding: scanned text to participant identity.
//!
//! Credentials are issued as QR codes whose content is the path of the
//! rendered image, `<dir>/<participant-uuid>.png`. Older badges and manual
//! entry carry the bare UUID instead. Both forms are accepted; the path form
//! is tried first.
//!
//! This is pure parsing. Whether the participant exists is the caller's job.

use crate::error::CredentialError;
use crate::types::ParticipantId;

/// Decode a scanned credential into a participant identifier.
pub fn resolve_credential(raw: &str) -> Result<ParticipantId, CredentialError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CredentialError::Empty);
    }

    parse_path_form(raw)
        .or_else(|| ParticipantId::parse(raw).ok())
        .ok_or_else(|| CredentialError::Unrecognized(raw.to_string()))
}

/// Extract the identifier from `dir/<uuid>.<ext>`.
///
/// The file stem must be the identifier and an extension must be present.
fn parse_path_form(raw: &str) -> Option<ParticipantId> {
    let file_name = raw.rsplit(['/', '\\']).next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    ParticipantId::parse(stem).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0b7f6a52-3c1e-4f0a-9d51-4be7d0c9a8e2";

    #[test]
    fn test_path_form() {
        let raw = format!("uploads/qrcodes/{}.png", ID);
        assert_eq!(resolve_credential(&raw).unwrap().to_string(), ID);
    }

    #[test]
    fn test_windows_path_form() {
        let raw = format!("C:\\badges\\{}.png", ID);
        assert_eq!(resolve_credential(&raw).unwrap().to_string(), ID);
    }

    #[test]
    fn test_bare_form() {
        assert_eq!(resolve_credential(ID).unwrap().to_string(), ID);
    }

    #[test]
    fn test_trims_scanner_whitespace() {
        let raw = format!("  {}.png\n", ID);
        assert_eq!(resolve_credential(&raw).unwrap().to_string(), ID);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(resolve_credential("   "), Err(CredentialError::Empty));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            resolve_credential("uploads/qrcodes/not-a-uuid.png"),
            Err(CredentialError::Unrecognized(_))
        ));
        assert!(resolve_credential("hello").is_err());
    }

    #[test]
    fn test_rejects_missing_extension_in_path() {
        // A directory path ending in the id is not a rendered credential.
        let raw = format!("uploads/qrcodes/{}", ID);
        // Falls back to bare parsing of the whole string, which fails.
        assert!(resolve_credential(&raw).is_err());
    }
}
