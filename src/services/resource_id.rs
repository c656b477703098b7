//! Composite resource identifier codec
//!
//! The file manager addresses files by `base64url("<storage_id>:<opaque_id>")`.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::errors::{AppError, AppResult};
use crate::models::ResourceId;

/// URL-safe alphabet, padding optional on input
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a composite id into storage and opaque parts.
///
/// Splits on the first `:`; further colons belong to the opaque id. Either
/// half may be empty.
pub fn decode(encoded: &str) -> AppResult<ResourceId> {
    let bytes = LENIENT_URL_SAFE
        .decode(encoded.trim())
        .map_err(|e| AppError::malformed_identifier(format!("invalid base64 in {encoded:?}: {e}")))?;
    let decoded = String::from_utf8(bytes)
        .map_err(|_| AppError::malformed_identifier(format!("{encoded:?} does not decode to UTF-8")))?;

    match decoded.split_once(':') {
        Some((storage_id, opaque_id)) => Ok(ResourceId::new(storage_id, opaque_id)),
        None => Err(AppError::malformed_identifier(format!(
            "{decoded:?} has no storage separator"
        ))),
    }
}

/// Encode an id in the form [`decode`] accepts
pub fn encode(id: &ResourceId) -> String {
    base64::engine::general_purpose::URL_SAFE.encode(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_decode_simple() {
        let id = decode("c3RvcmFnZS0xOmFiYy0xMjM=").unwrap();
        assert_eq!(id, ResourceId::new("storage-1", "abc-123"));
    }

    #[test]
    fn test_decode_without_padding() {
        let id = decode("c3RvcmFnZS0xOmFiYy0xMjM").unwrap();
        assert_eq!(id, ResourceId::new("storage-1", "abc-123"));
    }

    #[test]
    fn test_decode_splits_on_first_colon() {
        // "s1:a:b:c"
        let id = decode("czE6YTpiOmM=").unwrap();
        assert_eq!(id.storage_id, "s1");
        assert_eq!(id.opaque_id, "a:b:c");
    }

    #[rstest]
    #[case::empty_storage(":x", "", "x")]
    #[case::empty_opaque("s:", "s", "")]
    #[case::both_empty(":", "", "")]
    fn test_decode_empty_halves(#[case] raw: &str, #[case] storage: &str, #[case] opaque: &str) {
        let encoded = base64::engine::general_purpose::URL_SAFE.encode(raw);
        assert_eq!(decode(&encoded).unwrap(), ResourceId::new(storage, opaque));
    }

    #[rstest]
    #[case::not_base64("%%%")]
    #[case::standard_alphabet("+/+/")]
    #[case::no_separator("bm9jb2xvbg==")]
    #[case::invalid_utf8("_w==")]
    fn test_decode_rejects(#[case] input: &str) {
        assert!(matches!(
            decode(input),
            Err(AppError::MalformedIdentifier { .. })
        ));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(storage in "[^:]{0,24}", opaque in "\\PC{0,48}") {
            let id = ResourceId::new(storage, opaque);
            prop_assert_eq!(decode(&encode(&id)).unwrap(), id);
        }

        #[test]
        fn decode_never_panics(input in "\\PC{0,64}") {
            let _ = decode(&input);
        }
    }
}
