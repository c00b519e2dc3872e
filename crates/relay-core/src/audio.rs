use base64::{engine::general_purpose::STANDARD, Engine};

pub const AUDIO_MIME: &str = "audio/mp3";

fn prefix() -> String {
    format!("data:{AUDIO_MIME};base64,")
}

/// Wraps synthesized audio for transport inside a JSON string.
pub fn to_data_uri(bytes: &[u8]) -> String {
    let mut out = prefix();
    STANDARD.encode_string(bytes, &mut out);
    out
}

/// Inverse of [`to_data_uri`]. `None` for a foreign MIME type or bad base64.
pub fn from_data_uri(uri: &str) -> Option<Vec<u8>> {
    let payload = uri.strip_prefix(&prefix())?;
    STANDARD.decode(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_padded_base64() {
        let uri = to_data_uri(&[0xFF, 0xFB, 0x90, 0x64]);
        assert_eq!(uri, "data:audio/mp3;base64,//uQZA==");
        let payload = uri.trim_start_matches("data:audio/mp3;base64,");
        assert_eq!(payload.len() % 4, 0);
    }

    #[test]
    fn decodes_back_to_same_bytes() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        assert_eq!(from_data_uri(&to_data_uri(&bytes)), Some(bytes));
    }

    #[test]
    fn empty_audio_is_bare_prefix() {
        assert_eq!(to_data_uri(&[]), "data:audio/mp3;base64,");
    }

    #[test]
    fn rejects_other_mime() {
        assert_eq!(from_data_uri("data:audio/wav;base64,AAAA"), None);
        assert_eq!(from_data_uri("data:audio/mp3;base64,@@@"), None);
    }
}
