use std::borrow::Cow;

/// Length of `bytes` minus an unfinished trailing UTF-8 sequence.
///
/// Bytes that can never start or continue a character count as complete;
/// they come out as U+FFFD through [`lossy`].
pub(crate) fn utf8_emit_boundary(bytes: &[u8]) -> usize {
    let mut start = 0;
    while start < bytes.len() {
        match std::str::from_utf8(&bytes[start..]) {
            Ok(_) => return bytes.len(),
            Err(e) => match e.error_len() {
                Some(bad) => start += e.valid_up_to() + bad,
                None => return start + e.valid_up_to(),
            },
        }
    }
    bytes.len()
}

/// Decode `bytes`, replacing invalid or incomplete sequences.
pub(crate) fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_multibyte_char_is_excluded() {
        let snow = "a☃".as_bytes();
        assert_eq!(utf8_emit_boundary(&snow[..2]), 1);
        assert_eq!(utf8_emit_boundary(snow), 4);
    }

    #[test]
    fn invalid_bytes_do_not_block_the_boundary() {
        assert_eq!(utf8_emit_boundary(&[b'a', 0xFF, b'b']), 3);
        assert_eq!(utf8_emit_boundary(&[0xFF]), 1);
        // invalid byte followed by a character still being built
        assert_eq!(utf8_emit_boundary(&[0xFF, b'x', 0xE2, 0x98]), 2);
    }

    #[test]
    fn lossy_replaces_dangling_bytes() {
        let bytes = [b'h', b'i', 0xE2, 0x98];
        assert_eq!(lossy(&bytes), "hi\u{FFFD}");
    }
}
