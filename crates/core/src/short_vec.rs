//! Compact-u16 length prefixes used by the transaction wire format.
//!
//! Each byte carries 7 bits of the value, low bits first; the high bit marks
//! a continuation. At most three bytes are used.

/// Append `len` as a compact-u16.
pub fn encode_len(len: u16, out: &mut Vec<u8>) {
    let mut rem = len;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            break;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

/// Decode a compact-u16 from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` if the
/// input is truncated, overlong, or does not fit in a u16.
pub fn decode_len(bytes: &[u8]) -> Option<(u16, usize)> {
    let mut value: u32 = 0;
    for (i, byte) in bytes.iter().take(3).enumerate() {
        let elem = (*byte & 0x7f) as u32;
        // A trailing zero byte would be a non-canonical encoding.
        if i > 0 && *byte == 0 {
            return None;
        }
        value |= elem << (i * 7);
        if byte & 0x80 == 0 {
            return u16::try_from(value).ok().map(|v| (v, i + 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(len: u16) -> Vec<u8> {
        let mut out = Vec::new();
        encode_len(len, &mut out);
        out
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(0x7f), vec![0x7f]);
        assert_eq!(encoded(0x80), vec![0x80, 0x01]);
        assert_eq!(encoded(0x3fff), vec![0xff, 0x7f]);
        assert_eq!(encoded(0x4000), vec![0x80, 0x80, 0x01]);
        assert_eq!(encoded(u16::MAX), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn test_decode_consumes_prefix_only() {
        assert_eq!(decode_len(&[0x80, 0x01, 0xaa]), Some((0x80, 2)));
        assert_eq!(decode_len(&[0x05, 0xff]), Some((5, 1)));
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert_eq!(decode_len(&[]), None);
        assert_eq!(decode_len(&[0x80]), None);
        assert_eq!(decode_len(&[0x80, 0x00]), None);
        assert_eq!(decode_len(&[0xff, 0xff, 0x04]), None);
        assert_eq!(decode_len(&[0x80, 0x80, 0x80, 0x01]), None);
    }
}
