//! Binary framing for the out-of-process oracle.
//!
//! Request frame layout:
//!
//! ```text
//! +----------------+----------+------------------------------+
//! | 4 bytes        | 1 byte   | body                         |
//! | body length BE | type (1) | UTF-8, space-separated tokens|
//! +----------------+----------+------------------------------+
//! ```
//!
//! The response is one newline-terminated ASCII line carrying the decimal
//! result. Boolean expressions yield exactly `"1"` or `"0"`.

/// Message type byte for an execute request.
pub const MSG_EXECUTE: u8 = 1;

/// Encode one token list into a single execute frame.
///
/// Tokens are joined with single spaces; the caller is responsible for
/// having stripped quote layers already (see [`strip_quotes`]).
pub fn encode_frame(tokens: &[String]) -> Vec<u8> {
    let body = tokens.join(" ").into_bytes();
    let mut frame = Vec::with_capacity(5 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.push(MSG_EXECUTE);
    frame.extend_from_slice(&body);
    frame
}

/// Strip one layer of matching quote characters from a token.
///
/// The oracle's token language predates the framing layer; operator tokens
/// were historically written quoted (`"&"`, `'<'`) so shells would not eat
/// them, and the protocol expects the quotes removed before transmission.
/// Only a single matching outer layer is stripped; everything else passes
/// through unchanged.
pub fn strip_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &token[1..token.len() - 1];
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let tokens = vec!["5".to_string(), "3".to_string(), "+".to_string()];
        let frame = encode_frame(&tokens);

        // 4-byte big-endian length of "5 3 +" (5 bytes), then type, then body.
        assert_eq!(&frame[..4], &[0, 0, 0, 5]);
        assert_eq!(frame[4], MSG_EXECUTE);
        assert_eq!(&frame[5..], b"5 3 +");
    }

    #[test]
    fn frame_empty_body() {
        let frame = encode_frame(&[]);
        assert_eq!(frame, vec![0, 0, 0, 0, MSG_EXECUTE]);
    }

    #[test]
    fn strip_quotes_single_layer() {
        assert_eq!(strip_quotes("\"&\""), "&");
        assert_eq!(strip_quotes("'<'"), "<");
        assert_eq!(strip_quotes("\"\"&\"\""), "\"&\"");
    }

    #[test]
    fn strip_quotes_passthrough() {
        assert_eq!(strip_quotes("42"), "42");
        assert_eq!(strip_quotes("\"unterminated"), "\"unterminated");
        assert_eq!(strip_quotes("'"), "'");
        assert_eq!(strip_quotes("\"mixed'"), "\"mixed'");
    }
}
