//! Bounded capture of child output

use codeon_core::MAX_OUTPUT_CHARS;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 8 * 1024;

/// Bytes kept from one stream
///
/// A UTF-8 character is at most four bytes and every invalid byte decodes to
/// at least one replacement character, so this many bytes always decode to
/// more than `MAX_OUTPUT_CHARS` characters when anything was dropped.
pub(crate) const RETAINED_BYTES: usize = MAX_OUTPUT_CHARS * 4 + 1;

/// Read a stream to EOF, keeping at most `RETAINED_BYTES`
///
/// The pipe is drained past the limit so the child never blocks on a full
/// pipe buffer. Read errors end the capture with whatever was collected.
pub async fn read_capped<R>(reader: Option<R>) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Vec::new();
    };

    let mut retained = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = RETAINED_BYTES.saturating_sub(retained.len());
                retained.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!(error = %e, "output stream read failed");
                break;
            }
        }
    }
    retained
}

/// Truncate to `MAX_OUTPUT_CHARS` characters, appending `marker` when cut
pub fn cap_text(text: &str, marker: &str) -> String {
    match text.char_indices().nth(MAX_OUTPUT_CHARS) {
        Some((cut, _)) => {
            let mut capped = String::with_capacity(cut + marker.len());
            capped.push_str(&text[..cut]);
            capped.push_str(marker);
            capped
        }
        None => text.to_string(),
    }
}

/// Decode lossily and cap
pub fn decode_capped(bytes: &[u8], marker: &str) -> String {
    cap_text(&String::from_utf8_lossy(bytes), marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeon_core::{FILE_TRUNCATION_MARKER, STDOUT_TRUNCATION_MARKER};

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(cap_text("hello", STDOUT_TRUNCATION_MARKER), "hello");

        let exact = "x".repeat(MAX_OUTPUT_CHARS);
        assert_eq!(cap_text(&exact, STDOUT_TRUNCATION_MARKER), exact);
    }

    #[test]
    fn test_long_text_capped_with_marker() {
        let long = "y".repeat(MAX_OUTPUT_CHARS + 10);
        let capped = cap_text(&long, STDOUT_TRUNCATION_MARKER);
        assert_eq!(
            capped.len(),
            MAX_OUTPUT_CHARS + STDOUT_TRUNCATION_MARKER.len()
        );
        assert!(capped.ends_with(STDOUT_TRUNCATION_MARKER));
    }

    #[test]
    fn test_cap_counts_characters_not_bytes() {
        let long = "é".repeat(MAX_OUTPUT_CHARS + 1);
        let capped = cap_text(&long, FILE_TRUNCATION_MARKER);
        let body = capped.strip_suffix(FILE_TRUNCATION_MARKER).unwrap();
        assert_eq!(body.chars().count(), MAX_OUTPUT_CHARS);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let decoded = decode_capped(&[b'o', b'k', 0xff], STDOUT_TRUNCATION_MARKER);
        assert_eq!(decoded, "ok\u{fffd}");
    }

    #[tokio::test]
    async fn test_read_capped_drains_everything_but_keeps_prefix() {
        let total = RETAINED_BYTES * 3;
        let data = vec![b'z'; total];
        let captured = read_capped(Some(&data[..])).await;

        assert_eq!(captured.len(), RETAINED_BYTES);
        let text = decode_capped(&captured, STDOUT_TRUNCATION_MARKER);
        assert!(text.ends_with(STDOUT_TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_read_capped_without_stream() {
        assert!(read_capped::<&[u8]>(None).await.is_empty());
    }
}
