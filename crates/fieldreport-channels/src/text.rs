/// Telegram's limit on one text message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Split `text` into pieces of at most `limit` characters.
///
/// Cuts at the last line break that fits, or mid-line when a single line is
/// longer than `limit`. The break itself is dropped, and so are pieces with
/// nothing but whitespace, which Telegram refuses. Text that already fits
/// comes back as one piece, even when empty.
pub fn split_message(text: &str, limit: usize) -> Vec<&str> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    loop {
        let Some((cut, _)) = rest.char_indices().nth(limit) else {
            if chunks.is_empty() || !rest.trim().is_empty() {
                chunks.push(rest);
            }
            return chunks;
        };
        match rest[..cut].rfind('\n') {
            Some(newline) if newline > 0 => {
                if !rest[..newline].trim().is_empty() {
                    chunks.push(&rest[..newline]);
                }
                rest = &rest[newline + 1..];
            }
            _ => {
                chunks.push(&rest[..cut]);
                rest = &rest[cut..];
            }
        }
    }
}
