//! Small utility helpers used across modules.

/// Choice label for a zero-based slot: 0 → 'A', 1 → 'B', ...
pub fn option_letter(index: usize) -> char {
  char::from(b'A' + (index % 26) as u8)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge client payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
