//! Hashtag extraction from a note's tag line.
//!
//! Bear allows multi-word hashtags by closing them with a second `#`
//! (`#blog/rust tips#`). The scanner walks the line one `char` at a time,
//! with one `char` of lookahead, and recognises three shapes:
//!
//! - `#word` ended by end-of-line or by ` #` (the start of the next tag),
//! - `#several words#` where the closing hash directly follows text,
//! - `#word trailing text` where the text after the first space is dropped
//!   unless a closing `#` shows up later.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InHash,
    /// A space was seen inside the span; later text only counts if a
    /// closing `#` follows it.
    PendingMultiWord,
}

/// Extract the hashtags on `line`.
///
/// Tags are title-cased and lose their `prefix/` segment. When `omit_others`
/// is set, tags that don't start with `prefix` are dropped.
pub fn scan(line: &str, prefix: &str, omit_others: bool) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut hashtags = Vec::new();
    let mut state = State::Outside;
    let mut start = 0usize;
    let mut end = 0usize;

    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();

        state = match state {
            State::Outside => {
                if c == '#' && matches!(prev, None | Some(' ')) {
                    start = i + 1;
                    end = start;
                    State::InHash
                } else {
                    State::Outside
                }
            }
            State::InHash | State::PendingMultiWord => {
                if c == '#' && prev != Some(' ') {
                    // Closing hash of a multi-word tag.
                    end = i;
                    state
                } else if c == ' ' && next == Some('#') {
                    push_tag(&chars[start..end], prefix, omit_others, &mut hashtags);
                    State::Outside
                } else if c == ' ' {
                    end = i;
                    State::PendingMultiWord
                } else if state == State::InHash {
                    end = i + 1;
                    State::InHash
                } else {
                    state
                }
            }
        };
    }

    if state != State::Outside {
        push_tag(&chars[start..end], prefix, omit_others, &mut hashtags);
    }

    hashtags
}

fn push_tag(span: &[char], prefix: &str, omit_others: bool, hashtags: &mut Vec<String>) {
    let raw: String = span.iter().collect();
    if omit_others && !raw.starts_with(prefix) {
        return;
    }
    let tag = format_tag(&raw, prefix);
    // A bare `#` yields nothing worth publishing.
    if !tag.is_empty() {
        hashtags.push(tag);
    }
}

fn format_tag(raw: &str, prefix: &str) -> String {
    let tag = raw.trim();
    let tag = tag.strip_suffix('#').unwrap_or(tag);
    let tag = tag
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(tag);
    title_case(tag)
}

/// Upper-case the first letter of every word and lower-case the rest.
///
/// Word boundaries follow Unicode word segmentation for the common cases:
/// `_` joins words, and apostrophes, periods and colons join them when
/// they sit between two letters. So "don't" becomes "Don't", "snake_case"
/// becomes "Snake_case" and "e.g." becomes "E.g.".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_alphanumeric() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
            continue;
        }

        out.push(c);
        in_word = match c {
            '_' => in_word,
            '\'' | '’' | '.' | ':' => {
                in_word && chars.peek().is_some_and(|next| next.is_alphanumeric())
            }
            _ => false,
        };
    }
    out
}

/// Whether any tag marks the note as a draft.
pub fn is_draft(hashtags: &[String]) -> bool {
    hashtags
        .iter()
        .any(|tag| tag.to_lowercase().contains("draft"))
}
