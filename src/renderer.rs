use std::io::{self, Write};

use crate::frontmatter::DELIMITER;
use crate::note::TransformedNote;

/// Write the Hugo page for `note`.
///
/// `custom_front_matter` lines are inserted verbatim after the managed keys.
/// The body follows the closing delimiter directly; notes carry their own
/// blank line after the title.
pub fn render_page<W: Write>(
    writer: &mut W,
    note: &TransformedNote,
    custom_front_matter: &[String],
) -> io::Result<()> {
    writeln!(writer, "{}", DELIMITER)?;
    writeln!(writer, "title: \"{}\"", note.title)?;
    writeln!(writer, "date: {}", note.date)?;
    if note.categories {
        writeln!(writer, "categories: {}", string_array(&note.hashtags))?;
    }
    if note.tags {
        writeln!(writer, "tags: {}", string_array(&note.hashtags))?;
    }
    writeln!(writer, "draft: {}", note.draft)?;
    for line in custom_front_matter {
        writeln!(writer, "{}", line)?;
    }
    writeln!(writer, "{}", DELIMITER)?;
    write!(writer, "{}", note.body)?;
    Ok(())
}

pub fn render_to_vec(note: &TransformedNote, custom_front_matter: &[String]) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing into a Vec can't fail.
    let _ = render_page(&mut buf, note, custom_front_matter);
    buf
}

fn string_array(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
    format!("[{}]", quoted.join(","))
}
