use digest_core::render::Document;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Plain-text preview of every week, separated by a blank line.
pub fn print_documents(documents: &[Document]) {
    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", doc.to_plain_text());
    }
}
