use anyhow::Result;
use std::io::Write;

use h5err::Classifier;

/// Write one `<symbol>\t<kind>\t<message>` line per message.
pub fn classify<W: Write>(classifier: &Classifier, messages: &[String], mut out: W) -> Result<()> {
    for msg in messages {
        let kind = classifier.classify_major(msg);
        let symbol = if kind.symbol().is_empty() {
            "-"
        } else {
            kind.symbol()
        };
        writeln!(out, "{symbol}\t{kind:?}\t{msg}")?;
    }
    Ok(())
}
