use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};

use crate::error::PatchError;

/// Print `err` against the document it happened in. Errors without a location are left for the
/// caller to report.
pub fn report(err: &PatchError, path: &str, src: &str) -> anyhow::Result<()> {
    let Some(span) = err.span() else {
        return Ok(());
    };
    let range = span.char_range(src);

    let builder = Report::build(ReportKind::Error, path, range.start).with_message(err.to_string());
    let builder = match err {
        PatchError::DuplicateEntry { slug, .. } => builder
            .with_label(
                Label::new((path, range))
                    .with_message(format!("\"{}\" is already defined here", slug.fg(Color::Blue)))
                    .with_color(Color::Yellow),
            )
            .with_help("choose a different slug, or remove the existing post first"),
        _ => builder.with_label(Label::new((path, range)).with_color(Color::Red)),
    };

    builder.finish().eprint((path, Source::from(src)))?;
    Ok(())
}
