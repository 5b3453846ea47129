//! Title and language metadata, language tags on runs

use html2docx_ooxml::Document;

/// Write `dc:title` and `dc:language`, creating the core properties part
/// when the package has none
pub fn set_metadata(document: &mut Document, title: &str, locale: &str) {
    let core = document.core_properties_mut();
    core.set_title(title);
    core.set_language(locale);
}

/// Tag every run of the body paragraphs and of every table cell (nested
/// tables and hyperlinks included) with `locale`. Returns the number of runs.
pub fn tag_runs(document: &mut Document, locale: &str) -> usize {
    let mut count = 0;

    for mut paragraph in document.paragraphs_mut() {
        paragraph.for_each_run_mut(&mut |mut run| {
            run.set_language(locale);
            count += 1;
        });
    }
    for mut table in document.tables_mut() {
        table.for_each_paragraph_mut(&mut |mut paragraph| {
            paragraph.for_each_run_mut(&mut |mut run| {
                run.set_language(locale);
                count += 1;
            });
        });
    }

    log::debug!("tagged {count} runs with {locale}");
    count
}

/// Metadata and run tags in one go
pub fn apply_language(document: &mut Document, title: &str, locale: &str) -> usize {
    set_metadata(document, title, locale);
    tag_runs(document, locale)
}

/// Runs in the body and in tables, and how many of them carry `locale`
pub fn language_coverage(document: &Document, locale: &str) -> (usize, usize) {
    let mut total = 0;
    let mut tagged = 0;
    let mut count = |is_tagged: bool| {
        total += 1;
        if is_tagged {
            tagged += 1;
        }
    };

    for paragraph in document.paragraphs() {
        for run in paragraph.all_runs() {
            count(run.language() == Some(locale));
        }
    }
    for table in document.tables() {
        for paragraph in table.paragraphs() {
            for run in paragraph.all_runs() {
                count(run.language() == Some(locale));
            }
        }
    }

    (tagged, total)
}
