use std::fmt::{self, Write};

use super::CurationReport;

/// レポートを人が読む Markdown に描画する。内容は JSON 版と同一で、
/// 描画が選定結果を変えることはない。
#[must_use]
pub fn render(report: &CurationReport) -> String {
    let mut out = String::new();
    // String への書き込みは失敗しない
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &CurationReport) -> fmt::Result {
    writeln!(out, "# Pool curation report")?;
    writeln!(out)?;
    writeln!(out, "- Run: `{}`", report.run_id)?;
    writeln!(out, "- Generated: {}", report.generated_at.to_rfc3339())?;
    writeln!(out, "- Accepted: {}", report.selections.len())?;
    writeln!(out)?;

    write_coverage(out, report)?;
    write_selections(out, report)?;
    write_unmet(out, report)?;
    write_notes(out, report)?;

    Ok(())
}

fn write_coverage(out: &mut String, report: &CurationReport) -> fmt::Result {
    writeln!(out, "## Coverage")?;
    writeln!(out)?;
    writeln!(out, "| Label | Target | Before | After | Remaining |")?;
    writeln!(out, "|---|---:|---:|---:|---:|")?;

    for row in &report.coverage {
        let target = row
            .target
            .map_or_else(|| "-".to_string(), |target| target.to_string());
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            row.label, target, row.before, row.after, row.remaining
        )?;
    }

    writeln!(out)
}

fn write_selections(out: &mut String, report: &CurationReport) -> fmt::Result {
    writeln!(out, "## Selected candidates")?;
    writeln!(out)?;

    if report.selections.is_empty() {
        writeln!(out, "No candidates were selected.")?;
        return writeln!(out);
    }

    writeln!(out, "| # | Comment | Score | Usage | Labels | Credited |")?;
    writeln!(out, "|--:|---|---:|---:|---|---|")?;

    for row in &report.selections {
        writeln!(
            out,
            "| {} | {} | {:.3} | {} | {} | {} |",
            row.rank,
            row.text,
            row.score,
            row.usage_count,
            row.labels.join(", "),
            row.credited.join(", ")
        )?;
    }

    writeln!(out)
}

fn write_unmet(out: &mut String, report: &CurationReport) -> fmt::Result {
    writeln!(out, "## Unmet coverage")?;
    writeln!(out)?;

    if report.unmet.is_empty() {
        writeln!(out, "All coverage targets were met.")?;
        return writeln!(out);
    }

    writeln!(out, "| Label | Remaining |")?;
    writeln!(out, "|---|---:|")?;

    for row in &report.unmet {
        writeln!(out, "| {} | {} |", row.label, row.remaining)?;
    }

    writeln!(out)
}

fn write_notes(out: &mut String, report: &CurationReport) -> fmt::Result {
    writeln!(out, "## Notes")?;
    writeln!(out)?;
    writeln!(
        out,
        "- Budget exhausted: {}",
        if report.notes.budget_exhausted {
            "yes"
        } else {
            "no"
        }
    )?;
    writeln!(
        out,
        "- Already in pool: {}",
        report.notes.already_in_pool
    )?;
    writeln!(
        out,
        "- Skipped without creditable label: {}",
        report.notes.skipped_no_credit
    )?;
    writeln!(
        out,
        "- Generic fillers used: {}",
        report.notes.generic_fill_count
    )?;
    writeln!(out)?;

    writeln!(out, "## Input diagnostics")?;
    writeln!(out)?;
    writeln!(
        out,
        "- Catalog records: {}",
        report.diagnostics.catalog_records
    )?;
    writeln!(
        out,
        "- Excluded by validation: {}",
        report.diagnostics.catalog_skipped
    )?;
    writeln!(
        out,
        "- Unknown label warnings: {}",
        report.diagnostics.unknown_label_warnings
    )?;
    writeln!(out, "- Pool entries: {}", report.diagnostics.pool_entries)
}
