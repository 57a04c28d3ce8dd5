//! Plain-text rendering of workspace state for the terminal.
//!
//! Every function returns a `String` so the CLI decides where it goes.
//! Match contexts and highlighted content are backend-rendered markup
//! (`<mark>` tags included) and are printed verbatim.

use chrono::{DateTime, Utc};
use doc_analytics_core::models::{Document, MatchType, Statistics};
use doc_analytics_core::navigator::MatchNavigator;
use doc_analytics_core::session::SessionEntry;
use doc_analytics_core::statistics::DistributionRow;
use doc_analytics_core::{ApiStatus, Notice, NoticeLevel};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size: two decimals at most, trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    while exponent + 1 < SIZE_UNITS.len() && bytes >= 1u64 << (10 * (exponent + 1)) {
        exponent += 1;
    }
    let value = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    format!("{} {}", trim_decimals(value), SIZE_UNITS[exponent])
}

fn trim_decimals(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Classifier confidence as a whole percentage.
pub fn format_confidence(confidence: f64) -> String {
    format!("{}%", (confidence * 100.0).round() as i64)
}

pub fn match_count(n: u64) -> String {
    format!("{} match{}", n, if n == 1 { "" } else { "es" })
}

/// At most `max_chars` characters, with "..." when something was cut.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Horizontal bar for a percentage in `[0, 100]`.
pub fn bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled.min(width)))
}

fn classification_label(doc: &Document) -> String {
    match (&doc.classification, doc.classification_confidence) {
        (Some(label), Some(confidence)) => format!("{} ({})", label, format_confidence(confidence)),
        (Some(label), None) => label.clone(),
        (None, _) => "Unclassified".to_string(),
    }
}

pub fn render_documents(documents: &[Document], loaded: bool) -> String {
    if !loaded {
        return "Documents not loaded.".to_string();
    }
    if documents.is_empty() {
        return "No documents uploaded yet.".to_string();
    }
    let mut lines = vec![
        format!(
            "{:>5}  {:<32} {:>10}  {:<16}  {}",
            "ID", "TITLE", "SIZE", "UPLOADED", "CLASSIFICATION"
        ),
        "-".repeat(84),
    ];
    for doc in documents {
        lines.push(format!(
            "{:>5}  {:<32} {:>10}  {:<16}  {}",
            doc.id,
            truncate_snippet(&doc.title, 29),
            format_file_size(doc.file_size),
            format_date(doc.upload_date),
            classification_label(doc)
        ));
    }
    lines.join("\n")
}

pub fn render_document(doc: &Document) -> String {
    let mut lines = vec![
        format!("{} (#{})", doc.title, doc.id),
        format!("  File:           {}", doc.filename),
        format!("  Size:           {}", format_file_size(doc.file_size)),
        format!("  Uploaded:       {}", format_date(doc.upload_date)),
    ];
    if let Some(author) = &doc.author {
        lines.push(format!("  Author:         {}", author));
    }
    if doc.creation_date.is_some() {
        lines.push(format!("  Created:        {}", format_date(doc.creation_date)));
    }
    if doc.last_modified.is_some() {
        lines.push(format!("  Modified:       {}", format_date(doc.last_modified)));
    }
    lines.push(format!("  Classification: {}", classification_label(doc)));
    lines.join("\n")
}

fn render_context(navigator: &MatchNavigator, index: usize, lines: &mut Vec<String>) {
    let Some(ctx) = navigator.contexts().get(index) else {
        return;
    };
    lines.push(format!(
        "    Match {} of {}  (line {}, lines {}-{}, term \"{}\")",
        index + 1,
        navigator.display_total(),
        ctx.line_number,
        ctx.context_start_line,
        ctx.context_end_line,
        ctx.term
    ));
    for line in ctx.context.as_str().lines() {
        lines.push(format!("      {}", line));
    }
}

/// One search result with its current match, or every match with
/// `all_matches`.
pub fn render_result(entry: &SessionEntry, all_matches: bool, snippet_chars: usize) -> String {
    let result = &entry.result;
    let title = result
        .highlighted_title
        .as_ref()
        .map(|t| t.as_str())
        .unwrap_or(&result.document.title);
    let mut lines = vec![format!("#{}  {}", result.id(), title)];

    let mut meta = vec![result.document.filename.clone()];
    if let Some(label) = result.match_type.label() {
        meta.push(label.to_string());
    }
    let shown_total = entry.navigator.display_total();
    if shown_total > 0 {
        meta.push(match_count(shown_total));
    }
    lines.push(format!("    {}", meta.join(" | ")));
    if !result.matched_terms.is_empty() {
        lines.push(format!("    Found: {}", result.matched_terms.join(", ")));
    }

    let navigator = &entry.navigator;
    match navigator.position() {
        Some(current) if !all_matches => {
            render_context(navigator, current, &mut lines);
            if navigator.shows_controls() {
                lines.push(format!("    (next/prev {} to move between matches)", result.id()));
            }
        }
        Some(_) => {
            for index in 0..navigator.len() {
                render_context(navigator, index, &mut lines);
            }
        }
        None => {
            if let Some(content) = &result.highlighted_content {
                lines.push(format!(
                    "    {}",
                    truncate_snippet(content.as_str(), snippet_chars)
                ));
            } else if result.match_type == MatchType::None {
                lines.push("    (no match details)".to_string());
            }
        }
    }
    lines.join("\n")
}

pub fn render_results(
    query: Option<&str>,
    entries: &[SessionEntry],
    search_time: Option<f64>,
    all_matches: bool,
    snippet_chars: usize,
) -> String {
    let Some(query) = query else {
        return "No search yet.".to_string();
    };
    if entries.is_empty() {
        return format!("No documents found for \"{}\".", query);
    }
    let mut header = format!(
        "{} result{} for \"{}\"",
        entries.len(),
        if entries.len() == 1 { "" } else { "s" },
        query
    );
    if let Some(seconds) = search_time {
        header.push_str(&format!(" in {:.3}s", seconds));
    }
    let mut blocks = vec![header];
    for entry in entries {
        blocks.push(render_result(entry, all_matches, snippet_chars));
    }
    blocks.join("\n\n")
}

pub fn render_statistics(
    stats: Option<&Statistics>,
    distribution: &[DistributionRow],
    bar_width: usize,
) -> String {
    let Some(stats) = stats else {
        return "Statistics not loaded.".to_string();
    };
    let mut lines = vec![
        "Document Analytics — Statistics".to_string(),
        "===============================".to_string(),
        String::new(),
        format!("  Documents:        {}", stats.total_documents),
        format!(
            "  Total size:       {} ({:.2} MB)",
            format_file_size(stats.total_size_bytes),
            stats.total_size_mb
        ),
        format!("  Searches:         {}", stats.total_searches),
        format!("  Avg search time:  {:.3}s", stats.average_search_time),
    ];

    if !distribution.is_empty() {
        lines.push(String::new());
        lines.push("  Classification:".to_string());
        for row in distribution {
            lines.push(format!(
                "  {:<20} {} {:>5.1}% ({})",
                row.label,
                bar(row.percentage, bar_width),
                row.percentage,
                row.count
            ));
        }
    }

    if !stats.recent_searches.is_empty() {
        lines.push(String::new());
        lines.push("  Recent searches:".to_string());
        for search in &stats.recent_searches {
            lines.push(format!(
                "  {:<24} {:>4} results  {:.3}s  {}",
                truncate_snippet(&search.query, 21),
                search.results_count,
                search.search_time,
                format_date(search.timestamp)
            ));
        }
    }
    lines.join("\n")
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => notice.message.clone(),
        NoticeLevel::Error => format!("error: {}", notice.message),
    }
}

pub fn render_api_status(status: ApiStatus, base_url: &str) -> String {
    match status {
        ApiStatus::Connected => format!("API connected ({})", base_url),
        ApiStatus::Disconnected => format!("API disconnected ({})", base_url),
        ApiStatus::Unknown => format!("API status unknown ({})", base_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_analytics_core::models::{MatchContext, SearchResult, TrustedMarkup};

    fn entry(contexts: usize, total: u64) -> SessionEntry {
        let result = SearchResult {
            document: Document::new(1, "Q1", "q1.pdf", 2048),
            match_type: MatchType::ExactPhrase,
            matched_terms: vec!["revenue".into(), "growth".into()],
            total_matches: total,
            match_contexts: (0..contexts as u32)
                .map(|i| MatchContext {
                    line_number: 10 + i,
                    context_start_line: 9 + i,
                    context_end_line: 11 + i,
                    term: "revenue".into(),
                    context: TrustedMarkup::new(format!("<mark>revenue</mark> #{}", i)),
                    match_line_in_context: None,
                })
                .collect(),
            highlighted_content: Some(TrustedMarkup::new("x".repeat(600))),
            highlighted_title: None,
        };
        SessionEntry {
            navigator: MatchNavigator::new(&result),
            result,
        }
    }

    #[test]
    fn test_file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2_621_440), "2.5 MB");
        assert_eq!(format_file_size(1_073_741_824), "1 GB");
    }

    #[test]
    fn test_confidence_and_counts() {
        assert_eq!(format_confidence(0.876), "88%");
        assert_eq!(match_count(1), "1 match");
        assert_eq!(match_count(3), "3 matches");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_snippet("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_snippet("short", 10), "short");
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(bar(50.0, 10).chars().count(), 10);
        assert_eq!(bar(0.0, 4), "░░░░");
        assert_eq!(bar(100.0, 4), "████");
    }

    #[test]
    fn test_result_shows_current_match_verbatim() {
        let text = render_result(&entry(3, 7), false, 500);
        assert!(text.contains("Exact phrase | 7 matches"));
        assert!(text.contains("Found: revenue, growth"));
        assert!(text.contains("Match 1 of 7"));
        assert!(text.contains("<mark>revenue</mark> #0"));
        assert!(!text.contains("</mark> #1"));
        assert!(text.contains("next/prev 1"));
    }

    #[test]
    fn test_result_all_matches() {
        let text = render_result(&entry(2, 2), true, 500);
        assert!(text.contains("Match 1 of 2"));
        assert!(text.contains("Match 2 of 2"));
    }

    #[test]
    fn test_result_without_contexts_uses_truncated_highlight() {
        let text = render_result(&entry(0, 0), false, 500);
        assert!(text.contains(&format!("{}...", "x".repeat(500))));
        assert!(!text.contains(&"x".repeat(501)));
    }

    #[test]
    fn test_statistics_zero_documents() {
        let stats = Statistics::default();
        let rows = vec![DistributionRow {
            label: "Report".into(),
            count: 0,
            percentage: 0.0,
        }];
        let text = render_statistics(Some(&stats), &rows, 10);
        assert!(text.contains("Documents:        0"));
        assert!(text.contains("0.0% (0)"));
    }
}
