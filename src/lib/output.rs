use std::io::Write;

use anstyle::{AnsiColor, Color, Style};
use comfy_table::{Table, presets};
use serde::Serialize;

use crate::Result;
use crate::lib::affinity::{NodePlacement, PvRow};
use crate::lib::cli::OutputFormat;
use crate::lib::quantity::format_quantity;
use crate::lib::usage::{PodDiagnostic, UsageClass, UsageEntry, UsageRow};

const RED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
const GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
const YELLOW: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

/// Spaces after every column
const PADDING: u16 = 3;

const USAGE_HEADER: [&str; 5] = ["POD", "CONTAINER", "USAGE", "REQUESTS", "LIMITS"];
const PV_HEADER: [&str; 4] = ["PV", "NODE AFFINITY", "CLAIM NAMESPACE", "CLAIM NAME"];

/// Top-level JSON document for either report
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput<T> {
    pub metadata: OutputMetadata,
    pub rows: Vec<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<PodDiagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputMetadata {
    pub timestamp: String,
    pub report: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub total_rows: usize,
}

impl<T> ReportOutput<T> {
    pub fn new(
        report: &'static str,
        namespace: Option<String>,
        rows: Vec<T>,
        diagnostics: Vec<PodDiagnostic>,
    ) -> Self {
        Self {
            metadata: OutputMetadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
                report,
                namespace,
                total_rows: rows.len(),
            },
            rows,
            diagnostics,
        }
    }
}

fn paint(text: &str, style: Style, color: bool) -> String {
    if color {
        format!("{}{text}{}", style.render(), style.render_reset())
    } else {
        text.to_string()
    }
}

/// Append one block of aligned rows. Column widths only cover the rows of
/// this block, so text written between blocks starts a fresh alignment.
fn push_block(out: &mut String, header: Option<&[&str]>, rows: Vec<Vec<String>>) {
    if header.is_none() && rows.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    if let Some(header) = header {
        table.set_header(header.to_vec());
    }
    table.add_rows(rows);
    for column in table.column_iter_mut() {
        column.set_padding((0, PADDING));
    }

    for line in table.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

fn usage_cells(row: &UsageRow, color: bool) -> Vec<String> {
    let usage = format_quantity(row.usage);
    let usage = match row.classification {
        UsageClass::Over if color => paint(&usage, RED, true),
        UsageClass::Over => format!("{usage} (over)"),
        UsageClass::Within => paint(&usage, GREEN, color),
    };
    vec![
        paint(&row.pod, YELLOW, color),
        paint(&row.container, YELLOW, color),
        usage,
        paint(&format_quantity(row.request), YELLOW, color),
        paint(&format_quantity(row.limit), YELLOW, color),
    ]
}

fn affinity_cell(row: &PvRow, color: bool) -> String {
    row.nodes
        .iter()
        .map(|node| match node.placement {
            NodePlacement::Shared if color => paint(&node.name, RED, true),
            NodePlacement::Shared => format!("{} (shared)", node.name),
            NodePlacement::Unique => paint(&node.name, GREEN, color),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the usage report as an aligned table. Pods that could not be
/// reported appear as a free-text line at their position; rows after such a
/// line are aligned among themselves.
pub fn render_usage_table(entries: &[UsageEntry], color: bool) -> String {
    let mut out = String::new();
    let mut header = Some(&USAGE_HEADER[..]);
    let mut rows = Vec::new();

    for entry in entries {
        let line = match entry {
            UsageEntry::Row(row) => {
                rows.push(usage_cells(row, color));
                continue;
            }
            UsageEntry::MetricsUnavailable(diag) => {
                format!("Error getting metrics for pod {}: {}", diag.pod, diag.reason)
            }
            UsageEntry::InvalidSpec(diag) => {
                format!("Error reading resources for pod {}: {}", diag.pod, diag.reason)
            }
        };
        push_block(&mut out, header.take(), std::mem::take(&mut rows));
        out.push_str(&line);
        out.push('\n');
    }
    push_block(&mut out, header, rows);

    out
}

pub fn render_pv_table(rows: &[PvRow], color: bool) -> String {
    let rows = rows
        .iter()
        .map(|row| {
            vec![
                paint(&row.volume, YELLOW, color),
                affinity_cell(row, color),
                row.claim_namespace.clone(),
                row.claim_name.clone(),
            ]
        })
        .collect();

    let mut out = String::new();
    push_block(&mut out, Some(&PV_HEADER[..]), rows);
    out
}

pub fn write_usage_report<W: Write>(
    out: &mut W,
    entries: Vec<UsageEntry>,
    namespace: Option<String>,
    format: &OutputFormat,
    color: bool,
) -> Result<()> {
    match format {
        OutputFormat::Table => out.write_all(render_usage_table(&entries, color).as_bytes())?,
        OutputFormat::Json => {
            let mut rows = Vec::new();
            let mut diagnostics = Vec::new();
            for entry in entries {
                match entry {
                    UsageEntry::Row(row) => rows.push(row),
                    UsageEntry::MetricsUnavailable(diag) | UsageEntry::InvalidSpec(diag) => {
                        diagnostics.push(diag)
                    }
                }
            }
            let report = ReportOutput::new("usage", namespace, rows, diagnostics);
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn write_pv_report<W: Write>(
    out: &mut W,
    rows: Vec<PvRow>,
    format: &OutputFormat,
    color: bool,
) -> Result<()> {
    match format {
        OutputFormat::Table => out.write_all(render_pv_table(&rows, color).as_bytes())?,
        OutputFormat::Json => {
            let report = ReportOutput::new("pv", None, rows, Vec::new());
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::affinity::{AffinityNode, NOT_BOUND};
    use crate::lib::quantity::{MIB, ResourceQuantity};

    fn usage_row(pod: &str, container: &str, usage: u64, request: u64) -> UsageRow {
        let usage = ResourceQuantity::from_bytes(usage * MIB);
        let request = ResourceQuantity::from_bytes(request * MIB);
        UsageRow {
            pod: pod.to_string(),
            namespace: "shop".to_string(),
            container: container.to_string(),
            usage,
            classification: crate::lib::usage::classify_usage(usage, request),
            request,
            limit: ResourceQuantity::UNSET,
        }
    }

    fn pv_row(volume: &str, nodes: &[(&str, NodePlacement)]) -> PvRow {
        PvRow {
            volume: volume.to_string(),
            nodes: nodes
                .iter()
                .map(|(name, placement)| AffinityNode {
                    name: name.to_string(),
                    placement: *placement,
                })
                .collect(),
            claim_namespace: NOT_BOUND.to_string(),
            claim_name: NOT_BOUND.to_string(),
        }
    }

    fn diagnostic(pod: &str, reason: &str) -> PodDiagnostic {
        PodDiagnostic {
            pod: pod.to_string(),
            namespace: "shop".to_string(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_usage_table_aligns_columns() {
        let entries = vec![UsageEntry::Row(usage_row("web-1", "app", 50, 100))];

        let table = render_usage_table(&entries, false);

        assert_eq!(
            table,
            "POD     CONTAINER   USAGE   REQUESTS   LIMITS\n\
             web-1   app         50Mi    100Mi      Not Set\n"
        );
    }

    #[test]
    fn test_usage_table_interleaves_diagnostics() {
        let entries = vec![
            UsageEntry::MetricsUnavailable(diagnostic("broken", "not found")),
            UsageEntry::Row(usage_row("web-2", "app", 50, 100)),
            UsageEntry::InvalidSpec(diagnostic("odd", "bad memory limit")),
        ];

        let table = render_usage_table(&entries, false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("POD"));
        assert_eq!(lines[1], "Error getting metrics for pod broken: not found");
        assert!(lines[2].starts_with("web-2"));
        assert_eq!(lines[3], "Error reading resources for pod odd: bad memory limit");
    }

    #[test]
    fn test_usage_table_realigns_after_diagnostic() {
        let entries = vec![
            UsageEntry::Row(usage_row("checkout-7f9c8d-xk2p", "app", 50, 100)),
            UsageEntry::MetricsUnavailable(diagnostic("broken", "not found")),
            UsageEntry::Row(usage_row("w", "app", 50, 100)),
        ];

        let table = render_usage_table(&entries, false);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[1].starts_with("checkout-7f9c8d-xk2p   app"));
        assert_eq!(lines[3], "w   app   50Mi   100Mi   Not Set");
    }

    #[test]
    fn test_usage_table_marks_over_without_color() {
        let entries = vec![
            UsageEntry::Row(usage_row("hot", "app", 150, 100)),
            UsageEntry::Row(usage_row("cool", "app", 50, 100)),
        ];

        let table = render_usage_table(&entries, false);
        let lines: Vec<&str> = table.lines().collect();

        let hot: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(hot, vec!["hot", "app", "150Mi", "(over)", "100Mi", "Not", "Set"]);
        assert!(!lines[2].contains("(over)"));
        assert!(!table.contains('\x1b'));
    }

    #[test]
    fn test_usage_table_colors_classification() {
        let entries = vec![
            UsageEntry::Row(usage_row("hot", "app", 150, 100)),
            UsageEntry::Row(usage_row("cool", "app", 50, 100)),
        ];

        let table = render_usage_table(&entries, true);

        assert!(table.contains(&format!("{}150Mi{}", RED.render(), RED.render_reset())));
        assert!(table.contains(&format!("{}50Mi{}", GREEN.render(), GREEN.render_reset())));
        // header stays unstyled
        assert!(table.starts_with("POD "));
    }

    #[test]
    fn test_pv_table_marks_shared_without_color() {
        let rows = vec![
            pv_row(
                "pv-a",
                &[("node1", NodePlacement::Shared), ("node2", NodePlacement::Unique)],
            ),
            pv_row("pv-c", &[]),
        ];

        let table = render_pv_table(&rows, false);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("PV     NODE AFFINITY"));
        assert!(lines[1].contains("node1 (shared), node2"));
        assert!(lines[1].ends_with(NOT_BOUND));
        assert_eq!(lines[1].matches(NOT_BOUND).count(), 2);
        assert!(lines[2].starts_with("pv-c"));
    }

    #[test]
    fn test_pv_table_colors_nodes() {
        let rows = vec![pv_row(
            "pv-a",
            &[("node1", NodePlacement::Shared), ("node2", NodePlacement::Unique)],
        )];

        let table = render_pv_table(&rows, true);

        assert!(table.contains(&format!("{}node1{}", RED.render(), RED.render_reset())));
        assert!(table.contains(&format!("{}node2{}", GREEN.render(), GREEN.render_reset())));
        assert!(!table.contains("(shared)"));
        // widths ignore escape sequences
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0].find("CLAIM NAMESPACE"), Some(7 + "NODE AFFINITY".len() + 3));
    }

    #[test]
    fn test_json_usage_report_splits_diagnostics() {
        let entries = vec![
            UsageEntry::Row(usage_row("web-1", "app", 150, 100)),
            UsageEntry::MetricsUnavailable(diagnostic("broken", "timeout")),
            UsageEntry::InvalidSpec(diagnostic("odd", "bad memory limit")),
        ];
        let mut buf = Vec::new();

        write_usage_report(
            &mut buf,
            entries,
            Some("shop".to_string()),
            &OutputFormat::Json,
            false,
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["metadata"]["report"], "usage");
        assert_eq!(json["metadata"]["namespace"], "shop");
        assert_eq!(json["metadata"]["total_rows"], 1);
        assert_eq!(json["rows"][0]["classification"], "over");
        assert_eq!(json["rows"][0]["usage"], 150 * MIB);
        assert_eq!(json["diagnostics"][0]["pod"], "broken");
        assert_eq!(json["diagnostics"][1]["pod"], "odd");
    }

    #[test]
    fn test_json_pv_report_omits_empty_diagnostics() {
        let rows = vec![pv_row("pv-a", &[("node1", NodePlacement::Unique)])];
        let mut buf = Vec::new();

        write_pv_report(&mut buf, rows, &OutputFormat::Json, false).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["rows"][0]["nodes"][0]["placement"], "unique");
        assert_eq!(json["rows"][0]["claim_name"], NOT_BOUND);
        assert!(json.get("diagnostics").is_none());
        assert!(json["metadata"].get("namespace").is_none());
    }
}
