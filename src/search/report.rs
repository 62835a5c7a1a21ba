//! 检索结果的报告行与输出格式（终端 markdown 摘要、CSV 全量报告）。

use std::fmt;
use std::io::Write;

use indexmap::IndexSet;

use crate::error::Result;
use crate::search::result::{CellLineResult, ProfileResult, SearchResult};

pub const SUMMARY_COLUMNS: [&str; 5] = ["Sample", "CellLine", "Score", "SharedAlleles", "Source"];
pub const REPORT_COLUMNS: [&str; 6] =
    ["Sample", "CellLine", "Status", "Score", "SharedAlleles", "Source"];

/// 摘要：每个入选细胞系一行，取该细胞系的最佳结果
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub sample: String,
    pub cell_line: String,
    pub score: f64,
    pub shared_alleles: usize,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Query,
    Best,
    Worst,
    Only,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Query => "query",
            Status::Best => "best",
            Status::Worst => "worst",
            Status::Only => "only",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub sample: String,
    pub cell_line: String,
    pub status: Status,
    pub score: Option<f64>,
    pub shared_alleles: Option<usize>,
    pub source: Option<String>,
    /// 与 `FullReport::markers` 一一对应
    pub alleles: Vec<Option<String>>,
}

/// 全量报告：查询行 + 每个入选细胞系的 best/worst（或 only）行
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FullReport {
    pub markers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

fn profile_row(
    cell_line: &CellLineResult<'_>,
    status: Status,
    result: &ProfileResult<'_>,
    markers: &[String],
) -> ReportRow {
    ReportRow {
        sample: cell_line.sample().to_string(),
        cell_line: cell_line.identifier().to_string(),
        status,
        score: Some(result.score),
        shared_alleles: Some(result.shared_alleles),
        source: Some(result.reference.source().to_string()),
        alleles: result.reference.marker_alleles(markers),
    }
}

impl SearchResult<'_> {
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.hits()
            .filter_map(|cell_line| {
                cell_line.best().map(|best| SummaryRow {
                    sample: cell_line.sample().to_string(),
                    cell_line: cell_line.identifier().to_string(),
                    score: best.score,
                    shared_alleles: best.shared_alleles,
                    source: best.reference.source().to_string(),
                })
            })
            .collect()
    }

    pub fn full_report(&self) -> FullReport {
        let markers = self.all_markers();
        let sample = self.query.sample().to_string();
        let mut rows = vec![ReportRow {
            sample: sample.clone(),
            cell_line: sample,
            status: Status::Query,
            score: None,
            shared_alleles: None,
            source: None,
            alleles: self.query.marker_alleles(&markers),
        }];
        for cell_line in self.hits() {
            let (Some(best), Some(worst)) = (cell_line.best(), cell_line.worst()) else {
                continue;
            };
            if cell_line.len() > 1 {
                rows.push(profile_row(cell_line, Status::Best, best, &markers));
                rows.push(profile_row(cell_line, Status::Worst, worst, &markers));
            } else {
                rows.push(profile_row(cell_line, Status::Only, best, &markers));
            }
        }
        FullReport { markers, rows }
    }
}

impl FullReport {
    /// 合并多个查询的报告。位点列按首次出现的顺序合并，缺失列留空。
    pub fn concat<I: IntoIterator<Item = FullReport>>(reports: I) -> FullReport {
        let reports: Vec<FullReport> = reports.into_iter().collect();
        let markers: IndexSet<String> =
            reports.iter().flat_map(|r| r.markers.iter().cloned()).collect();
        let mut rows = Vec::new();
        for report in reports {
            for mut row in report.rows {
                let mut alleles = vec![None; markers.len()];
                for (marker, value) in report.markers.iter().zip(row.alleles.drain(..)) {
                    if let Some(i) = markers.get_index_of(marker) {
                        alleles[i] = value;
                    }
                }
                row.alleles = alleles;
                rows.push(row);
            }
        }
        FullReport { markers: markers.into_iter().collect(), rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell_lines(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.cell_line.as_str()).collect()
    }
}

/// 浮点数最短往返表示，整数值保留一位小数（1.0 而不是 1）
pub fn format_score(score: f64) -> String {
    if score.is_finite() && score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        format!("{score}")
    }
}

pub fn write_full_csv<W: Write>(report: &FullReport, writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    let header: Vec<&str> = REPORT_COLUMNS
        .iter()
        .copied()
        .chain(report.markers.iter().map(String::as_str))
        .collect();
    wtr.write_record(&header)?;
    for row in &report.rows {
        let mut record = vec![
            row.sample.clone(),
            row.cell_line.clone(),
            row.status.to_string(),
            row.score.map(format_score).unwrap_or_default(),
            row.shared_alleles.map(|n| n.to_string()).unwrap_or_default(),
            row.source.clone().unwrap_or_default(),
        ];
        record.extend(row.alleles.iter().map(|a| a.clone().unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// 终端摘要：markdown 表格，得分保留三位小数
pub fn write_summary_markdown<W: Write>(rows: &[SummaryRow], mut writer: W) -> Result<()> {
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|r| {
            [
                r.sample.clone(),
                r.cell_line.clone(),
                format!("{:.3}", r.score),
                r.shared_alleles.to_string(),
                r.source.clone(),
            ]
        })
        .collect();
    let mut widths: [usize; 5] = SUMMARY_COLUMNS.map(str::len);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    // 数值列右对齐
    let numeric = [false, false, true, true, false];

    let header: Vec<String> = SUMMARY_COLUMNS
        .iter()
        .zip(widths)
        .zip(numeric)
        .map(|((name, w), right)| {
            if right {
                format!("{name:>w$}")
            } else {
                format!("{name:<w$}")
            }
        })
        .collect();
    writeln!(writer, "| {} |", header.join(" | "))?;
    let rule: Vec<String> = widths
        .iter()
        .zip(numeric)
        .map(|(w, right)| {
            if right {
                format!("{}:", "-".repeat(*w + 1))
            } else {
                format!(":{}", "-".repeat(*w + 1))
            }
        })
        .collect();
    writeln!(writer, "|{}|", rule.join("|"))?;
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .zip(numeric)
            .map(|((cell, w), right)| {
                if right {
                    format!("{cell:>w$}")
                } else {
                    format!("{cell:<w$}")
                }
            })
            .collect();
        writeln!(writer, "| {} |", line.join(" | "))?;
    }
    Ok(())
}
