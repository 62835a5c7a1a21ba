use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::profile::{Metadata, Profile};

/// 允许的最大 AlleleN 列数
pub const MAX_ALLELE_COLUMNS: usize = 10;

const REQUIRED_COLUMNS: [&str; 3] = ["Sample", "Marker", "Allele1"];

/// 根据表头猜测分隔符：制表符、分号、逗号依次尝试
fn sniff_delimiter(header: &str) -> u8 {
    if header.contains('\t') {
        b'\t'
    } else if header.contains(';') {
        b';'
    } else {
        b','
    }
}

/// 统计 AlleleN 列数（取最大的 N），并校验列名
pub fn num_allele_columns<S: AsRef<str>>(header: &[S]) -> Result<usize> {
    let mut count = 1;
    for column in header {
        let column = column.as_ref();
        if let Some(suffix) = column.strip_prefix("Allele") {
            let number: usize = suffix
                .parse()
                .map_err(|_| Error::InvalidArgument(format!("invalid table header '{column}'")))?;
            count = count.max(number);
        }
    }
    if count > MAX_ALLELE_COLUMNS {
        return Err(Error::InvalidArgument(format!(
            "found {count} allele columns, well above expected limit"
        )));
    }
    Ok(count)
}

pub fn load_queries<P: AsRef<Path>>(path: P) -> Result<Vec<Profile>> {
    let fh = std::fs::File::open(path)?;
    read_queries(fh)
}

/// 读取查询表：列 Sample、Marker、Allele1..AlleleN。
///
/// 每个样本生成一个 Profile；样本按名字排序输出，样本内的行保持文件顺序，空单元格忽略。
pub fn read_queries<R: Read>(reader: R) -> Result<Vec<Profile>> {
    let mut reader = BufReader::new(reader);
    let mut header_line = String::new();
    reader.read_line(&mut header_line)?;
    let delimiter = sniff_delimiter(&header_line);

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(header_line.as_bytes().chain(reader));
    let header: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    for column in REQUIRED_COLUMNS {
        if !header.iter().any(|h| h == column) {
            return Err(Error::InvalidArgument(format!("expected column '{column}' missing")));
        }
    }
    let numalleles = num_allele_columns(&header)?;
    let column = |name: &str| header.iter().position(|h| h == name);
    let sample_col = column("Sample").unwrap_or(0);
    let marker_col = column("Marker").unwrap_or(1);
    let allele_cols: Vec<usize> = (1..=numalleles)
        .filter_map(|n| column(&format!("Allele{n}")))
        .collect();

    let mut samples: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    for record in rdr.records() {
        let record = record?;
        let field = |i: usize| record.get(i).map(str::trim).unwrap_or("");
        let sample = field(sample_col);
        if sample.is_empty() {
            continue;
        }
        let mut alleles: Vec<&str> = allele_cols
            .iter()
            .map(|&i| field(i))
            .filter(|a| !a.is_empty())
            .collect();
        alleles.sort_unstable();
        samples
            .entry(sample.to_string())
            .or_default()
            .push((field(marker_col).to_string(), alleles.join(",")));
    }

    samples
        .into_iter()
        .map(|(sample, rows)| Profile::new(rows, Metadata::for_sample(sample)))
        .collect()
}
