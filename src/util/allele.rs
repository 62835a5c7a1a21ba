use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// 单个等位基因的排序键：数值（整数或小数，如 9.3）排在前，性染色体字母 X/Y 排在后。
#[derive(Debug, Clone, PartialEq)]
pub enum AlleleKey<'a> {
    Number(f64),
    Letter(&'a str),
}

impl<'a> AlleleKey<'a> {
    pub fn parse(allele: &'a str) -> Result<Self> {
        if allele.contains('.') {
            return allele
                .parse::<f64>()
                .map(AlleleKey::Number)
                .map_err(|_| Error::InvalidAllele(allele.to_string()));
        }
        if !allele.is_empty() && allele.bytes().all(|b| b.is_ascii_digit()) {
            return allele
                .parse::<u64>()
                .map(|n| AlleleKey::Number(n as f64))
                .map_err(|_| Error::InvalidAllele(allele.to_string()));
        }
        match allele {
            "X" | "Y" => Ok(AlleleKey::Letter(allele)),
            _ => Err(Error::InvalidAllele(allele.to_string())),
        }
    }
}

fn key_cmp(a: &AlleleKey<'_>, b: &AlleleKey<'_>) -> Ordering {
    match (a, b) {
        (AlleleKey::Number(x), AlleleKey::Number(y)) => x.total_cmp(y),
        (AlleleKey::Number(_), AlleleKey::Letter(_)) => Ordering::Less,
        (AlleleKey::Letter(_), AlleleKey::Number(_)) => Ordering::Greater,
        (AlleleKey::Letter(x), AlleleKey::Letter(y)) => x.cmp(y),
    }
}

/// 按数值比较两个等位基因；无法解析的值按字符串排在最后（构造 Profile 时已校验，正常不会出现）
pub fn compare(a: &str, b: &str) -> Ordering {
    match (AlleleKey::parse(a), AlleleKey::parse(b)) {
        (Ok(ka), Ok(kb)) => key_cmp(&ka, &kb).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// 解析逗号分隔的等位基因串，如 "12, 15.2"。去掉所有空格，丢弃空片段。
pub fn parse_allele_set(alleles: &str) -> Result<BTreeSet<String>> {
    let compact: String = alleles.chars().filter(|c| *c != ' ').collect();
    let mut set = BTreeSet::new();
    for token in compact.split(',').filter(|t| !t.is_empty()) {
        AlleleKey::parse(token)?;
        set.insert(token.to_string());
    }
    Ok(set)
}

/// 数值顺序渲染（报告与表格使用）："9.3,13"、"X,Y"
pub fn allele_repr<'a, I>(alleles: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    sorted_alleles(alleles).join(",")
}

pub fn sorted_alleles<'a, I>(alleles: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out: Vec<&str> = alleles.into_iter().map(String::as_str).collect();
    out.sort_by(|a, b| compare(a, b));
    out
}

/// 字典序渲染（持久化 JSON 使用，BTreeSet 本身即字典序）
pub fn allele_join(alleles: &BTreeSet<String>) -> String {
    alleles.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}
