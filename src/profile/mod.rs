//! STR 图谱：一个细胞系在一个来源下（或一个查询样本）的全部位点等位基因。

pub mod markers;

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::allele;

/// 物种来源。Cellosaurus 记录可以有多条 OX 行，此时保留全部 taxid。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Taxonomy {
    Single(u32),
    Multiple(Vec<u32>),
}

impl Taxonomy {
    /// 只有一个元素时折叠为 Single；空列表返回 None
    pub fn from_ids(mut ids: Vec<u32>) -> Option<Self> {
        match ids.len() {
            0 => None,
            1 => ids.pop().map(Taxonomy::Single),
            _ => Some(Taxonomy::Multiple(ids)),
        }
    }

    pub fn ids(&self) -> &[u32] {
        match self {
            Taxonomy::Single(id) => std::slice::from_ref(id),
            Taxonomy::Multiple(ids) => ids,
        }
    }

    /// 任一 taxid 相同即视为匹配
    pub fn contains(&self, taxid: u32) -> bool {
        self.ids().contains(&taxid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Organism {
    Single(String),
    Multiple(Vec<String>),
}

impl Organism {
    pub fn from_names(mut names: Vec<String>) -> Option<Self> {
        match names.len() {
            0 => None,
            1 => names.pop().map(Organism::Single),
            _ => Some(Organism::Multiple(names)),
        }
    }
}

/// 图谱元数据。字段顺序即持久化 JSON 中的键顺序。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxid: Option<Taxonomy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism: Option<Organism>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
}

impl Metadata {
    pub fn for_sample(sample: impl Into<String>) -> Self {
        Self { sample: Some(sample.into()), ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    meta: Metadata,
    species: u32,
    alleles: IndexMap<String, BTreeSet<String>>,
}

impl Profile {
    /// 由 位点名 → 等位基因串（"13,14"）构造图谱。
    ///
    /// 位点名经注册表规范化；等位基因串去空格后按逗号拆分。
    /// 没有任何等位基因的位点被丢弃，整个图谱为空则报错。
    pub fn new<I, K, V>(alleles: I, meta: Metadata) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let raw: Vec<(K, V)> = alleles.into_iter().collect();
        let (names, species) = markers::resolve_all(raw.iter().map(|(k, _)| k.as_ref()))?;
        let mut parsed = IndexMap::with_capacity(raw.len());
        for (marker, marker_alleles) in &raw {
            let set = allele::parse_allele_set(marker_alleles.as_ref())?;
            if set.is_empty() {
                log::debug!("dropping marker '{}' without alleles", marker.as_ref());
                continue;
            }
            parsed.insert(names[marker.as_ref()].to_string(), set);
        }
        if parsed.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "profile '{}' has no allele data",
                meta.sample.as_deref().or(meta.identifier.as_deref()).unwrap_or("sample")
            )));
        }
        Ok(Self { meta, species, alleles: parsed })
    }

    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }

    /// 由位点名推断出的物种
    pub fn species(&self) -> u32 {
        self.species
    }

    pub fn identifier(&self) -> &str {
        self.meta.identifier.as_deref().unwrap_or("")
    }

    pub fn accession(&self) -> &str {
        self.meta.accession.as_deref().unwrap_or("")
    }

    pub fn source(&self) -> &str {
        self.meta.source.as_deref().unwrap_or("")
    }

    pub fn sample(&self) -> &str {
        self.meta.sample.as_deref().unwrap_or("sample")
    }

    /// 用于同分时确定性排序
    pub fn slug(&self) -> (&str, &str, &str) {
        (self.identifier(), self.accession(), self.source())
    }

    /// 元数据里有 taxid 时按元数据判断（多个 taxid 任一匹配即可），否则退回位点推断的物种
    pub fn taxid_match(&self, taxid: u32) -> bool {
        match &self.meta.taxid {
            Some(taxonomy) => taxonomy.contains(taxid),
            None => self.species == taxid,
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.alleles.keys().map(String::as_str)
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.alleles.contains_key(marker)
    }

    pub fn allele_set(&self, marker: &str) -> Option<&BTreeSet<String>> {
        self.alleles.get(marker)
    }

    /// 所有 (位点, 等位基因) 对，位点按插入顺序，等位基因按字典序
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.alleles
            .iter()
            .flat_map(|(m, set)| set.iter().map(move |a| (m.as_str(), a.as_str())))
    }

    pub fn allele_count(&self) -> usize {
        self.alleles.values().map(BTreeSet::len).sum()
    }

    pub fn max_num_alleles(&self) -> usize {
        self.alleles.values().map(BTreeSet::len).max().unwrap_or(0)
    }

    /// 逐位点渲染等位基因（数值序），缺失位点为 None
    pub fn marker_alleles<S: AsRef<str>>(&self, markers: &[S]) -> Vec<Option<String>> {
        markers
            .iter()
            .map(|m| self.alleles.get(m.as_ref()).map(allele::allele_repr))
            .collect()
    }

    /// 持久化形式：位点 → 字典序拼接的等位基因串
    pub fn allele_map(&self) -> IndexMap<String, String> {
        self.alleles
            .iter()
            .map(|(m, set)| (m.clone(), allele::allele_join(set)))
            .collect()
    }

    /// 规范表格：Sample,Marker,Allele1..AlleleN
    pub fn write_table<W: std::io::Write>(&self, wtr: &mut csv::Writer<W>) -> csv::Result<()> {
        let width = self.max_num_alleles();
        let mut header = vec!["Sample".to_string(), "Marker".to_string()];
        header.extend((1..=width).map(|i| format!("Allele{i}")));
        wtr.write_record(&header)?;
        for (marker, set) in &self.alleles {
            let mut row = vec![self.sample(), marker.as_str()];
            row.extend(allele::sorted_alleles(set));
            row.resize(width + 2, "");
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        self.write_table(&mut wtr).map_err(|_| fmt::Error)?;
        let bytes = wtr.into_inner().map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&bytes))
    }
}
