use std::io::BufRead;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Error, Result};
use crate::profile::{Metadata, Organism, Taxonomy};

/// 一条 Cellosaurus 记录的原始行（已去除首尾空白，不含结尾的 `//`）
pub type RecordLines = Vec<String>;

/// 按记录切分 Cellosaurus 文本：跳过文件头直到 `ID` 行，每条记录以 `//` 结束。
pub struct CellosaurusReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
}

impl<R: BufRead> CellosaurusReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: String::new(), done: false }
    }

    pub fn next_record(&mut self) -> Result<Option<RecordLines>> {
        if self.done {
            return Ok(None);
        }

        // Find ID line
        let first = loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                return Ok(None);
            }
            if self.buf.starts_with("ID") {
                break self.buf.trim().to_string();
            }
        };

        let mut lines = vec![first];
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                log::warn!("dropping record '{}' not terminated by '//'", lines[0]);
                return Ok(None);
            }
            let line = self.buf.trim();
            if line == "//" {
                return Ok(Some(lines));
            }
            lines.push(line.to_string());
        }
    }
}

impl<R: BufRead> Iterator for CellosaurusReader<R> {
    type Item = Result<RecordLines>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn species_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^OX   NCBI_TaxID=(\d+); ! (.+)$").expect("valid regex"))
}

fn sources_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ST   Source\(s\): (.+)$").expect("valid regex"))
}

fn alleles_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ST   ([^:]+): ([\dXY,. ]+)(.+)?$").expect("valid regex"))
}

/// 解析后的一条记录：记录级元数据 + 每个来源（Source）独立的等位基因表
#[derive(Debug, Clone, Default)]
pub struct CellosaurusEntry {
    pub identifier: Option<String>,
    pub accession: Option<String>,
    pub synonyms: Option<String>,
    pub taxids: Vec<u32>,
    pub organisms: Vec<String>,
    /// source → (marker → 等位基因串)，保持 `Source(s)` 行中的声明顺序
    pub alleles: IndexMap<String, IndexMap<String, String>>,
}

impl CellosaurusEntry {
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut entry = Self::default();
        for line in lines {
            let line = line.as_ref();
            match line.get(..2) {
                Some("ID") | Some("AC") | Some("SY") => entry.parse_meta(line)?,
                Some("OX") => entry.parse_species(line)?,
                Some("ST") if line.contains("Source") => entry.parse_sources(line)?,
                Some("ST") if !line.contains("Not_detected") => entry.parse_alleles(line)?,
                _ => {}
            }
        }
        Ok(entry)
    }

    fn name(&self) -> &str {
        self.identifier.as_deref().unwrap_or("?")
    }

    fn parse_meta(&mut self, line: &str) -> Result<()> {
        let (code, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let value = value.trim_start().to_string();
        let slot = match code {
            "ID" => &mut self.identifier,
            "AC" => &mut self.accession,
            "SY" => &mut self.synonyms,
            _ => return Ok(()),
        };
        if slot.is_some() {
            return Err(Error::MalformedRecord(format!(
                "duplicate '{code}' line in record: {line}"
            )));
        }
        *slot = Some(value);
        Ok(())
    }

    fn parse_species(&mut self, line: &str) -> Result<()> {
        let caps = species_re().captures(line).ok_or_else(|| {
            Error::MalformedRecord(format!("cannot parse species of origin: {line}"))
        })?;
        let taxid = caps[1].parse::<u32>().map_err(|_| {
            Error::MalformedRecord(format!("cannot parse species of origin: {line}"))
        })?;
        self.taxids.push(taxid);
        self.organisms.push(caps[2].to_string());
        Ok(())
    }

    fn parse_sources(&mut self, line: &str) -> Result<()> {
        let caps = sources_re()
            .captures(line)
            .ok_or_else(|| Error::MalformedRecord(format!("could not parse sources: {line}")))?;
        for source in caps[1].split("; ") {
            self.alleles.insert(source.to_string(), IndexMap::new());
        }
        Ok(())
    }

    fn parse_alleles(&mut self, line: &str) -> Result<()> {
        let caps = alleles_re().captures(line).ok_or_else(|| {
            Error::MalformedRecord(format!("could not parse STR profile data: {line}"))
        })?;
        let marker = caps[1].to_string();
        let allele_str = caps[2].trim().to_string();
        match caps.get(3) {
            None => {
                for marker_alleles in self.alleles.values_mut() {
                    marker_alleles.insert(marker.clone(), allele_str.clone());
                }
            }
            Some(sources) => {
                let sources = sources.as_str().replace(['(', ')'], "");
                for source in sources.trim().split("; ") {
                    match self.alleles.get_mut(source) {
                        Some(marker_alleles) => {
                            marker_alleles.insert(marker.clone(), allele_str.clone());
                        }
                        None => log::warn!(
                            "Source '{}' not defined for cell line {}",
                            source,
                            self.name()
                        ),
                    }
                }
            }
        }
        Ok(())
    }

    /// 每个来源一对 (等位基因表, 元数据)。只有一个物种时 taxid/organism 折叠为标量。
    pub fn profiles(&self) -> Vec<(IndexMap<String, String>, Metadata)> {
        let taxid = Taxonomy::from_ids(self.taxids.clone());
        let organism = Organism::from_names(self.organisms.clone());
        let mut out = Vec::with_capacity(self.alleles.len());
        for (source, marker_alleles) in &self.alleles {
            if marker_alleles.is_empty() {
                log::warn!("Source '{}' of cell line {} has no STR data", source, self.name());
                continue;
            }
            let meta = Metadata {
                identifier: self.identifier.clone(),
                accession: self.accession.clone(),
                synonyms: self.synonyms.clone(),
                taxid: taxid.clone(),
                organism: organism.clone(),
                source: Some(source.clone()),
                sample: None,
            };
            out.push((marker_alleles.clone(), meta));
        }
        out
    }
}
