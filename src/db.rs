//! 参考图谱数据库：Cellosaurus 文本转换、JSON 持久化与检索入口。

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::io::cellosaurus::{CellosaurusEntry, CellosaurusReader};
use crate::profile::{Metadata, Profile};
use crate::search::{self, SearchOpt, SearchResult};

/// 持久化格式中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub meta: Metadata,
    pub alleles: IndexMap<String, String>,
}

impl From<&Profile> for ProfileRecord {
    fn from(profile: &Profile) -> Self {
        Self { meta: profile.meta().clone(), alleles: profile.allele_map() }
    }
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = Error;

    fn try_from(record: ProfileRecord) -> Result<Self> {
        Profile::new(record.alleles, record.meta)
    }
}

/// 有序的参考图谱集合，每个 (细胞系, 来源) 一条
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    profiles: Vec<Profile>,
}

impl Database {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self { profiles }
    }

    /// 解析 Cellosaurus 文本（cellosaurus.txt）
    pub fn from_flat_file<R: BufRead>(reader: R) -> Result<Self> {
        let mut profiles = Vec::new();
        let mut n_records = 0usize;
        for lines in CellosaurusReader::new(reader) {
            let entry = CellosaurusEntry::parse(&lines?)?;
            n_records += 1;
            for (alleles, meta) in entry.profiles() {
                profiles.push(Profile::new(alleles, meta)?);
            }
        }
        log::info!("parsed {} database records", n_records);
        log::info!("parsed {} distinct cell line STR profiles", profiles.len());
        Ok(Self { profiles })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let fh = std::fs::File::open(path)?;
        Self::from_json(BufReader::new(fh))
    }

    /// 读取持久化 JSON：顶层为数组，或单个对象（视为只有一条记录）。
    ///
    /// 直接反序列化为记录，不经过 `Value`，以保留每条记录中位点的原有顺序。
    pub fn from_json<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let records: Vec<ProfileRecord> = match text.trim_start().as_bytes().first() {
            Some(b'[') => serde_json::from_str(&text)?,
            Some(b'{') => vec![serde_json::from_str(&text)?],
            _ => {
                let other: Value = serde_json::from_str(&text)?;
                return Err(Error::InvalidArgument(format!(
                    "unexpected data type '{}'",
                    json_type_name(&other)
                )));
            }
        };
        let profiles = records.into_iter().map(Profile::try_from).collect::<Result<Vec<_>>>()?;
        log::debug!("loaded {} reference profiles", profiles.len());
        Ok(Self { profiles })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let fh = std::fs::File::create(path)?;
        let mut out = BufWriter::new(fh);
        self.to_json(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// 四空格缩进的 JSON 数组
    pub fn to_json<W: Write>(&self, writer: W) -> Result<()> {
        let records: Vec<ProfileRecord> = self.profiles.iter().map(ProfileRecord::from).collect();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
        records.serialize(&mut ser)?;
        Ok(())
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Profile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn push(&mut self, profile: Profile) {
        self.profiles.push(profile);
    }

    pub fn retain<F: FnMut(&Profile) -> bool>(&mut self, f: F) {
        self.profiles.retain(f);
    }

    /// 某个细胞系的全部来源
    pub fn get<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = &'a Profile> + 'a {
        self.profiles.iter().filter(move |p| p.identifier() == identifier)
    }

    pub fn search(&self, query: &Profile, opt: &SearchOpt) -> SearchResult<'_> {
        search::search(&self.profiles, query, opt)
    }

    pub fn search_all(&self, queries: &[Profile], opt: &SearchOpt) -> Vec<SearchResult<'_>> {
        search::search_all(&self.profiles, queries, opt)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl FromIterator<Profile> for Database {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        Self { profiles: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a Database {
    type Item = &'a Profile;
    type IntoIter = std::slice::Iter<'a, Profile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Taxonomy;

    const FLAT: &str = "\
 CELLOSAURUS header
----------------------
ID   Cell-A
AC   CVCL_000A
OX   NCBI_TaxID=9606; ! Homo sapiens (Human)
ST   Source(s): ATCC; DSMZ
ST   Amelogenin: X
ST   FGA: 20,21
ST   TH01: 7 (ATCC)
ST   TH01: 7,8 (DSMZ)
//
ID   Cell-B
AC   CVCL_000B
OX   NCBI_TaxID=10090; ! Mus musculus (Mouse)
ST   Source(s): ATCC
ST   Mouse STR 1-1: 10,11
//
";

    #[test]
    fn flat_file_conversion() {
        let db = Database::from_flat_file(FLAT.as_bytes()).unwrap();
        assert_eq!(db.len(), 3);
        let sources: Vec<&str> = db.get("Cell-A").map(Profile::source).collect();
        assert_eq!(sources, ["ATCC", "DSMZ"]);
        let mouse = db.get("Cell-B").next().unwrap();
        assert_eq!(mouse.meta().taxid, Some(Taxonomy::Single(10090)));
        assert!(mouse.has_marker("Mouse STR 1-1"));
    }

    #[test]
    fn json_round_trip_is_stable() {
        let db = Database::from_flat_file(FLAT.as_bytes()).unwrap();
        let mut first = Vec::new();
        db.to_json(&mut first).unwrap();
        let loaded = Database::from_json(first.as_slice()).unwrap();
        assert_eq!(loaded, db);
        let mut second = Vec::new();
        loaded.to_json(&mut second).unwrap();
        assert_eq!(first, second);

        let text = String::from_utf8(first).unwrap();
        assert!(text.starts_with("[\n    {\n        \"meta\": {\n            \"identifier\": \"Cell-A\""));
        assert!(text.contains("\"taxid\": 9606,"));
        assert!(!text.contains("\"sample\""));
    }

    #[test]
    fn single_object_and_bad_top_level() {
        let one = r#"{"meta": {"identifier": "X", "source": "ATCC"}, "alleles": {"FGA": "21,20"}}"#;
        let db = Database::from_json(one.as_bytes()).unwrap();
        assert_eq!(db.len(), 1);
        assert_eq!(db.profiles()[0].allele_map()["FGA"], "20,21");

        let err = Database::from_json("\"cellosaurus\"".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "unexpected data type 'string'");
        let err = Database::from_json("42".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn marker_order_survives_reload() {
        let text = "ID   Mouse-A\nOX   NCBI_TaxID=10090; ! Mus musculus (Mouse)\n\
                    ST   Source(s): ATCC\nST   Mouse STR 3-2: 14,15\nST   Mouse STR 12-1: 16\n\
                    ST   Mouse STR 1-1: 12\n//\n";
        let db = Database::from_flat_file(text.as_bytes()).unwrap();
        let mut first = Vec::new();
        db.to_json(&mut first).unwrap();
        let loaded = Database::from_json(first.as_slice()).unwrap();
        let markers: Vec<&str> = loaded.profiles()[0].markers().collect();
        assert_eq!(markers, ["Mouse STR 3-2", "Mouse STR 12-1", "Mouse STR 1-1"]);
        assert_eq!(loaded.profiles()[0].to_string(), db.profiles()[0].to_string());
        let mut second = Vec::new();
        loaded.to_json(&mut second).unwrap();
        assert_eq!(String::from_utf8(first).unwrap(), String::from_utf8(second).unwrap());
    }

    #[test]
    fn filtered_database_round_trip() {
        let mut db = Database::from_flat_file(FLAT.as_bytes()).unwrap();
        db.retain(|p| p.source() == "ATCC");
        assert_eq!(db.len(), 2);
        let mut first = Vec::new();
        db.to_json(&mut first).unwrap();
        let mut loaded = Database::from_json(first.as_slice()).unwrap();
        assert_eq!(loaded, db);

        loaded.push(Profile::new([("FGA", "22")], Metadata::for_sample("extra")).unwrap());
        let rebuilt: Database = loaded.iter().take(2).cloned().collect();
        let mut second = Vec::new();
        rebuilt.to_json(&mut second).unwrap();
        assert_eq!(first, second);
        assert!(Database::new(Vec::new()).is_empty());
    }

    #[test]
    fn invalid_marker_in_record_is_fatal() {
        let text = "ID   X\nST   Source(s): A\nST   FGA: 20\nST   D99S999: 1\n//\n";
        let err = Database::from_flat_file(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidMarker(_)));
    }

    #[test]
    fn search_entry_points() {
        let db = Database::from_flat_file(FLAT.as_bytes()).unwrap();
        let query = Profile::new([("FGA", "20,21"), ("TH01", "7")], Metadata::for_sample("q")).unwrap();
        let result = db.search(&query, &SearchOpt::default());
        assert_eq!(result.cell_lines().len(), 1);
        let best = result.cell_lines()["Cell-A"].best().unwrap();
        assert_eq!(best.reference.source(), "ATCC");
        assert_eq!(best.score, 1.0);

        let results = db.search_all(&[query.clone(), query], &SearchOpt::default());
        assert_eq!(results.len(), 2);
    }
}
