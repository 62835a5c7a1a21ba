//! STR 位点名称注册表：按物种（NCBI taxid）列出规范位点名，并提供忽略大小写/空格的名称解析。

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};

pub const HUMAN_TAXID: u32 = 9606;
pub const MOUSE_TAXID: u32 = 10090;
pub const DOG_TAXID: u32 = 9615;

pub const AMELOGENIN: &str = "Amelogenin";

const HUMAN_MARKERS: &[&str] = &[
    "Amelogenin",
    "CSF1PO",
    "D10S1248",
    "D12S391",
    "D13S317",
    "D16S539",
    "D17S1301",
    "D18S51",
    "D19S433",
    "D1S1656",
    "D20S482",
    "D21S11",
    "D22S1045",
    "D2S1338",
    "D2S441",
    "D3S1358",
    "D4S2408",
    "D5S818",
    "D6S1043",
    "D7S820",
    "D8S1179",
    "D9S1122",
    "DXS10074",
    "DXS101",
    "DXS10103",
    "DXS10135",
    "DXS7132",
    "DXS7423",
    "DXS8378",
    "DYF387S1",
    "DYS19",
    "DYS385a-b",
    "DYS389I",
    "DYS389II",
    "DYS390",
    "DYS391",
    "DYS392",
    "DYS437",
    "DYS438",
    "DYS439",
    "DYS448",
    "DYS460",
    "DYS481",
    "DYS505",
    "DYS522",
    "DYS533",
    "DYS549",
    "DYS570",
    "DYS576",
    "DYS612",
    "DYS635",
    "DYS643",
    "F13A01",
    "F13B",
    "FESFPS",
    "FGA",
    "HPRTB",
    "LPL",
    "Penta C",
    "Penta D",
    "Penta E",
    "SE33",
    "TH01",
    "TPOX",
    "Y-GATA-H4",
    "vWA",
];

const MOUSE_MARKERS: &[&str] = &[
    "Mouse STR 1-1",
    "Mouse STR 1-2",
    "Mouse STR 2-1",
    "Mouse STR 3-2",
    "Mouse STR 4-2",
    "Mouse STR 5-5",
    "Mouse STR 6-4",
    "Mouse STR 6-7",
    "Mouse STR 7-1",
    "Mouse STR 8-1",
    "Mouse STR 9-2",
    "Mouse STR 11-2",
    "Mouse STR 12-1",
    "Mouse STR 13-1",
    "Mouse STR 15-3",
    "Mouse STR 17-2",
    "Mouse STR 18-3",
    "Mouse STR 19-2",
    "Mouse STR X-1",
];

const DOG_MARKERS: &[&str] = &[
    "Dog FHC2010",
    "Dog FHC2054",
    "Dog FHC2079",
    "Dog PEZ1",
    "Dog PEZ3",
    "Dog PEZ5",
    "Dog PEZ6",
    "Dog PEZ8",
    "Dog PEZ12",
    "Dog PEZ20",
];

/// 物种表：(taxid, 物种名, 规范位点名)。运行期不可变。
pub struct Species {
    pub taxid: u32,
    pub name: &'static str,
    pub markers: &'static [&'static str],
}

pub const SPECIES: &[Species] = &[
    Species { taxid: HUMAN_TAXID, name: "human", markers: HUMAN_MARKERS },
    Species { taxid: MOUSE_TAXID, name: "mouse", markers: MOUSE_MARKERS },
    Species { taxid: DOG_TAXID, name: "dog", markers: DOG_MARKERS },
];

pub fn species_name(taxid: u32) -> Option<&'static str> {
    SPECIES.iter().find(|s| s.taxid == taxid).map(|s| s.name)
}

fn normalize(name: &str) -> String {
    name.chars().filter(|c| *c != ' ').collect::<String>().to_lowercase()
}

/// 将任意写法的位点名解析为 (规范名, taxid)。找不到时返回 None。
pub fn resolve(name: &str) -> Option<(&'static str, u32)> {
    let candidate = normalize(name);
    SPECIES.iter().find_map(|species| {
        species
            .markers
            .iter()
            .find(|marker| normalize(marker) == candidate)
            .map(|marker| (*marker, species.taxid))
    })
}

/// 解析一组位点名，返回 原始名 → 规范名 的映射以及唯一物种 taxid。
///
/// 所有无法识别的名字会一次性列出；若位点来自多个物种，同样报错。
pub fn resolve_all<'a, I>(names: I) -> Result<(HashMap<String, &'static str>, u32)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut valid = HashMap::new();
    let mut invalid = Vec::new();
    let mut taxids = BTreeSet::new();
    for name in names {
        match resolve(name) {
            Some((canonical, taxid)) => {
                valid.insert(name.to_string(), canonical);
                taxids.insert(taxid);
            }
            None => invalid.push(name.to_string()),
        }
    }
    if !invalid.is_empty() {
        return Err(Error::InvalidMarker(invalid.join(", ")));
    }
    if taxids.len() > 1 {
        let mut species: Vec<&str> = taxids
            .iter()
            .map(|t| species_name(*t).unwrap_or("unknown"))
            .collect();
        species.sort_unstable();
        return Err(Error::MixedSpecies(species.join(", ")));
    }
    match taxids.into_iter().next() {
        Some(taxid) => Ok((valid, taxid)),
        None => Err(Error::InvalidMarker("no marker names given".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(input: &[&str], expected: &[(&str, &str)], expected_taxid: u32) {
        let (names, taxid) = resolve_all(input.iter().copied()).unwrap();
        assert_eq!(taxid, expected_taxid);
        assert_eq!(names.len(), expected.len());
        for (raw, canonical) in expected {
            assert_eq!(names[*raw], *canonical, "raw name {raw:?}");
        }
    }

    #[test]
    fn resolve_all_basic() {
        check(
            &["PENTAD", "AmeLoGenIN", "D21S11"],
            &[("PENTAD", "Penta D"), ("AmeLoGenIN", "Amelogenin"), ("D21S11", "D21S11")],
            HUMAN_TAXID,
        );
        check(
            &["d8s1179", "PentaE", "Se33", "Tpox"],
            &[("d8s1179", "D8S1179"), ("PentaE", "Penta E"), ("Se33", "SE33"), ("Tpox", "TPOX")],
            HUMAN_TAXID,
        );
        check(
            &["CSF1PO", "fgA", "D3S1358"],
            &[("CSF1PO", "CSF1PO"), ("fgA", "FGA"), ("D3S1358", "D3S1358")],
            HUMAN_TAXID,
        );
        check(
            &[" mousestr1-2 ", "MouseSTR8-1"],
            &[(" mousestr1-2 ", "Mouse STR 1-2"), ("MouseSTR8-1", "Mouse STR 8-1")],
            MOUSE_TAXID,
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        for raw in ["pentad", " v W a ", "dogpez12", "Mouse STR X-1"] {
            let (canonical, taxid) = resolve(raw).expect("resolvable");
            assert_eq!(resolve(canonical), Some((canonical, taxid)));
        }
        assert_eq!(resolve("Penta G"), None);
    }

    #[test]
    fn invalid_markers_are_all_listed() {
        let err = resolve_all(["CSF1PO", "Penta G", "D2S1338", "D99"]).unwrap_err();
        assert!(matches!(err, Error::InvalidMarker(_)));
        assert_eq!(err.to_string(), "invalid marker name(s): Penta G, D99");
    }

    #[test]
    fn mixed_species() {
        let err = resolve_all(["vWA", "DogPEZ8"]).unwrap_err();
        assert!(matches!(err, Error::MixedSpecies(_)));
        assert_eq!(
            err.to_string(),
            "list of marker names includes markers from different species: dog, human"
        );
    }

    #[test]
    fn every_canonical_name_maps_to_one_species() {
        for species in SPECIES {
            for marker in species.markers {
                assert_eq!(resolve(marker), Some((*marker, species.taxid)));
            }
        }
    }
}
