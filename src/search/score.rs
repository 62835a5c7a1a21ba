use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::profile::markers::AMELOGENIN;
use crate::profile::Profile;

/// 相似度算法（Q = 查询等位基因数，R = 参考等位基因数，S = 共有等位基因数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// 2S / (Q + R)，doi:10.11418/jtca1981.18.4_329
    #[default]
    Tanabe,
    /// S / Q
    Query,
    /// S / R
    Reference,
}

/// 缺失数据的处理方式：决定参与计分的位点集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// 两个图谱共有的位点
    #[default]
    Intersect,
    /// 查询图谱的全部位点
    Query,
    /// 参考图谱的全部位点
    Reference,
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Tanabe" => Ok(Algorithm::Tanabe),
            "query" => Ok(Algorithm::Query),
            "reference" => Ok(Algorithm::Reference),
            _ => Err(Error::InvalidArgument(format!("unsupported scoring algorithm '{s}'"))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Tanabe => "Tanabe",
            Algorithm::Query => "query",
            Algorithm::Reference => "reference",
        })
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intersect" => Ok(Mode::Intersect),
            "query" => Ok(Mode::Query),
            "reference" => Ok(Mode::Reference),
            _ => Err(Error::InvalidArgument(format!("unsupported scoring mode '{s}'"))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Intersect => "intersect",
            Mode::Query => "query",
            Mode::Reference => "reference",
        })
    }
}

/// 参与计分的位点。Amelogenin 用于性别判定，除非 `amel` 为真否则排除。
pub fn markers_for_scoring<'a>(
    query: &'a Profile,
    reference: &'a Profile,
    mode: Mode,
    amel: bool,
) -> Vec<&'a str> {
    let markers: Vec<&str> = match mode {
        Mode::Intersect => query.markers().filter(|m| reference.has_marker(m)).collect(),
        Mode::Query => query.markers().collect(),
        Mode::Reference => reference.markers().collect(),
    };
    markers.into_iter().filter(|m| amel || *m != AMELOGENIN).collect()
}

/// 计算两个图谱的相似度，返回 (score, 共有等位基因数)。
///
/// 共有数 S 为 0 时得分恒为 0.0；Tanabe 对称，query/reference 不对称。
pub fn score(
    query: &Profile,
    reference: &Profile,
    algorithm: Algorithm,
    mode: Mode,
    amel: bool,
) -> (f64, usize) {
    let mut q = 0usize;
    let mut r = 0usize;
    let mut s = 0usize;
    for marker in markers_for_scoring(query, reference, mode, amel) {
        let qa = query.allele_set(marker);
        let ra = reference.allele_set(marker);
        q += qa.map_or(0, |set| set.len());
        r += ra.map_or(0, |set| set.len());
        if let (Some(qa), Some(ra)) = (qa, ra) {
            s += qa.intersection(ra).count();
        }
    }
    if s == 0 {
        return (0.0, 0);
    }
    let value = match algorithm {
        Algorithm::Tanabe => (2 * s) as f64 / (q + r) as f64,
        Algorithm::Query => s as f64 / q as f64,
        Algorithm::Reference => s as f64 / r as f64,
    };
    (value, s)
}
