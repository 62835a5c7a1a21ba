use std::cmp::Ordering;
use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::profile::Profile;

/// 查询图谱与单个参考图谱的比较结果
#[derive(Debug, Clone)]
pub struct ProfileResult<'db> {
    pub sample: String,
    pub score: f64,
    pub shared_alleles: usize,
    pub reference: &'db Profile,
}

impl ProfileResult<'_> {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then(self.shared_alleles.cmp(&other.shared_alleles))
            .then_with(|| self.reference.slug().cmp(&other.reference.slug()))
    }
}

impl PartialEq for ProfileResult<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.rank_cmp(other) == Ordering::Equal
    }
}

impl Eq for ProfileResult<'_> {}

impl PartialOrd for ProfileResult<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 先按得分，再按共有等位基因数，最后按参考图谱 slug 排序
impl Ord for ProfileResult<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank_cmp(other)
    }
}

/// 同一细胞系（identifier 相同）的所有比较结果，保持数据库扫描顺序
#[derive(Debug, Clone, Default)]
pub struct CellLineResult<'db> {
    results: Vec<ProfileResult<'db>>,
}

impl<'db> CellLineResult<'db> {
    pub fn push(&mut self, result: ProfileResult<'db>) {
        debug_assert!(self
            .results
            .first()
            .map_or(true, |r| r.reference.identifier() == result.reference.identifier()
                && r.sample == result.sample));
        self.results.push(result);
    }

    pub fn results(&self) -> &[ProfileResult<'db>] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn top_score(&self) -> f64 {
        self.results.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max)
    }

    /// 达到最高分的结果中最大的共有等位基因数
    pub fn top_score_shared_alleles(&self) -> usize {
        let top = self.top_score();
        self.results
            .iter()
            .filter(|r| r.score == top)
            .map(|r| r.shared_alleles)
            .max()
            .unwrap_or(0)
    }

    pub fn identifier(&self) -> &str {
        self.results.first().map_or("", |r| r.reference.identifier())
    }

    pub fn sample(&self) -> &str {
        self.results.first().map_or("", |r| r.sample.as_str())
    }

    pub fn best(&self) -> Option<&ProfileResult<'db>> {
        self.results.iter().max()
    }

    pub fn worst(&self) -> Option<&ProfileResult<'db>> {
        self.results.iter().min()
    }
}

/// 单个查询的检索结果。
///
/// `minscore` 与 `maxhits` 在读取时生效而非插入时，因此同一个结果可以多次遍历。
#[derive(Debug, Clone)]
pub struct SearchResult<'db> {
    pub query: Profile,
    pub minscore: f64,
    pub maxhits: i64,
    by_cell_line: IndexMap<String, CellLineResult<'db>>,
}

impl<'db> SearchResult<'db> {
    pub fn new(query: Profile, minscore: f64, maxhits: i64) -> Self {
        Self { query, minscore, maxhits, by_cell_line: IndexMap::new() }
    }

    pub fn add_profile_result(&mut self, result: ProfileResult<'db>) {
        self.by_cell_line
            .entry(result.reference.identifier().to_string())
            .or_default()
            .push(result);
    }

    /// 全部细胞系（不做阈值过滤），按插入顺序
    pub fn cell_lines(&self) -> &IndexMap<String, CellLineResult<'db>> {
        &self.by_cell_line
    }

    /// 按 (最高分, 最高分对应的共有数) 降序排列；同分保持插入顺序
    pub fn ranked(&self) -> Vec<&CellLineResult<'db>> {
        let mut ranked: Vec<&CellLineResult<'db>> = self.by_cell_line.values().collect();
        ranked.sort_by(|a, b| {
            b.top_score()
                .total_cmp(&a.top_score())
                .then(b.top_score_shared_alleles().cmp(&a.top_score_shared_alleles()))
        });
        ranked
    }

    /// 按排名遍历候选细胞系：最多 `maxhits` 个（<= 0 不限），遇到第一个低于 `minscore` 的即停止
    pub fn hits(&self) -> impl Iterator<Item = &CellLineResult<'db>> + '_ {
        let cap = if self.maxhits > 0 { self.maxhits as usize } else { usize::MAX };
        let minscore = self.minscore;
        self.ranked()
            .into_iter()
            .take(cap)
            .take_while(move |result| result.top_score() >= minscore)
    }

    /// 报告中需要展示的全部位点：查询图谱及所有入选细胞系的全部参考图谱，字典序
    pub fn all_markers(&self) -> Vec<String> {
        let mut markers: BTreeSet<&str> = self.query.markers().collect();
        for cell_line in self.hits() {
            for result in cell_line.results() {
                markers.extend(result.reference.markers());
            }
        }
        markers.into_iter().map(String::from).collect()
    }
}
