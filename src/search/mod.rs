//! 数据库检索：逐个参考图谱计分、按细胞系聚合、排序并生成报告。

pub mod report;
pub mod result;
pub mod score;

use rayon::prelude::*;

use crate::profile::markers::HUMAN_TAXID;
use crate::profile::Profile;

pub use report::{FullReport, ReportRow, Status, SummaryRow};
pub use result::{CellLineResult, ProfileResult, SearchResult};
pub use score::{score, Algorithm, Mode};

/// 检索参数
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchOpt {
    pub algorithm: Algorithm,
    pub mode: Mode,
    /// 只比较该物种的参考图谱；None 表示不过滤
    pub taxid: Option<u32>,
    /// 计分时是否包含 Amelogenin
    pub amel: bool,
    pub minscore: f64,
    /// <= 0 表示不限制
    pub maxhits: i64,
}

impl Default for SearchOpt {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Tanabe,
            mode: Mode::Intersect,
            taxid: Some(HUMAN_TAXID),
            amel: false,
            minscore: 0.0,
            maxhits: 20,
        }
    }
}

impl SearchOpt {
    /// 物种过滤取查询图谱自身的物种
    pub fn for_query(self, query: &Profile) -> Self {
        Self { taxid: Some(query.species()), ..self }
    }
}

/// 用一个查询图谱检索参考图谱集合，结果按 identifier 归组，组内保持扫描顺序
pub fn search<'db>(db: &'db [Profile], query: &Profile, opt: &SearchOpt) -> SearchResult<'db> {
    let mut result = SearchResult::new(query.clone(), opt.minscore, opt.maxhits);
    let mut compared = 0usize;
    for reference in db {
        if let Some(taxid) = opt.taxid {
            if !reference.taxid_match(taxid) {
                continue;
            }
        }
        let (value, shared_alleles) = score(query, reference, opt.algorithm, opt.mode, opt.amel);
        result.add_profile_result(ProfileResult {
            sample: query.sample().to_string(),
            score: value,
            shared_alleles,
            reference,
        });
        compared += 1;
    }
    log::debug!(
        "query '{}': compared against {} of {} reference profiles",
        query.sample(),
        compared,
        db.len()
    );
    result
}

/// 批量检索：各查询之间相互独立，用 rayon 并行，输出顺序与输入一致
pub fn search_all<'db>(
    db: &'db [Profile],
    queries: &[Profile],
    opt: &SearchOpt,
) -> Vec<SearchResult<'db>> {
    queries.par_iter().map(|query| search(db, query, opt)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::markers::MOUSE_TAXID;
    use crate::profile::{Metadata, Taxonomy};

    fn reference(identifier: &str, source: &str, taxid: Taxonomy, alleles: &[(&str, &str)]) -> Profile {
        let meta = Metadata {
            identifier: Some(identifier.to_string()),
            accession: Some(format!("CVCL_{identifier}")),
            taxid: Some(taxid),
            source: Some(source.to_string()),
            ..Metadata::default()
        };
        Profile::new(alleles.iter().copied(), meta).unwrap()
    }

    fn db() -> Vec<Profile> {
        vec![
            reference("A", "ATCC", Taxonomy::Single(9606), &[("FGA", "20,21"), ("TH01", "7")]),
            reference("B", "ATCC", Taxonomy::Single(9606), &[("FGA", "20"), ("TH01", "8")]),
            reference("A", "DSMZ", Taxonomy::Single(9606), &[("FGA", "20,21"), ("TH01", "7,8")]),
            reference(
                "C",
                "ATCC",
                Taxonomy::Multiple(vec![9606, 10090]),
                &[("FGA", "20,21"), ("TH01", "9")],
            ),
            reference("M", "ATCC", Taxonomy::Single(10090), &[("FGA", "20,21"), ("TH01", "7")]),
        ]
    }

    fn query() -> Profile {
        Profile::new([("FGA", "20,21"), ("TH01", "7")], Metadata::for_sample("q")).unwrap()
    }

    #[test]
    fn search_groups_by_cell_line_and_filters_species() {
        let db = db();
        let result = search(&db, &query(), &SearchOpt::default());
        let ids: Vec<&str> = result.cell_lines().keys().map(String::as_str).collect();
        assert_eq!(ids, ["A", "B", "C"]);
        let a = &result.cell_lines()["A"];
        assert_eq!(a.len(), 2);
        // 组内保持扫描顺序
        assert_eq!(a.results()[0].reference.source(), "ATCC");
        assert_eq!(a.top_score(), 1.0);
        assert_eq!(a.best().unwrap().reference.source(), "ATCC");
        assert_eq!(a.worst().unwrap().reference.source(), "DSMZ");

        let hits: Vec<&str> = result.hits().map(|c| c.identifier()).collect();
        assert_eq!(hits, ["A", "C", "B"]);
    }

    #[test]
    fn taxid_filter_accepts_any_of_multiple() {
        let db = db();
        let opt = SearchOpt { taxid: Some(MOUSE_TAXID), ..SearchOpt::default() };
        let result = search(&db, &query(), &opt);
        let ids: Vec<&str> = result.cell_lines().keys().map(String::as_str).collect();
        assert_eq!(ids, ["C", "M"]);

        let opt = SearchOpt { taxid: None, ..SearchOpt::default() };
        assert_eq!(search(&db, &query(), &opt).cell_lines().len(), 4);
    }

    #[test]
    fn summary_and_full_report() {
        let db = db();
        let opt = SearchOpt { minscore: 0.5, ..SearchOpt::default() };
        let result = search(&db, &query(), &opt);
        let summary = result.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].cell_line, "A");
        assert_eq!(summary[0].score, 1.0);
        assert_eq!(summary[0].shared_alleles, 3);
        assert_eq!(summary[1].cell_line, "C");

        let report = result.full_report();
        assert_eq!(report.markers, ["FGA", "TH01"]);
        assert_eq!(report.cell_lines(), ["q", "A", "A", "C"]);
        let statuses: Vec<Status> = report.rows.iter().map(|r| r.status).collect();
        assert_eq!(statuses, [Status::Query, Status::Best, Status::Worst, Status::Only]);
        assert_eq!(report.rows[0].alleles, [Some("20,21".to_string()), Some("7".to_string())]);
        assert_eq!(report.rows[2].alleles[1].as_deref(), Some("7,8"));
        assert_eq!(report.rows[0].score, None);
    }

    #[test]
    fn batch_search_preserves_input_order() {
        let db = db();
        let queries = vec![
            Profile::new([("FGA", "20")], Metadata::for_sample("first")).unwrap(),
            query(),
            Profile::new([("TH01", "8")], Metadata::for_sample("third")).unwrap(),
        ];
        let results = search_all(&db, &queries, &SearchOpt::default());
        let samples: Vec<&str> = results.iter().map(|r| r.query.sample()).collect();
        assert_eq!(samples, ["first", "q", "third"]);
    }
}
