//! # clasp
//!
//! 基于 STR（短串联重复）图谱的细胞系鉴定工具。
//!
//! 本 crate 将一个或多个查询图谱与 Cellosaurus 参考图谱库比对，包括：
//!
//! - **数据库构建**：解析 Cellosaurus 文本格式，每个 (细胞系, 来源) 生成一个图谱，持久化为 JSON
//! - **位点注册表**：人、小鼠、犬的规范 STR 位点名，忽略大小写与空格解析
//! - **相似度计分**：Tanabe / query / reference 三种算法，intersect / query / reference 三种位点集合
//! - **检索与报告**：按细胞系聚合、排序、阈值截断，输出摘要表与全量 CSV 报告
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use clasp::{Database, Metadata, Profile, SearchOpt};
//!
//! let db = Database::load("cellosaurus.json")?;
//! let query = Profile::new(
//!     [("CSF1PO", "11,12"), ("D13S317", "8,12"), ("TH01", "7,9"), ("vWA", "14,17")],
//!     Metadata::for_sample("mock"),
//! )?;
//! let result = db.search(&query, &SearchOpt::default());
//! for row in result.summary() {
//!     println!("{} {:.3} {}", row.cell_line, row.score, row.source);
//! }
//! # Ok::<(), clasp::Error>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`profile`] — STR 图谱与位点注册表
//! - [`io`] — Cellosaurus 文本与查询表格解析
//! - [`db`] — 参考图谱库（转换、持久化、检索入口）
//! - [`search`] — 计分、排序与报告
//! - [`util`] — 等位基因解析与排序

pub mod db;
pub mod error;
pub mod io;
pub mod logging;
pub mod profile;
pub mod search;
pub mod util;

pub use db::Database;
pub use error::{Error, Result};
pub use profile::{Metadata, Profile, Taxonomy};
pub use search::{Algorithm, FullReport, Mode, SearchOpt, SearchResult};
