//! 输入解析：Cellosaurus 文本数据库与查询样本表格。

pub mod cellosaurus;
pub mod table;
