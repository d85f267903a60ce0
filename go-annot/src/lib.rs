//! # go-annot
//!
//! Gene Ontology 注释工具集。
//!
//! 核心是 GO 本体模型与传递祖先解析：从 OBO 文件读取 is_a 边，构建 term -> 直接父节点
//! 的 DAG，对任意 term 计算其全部祖先（记忆化、带环检测），并据此生成
//! 蛋白 / GO term / 祖先 三列报告。
//!
//! ## 快速示例
//!
//! ```rust
//! use go_annot::io::gaf::Associations;
//! use go_annot::ontology::{ancestors::AncestorResolver, Ontology};
//! use go_annot::report::{ReportBuilder, ReportOpt};
//!
//! let onto = Ontology::from_edges([
//!     ("GO:1", vec![]),
//!     ("GO:2", vec!["GO:1"]),
//!     ("GO:3", vec!["GO:1"]),
//!     ("GO:4", vec!["GO:2", "GO:3"]),
//! ]);
//!
//! let mut resolver = AncestorResolver::new(&onto);
//! let ancestors: Vec<&str> = resolver.resolve("GO:4").unwrap().iter().copied().collect();
//! assert_eq!(ancestors, vec!["GO:1", "GO:2", "GO:3"]);
//!
//! let assoc: Associations = vec![("P1", "GO:4")].into_iter().collect();
//! let mut out = Vec::new();
//! ReportBuilder::new(&onto, &assoc, ReportOpt::default()).write(&mut out).unwrap();
//! assert_eq!(out, b"P1\tGO:4\tGO:1\n\t\tGO:2\n\t\tGO:3\n");
//! ```
//!
//! ## 模块说明
//!
//! - [`io`]：OBO / GAF / BLAST outfmt6 / 表达矩阵 解析
//! - [`ontology`]：本体模型、二进制快照与祖先解析
//! - [`report`]：GO 祖先报告与差异表达注释报告
//! - [`error`]：错误类型
//! - [`logging`]：tracing 日志初始化

pub mod error;
pub mod io;
pub mod logging;
pub mod ontology;
pub mod report;
