//! # 通用工具函数
//!
//! - `path` - 配置目录、备份路径与项目条目路径解析

pub mod path;
