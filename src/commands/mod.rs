//! # 命令处理模块
//!
//! 每个子模块对应一个功能域，返回 `Result<_, String>` 供命令行层直接输出：
//! - `settings` - 配置读取与目录查询
//! - `projects` - 项目列表加载
//! - `convert` - 执行 PCL 转换

pub mod convert;
pub mod projects;
pub mod settings;
