//! # 数据模型模块
//!
//! 定义了迁移引擎使用的 Rust 数据结构：
//! - `framework` - 经典框架与可移植配置文件描述（从定义列表加载）
//! - `project` - 宿主项目树、候选项目记录和外部引用描述
//! - `assembly` - 完全限定的程序集标识
//! - `settings` - PCL Converter 自身的配置

pub mod assembly;
pub mod framework;
pub mod project;
pub mod settings;
