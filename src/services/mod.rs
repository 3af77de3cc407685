//! # 业务逻辑服务模块
//!
//! 与命令层解耦的核心实现：
//! - `host` - 项目宿主与程序集解析的抽象接口
//! - `workspace` / `scanner` / `resolver` - 基于文件系统的宿主实现
//! - `catalog` - 目标框架与可移植配置文件目录
//! - `classifier` - 框架引用分类与移除
//! - `assembly_info` - 程序集元数据文本改写
//! - `project_file` - 项目构建配置文件的逐行改写
//! - `file_guard` - 项目文件写入守卫：`.bak` 备份与失败回滚
//! - `migrator` - 迁移编排与进度事件
//! - `session` - 进度事件的唯一消费者

pub mod assembly_info;
pub mod catalog;
pub mod classifier;
pub mod file_guard;
pub mod host;
pub mod migrator;
pub mod project_file;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod workspace;
