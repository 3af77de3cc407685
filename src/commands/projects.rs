//! # 项目列表命令
//!
//! - `reload_projects` - 扫描根目录，返回可转换的候选项目

use crate::services::migrator::{Migrator, ReloadResult};

/// 重新加载项目列表
///
/// 返回的项目均已读到目标框架；仍在加载或框架不可读的项目会被排除。
/// 没有候选项目时 `state` 为 `"No .Net projects"`，根目录不存在时为 `"No solution"`。
pub async fn reload_projects(migrator: &Migrator) -> Result<ReloadResult, String> {
    migrator
        .reload()
        .await
        .map_err(|e| format!("加载项目失败: {}", e))
}
