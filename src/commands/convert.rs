//! # 转换命令
//!
//! `convert_projects`：重新加载项目 → 按选择勾选 → 执行迁移，
//! 同时由 `SessionState` 消费进度事件并回调调用方。

use tokio::sync::mpsc;

use crate::models::framework::PortableProfileDescriptor;
use crate::models::project::ProjectRecord;
use crate::services::catalog::FrameworkCatalog;
use crate::services::migrator::{MigrationEvent, Migrator};
use crate::services::session::SessionState;

/// 参与转换的项目选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// 勾选全部候选项目
    All,
    /// 只勾选指定名称的项目
    Named(Vec<String>),
}

/// 确定目标可移植配置文件
///
/// 优先使用 `requested`，其次是配置中的默认值。
/// 名称不区分大小写；找不到时错误信息中列出所有可用配置文件。
pub fn resolve_profile(
    catalog: &FrameworkCatalog,
    requested: Option<&str>,
    default: Option<&str>,
) -> Result<PortableProfileDescriptor, String> {
    let known = || {
        catalog
            .portable_profiles()
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let name = requested
        .or(default)
        .ok_or_else(|| format!("未指定目标配置文件，可选: {}", known()))?;

    catalog
        .find_profile(name)
        .cloned()
        .ok_or_else(|| format!("未知的配置文件 \"{}\"，可选: {}", name, known()))
}

/// 按选择设置项目的勾选状态
///
/// 指定的名称中有任何一个不在候选列表内时返回错误。
pub fn apply_selection(
    mut projects: Vec<ProjectRecord>,
    selection: &Selection,
) -> Result<Vec<ProjectRecord>, String> {
    match selection {
        Selection::All => projects.iter_mut().for_each(|p| p.selected = true),
        Selection::Named(names) => {
            if let Some(missing) = names
                .iter()
                .find(|n| !projects.iter().any(|p| &p.name == *n))
            {
                return Err(format!("找不到项目 \"{}\"", missing));
            }
            for project in &mut projects {
                project.selected = names.contains(&project.name);
            }
        }
    }
    Ok(projects)
}

/// 执行一次转换，返回最终的会话状态
///
/// `on_event` 在每条进度事件被应用到会话状态之后调用。
pub async fn convert_projects<F>(
    migrator: &Migrator,
    catalog: &FrameworkCatalog,
    selection: &Selection,
    profile: Option<&str>,
    default_profile: Option<&str>,
    on_event: F,
) -> Result<SessionState, String>
where
    F: FnMut(&SessionState, &MigrationEvent),
{
    let profile = resolve_profile(catalog, profile, default_profile)?;

    let loaded = migrator
        .reload()
        .await
        .map_err(|e| format!("加载项目失败: {}", e))?;
    let projects = apply_selection(loaded.projects, selection)?;

    log::info!(
        "开始转换 {} 个项目，目标 {}",
        projects.iter().filter(|p| p.is_eligible()).count(),
        profile.name
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let consumer = SessionState::with_projects(projects.clone()).consume(rx, on_event);
    let (result, session) = tokio::join!(migrator.update(projects, profile, tx), consumer);

    result.map_err(|e| format!("转换失败: {}", e))?;
    Ok(session)
}
