//! # 项目与引用数据模型
//!
//! 定义了宿主项目树节点（ProjectNode / HostProject）、每轮重新加载生成的
//! 候选项目记录（ProjectRecord）以及外部程序集引用描述（ReferenceDescriptor）。
//!
//! 这些结构体通过 `serde` 的 Serialize 特征支持 `list --json` 输出。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::framework::FrameworkDescriptor;

/// 宿主中的单个项目
///
/// `file_path` 为项目构建配置文件（`.csproj`）的绝对路径。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostProject {
    pub name: String,
    pub file_path: PathBuf,
}

/// 宿主项目树节点
///
/// 解决方案文件夹（Folder）可以嵌套，重新加载时会被递归展平。
#[derive(Debug, Clone)]
pub enum ProjectNode {
    Folder {
        name: String,
        children: Vec<ProjectNode>,
    },
    Project(HostProject),
}

/// 候选项目记录
///
/// 每轮重新加载（reload）时根据宿主项目树重新构建，不做持久化。
/// `current_framework` 为 `None` 表示框架属性尚不可读（如项目仍在加载中），
/// 此类记录会在过滤阶段被排除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_framework: Option<FrameworkDescriptor>,
    pub file_path: PathBuf,
    pub selected: bool,
}

impl ProjectRecord {
    pub fn from_host(project: &HostProject, framework: Option<FrameworkDescriptor>) -> Self {
        Self {
            name: project.name.clone(),
            current_framework: framework,
            file_path: project.file_path.clone(),
            selected: false,
        }
    }

    pub fn has_framework(&self) -> bool {
        self.current_framework.is_some()
    }

    /// 是否参与本轮迁移：已勾选且当前框架名称包含 "4.5"
    pub fn is_eligible(&self) -> bool {
        self.selected
            && self
                .current_framework
                .as_ref()
                .is_some_and(FrameworkDescriptor::is_v45)
    }

    pub fn host_project(&self) -> HostProject {
        HostProject {
            name: self.name.clone(),
            file_path: self.file_path.clone(),
        }
    }
}

/// 外部程序集引用描述
///
/// `include` 保存宿主中原始的引用标识文本，供 `remove_reference` 精确定位。
/// `has_source_project` 为 true 表示项目到项目的引用，永远不会被视为框架引用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDescriptor {
    pub include: String,
    pub name: String,
    pub major_version: u16,
    pub minor_version: u16,
    pub build_number: u16,
    pub revision_number: u16,
    pub culture: Option<String>,
    pub public_key_token: Option<String>,
    pub has_source_project: bool,
}
