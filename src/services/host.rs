//! # 项目宿主接口
//!
//! 迁移引擎只依赖这里定义的窄接口，不直接接触 IDE 的自动化对象模型。
//! 宿主负责：
//! - 枚举项目树（含解决方案文件夹）
//! - 读取项目的当前目标框架
//! - 保存项目（把编辑器中未落盘的修改写回磁盘）
//! - 枚举项目条目、读写文本条目
//! - 枚举与移除外部引用
//! - 解析程序集标识（`AssemblyResolver`）
//!
//! 内置实现见 `services::workspace`（基于文件系统）；
//! 测试中使用内存中的替身实现。

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::assembly::AssemblyIdentity;
use crate::models::framework::FrameworkDescriptor;
use crate::models::project::{HostProject, ProjectNode, ReferenceDescriptor};

/// 宿主调用错误
#[derive(Error, Debug)]
pub enum HostError {
    /// 项目暂时不可用：按项目跳过，批处理继续
    #[error("项目暂时不可用: {0}")]
    Unavailable(String),

    /// 项目框架属性缺失或类型不符（通常是项目仍在加载中）
    #[error("项目元数据不匹配: {0}")]
    MetadataMismatch(String),

    /// 要操作的条目不存在
    #[error("未找到: {0}")]
    NotFound(String),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 程序集解析错误
#[derive(Error, Debug)]
pub enum ResolveError {
    /// 程序集不存在（第三方或不可用的程序集）
    #[error("未找到程序集: {0}")]
    NotFound(String),

    #[error("解析程序集失败: {0}")]
    Failed(String),
}

/// 解析成功的程序集及其产品元数据（AssemblyProduct 特性）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssembly {
    pub name: String,
    pub product: Option<String>,
}

/// 宿主的程序集解析能力
pub trait AssemblyResolver {
    fn resolve(&self, identity: &AssemblyIdentity) -> Result<ResolvedAssembly, ResolveError>;
}

/// 项目宿主（外部协作方）
///
/// 所有方法都是阻塞调用，由迁移编排器在后台工作线程上执行。
pub trait ProjectHost: AssemblyResolver + Send + Sync {
    /// 枚举项目树；宿主没有打开任何解决方案时返回 `None`
    fn list_projects(&self) -> Result<Option<Vec<ProjectNode>>, HostError>;

    fn current_framework(&self, project: &HostProject) -> Result<FrameworkDescriptor, HostError>;

    fn save_project(&self, project: &HostProject) -> Result<(), HostError>;

    /// 递归枚举项目下的所有文件条目
    fn list_file_items(&self, project: &HostProject) -> Result<Vec<PathBuf>, HostError>;

    fn read_text(&self, item: &Path) -> Result<String, HostError>;

    fn write_text(&self, item: &Path, content: &str) -> Result<(), HostError>;

    fn list_references(&self, project: &HostProject) -> Result<Vec<ReferenceDescriptor>, HostError>;

    fn remove_reference(
        &self,
        project: &HostProject,
        reference: &ReferenceDescriptor,
    ) -> Result<(), HostError>;
}

/// 展平项目树：递归展开解决方案文件夹，保持原有顺序
pub fn flatten_projects(nodes: Vec<ProjectNode>) -> Vec<HostProject> {
    let mut projects = Vec::new();
    for node in nodes {
        match node {
            ProjectNode::Folder { children, .. } => projects.extend(flatten_projects(children)),
            ProjectNode::Project(project) => projects.push(project),
        }
    }
    projects
}
