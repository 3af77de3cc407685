//! # 框架目录服务
//!
//! 在进程启动时加载两份外部定义列表：
//! - `frameworks.json` — 经典 .NET 框架 `{id, name}`
//! - `portable-frameworks.json` — 可移植配置文件 `{name, description}`
//!
//! 任一文件缺失或格式错误都属于启动级致命错误：没有这些数据工具无法工作，
//! 因此不提供任何降级路径。加载完成后目录只读。

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::framework::{FrameworkDescriptor, PortableProfileDescriptor};
use crate::utils::path;

/// 经典框架定义文件名
pub const FRAMEWORKS_FILE: &str = "frameworks.json";

/// 可移植配置文件定义文件名
pub const PORTABLE_FRAMEWORKS_FILE: &str = "portable-frameworks.json";

/// 定义列表加载错误（启动级致命）
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("找不到定义文件: {0}")]
    Missing(PathBuf),

    #[error("读取定义文件 {path} 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("定义文件 {path} 格式错误: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 框架目录
#[derive(Debug, Clone)]
pub struct FrameworkCatalog {
    frameworks: Vec<FrameworkDescriptor>,
    portable_profiles: Vec<PortableProfileDescriptor>,
}

impl FrameworkCatalog {
    pub fn new(
        frameworks: Vec<FrameworkDescriptor>,
        portable_profiles: Vec<PortableProfileDescriptor>,
    ) -> Self {
        Self {
            frameworks,
            portable_profiles,
        }
    }

    /// 从指定目录加载两份定义列表
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let frameworks = read_definitions(&dir.join(FRAMEWORKS_FILE))?;
        let portable_profiles = read_definitions(&dir.join(PORTABLE_FRAMEWORKS_FILE))?;

        log::info!(
            "已加载 {} 个经典框架、{} 个可移植配置文件（{}）",
            frameworks.len(),
            portable_profiles.len(),
            dir.display()
        );

        Ok(Self::new(frameworks, portable_profiles))
    }

    /// 按优先级定位定义目录后加载
    ///
    /// 查找顺序：配置中显式指定的目录 → 可执行文件所在目录 → `./data`。
    /// 显式指定目录时不再回退。
    pub fn locate_and_load(configured: Option<&Path>) -> Result<Self, CatalogError> {
        if let Some(dir) = configured {
            return Self::load(dir);
        }

        let candidates = path::get_executable_dir()
            .into_iter()
            .chain(std::iter::once(PathBuf::from("data")));

        let mut last_missing = None;
        for dir in candidates {
            if dir.join(FRAMEWORKS_FILE).is_file() {
                return Self::load(&dir);
            }
            last_missing = Some(dir.join(FRAMEWORKS_FILE));
        }

        Err(CatalogError::Missing(
            last_missing.unwrap_or_else(|| PathBuf::from(FRAMEWORKS_FILE)),
        ))
    }

    pub fn frameworks(&self) -> &[FrameworkDescriptor] {
        &self.frameworks
    }

    pub fn portable_profiles(&self) -> &[PortableProfileDescriptor] {
        &self.portable_profiles
    }

    pub fn find_by_id(&self, id: u32) -> Option<&FrameworkDescriptor> {
        self.frameworks.iter().find(|f| f.id == id)
    }

    /// 按名称子串查找第一个匹配的经典框架
    pub fn find_by_name(&self, fragment: &str) -> Option<&FrameworkDescriptor> {
        self.frameworks.iter().find(|f| f.name.contains(fragment))
    }

    /// 按名称查找可移植配置文件（不区分大小写）
    pub fn find_profile(&self, name: &str) -> Option<&PortableProfileDescriptor> {
        self.portable_profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

fn read_definitions<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CatalogError> {
    if !path.is_file() {
        return Err(CatalogError::Missing(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| CatalogError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
