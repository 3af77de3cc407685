//! # 配置与目录查询命令
//!
//! - `read_config` - 读取 `~/.pcl-converter/config.json`
//! - `list_profiles` - 列出可移植配置文件
//! - `list_frameworks` - 列出经典框架，可按名称片段筛选

use crate::models::framework::{FrameworkDescriptor, PortableProfileDescriptor};
use crate::models::settings::AppConfig;
use crate::services::catalog::FrameworkCatalog;
use crate::utils::path;

/// 配置文件名
pub const CONFIG_FILE: &str = "config.json";

/// 读取应用配置
///
/// 文件不存在时返回默认配置；文件损坏时记录警告并回退到默认配置，
/// 不阻止工具启动。
///
/// # 错误
/// 无法确定用户主目录或文件存在但不可读时返回错误信息
pub async fn read_config() -> Result<AppConfig, String> {
    let config_path = path::get_config_dir()?.join(CONFIG_FILE);

    if !config_path.exists() {
        log::debug!("配置文件 {} 不存在，使用默认配置", config_path.display());
        return Ok(AppConfig::default());
    }

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|e| format!("读取配置文件失败: {}", e))?;

    match serde_json::from_str(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            log::warn!("解析配置文件 {} 失败，使用默认配置: {}", config_path.display(), e);
            Ok(AppConfig::default())
        }
    }
}

pub fn list_profiles(catalog: &FrameworkCatalog) -> Vec<PortableProfileDescriptor> {
    catalog.portable_profiles().to_vec()
}

/// 列出经典框架；给定 `filter` 时只返回名称包含该片段的第一个框架
pub fn list_frameworks(
    catalog: &FrameworkCatalog,
    filter: Option<&str>,
) -> Result<Vec<FrameworkDescriptor>, String> {
    match filter {
        None => Ok(catalog.frameworks().to_vec()),
        Some(fragment) => catalog
            .find_by_name(fragment)
            .cloned()
            .map(|f| vec![f])
            .ok_or_else(|| format!("没有名称包含 \"{}\" 的框架", fragment)),
    }
}
