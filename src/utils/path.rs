//! # 路径工具函数
//!
//! 提供与文件路径相关的工具函数，包括：
//! - 获取 PCL Converter 配置目录路径（`~/.pcl-converter/`）
//! - 获取当前可执行文件所在目录（定义列表的默认位置）
//! - 计算项目文件的备份路径（`<path>bak`）
//! - 将项目文件中的 Windows 风格相对路径转换为当前平台路径

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// 获取 PCL Converter 配置目录的绝对路径
///
/// 使用 `dirs` crate 获取跨平台的主目录路径。
///
/// # 错误
/// 如果无法确定用户主目录（如无 HOME 环境变量），返回错误信息。
pub fn get_config_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or_else(|| "无法获取用户主目录".to_string())?;
    Ok(home.join(".pcl-converter"))
}

/// 获取当前可执行文件所在目录
///
/// 定义列表默认与可执行文件放在一起。
pub fn get_executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// 计算项目文件的备份路径
///
/// 备份文件名直接在原路径后追加 `bak`（不加点号），
/// 例如 `Core.csproj` → `Core.csprojbak`。
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push("bak");
    PathBuf::from(name)
}

/// 将项目文件中的相对路径（使用 `\` 分隔）解析为当前平台下的绝对路径
///
/// # 参数
/// - `base_dir` - 项目文件所在目录
/// - `include` - 项目条目的 `Include` 属性值（如 `Properties\AssemblyInfo.cs`）
pub fn resolve_include(base_dir: &Path, include: &str) -> PathBuf {
    let separator = std::path::MAIN_SEPARATOR.to_string();
    let relative = include.replace('\\', &separator);
    base_dir.join(relative)
}
