//! # 程序集元数据改写
//!
//! 从 AssemblyInfo 文本中移除与可移植目标不兼容的程序集特性：
//! - `[assembly: ComVisible(false)]`
//! - `[assembly: Guid("...")]`（从标记起到下一个 `)]` 为止，含结尾）
//!
//! 纯文本操作，不理解编译单元的结构。调用方只在 `changed` 为 true 时落盘，
//! 避免无意义的文件修改和版本控制噪音。

use std::io::ErrorKind;

use crate::models::project::HostProject;
use crate::services::host::{HostError, ProjectHost};

const COM_VISIBLE_MARKER: &str = "[assembly: ComVisible(false)]";
const GUID_MARKER: &str = "[assembly: Guid(";
const GUID_END: &str = ")]";

/// 程序集元数据文本单元的路径特征
pub const ASSEMBLY_INFO_FILE: &str = "AssemblyInfo.cs";

/// 改写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRewrite {
    pub text: String,
    pub changed: bool,
}

/// 移除不兼容的程序集特性
///
/// 重复应用直到文本不再变化，使得对输出再次改写一定是空操作。
/// `Guid` 标记之后找不到结尾 `)]` 时保留原样。
pub fn rewrite_assembly_metadata(text: &str) -> MetadataRewrite {
    let mut current = text.to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }

    MetadataRewrite {
        changed: current != text,
        text: current,
    }
}

fn strip_once(text: &str) -> String {
    let mut content = text.replace(COM_VISIBLE_MARKER, "");

    if let Some(start) = content.find(GUID_MARKER) {
        if let Some(offset) = content[start..].find(GUID_END) {
            let end = start + offset + GUID_END.len();
            content.replace_range(start..end, "");
        }
    }

    content
}

/// 改写项目中所有 AssemblyInfo 文本单元，返回实际修改的文件数
///
/// 无法按 UTF-8 解码的文本单元记录警告后跳过，不影响项目的其余步骤。
pub fn strip_assembly_metadata(
    host: &dyn ProjectHost,
    project: &HostProject,
) -> Result<usize, HostError> {
    let items = host.list_file_items(project)?;

    let mut changed_files = 0;
    for item in items
        .iter()
        .filter(|p| p.to_string_lossy().contains(ASSEMBLY_INFO_FILE))
    {
        let original = match host.read_text(item) {
            Ok(text) => text,
            // 非 UTF-8 编码（例如含 © 的 Windows-1252 文件）
            Err(HostError::Io(e)) if e.kind() == ErrorKind::InvalidData => {
                log::warn!("{}: 无法解码 {}，已跳过: {}", project.name, item.display(), e);
                continue;
            }
            Err(e) => return Err(e),
        };
        let rewrite = rewrite_assembly_metadata(&original);
        if rewrite.changed {
            host.write_text(item, &rewrite.text)?;
            log::debug!("{}: 已改写 {}", project.name, item.display());
            changed_files += 1;
        }
    }

    Ok(changed_files)
}
