//! # 项目树扫描服务
//!
//! 在根目录下递归查找 `*.csproj` 文件，构建与 IDE 解决方案相似的项目树：
//! - 直接包含项目文件的目录，其项目平铺到上一级
//! - 不含项目文件、但下层有项目的目录视为解决方案文件夹
//! - 跳过 `bin`、`obj`、`packages`、`node_modules` 和隐藏目录
//!
//! 遍历基于 `walkdir`，同一目录下的条目按名称排序，保证扫描结果稳定。

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::models::project::{HostProject, ProjectNode};
use crate::services::host::HostError;

/// 项目文件扩展名
pub const PROJECT_EXTENSION: &str = "csproj";

const SKIPPED_DIRS: &[&str] = &["bin", "obj", "packages", "node_modules"];

/// 扫描 `root` 下的项目树
///
/// 根目录本身不可读时返回错误；下层目录读取失败只记录警告。
pub fn scan_project_tree(root: &Path) -> Result<Vec<ProjectNode>, HostError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(HostError::Io(e.into())),
            Err(e) => {
                log::warn!("扫描目录失败: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_project_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    let project_dirs: HashSet<&Path> = files.iter().filter_map(|f| f.parent()).collect();
    Ok(fold_tree(root, &files, &project_dirs))
}

/// 把 `dir` 下的项目文件折叠为节点：先是直接位于 `dir` 的项目，再按名称排列子目录
fn fold_tree(dir: &Path, files: &[PathBuf], project_dirs: &HashSet<&Path>) -> Vec<ProjectNode> {
    let mut nodes: Vec<ProjectNode> = files
        .iter()
        .filter(|f| f.parent() == Some(dir))
        .map(|f| ProjectNode::Project(host_project(f.clone())))
        .collect();

    let mut child_dirs: Vec<PathBuf> = Vec::new();
    for child in files.iter().filter_map(|f| child_dir(dir, f)) {
        if child_dirs.last() != Some(&child) {
            child_dirs.push(child);
        }
    }

    for child in child_dirs {
        let children = fold_tree(&child, files, project_dirs);
        if project_dirs.contains(child.as_path()) {
            nodes.extend(children);
        } else {
            let name = child
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            nodes.push(ProjectNode::Folder { name, children });
        }
    }

    nodes
}

/// `file` 位于 `dir` 的某个子目录之下时，返回该直接子目录
fn child_dir(dir: &Path, file: &Path) -> Option<PathBuf> {
    let mut components = file.strip_prefix(dir).ok()?.components();
    let first = components.next()?;
    components.next()?;
    match first {
        Component::Normal(name) => Some(dir.join(name)),
        _ => None,
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.to_lowercase().as_str())
}

fn is_project_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION))
}

fn host_project(file_path: PathBuf) -> HostProject {
    let name = file_path
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    HostProject { name, file_path }
}
