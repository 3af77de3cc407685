//! # 项目文件写入守卫
//!
//! 统一项目构建配置文件的落盘流程，保证任何一步失败都留有可恢复的副本：
//!
//! 1. 读取整个文件并拆分为行
//! 2. 计算改写后的行序列（`project_file::retarget`）
//! 3. 请求宿主保存项目，先把编辑器中未落盘的内容写回磁盘
//! 4. 清除只读属性
//! 5. 删除已存在的备份文件 `<path>bak`
//! 6. 将原文件重命名为备份文件（同一卷上为原子操作）
//! 7. 以新文件的形式写入改写后的内容，迫使外部文件监视器把它当作重新加载
//!
//! 第 7 步失败时把备份重命名回原路径，避免项目文件丢失。
//! 改写结果与原内容逐行一致时不触碰文件，也不产生备份。

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::project::HostProject;
use crate::services::host::{HostError, ProjectHost};
use crate::services::project_file;
use crate::utils::path;

/// 项目文件落盘错误
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("读取项目文件 {path} 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("清除只读属性失败 {path}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("创建备份 {backup} 失败: {source}")]
    Backup {
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("写入项目文件 {path} 失败（已从备份恢复: {restored}）: {source}")]
    Write {
        path: PathBuf,
        restored: bool,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Host(#[from] HostError),
}

/// 项目文件改写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetargetOutcome {
    /// 内容无需变化（不适用或已是 PCL）
    Unchanged,
    /// 已写入新内容，原文件保存在 `backup`
    Rewritten { backup: PathBuf },
}

/// 按落盘流程把项目文件改写为以 `profile_name` 为目标
pub fn retarget_project_file(
    host: &dyn ProjectHost,
    project: &HostProject,
    profile_name: &str,
) -> Result<RetargetOutcome, PersistError> {
    let file_path = project.file_path.as_path();

    let content = std::fs::read_to_string(file_path).map_err(|source| match source.kind() {
        // 项目文件在运行期间被移走，只跳过该项目
        io::ErrorKind::NotFound => PersistError::Host(HostError::Unavailable(format!(
            "{} ({})",
            project.name,
            file_path.display()
        ))),
        _ => PersistError::Read {
            path: file_path.to_path_buf(),
            source,
        },
    })?;
    let lines = project_file::split_lines(&content);
    let rewritten = project_file::retarget(lines.clone(), profile_name);

    if rewritten == lines {
        log::debug!("{}: 项目文件无需改写", project.name);
        return Ok(RetargetOutcome::Unchanged);
    }

    host.save_project(project)?;

    let backup = replace_with_backup(
        file_path,
        &project_file::serialize_lines(&rewritten),
        |path, content| std::fs::write(path, content),
    )?;

    log::info!(
        "{}: 项目文件已改写为 {}（备份: {}）",
        project.name,
        profile_name,
        backup.display()
    );
    Ok(RetargetOutcome::Rewritten { backup })
}

/// 执行第 4～7 步：清除只读、轮换备份、写入新文件，写入失败时回滚
///
/// `write` 负责把内容写入一个新文件，测试中可注入失败。
fn replace_with_backup<W>(file_path: &Path, content: &str, write: W) -> Result<PathBuf, PersistError>
where
    W: FnOnce(&Path, &str) -> io::Result<()>,
{
    clear_readonly(file_path).map_err(|source| PersistError::Permissions {
        path: file_path.to_path_buf(),
        source,
    })?;

    let backup = path::backup_path(file_path);
    let backup_err = |source| PersistError::Backup {
        backup: backup.clone(),
        source,
    };

    if backup.exists() {
        std::fs::remove_file(&backup).map_err(backup_err)?;
    }
    std::fs::rename(file_path, &backup).map_err(backup_err)?;

    if let Err(source) = write(file_path, content) {
        log::warn!("写入 {} 失败，正在从备份恢复: {}", file_path.display(), source);
        let _ = std::fs::remove_file(file_path);
        let restored = match std::fs::rename(&backup, file_path) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("从备份 {} 恢复失败: {}", backup.display(), e);
                false
            }
        };
        return Err(PersistError::Write {
            path: file_path.to_path_buf(),
            restored,
            source,
        });
    }

    Ok(backup)
}

#[cfg(unix)]
fn clear_readonly(file_path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(file_path)?.permissions();
    if permissions.readonly() {
        permissions.set_mode(permissions.mode() | 0o200);
        std::fs::set_permissions(file_path, permissions)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn clear_readonly(file_path: &Path) -> io::Result<()> {
    let mut permissions = std::fs::metadata(file_path)?.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        std::fs::set_permissions(file_path, permissions)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::project_file::{LINE_ENDING, PORTABLE_PROJECT_TYPES_LINE};
    use crate::services::resolver::ReferenceAssemblyResolver;
    use crate::services::workspace::FileSystemHost;

    const CLASSIC: &str = "<Project>\n  <PropertyGroup>\n    <TargetFrameworkVersion>v4.5</TargetFrameworkVersion>\n  </PropertyGroup>\n  <Import Project=\"$(MSBuildToolsPath)\\Microsoft.CSharp.targets\" />\n</Project>\n";

    #[test]
    fn test_replace_rotates_backup_and_writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Core.csproj");
        std::fs::write(&file, "old").unwrap();
        std::fs::write(path::backup_path(&file), "stale backup").unwrap();

        let backup = replace_with_backup(&file, "new", |p, c| std::fs::write(p, c)).unwrap();

        assert_eq!(backup, dir.path().join("Core.csprojbak"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "old");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "new");
    }

    #[test]
    fn test_failed_write_restores_original() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Core.csproj");
        std::fs::write(&file, "old").unwrap();

        let err = replace_with_backup(&file, "new", |p, _| {
            std::fs::write(p, "partial")?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, PersistError::Write { restored: true, .. }));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "old");
        assert!(!path::backup_path(&file).exists());
    }

    #[test]
    fn test_readonly_file_is_made_writable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Core.csproj");
        std::fs::write(&file, "old").unwrap();
        let mut permissions = std::fs::metadata(&file).unwrap().permissions();
        permissions.set_readonly(true);
        std::fs::set_permissions(&file, permissions).unwrap();

        replace_with_backup(&file, "new", |p, c| std::fs::write(p, c)).unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "new");
    }

    #[test]
    fn test_vanished_project_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let host = FileSystemHost::new(dir.path(), ReferenceAssemblyResolver::default());
        let project = HostProject {
            name: "Gone".to_string(),
            file_path: dir.path().join("Gone.csproj"),
        };

        let err = retarget_project_file(&host, &project, "Profile7").unwrap_err();
        assert!(matches!(err, PersistError::Host(HostError::Unavailable(_))));
    }

    #[test]
    fn test_split_then_serialize_rewrites_classic_project() {
        let lines = project_file::split_lines(CLASSIC);
        let rewritten = project_file::retarget(lines, "Profile259");
        let content = project_file::serialize_lines(&rewritten);

        assert!(content.contains(PORTABLE_PROJECT_TYPES_LINE));
        assert!(content.ends_with(&format!("</Project>{LINE_ENDING}")));
    }
}
