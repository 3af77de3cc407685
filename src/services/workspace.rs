//! # 文件系统项目宿主
//!
//! 不依赖 IDE 的 `ProjectHost` 实现：直接读写磁盘上的 `.csproj` 与源文件。
//!
//! ## 项目元数据来源
//! - 目标框架：`<TargetFrameworkVersion>`、`<TargetFrameworkIdentifier>`、`<TargetFrameworkProfile>`
//! - 文件条目：`<Compile|None|Content|EmbeddedResource Include="...">`
//! - 外部引用：`<Reference Include="...">`；`<ProjectReference Include="...">` 为项目引用
//!
//! 没有编辑器缓冲区，`save_project` 为空操作。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::assembly::{AssemblyIdentity, AssemblyVersion};
use crate::models::framework::FrameworkDescriptor;
use crate::models::project::{HostProject, ProjectNode, ReferenceDescriptor};
use crate::services::host::{
    AssemblyResolver, HostError, ProjectHost, ResolveError, ResolvedAssembly,
};
use crate::services::project_file;
use crate::services::resolver::ReferenceAssemblyResolver;
use crate::services::scanner;
use crate::utils::path;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<TargetFrameworkVersion>\s*v((\d+)\.(\d+)(?:\.\d+)?)\s*</TargetFrameworkVersion>")
        .unwrap()
});

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<TargetFrameworkIdentifier>\s*([^<\s]+)\s*</TargetFrameworkIdentifier>").unwrap()
});

static PROFILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<TargetFrameworkProfile>\s*([^<\s]+)\s*</TargetFrameworkProfile>").unwrap()
});

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?:Compile|None|Content|EmbeddedResource)\s+Include="([^"]+)""#).unwrap()
});

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<Reference\s+Include="([^"]+)""#).unwrap());

static PROJECT_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<ProjectReference\s+Include="([^"]+)""#).unwrap());

const PORTABLE_PROJECT_TYPE_GUID: &str = "{786C830F-07A1-408B-BD7F-6EE04809D6DB}";

/// 以目录为解决方案的文件系统宿主
#[derive(Debug, Clone)]
pub struct FileSystemHost {
    root: PathBuf,
    resolver: ReferenceAssemblyResolver,
}

impl FileSystemHost {
    pub fn new(root: impl Into<PathBuf>, resolver: ReferenceAssemblyResolver) -> Self {
        Self {
            root: root.into(),
            resolver,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_project(&self, project: &HostProject) -> Result<String, HostError> {
        std::fs::read_to_string(&project.file_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => HostError::Unavailable(format!(
                "{} ({})",
                project.name,
                project.file_path.display()
            )),
            _ => HostError::Io(e),
        })
    }

    fn project_dir(project: &HostProject) -> &Path {
        project.file_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

impl AssemblyResolver for FileSystemHost {
    fn resolve(&self, identity: &AssemblyIdentity) -> Result<ResolvedAssembly, ResolveError> {
        self.resolver.resolve(identity)
    }
}

impl ProjectHost for FileSystemHost {
    fn list_projects(&self) -> Result<Option<Vec<ProjectNode>>, HostError> {
        if !self.root.is_dir() {
            return Ok(None);
        }
        scanner::scan_project_tree(&self.root).map(Some)
    }

    fn current_framework(&self, project: &HostProject) -> Result<FrameworkDescriptor, HostError> {
        let content = self.read_project(project)?;
        parse_framework(&content).ok_or_else(|| {
            HostError::MetadataMismatch(format!("{} 缺少 TargetFrameworkVersion", project.name))
        })
    }

    fn save_project(&self, project: &HostProject) -> Result<(), HostError> {
        log::debug!("{}: 无编辑器缓冲区，跳过保存", project.name);
        Ok(())
    }

    fn list_file_items(&self, project: &HostProject) -> Result<Vec<PathBuf>, HostError> {
        let content = self.read_project(project)?;
        let base = Self::project_dir(project);
        Ok(ITEM_RE
            .captures_iter(&content)
            .map(|c| path::resolve_include(base, &c[1]))
            .collect())
    }

    fn read_text(&self, item: &Path) -> Result<String, HostError> {
        Ok(std::fs::read_to_string(item)?)
    }

    fn write_text(&self, item: &Path, content: &str) -> Result<(), HostError> {
        Ok(std::fs::write(item, content)?)
    }

    fn list_references(&self, project: &HostProject) -> Result<Vec<ReferenceDescriptor>, HostError> {
        let content = self.read_project(project)?;
        Ok(parse_references(&content))
    }

    fn remove_reference(
        &self,
        project: &HostProject,
        reference: &ReferenceDescriptor,
    ) -> Result<(), HostError> {
        if reference.has_source_project {
            return Err(HostError::NotFound(format!(
                "{} 是项目引用",
                reference.include
            )));
        }

        let content = self.read_project(project)?;
        let mut lines = project_file::split_lines(&content);
        if !remove_reference_element(&mut lines, &reference.include) {
            return Err(HostError::NotFound(reference.include.clone()));
        }

        std::fs::write(&project.file_path, project_file::serialize_lines(&lines))?;
        Ok(())
    }
}

/// 从项目文件内容解析目标框架
fn parse_framework(content: &str) -> Option<FrameworkDescriptor> {
    let version = VERSION_RE.captures(content)?;
    let major: u32 = version[2].parse().ok()?;
    let minor: u32 = version[3].parse().ok()?;

    let identifier = IDENTIFIER_RE
        .captures(content)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| {
            if content.contains(PORTABLE_PROJECT_TYPE_GUID) {
                ".NETPortable".to_string()
            } else {
                ".NETFramework".to_string()
            }
        });

    let mut name = format!("{},Version=v{}", identifier, &version[1]);
    if let Some(profile) = PROFILE_RE.captures(content) {
        name.push_str(",Profile=");
        name.push_str(&profile[1]);
    }

    Some(FrameworkDescriptor {
        id: (major << 16) | minor,
        name,
    })
}

fn parse_references(content: &str) -> Vec<ReferenceDescriptor> {
    let mut references = Vec::new();

    for capture in REFERENCE_RE.captures_iter(content) {
        let include = &capture[1];
        let Some(identity) = AssemblyIdentity::parse(include) else {
            log::debug!("无法解析引用标识: {}", include);
            continue;
        };
        references.push(descriptor(include, identity, false));
    }

    for capture in PROJECT_REFERENCE_RE.captures_iter(content) {
        let include = &capture[1];
        let name = Path::new(&include.replace('\\', "/"))
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| include.to_string());
        let identity = AssemblyIdentity {
            name,
            version: AssemblyVersion::default(),
            culture: None,
            public_key_token: None,
        };
        references.push(descriptor(include, identity, true));
    }

    references
}

fn descriptor(include: &str, identity: AssemblyIdentity, has_source_project: bool) -> ReferenceDescriptor {
    ReferenceDescriptor {
        include: include.to_string(),
        name: identity.name,
        major_version: identity.version.major,
        minor_version: identity.version.minor,
        build_number: identity.version.build,
        revision_number: identity.version.revision,
        culture: identity.culture,
        public_key_token: identity.public_key_token,
        has_source_project,
    }
}

/// 删除 `<Reference Include="{include}" ...>` 元素（自闭合行，或起始行到 `</Reference>`）
///
/// 起始行与 `REFERENCE_RE` 的匹配规则一致，`Reference` 与 `Include` 之间允许任意空白。
fn remove_reference_element(lines: &mut Vec<String>, include: &str) -> bool {
    let Some(start) = lines.iter().position(|l| {
        REFERENCE_RE
            .captures_iter(l)
            .any(|c| &c[1] == include)
    }) else {
        return false;
    };

    if lines[start].trim_end().ends_with("/>") {
        lines.remove(start);
        return true;
    }

    match lines[start..].iter().position(|l| l.contains("</Reference>")) {
        Some(offset) => {
            lines.drain(start..=start + offset);
            true
        }
        None => false,
    }
}
