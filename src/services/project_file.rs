//! # 项目文件改写状态机
//!
//! 检查项目构建配置文件（`.csproj`）的文本行，并将其改写为以指定可移植
//! 配置文件为目标。只识别下列标记子串，其余内容逐行原样保留，不做语法解析：
//!
//! | 状态 | 条件 | 结果 |
//! |------|------|------|
//! | 不适用 | 没有 `<TargetFrameworkVersion>v4.5</TargetFrameworkVersion>` 行 | 原样返回 |
//! | 已是 PCL | 存在可移植导入行或可移植项目类型 GUID 对 | 原样返回 |
//! | 需要转换 | 以上都不满足 | 执行下述编辑 |
//!
//! ## 转换编辑
//! 1. 第一条 `$(MSBuildToolsPath)` 导入行替换为可移植导入行
//! 2. 第一条 `$(MSBuildBinPath)` 导入行同样替换（两者可以同时发生）
//! 3. 删除 `<TargetFrameworkProfile />` 行并在原位置插入；
//!    不存在时在 v4.5 标记行的位置插入
//! 4. 插入后配置文件声明行紧接在项目类型 GUID 行之前
//!
//! 行只会被"删除再在同一位置插入"，不会原地修改。
//! 标记都不出现的文件会被静默跳过。

use memchr::memmem;

/// v4.5 经典项目标记（唯一可转换的起点）
pub const TARGET_V45_MARKER: &str = "<TargetFrameworkVersion>v4.5</TargetFrameworkVersion>";

const TOOLS_PATH_IMPORT_MARKER: &str = r#"Import Project="$(MSBuildToolsPath)"#;
const BIN_PATH_IMPORT_MARKER: &str = r#"Import Project="$(MSBuildBinPath)"#;
const PORTABLE_IMPORT_MARKER: &str = r#"Import Project="$(MSBuildExtensionsPath32)\Microsoft\Portable\$(TargetFrameworkVersion)\Microsoft.Portable.CSharp.targets""#;
const PORTABLE_GUIDS_MARKER: &str =
    "{786C830F-07A1-408B-BD7F-6EE04809D6DB};{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";
const EMPTY_PROFILE_MARKER: &str = "<TargetFrameworkProfile />";

/// 可移植导入行（不含缩进）
pub const PORTABLE_IMPORT_LINE: &str = r#"<Import Project="$(MSBuildExtensionsPath32)\Microsoft\Portable\$(TargetFrameworkVersion)\Microsoft.Portable.CSharp.targets" />"#;

/// 可移植项目类型 GUID 行（不含缩进）
pub const PORTABLE_PROJECT_TYPES_LINE: &str = "<ProjectTypeGuids>{786C830F-07A1-408B-BD7F-6EE04809D6DB};{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}</ProjectTypeGuids>";

/// 一个制表位的缩进
const INDENT: &str = "    ";

/// 平台换行符
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// 项目文件所处的状态（由守卫条件推导，不做存储）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFileState {
    NotApplicable,
    AlreadyPortable,
    /// 携带 v4.5 标记行所在的下标
    NeedsConversion { v45_index: usize },
}

fn contains_marker(line: &str, marker: &str) -> bool {
    memmem::find(line.as_bytes(), marker.as_bytes()).is_some()
}

fn find_marker(lines: &[String], marker: &str) -> Option<usize> {
    let finder = memmem::Finder::new(marker.as_bytes());
    lines
        .iter()
        .position(|line| finder.find(line.as_bytes()).is_some())
}

/// 推导项目文件状态
pub fn inspect(lines: &[String]) -> ProjectFileState {
    let Some(v45_index) = find_marker(lines, TARGET_V45_MARKER) else {
        return ProjectFileState::NotApplicable;
    };

    let is_portable = lines.iter().any(|line| {
        contains_marker(line, PORTABLE_IMPORT_MARKER) || contains_marker(line, PORTABLE_GUIDS_MARKER)
    });

    if is_portable {
        ProjectFileState::AlreadyPortable
    } else {
        ProjectFileState::NeedsConversion { v45_index }
    }
}

/// 将项目文件行改写为以 `profile_name` 为目标的可移植类库
///
/// 对已转换的内容再次调用是空操作。
pub fn retarget(mut lines: Vec<String>, profile_name: &str) -> Vec<String> {
    let ProjectFileState::NeedsConversion { v45_index } = inspect(&lines) else {
        return lines;
    };

    let portable_import = format!("{INDENT}{PORTABLE_IMPORT_LINE}");
    replace_first_line(&mut lines, TOOLS_PATH_IMPORT_MARKER, &portable_import);
    replace_first_line(&mut lines, BIN_PATH_IMPORT_MARKER, &portable_import);

    let insert_at = match find_marker(&lines, EMPTY_PROFILE_MARKER) {
        Some(index) => {
            lines.remove(index);
            index
        }
        None => v45_index,
    };

    lines.insert(insert_at, format!("{INDENT}{PORTABLE_PROJECT_TYPES_LINE}"));
    lines.insert(
        insert_at,
        format!("{INDENT}<TargetFrameworkProfile>{profile_name}</TargetFrameworkProfile>"),
    );

    lines
}

/// 替换第一条包含 `marker` 的行
///
/// 第 0 行永远不替换：标记出现在首行说明文档格式异常。
fn replace_first_line(lines: &mut Vec<String>, marker: &str, replacement: &str) {
    if let Some(index) = find_marker(lines, marker).filter(|&i| i >= 1) {
        lines.remove(index);
        lines.insert(index, replacement.to_string());
    }
}

/// 将文件内容拆分为行（兼容 `\n` 与 `\r\n`）
pub fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_string).collect()
}

/// 用平台换行符连接各行，最后一行之后同样带换行符
pub fn serialize_lines(lines: &[String]) -> String {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 2).sum());
    for line in lines {
        content.push_str(line);
        content.push_str(LINE_ENDING);
    }
    content
}
