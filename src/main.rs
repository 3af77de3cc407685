//! # PCL Converter - 命令行入口点
//!
//! `main.rs` 仅负责启动，核心逻辑位于 `lib.rs` 中。

use std::process::ExitCode;

fn main() -> ExitCode {
    pcl_lib::run()
}
