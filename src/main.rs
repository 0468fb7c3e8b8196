// pedit - A lightweight piece-table text editor
//
// Copyright (c) 2025 pedit team
//
// Licensed under MIT License

use std::path::Path;

use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use pedit::PieceTable;

fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
        )
        .init();

    info!("pedit v0.1.0 starting...");

    // 从命令行加载文件（无参数则创建空文档）
    let table = match std::env::args().nth(1) {
        Some(path) => PieceTable::from_file(Path::new(&path))?,
        None => PieceTable::new(),
    };

    info!("文档已就绪: {} 字节, {} 个piece", table.total_bytes(), table.piece_count());

    // TODO: 运行交互式编辑循环

    Ok(())
}
