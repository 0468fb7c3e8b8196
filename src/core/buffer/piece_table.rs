// Piece Table 核心实现
//
// 职责：维护 piece 逻辑序列表示的文档内容，
//       一切改动都通过 span 交换完成，因此天然可撤销重做

use std::fs::{File, OpenOptions};
use std::ops::Range;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::{debug, info};

use crate::core::buffer::{
    chunk_iter::PieceChunks,
    error::BufferError,
    history::{Action, Change},
    insert_buffer::InsertBuffers,
    mmap::OriginalBuffer,
    piece::{Location, PieceId, PieceSource, Pieces, BEGIN, END},
    span::Span,
};

/// Piece Table 文档缓冲区
///
/// 文档内容是 begin 哨兵到 end 哨兵之间所有 piece 的字节拼接。
/// piece 引用的数据要么在原始映射区域，要么在插入缓冲区，两者都只增不改。
#[derive(Debug)]
pub struct PieceTable {
    // --- 后备存储 ---
    original: OriginalBuffer, // 加载时映射的原始内容
    buffers: InsertBuffers,   // 所有插入数据

    // --- Piece 链管理 ---
    pieces: Pieces, // piece arena（含两个哨兵）

    // --- 编辑历史 ---
    undo: Vec<Action>,
    redo: Vec<Action>,
    action_open: bool,         // undo 栈顶 Action 是否仍接收新 Change
    next_action_id: u64,       // Action 编号分配器
    saved_action: Option<u64>, // 最近一次成功保存时 undo 栈顶的 Action 编号

    // --- 状态 ---
    size: usize,             // 当前文档字节数
    path: Option<PathBuf>,   // 加载来源
}

// ========== 构造方法 ==========

impl PieceTable {
    /// 创建空文档
    pub fn new() -> Self {
        Self {
            original: OriginalBuffer::empty(),
            buffers: InsertBuffers::new(),
            pieces: Pieces::new(),
            undo: Vec::new(),
            redo: Vec::new(),
            action_open: false,
            next_action_id: 1,
            saved_action: None,
            size: 0,
            path: None,
        }
    }

    /// 从文件加载（整体只读映射）
    ///
    /// 非常规文件直接拒绝；0字节文件不建立映射，得到空文档
    pub fn from_file(path: &Path) -> Result<Self, BufferError> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;

        if !metadata.is_file() {
            return Err(BufferError::NotRegular(path.to_path_buf()));
        }

        let size = metadata.len() as usize;
        let mut table = Self::new();
        table.path = Some(path.to_path_buf());

        if size > 0 {
            table.original = OriginalBuffer::map(&file, size)?;

            // 初始状态：单个 piece 覆盖整个原始区域
            let id = table
                .pieces
                .alloc(PieceSource::Original, 0, size, Some(BEGIN), Some(END));
            table.pieces[BEGIN].next = Some(id);
            table.pieces[END].prev = Some(id);
            table.size = size;
        }

        info!("已加载文件: {} ({} 字节)", path.display(), size);
        Ok(table)
    }
}

// ========== 基本查询 ==========

impl PieceTable {
    /// 当前文档字节数
    pub fn total_bytes(&self) -> usize {
        self.size
    }

    /// 是否为空文档
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// 逻辑序列中的 piece 数量（不含哨兵）
    pub fn piece_count(&self) -> usize {
        let mut count = 0;
        let mut cur = self.pieces[BEGIN].next;

        while let Some(id) = cur {
            if id == END {
                break;
            }
            count += 1;
            cur = self.pieces[id].next;
        }

        count
    }

    /// 加载来源路径
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 自上次成功保存以来是否有改动
    ///
    /// 按 Action 身份比较而非内容比较：
    /// 编辑后恰好恢复原字节的文档仍然视为已改动
    pub fn modified(&self) -> bool {
        self.undo.last().map(|a| a.id) != self.saved_action
    }
}

// ========== 编辑操作 ==========

impl PieceTable {
    /// 在 pos 处插入字节，pos 取值范围 [0, size]
    pub fn insert(&mut self, pos: usize, bytes: &[u8]) -> Result<(), BufferError> {
        if bytes.is_empty() {
            return Ok(());
        }
        if pos > self.size {
            return Err(BufferError::OutOfBounds {
                pos,
                len: bytes.len(),
                size: self.size,
            });
        }

        let (buffer, start) = self.buffers.store(bytes);
        let len = bytes.len();

        let loc = self.locate(pos);
        let piece = self.pieces[loc.piece].clone();

        let (old, new) = if loc.off == piece.len {
            // 在两个 piece 之间插入（覆盖空文档与文档末尾的情况）
            let id = self.pieces.alloc(
                PieceSource::Add { buffer },
                start,
                len,
                Some(loc.piece),
                piece.next,
            );

            (Span::empty(), Span::new(&self.pieces, id, id))
        } else {
            // 在 piece 中间插入：拆分为 before / middle / after 三段
            let before = self
                .pieces
                .alloc(piece.source, piece.start, loc.off, piece.prev, None);
            let middle =
                self.pieces
                    .alloc(PieceSource::Add { buffer }, start, len, Some(before), None);
            let after = self.pieces.alloc(
                piece.source,
                piece.start + loc.off,
                piece.len - loc.off,
                Some(middle),
                piece.next,
            );
            self.pieces[before].next = Some(middle);
            self.pieces[middle].next = Some(after);

            (
                Span::new(&self.pieces, loc.piece, loc.piece),
                Span::new(&self.pieces, before, after),
            )
        };

        self.record_change(old, new);
        self.swap_spans(&old, &new);
        Ok(())
    }

    /// 从 pos 起删除 len 个字节
    ///
    /// len 为 0 时直接成功且不记录 Change；越过文档末尾则拒绝。
    /// 被摘除的 piece 保留在 arena 中，撤销时原样接回
    pub fn delete(&mut self, pos: usize, len: usize) -> Result<(), BufferError> {
        if len == 0 {
            return Ok(());
        }
        if pos.checked_add(len).map_or(true, |end| end > self.size) {
            return Err(BufferError::OutOfBounds {
                pos,
                len,
                size: self.size,
            });
        }

        let loc = self.locate(pos);
        let start_piece = self.pieces[loc.piece].clone();
        let midway_start = loc.off < start_piece.len;

        // cur：已落入删除范围的字节数；delete_start：第一个被摘除的 piece
        let (mut cur, delete_start) = if midway_start {
            (start_piece.len - loc.off, loc.piece)
        } else {
            // 从 piece 边界开始删除，定位到的 piece 自身保留
            (0, start_piece.next.unwrap())
        };

        // 向后收集落入删除范围的 piece
        let mut walk = loc.piece;
        while cur < len {
            walk = self.pieces[walk].next.unwrap();
            cur += self.pieces[walk].len;
        }
        let delete_end = walk;

        // 删除在 piece 中途结束时补出尾部碎片
        let (after, midway_end) = if cur == len {
            (self.pieces[delete_end].next.unwrap(), false)
        } else {
            let tail = cur - len;
            let end_piece = self.pieces[delete_end].clone();
            let id = self.pieces.alloc(
                end_piece.source,
                end_piece.start + end_piece.len - tail,
                tail,
                None, // prev 在 before 确定后回填
                end_piece.next,
            );
            (id, true)
        };

        // 删除在 piece 中途开始时补出头部碎片
        let before = if midway_start {
            Some(self.pieces.alloc(
                start_piece.source,
                start_piece.start,
                loc.off,
                start_piece.prev,
                Some(after),
            ))
        } else {
            None
        };

        if midway_end {
            // 尾部碎片的前驱：头部碎片，或边界开始时保留的原 piece
            self.pieces[after].prev = Some(before.unwrap_or(loc.piece));
        }

        let old = Span::new(&self.pieces, delete_start, delete_end);
        let new = match (before, midway_end) {
            (Some(b), true) => Span::new(&self.pieces, b, after),
            (Some(b), false) => Span::new(&self.pieces, b, b),
            (None, true) => Span::new(&self.pieces, after, after),
            (None, false) => Span::empty(),
        };

        self.record_change(old, new);
        self.swap_spans(&old, &new);
        Ok(())
    }

    /// 用 bytes 覆盖 pos 起等长的区段
    ///
    /// 等价于 delete + insert，两个 Change 记入同一个 Action，
    /// 一次撤销即可整体回退
    pub fn replace(&mut self, pos: usize, bytes: &[u8]) -> Result<(), BufferError> {
        if bytes.is_empty() {
            return Ok(());
        }

        self.delete(pos, bytes.len())?;
        self.insert(pos, bytes)
    }
}

// ========== 撤销重做 ==========

impl PieceTable {
    /// 撤销最近一个 Action，无可撤销时返回 false
    ///
    /// Change 按记录顺序的倒序回放：重叠的编辑必须后发生的先撤销
    pub fn undo(&mut self) -> bool {
        let action = match self.undo.pop() {
            Some(a) => a,
            None => return false,
        };

        for change in action.changes.iter().rev() {
            self.swap_spans(&change.new, &change.old);
        }

        self.redo.push(action);
        self.action_open = false;
        true
    }

    /// 重做最近撤销的 Action，无可重做时返回 false
    pub fn redo(&mut self) -> bool {
        let action = match self.redo.pop() {
            Some(a) => a,
            None => return false,
        };

        for change in action.changes.iter() {
            self.swap_spans(&change.old, &change.new);
        }

        self.undo.push(action);
        self.action_open = false;
        true
    }

    /// 设置 Action 边界：关闭当前 Action，下一次编辑开启新的
    ///
    /// 外部调用方用它把连续编辑归组为用户可见的撤销单位，不复制任何数据
    pub fn snapshot(&mut self) {
        self.action_open = false;
    }

    /// 把一个 Change 记入当前 Action，必要时开启新 Action
    fn record_change(&mut self, old: Span, new: Span) {
        if !self.action_open {
            // 即将产生新的编辑路径，整个 redo 栈作废
            self.truncate_redo();

            let action = Action::new(self.next_action_id);
            self.next_action_id += 1;
            self.undo.push(action);
            self.action_open = true;
        }

        // unwrap 安全：action_open 为真时 undo 栈顶必定存在
        self.undo
            .last_mut()
            .unwrap()
            .changes
            .push(Change { old, new });
    }

    /// 丢弃整个 redo 栈
    ///
    /// 只释放每个 Change 换入侧（new）的 piece：
    /// 换出侧仍被更早的历史引用
    fn truncate_redo(&mut self) {
        for action in self.redo.drain(..) {
            for change in &action.changes {
                let ids = change.new.piece_ids(&self.pieces);
                for id in ids {
                    self.pieces.free(id);
                }
            }
        }
    }
}

// ========== 定位与交换 ==========

impl PieceTable {
    /// 定位字节位置所在的 piece
    ///
    /// 从 begin 哨兵开始线性扫描，返回第一个满足
    /// cur <= pos <= cur + len 的 piece；内部边界因此归属前一个
    /// piece（off == len），pos == size 时返回最后一个数据 piece。
    /// 调用方保证 pos <= size
    fn locate(&self, pos: usize) -> Location {
        let mut cur = 0;
        let mut id = BEGIN;

        loop {
            let piece = &self.pieces[id];
            if pos <= cur + piece.len {
                return Location {
                    piece: id,
                    off: pos - cur,
                };
            }
            cur += piece.len;

            match piece.next {
                Some(next) => id = next,
                None => unreachable!("定位越过 piece 链尾"),
            }
        }
    }

    /// 范围检查版定位，供迭代器使用
    pub(crate) fn locate_checked(&self, pos: usize) -> Option<Location> {
        if pos > self.size {
            return None;
        }
        Some(self.locate(pos))
    }

    /// 交换原语：原子地用 new span 顶替逻辑序列中的 old span
    ///
    /// 被摘除 piece 自身的链接保持原样，这是撤销可行的前提；
    /// 接入空 old 时由调用方预先设置好 new 两端的外链
    fn swap_spans(&mut self, old: &Span, new: &Span) {
        if old.is_empty() && new.is_empty() {
            return;
        } else if old.is_empty() {
            // 接入新 span
            let (start, end) = (new.start.unwrap(), new.end.unwrap());
            let prev = self.pieces[start].prev.unwrap();
            let next = self.pieces[end].next.unwrap();
            self.pieces[prev].next = Some(start);
            self.pieces[next].prev = Some(end);
        } else if new.is_empty() {
            // 摘除旧 span
            let (start, end) = (old.start.unwrap(), old.end.unwrap());
            let prev = self.pieces[start].prev.unwrap();
            let next = self.pieces[end].next.unwrap();
            self.pieces[prev].next = Some(next);
            self.pieces[next].prev = Some(prev);
        } else {
            // 新旧替换
            let (old_start, old_end) = (old.start.unwrap(), old.end.unwrap());
            let (new_start, new_end) = (new.start.unwrap(), new.end.unwrap());
            let prev = self.pieces[old_start].prev.unwrap();
            let next = self.pieces[old_end].next.unwrap();
            self.pieces[prev].next = Some(new_start);
            self.pieces[next].prev = Some(new_end);
        }

        self.size = self.size - old.len + new.len;
    }
}

// ========== 内容读取 ==========

impl PieceTable {
    /// 从 pos 起按 piece 迭代文档内容，零拷贝
    pub fn chunks(&self, pos: usize) -> PieceChunks<'_> {
        PieceChunks::new(self, pos)
    }

    /// 回调式迭代：sink 返回 false 时在当前 piece 边界停止
    pub fn iterate<F>(&self, pos: usize, mut sink: F)
    where
        F: FnMut(usize, &[u8]) -> bool,
    {
        for (chunk_pos, bytes) in self.chunks(pos) {
            if !sink(chunk_pos, bytes) {
                break;
            }
        }
    }

    /// 获取指定范围的字节（自动截断到有效范围）
    pub fn get_byte_range(&self, range: Range<usize>) -> Vec<u8> {
        let start = range.start.min(self.size);
        let end = range.end.min(self.size);

        if start >= end {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(end - start);
        for (pos, chunk) in self.chunks(start) {
            if pos >= end {
                break;
            }
            let take = (end - pos).min(chunk.len());
            result.extend_from_slice(&chunk[..take]);
        }

        result
    }

    /// 解析 piece 引用的字节内容
    pub(crate) fn piece_bytes(&self, id: PieceId) -> &[u8] {
        let piece = &self.pieces[id];

        match piece.source {
            PieceSource::Sentinel => &[],
            PieceSource::Original => self
                .original
                .get_bytes(piece.start..piece.start + piece.len),
            PieceSource::Add { buffer } => self.buffers.slice(buffer, piece.start, piece.len),
        }
    }

    pub(crate) fn piece_next(&self, id: PieceId) -> Option<PieceId> {
        self.pieces[id].next
    }
}

// ========== 保存 ==========

impl PieceTable {
    /// 原子保存：写同目录临时文件再改名顶替目标
    ///
    /// 成功后记录保存点并开启新的 Action 边界；
    /// 任何一步失败都会清理临时文件，文档状态不变
    pub fn save(&mut self, path: &Path) -> Result<(), BufferError> {
        let file_name = path.file_name().ok_or_else(|| {
            BufferError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "无效的保存路径",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        let tmp_path = match path.parent() {
            Some(dir) => dir.join(&tmp_name),
            None => PathBuf::from(&tmp_name),
        };

        if let Err(err) = self.write_atomic(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err);
        }

        self.saved_action = self.undo.last().map(|a| a.id);
        self.snapshot();

        info!("已保存: {} ({} 字节)", path.display(), self.size);
        Ok(())
    }

    /// 写入临时文件并改名；失败清理交给调用方
    fn write_atomic(&self, tmp_path: &Path, path: &Path) -> Result<(), BufferError> {
        debug!("写入临时文件: {}", tmp_path.display());

        let mut options = OpenOptions::new();
        // 写映射要求读写打开
        options.read(true).write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options.open(tmp_path)?;
        file.set_len(self.size as u64)?;

        if self.size > 0 {
            let mut map = unsafe { MmapMut::map_mut(&file)? };

            let mut written = 0;
            for (_, chunk) in self.chunks(0) {
                map[written..written + chunk.len()].copy_from_slice(chunk);
                written += chunk.len();
            }
            map.flush()?;
        }

        drop(file);
        std::fs::rename(tmp_path, path)?;
        Ok(())
    }
}

// ========== 调试 ==========

impl PieceTable {
    /// 按链接顺序打印 piece 链（含哨兵），排查链接问题用
    pub fn debug_dump(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let mut cur = Some(BEGIN);

        while let Some(id) = cur {
            let piece = &self.pieces[id];
            let _ = writeln!(
                out,
                "piece {}: prev={:?} next={:?} len={} source={:?}",
                id, piece.prev, piece.next, piece.len, piece.source
            );
            cur = piece.next;
        }

        out
    }
}

// ========== 默认实现 ==========

impl Default for PieceTable {
    fn default() -> Self {
        Self::new()
    }
}

// ========== 测试 ==========
