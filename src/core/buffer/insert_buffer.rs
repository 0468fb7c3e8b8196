// 插入缓冲区
//
// 职责：以只追加方式存放所有插入操作的字节，
//       返回的 (缓冲区, 偏移) 句柄在编辑器生命周期内始终有效

use crate::core::buffer::INSERT_BUFFER_SIZE;

/// 单个只追加缓冲区
///
/// 容量在分配时固定，之后只向尾部写入，已写入的字节不再改动。
/// 依靠固定容量保证 Vec 永不重新分配。
#[derive(Debug)]
struct InsertBuffer {
    data: Vec<u8>,
}

impl InsertBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// 剩余可写空间
    fn remaining(&self) -> usize {
        self.data.capacity() - self.data.len()
    }
}

/// 插入缓冲区链
///
/// 当前写入目标始终是链尾的缓冲区；空间不足时新开一个，
/// 旧缓冲区剩余空间有意弃用（拆分piece去填满它的优化在此明确放弃）。
#[derive(Debug, Default)]
pub struct InsertBuffers {
    chain: Vec<InsertBuffer>,
}

impl InsertBuffers {
    pub fn new() -> Self {
        Self { chain: Vec::new() }
    }

    /// 存入一段字节，返回稳定句柄 (缓冲区索引, 起始偏移)
    pub fn store(&mut self, bytes: &[u8]) -> (usize, usize) {
        let need_new = match self.chain.last() {
            Some(buf) => buf.remaining() < bytes.len(),
            None => true,
        };

        if need_new {
            let capacity = INSERT_BUFFER_SIZE.max(bytes.len());
            self.chain.push(InsertBuffer::with_capacity(capacity));
        }

        let index = self.chain.len() - 1;
        let buf = &mut self.chain[index];
        let start = buf.data.len();
        buf.data.extend_from_slice(bytes);

        (index, start)
    }

    /// 按句柄取回字节切片
    pub fn slice(&self, buffer: usize, start: usize, len: usize) -> &[u8] {
        &self.chain[buffer].data[start..start + len]
    }

    /// 已分配的缓冲区数量
    pub fn buffer_count(&self) -> usize {
        self.chain.len()
    }
}
