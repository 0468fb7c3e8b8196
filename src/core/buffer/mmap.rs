// 内存映射缓冲区
//
// 职责：以只读内存映射持有加载时的原始文件内容，
//       整个编辑器生命周期内不可变

use std::fs::File;
use std::ops::Range;

use memmap2::Mmap;

/// 原始内容区域（加载时一次性映射，只读）
#[derive(Debug)]
pub struct OriginalBuffer {
    mmap: Option<Mmap>,
    length: usize,
}

impl OriginalBuffer {
    /// 空文档（或0字节文件）：不建立映射
    pub fn empty() -> Self {
        Self {
            mmap: None,
            length: 0,
        }
    }

    /// 映射已打开的文件
    ///
    /// 调用方负责确认这是常规文件；映射建立后文件句柄即可关闭
    pub fn map(file: &File, length: usize) -> Result<Self, std::io::Error> {
        let mmap = unsafe { Mmap::map(file)? };

        Ok(Self {
            mmap: Some(mmap),
            length,
        })
    }

    /// 获取缓冲区长度（字节）
    pub fn len(&self) -> usize {
        self.length
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// 获取字节切片（自动截断到有效范围）
    pub fn get_bytes(&self, range: Range<usize>) -> &[u8] {
        let start = range.start.min(self.length);
        let end = range.end.min(self.length);

        if start >= end {
            return &[];
        }

        match self.mmap {
            Some(ref mmap) => &mmap[start..end],
            None => &[],
        }
    }
}
