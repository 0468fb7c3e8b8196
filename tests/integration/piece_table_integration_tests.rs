// Piece Table 集成测试

use std::fs;

use pedit::core::buffer::{BufferError, PieceTable};

fn contents(table: &PieceTable) -> Vec<u8> {
    table.get_byte_range(0..table.total_bytes())
}

#[test]
fn test_scenario_insert_undo_redo() {
    let mut table = PieceTable::new();

    table.insert(0, b"hello").unwrap();
    table.snapshot();
    assert_eq!(contents(&table), b"hello");

    table.insert(5, b" world").unwrap();
    table.snapshot();
    assert_eq!(contents(&table), b"hello world");

    assert!(table.undo());
    assert_eq!(contents(&table), b"hello");

    assert!(table.redo());
    assert_eq!(contents(&table), b"hello world");
}

#[test]
fn test_scenario_load_delete_undo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.txt");
    fs::write(&path, b"abcdef").unwrap();

    let mut table = PieceTable::from_file(&path).unwrap();
    assert_eq!(table.total_bytes(), 6);

    table.delete(2, 2).unwrap();
    table.snapshot();
    assert_eq!(contents(&table), b"abef");

    assert!(table.undo());
    assert_eq!(contents(&table), b"abcdef");
}

#[test]
fn test_scenario_stacked_edits_unwind() {
    let mut table = PieceTable::new();

    table.insert(0, b"abcdef").unwrap();
    table.snapshot();
    table.insert(3, b"XYZ").unwrap();
    table.snapshot();
    assert_eq!(contents(&table), b"abcXYZdef");

    table.delete(2, 5).unwrap();
    table.snapshot();
    assert_eq!(contents(&table), b"abef");

    assert!(table.undo());
    assert_eq!(contents(&table), b"abcXYZdef");
    assert!(table.undo());
    assert_eq!(contents(&table), b"abcdef");
    assert!(table.undo());
    assert_eq!(contents(&table), b"");
    assert!(!table.undo());
}

#[test]
fn test_scenario_save_and_modified() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let mut table = PieceTable::new();
    table.insert(0, b"hi").unwrap();
    table.snapshot();
    table.insert(2, b"!").unwrap();
    assert!(table.modified());

    table.save(&path).unwrap();
    assert!(!table.modified());
    assert_eq!(fs::read(&path).unwrap(), b"hi!");

    table.insert(0, b"x").unwrap();
    assert!(table.modified());
}

#[test]
fn test_scenario_replace_undoes_as_one() {
    let mut table = PieceTable::new();

    table.insert(0, b"abc").unwrap();
    table.snapshot();
    table.replace(1, b"ZZ").unwrap();
    assert_eq!(contents(&table), b"aZZ");

    // replace 是一个 Action 里的两个 Change，一次撤销即可还原
    assert!(table.undo());
    assert_eq!(contents(&table), b"abc");
}

#[test]
fn test_scenario_empty_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("empty.txt");
    let dst = dir.path().join("copy.txt");
    fs::write(&src, b"").unwrap();

    let mut table = PieceTable::from_file(&src).unwrap();
    assert_eq!(table.total_bytes(), 0);
    assert!(table.chunks(0).next().is_none());

    table.save(&dst).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), b"");
}

#[test]
fn test_load_save_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.bin");
    let dst = dir.path().join("dst.bin");

    // 含非 UTF-8 字节的内容：文档语义是字节而非字符
    let mut payload: Vec<u8> = Vec::new();
    for i in 0..4096usize {
        payload.push((i % 251) as u8);
    }
    fs::write(&src, &payload).unwrap();

    let mut table = PieceTable::from_file(&src).unwrap();
    table.save(&dst).unwrap();

    assert_eq!(fs::read(&dst).unwrap(), payload);
}

#[test]
fn test_save_after_edits_streams_pieces() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dst = dir.path().join("dst.txt");
    fs::write(&src, b"hello world").unwrap();

    let mut table = PieceTable::from_file(&src).unwrap();
    table.delete(5, 6).unwrap();
    table.insert(5, b", piece table!").unwrap();
    table.snapshot();

    table.save(&dst).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), b"hello, piece table!");

    // 原文件不受影响
    assert_eq!(fs::read(&src).unwrap(), b"hello world");
}

#[test]
fn test_save_over_loaded_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.txt");
    fs::write(&path, b"version one").unwrap();

    let mut table = PieceTable::from_file(&path).unwrap();
    table.replace(8, b"two").unwrap();

    // 改名顶替仍处于映射状态的原文件，POSIX 下安全
    table.save(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"version two");
    assert!(!table.modified());
}

#[test]
fn test_save_failure_keeps_document_intact() {
    let dir = tempfile::tempdir().unwrap();
    let missing_dir = dir.path().join("no-such-dir").join("out.txt");

    let mut table = PieceTable::new();
    table.insert(0, b"data").unwrap();

    assert!(table.save(&missing_dir).is_err());
    // 失败不动文档，也不动保存点
    assert_eq!(contents(&table), b"data");
    assert!(table.modified());
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let mut table = PieceTable::new();
    table.insert(0, b"payload").unwrap();
    table.save(&path).unwrap();

    // 目录里只应剩下改名后的目标文件
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["out.txt".to_string()]);
}

#[test]
fn test_load_rejects_directory() {
    let dir = tempfile::tempdir().unwrap();

    let err = PieceTable::from_file(dir.path()).unwrap_err();
    assert!(matches!(err, BufferError::NotRegular(_)));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = PieceTable::from_file(&dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, BufferError::Io(_)));
}

#[test]
fn test_modified_is_identity_not_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.txt");

    let mut table = PieceTable::new();
    table.insert(0, b"same").unwrap();
    table.save(&path).unwrap();

    // 编辑后又手工恢复原内容：按身份判断仍算已改动
    table.insert(4, b"!").unwrap();
    table.snapshot();
    table.delete(4, 1).unwrap();
    table.snapshot();
    assert_eq!(contents(&table), b"same");
    assert!(table.modified());

    // 撤销回保存点则不算改动
    assert!(table.undo());
    assert!(table.undo());
    assert!(!table.modified());
}

#[test]
fn test_mixed_session_on_loaded_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    fs::write(&src, b"The quick brown fox").unwrap();

    let mut table = PieceTable::from_file(&src).unwrap();

    table.replace(4, b"slick").unwrap();
    table.snapshot();
    table.delete(9, 6).unwrap();
    table.snapshot();
    table.insert(table.total_bytes(), b" jumps").unwrap();
    table.snapshot();
    assert_eq!(contents(&table), b"The slick fox jumps");

    while table.undo() {}
    assert_eq!(contents(&table), b"The quick brown fox");

    while table.redo() {}
    assert_eq!(contents(&table), b"The slick fox jumps");
}
