#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1251;
use tempfile::{TempDir, tempdir};
use zip::{ZipWriter, write::SimpleFileOptions};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes UTF-8 `contents` into a file under the workspace.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    /// Writes `contents` re-encoded as Windows-1251, the export charset.
    pub fn write_cp1251(&self, name: &str, contents: &str) -> PathBuf {
        let (encoded, _, had_errors) = WINDOWS_1251.encode(contents);
        assert!(!had_errors, "fixture text must encode as cp1251");
        self.write_bytes(name, &encoded)
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Builds a ZIP archive holding the given `(entry_name, bytes)` pairs.
    pub fn write_zip(&self, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let file = File::create(&path).expect("create zip file");
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (entry_name, bytes) in entries {
            zip.start_file(*entry_name, options).expect("start entry");
            zip.write_all(bytes).expect("write entry bytes");
        }
        zip.finish().expect("finish zip");
        path
    }
}

/// A small but realistic export: a title row, a split header (annotation row
/// above the primary), and semicolon-delimited data with locale-formatted
/// numbers and day-first dates.
pub const SAMPLE_EXPORT: &str = "\
Отчет по продажам за март;;;;;;;
;Ссылка;;;;;;
;Дата;Номенклатура;Склад;Количество;Сумма;Менеджер;Регион
1;15.03.2023;Труба Проф 40 x 20, 1,5 L=6;Основной;10;1 234,56;Иванов;Москва
2;16.03.2023;Лист х/к 2х1250х2500;Основной;5;2 000,00;Петров;Тула
3;17.03.2023;Уголок 50х50х5;Резерв;8;987,65;Иванов;Москва
4;18.03.2023;Круг ст.20 120мм;Основной;3;456,78;Сидоров;Тула
5;19.03.2023;Арматура А500С 12мм;Резерв;20;3 210,00;Петров;Москва
";
