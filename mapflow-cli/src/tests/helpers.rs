//! Test helpers for composing CLI inputs on disk.

use camino::{Utf8Path, Utf8PathBuf};
use mapflow_core::{Entity, RecordBuffer};
use mapflow_data::test_support::write_fixture;
use std::fs;
use tempfile::TempDir;

/// Temporary directory with a UTF-8 root path.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path, contents).unwrap_or_else(|err| panic!("failed to write {path}: {err}"));
}

/// Frame `entities` as newline-delimited JSON at `path`.
pub(super) fn write_records(path: &Utf8Path, entities: &[Entity]) {
    let buffer = RecordBuffer::from_entities(entities).expect("frame records");
    write_utf8(path, buffer.as_bytes());
}

/// Decode one of the data crate's PBF fixtures to `path`.
pub(super) fn write_pbf_fixture(path: &Utf8Path, stem: &str) {
    write_fixture(path, stem).unwrap_or_else(|err| panic!("failed to write {path}: {err}"));
}
