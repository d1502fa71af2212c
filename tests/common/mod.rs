#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Scratch directory the binary runs in.
pub struct Workspace {
    _temp: TempDir,
    pub root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.root.join(name)).expect("read output")
    }

    /// Command for the binary with a clean environment, rooted here.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("mysql2sqlite").expect("binary built");
        cmd.current_dir(&self.root);
        for key in [
            "MYSQL2SQLITE_HOST",
            "MYSQL2SQLITE_PORT",
            "MYSQL2SQLITE_USER",
            "MYSQL2SQLITE_PASSWORD",
            "MYSQL2SQLITE_DATABASE",
            "MYSQL2SQLITE_MYSQLDUMP",
            "MYSQL2SQLITE_SQLITE3",
            "MYSQL2SQLITE_ENCODING",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    /// Executable shell script standing in for an external tool.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.write(name, format!("#!/bin/sh\n{body}\n").as_bytes());
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.root.join(name).exists()
    }
}

/// A compact ANSI mysqldump of one table, Windows-1252 encoded.
pub const SHOP_DUMP: &[u8] = b"CREATE TABLE \"products\" (\n  \"id\" int(10) unsigned NOT NULL,\n  \"label\" varchar(64) COLLATE utf8mb4_unicode_ci NOT NULL,\n  \"price\" decimal(8,2) DEFAULT NULL,\n  PRIMARY KEY (\"id\"),\n  UNIQUE KEY \"label\" (\"label\")\n) CHARACTER SET utf8mb4;\nINSERT INTO \"products\" VALUES (1,'Cr\xe8me br\xfbl\xe9e',4.50);\nINSERT INTO \"products\" VALUES (2,'Chef\\'s special',12.00);\n";
