//! `mysql2sqlite` - Convert a MySQL database into a SQLite file.
//!
//! Runs `mysqldump`, rewrites the MySQL-specific syntax in the dump and
//! loads the result with SQLite. A previous target file is kept as `.bk`.

use mysql2sqlite::run;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
