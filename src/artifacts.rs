//! Artifact files - Durable per-run outputs for audit and rollback.
//!
//! Every routine persists its raw fetch before touching the store and its
//! results after, one file per artifact kind per run, named with the run
//! timestamp. Artifacts are written once and never mutated; they are the
//! only record that survives a crashed run.

use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::payment_audit::UnappliedPayment;
use crate::errors::Result;

/// Writes run artifacts under a fixed directory.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Writes `data` as pretty-printed JSON. Returns the file name for the
    /// run summary.
    pub fn write_json<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        let path = self.dir.join(name);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, data)?;
        info!(file = %path.display(), "artifact written");
        Ok(name.to_owned())
    }

    /// Writes unapplied-payment findings as CSV with the fixed column set
    /// `payment_id, loan_id, transaction_ids, term, issue`.
    pub fn write_unapplied_csv(&self, name: &str, rows: &[UnappliedPayment]) -> Result<String> {
        let path = self.dir.join(name);
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        info!(file = %path.display(), rows = rows.len(), "artifact written");
        Ok(name.to_owned())
    }

    /// Writes a plain-text loan-id list with a header line.
    pub fn write_loan_id_list(&self, name: &str, header: &str, ids: &[String]) -> Result<String> {
        let path = self.dir.join(name);
        let mut file = File::create(&path)?;
        writeln!(file, "{header}")?;
        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file)?;
        for id in ids {
            writeln!(file, "{id}")?;
        }
        info!(file = %path.display(), ids = ids.len(), "artifact written");
        Ok(name.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::payment_audit::ISSUE_PAYMENT_INFO_EMPTY;

    fn temp_store(tag: &str) -> ArtifactStore {
        let dir = std::env::temp_dir()
            .join("loanwarden-tests")
            .join(format!("{tag}-{}", std::process::id()));
        ArtifactStore::open(&dir).unwrap()
    }

    #[test]
    fn json_artifact_round_trips() {
        let store = temp_store("json");
        let name = store.write_json("sample.json", &vec![1, 2, 3]).unwrap();
        assert_eq!(name, "sample.json");

        let raw = fs::read_to_string(store.dir.join(name)).unwrap();
        let parsed: Vec<i32> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn csv_artifact_has_fixed_columns() {
        let store = temp_store("csv");
        let rows = vec![UnappliedPayment {
            payment_id: "p1".to_owned(),
            loan_id: "l1".to_owned(),
            transaction_ids: "t1,t2".to_owned(),
            term: 3,
            issue: ISSUE_PAYMENT_INFO_EMPTY,
        }];
        let name = store.write_unapplied_csv("findings.csv", &rows).unwrap();

        let raw = fs::read_to_string(store.dir.join(name)).unwrap();
        let mut lines = raw.lines();
        assert_eq!(
            lines.next(),
            Some("payment_id,loan_id,transaction_ids,term,issue")
        );
        assert_eq!(lines.next(), Some("p1,l1,\"t1,t2\",3,payment_info_empty"));
    }

    #[test]
    fn loan_id_list_has_header_and_one_id_per_line() {
        let store = temp_store("txt");
        let ids = vec!["L1".to_owned(), "L2".to_owned()];
        let name = store
            .write_loan_id_list("inconsistent.txt", "Inconsistent loans:", &ids)
            .unwrap();

        let raw = fs::read_to_string(store.dir.join(name)).unwrap();
        assert!(raw.starts_with("Inconsistent loans:\n"));
        assert!(raw.contains("\nL1\n"));
        assert!(raw.ends_with("L2\n"));
    }
}
