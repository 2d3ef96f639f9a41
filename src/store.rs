//! Persistence adapter: three fixed keys holding JSON documents.
//!
//! This mirrors the original deployment's key-value records exactly:
//! whole-document replace on every mutation, last-write-wins, no schema
//! version. A malformed stored value reads as the empty default instead of
//! erroring. The backend is a trait so tests inject an in-memory fake and
//! production can point at a data directory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, instrument, warn};

use crate::domain::{CurrentUser, Registration, Submission};

pub const KEY_REGISTRATIONS: &str = "orchids_registrations_v1";
pub const KEY_SUBMISSIONS: &str = "orchids_submissions_v1";
pub const KEY_CURRENT_USER: &str = "orchids_current_user_v1";

/// Retention cap for the submissions record: newest 500 kept, oldest evicted.
pub const MAX_SUBMISSIONS: usize = 500;

/// Raw string storage for one key. Implementations must tolerate concurrent
/// callers; semantics are last-write-wins per key.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// Process-local backend. The default, and the test fake.
#[derive(Default)]
pub struct MemoryBackend {
    map: RwLock<HashMap<String, String>>,
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: String) {
        if let Ok(mut map) = self.map.write() {
            map.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.map.write() {
            map.remove(key);
        }
    }
}

/// One JSON file per key under a data directory. Write failures are logged
/// and swallowed; the records survive restarts but carry no other guarantees.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            error!(target: "arena", dir = %dir.display(), error = %e, "Failed to create data dir");
        }
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn put(&self, key: &str, value: String) {
        if let Err(e) = std::fs::write(self.path_for(key), value) {
            error!(target: "arena", %key, error = %e, "Failed to persist record");
        }
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}

/// Typed access to the three records. Every mutation is read-modify-replace
/// of the whole document, same as the original store.
pub struct AdminStore {
    backend: Box<dyn KvBackend>,
}

impl AdminStore {
    pub fn new(backend: Box<dyn KvBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::default()))
    }

    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.backend.get(key) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(target: "arena", %key, error = %e, "Malformed stored value; using default");
                T::default()
            }),
            None => T::default(),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.backend.put(key, raw),
            Err(e) => error!(target: "arena", %key, error = %e, "Failed to encode record"),
        }
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.read(KEY_REGISTRATIONS)
    }

    /// Keep ALL registrations, even when emails repeat. Newest first.
    #[instrument(level = "debug", skip(self, reg), fields(id = %reg.id))]
    pub fn add_registration(&self, reg: Registration) {
        let mut regs = self.registrations();
        regs.insert(0, reg);
        self.write(KEY_REGISTRATIONS, &regs);
    }

    /// Remove exactly the record with this id; all others stay.
    pub fn remove_registration(&self, id: &str) -> bool {
        let mut regs = self.registrations();
        let before = regs.len();
        regs.retain(|r| r.id != id);
        let removed = regs.len() != before;
        if removed {
            self.write(KEY_REGISTRATIONS, &regs);
        }
        removed
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.read(KEY_SUBMISSIONS)
    }

    /// Prepend and truncate to the newest `MAX_SUBMISSIONS` entries.
    #[instrument(level = "debug", skip(self, sub), fields(id = %sub.id, challenge = %sub.challenge_id))]
    pub fn add_submission(&self, sub: Submission) {
        let mut subs = self.submissions();
        subs.insert(0, sub);
        subs.truncate(MAX_SUBMISSIONS);
        self.write(KEY_SUBMISSIONS, &subs);
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        let user: Option<CurrentUser> = self.read(KEY_CURRENT_USER);
        // An entry with an empty email is as good as no entry.
        user.filter(|u| !u.email.is_empty())
    }

    pub fn set_current_user(&self, user: &CurrentUser) {
        self.write(KEY_CURRENT_USER, user);
    }

    pub fn clear_all(&self) {
        self.backend.remove(KEY_REGISTRATIONS);
        self.backend.remove(KEY_SUBMISSIONS);
        self.backend.remove(KEY_CURRENT_USER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SubmissionStatus, Track};
    use chrono::Utc;

    fn reg(id: &str, email: &str) -> Registration {
        Registration {
            id: id.into(),
            name: "Test".into(),
            email: email.into(),
            college: "C".into(),
            department: "D".into(),
            year: "2".into(),
            phone: "0".into(),
            is_team: false,
            team_member_name: None,
            team_member_email: None,
            created_at: Utc::now(),
        }
    }

    fn sub(id: &str) -> Submission {
        Submission {
            id: id.into(),
            user_email: "a@b.c".into(),
            user_name: "Test".into(),
            track: Track::Python,
            challenge_id: "PY01".into(),
            answer: "x".into(),
            status: SubmissionStatus::Fail,
            marks: 0,
            max_marks: 10,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_emails_coexist() {
        let store = AdminStore::in_memory();
        store.add_registration(reg("1", "same@x.y"));
        store.add_registration(reg("2", "same@x.y"));
        assert_eq!(store.registrations().len(), 2);
    }

    #[test]
    fn remove_registration_deletes_exactly_one() {
        let store = AdminStore::in_memory();
        store.add_registration(reg("1", "same@x.y"));
        store.add_registration(reg("2", "same@x.y"));
        store.add_registration(reg("3", "other@x.y"));
        assert!(store.remove_registration("2"));
        let left: Vec<String> = store.registrations().into_iter().map(|r| r.id).collect();
        assert_eq!(left, vec!["3", "1"]);
        assert!(!store.remove_registration("2"));
    }

    #[test]
    fn submissions_capped_at_500_oldest_evicted() {
        let store = AdminStore::in_memory();
        for i in 0..510 {
            store.add_submission(sub(&format!("s{i}")));
        }
        let subs = store.submissions();
        assert_eq!(subs.len(), MAX_SUBMISSIONS);
        // Newest first: s509 at the front, the first ten inserted are gone.
        assert_eq!(subs[0].id, "s509");
        assert!(subs.iter().all(|s| s.id != "s0" && s.id != "s9"));
        assert_eq!(subs.last().unwrap().id, "s10");
    }

    #[test]
    fn malformed_value_reads_as_default() {
        let backend = MemoryBackend::default();
        backend.put(KEY_REGISTRATIONS, "{not json".into());
        let store = AdminStore::new(Box::new(backend));
        assert!(store.registrations().is_empty());
    }

    #[test]
    fn current_user_overwritten_and_empty_email_ignored() {
        let store = AdminStore::in_memory();
        assert!(store.current_user().is_none());
        store.set_current_user(&CurrentUser { name: "A".into(), email: "a@x.y".into() });
        store.set_current_user(&CurrentUser { name: "B".into(), email: "b@x.y".into() });
        assert_eq!(store.current_user().unwrap().email, "b@x.y");
        store.set_current_user(&CurrentUser { name: "C".into(), email: String::new() });
        assert!(store.current_user().is_none());
    }

    #[test]
    fn file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = AdminStore::new(Box::new(FileBackend::new(dir.path())));
        store.add_registration(reg("1", "a@x.y"));
        // A second store over the same directory sees the record.
        let store2 = AdminStore::new(Box::new(FileBackend::new(dir.path())));
        assert_eq!(store2.registrations().len(), 1);
        store2.clear_all();
        assert!(store2.registrations().is_empty());
    }
}
