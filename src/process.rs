//! プロセステーブル（pid -> pgid の非所有インデックス）。
//!
//! [`Process`] の実体は [`crate::job::Job`] が単独で所有する。ここに置くのは
//! `waitpid` が返した pid からジョブを逆引きするための薄いマップだけである。

use std::collections::HashMap;

use libc::pid_t;

/// プロセスグループ ID。カーネル上は pid_t と同じ型。
pub type Pgid = pid_t;

/// 1 つの子プロセスを表す値。所有者は常に [`crate::job::Job`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Process {
    pub pid: pid_t,
    pub pgid: Pgid,
    pub status: ProcessStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Stopped,
    Done,
}

/// pid -> pgid の逆引きテーブル。ジョブテーブルから独立して保持する。
#[derive(Default)]
pub struct ProcessTable {
    index: HashMap<pid_t, Pgid>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
        }
    }

    pub fn register(&mut self, pid: pid_t, pgid: Pgid) {
        self.index.insert(pid, pgid);
    }

    pub fn pgid_of(&self, pid: pid_t) -> Option<Pgid> {
        self.index.get(&pid).copied()
    }

    pub fn forget(&mut self, pid: pid_t) {
        self.index.remove(&pid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut table = ProcessTable::new();
        table.register(100, 100);
        table.register(101, 100);
        assert_eq!(table.pgid_of(100), Some(100));
        assert_eq!(table.pgid_of(101), Some(100));
        assert_eq!(table.pgid_of(999), None);
    }

    #[test]
    fn forget_removes_entry() {
        let mut table = ProcessTable::new();
        table.register(5, 5);
        table.forget(5);
        assert_eq!(table.pgid_of(5), None);
    }

    #[test]
    fn register_is_idempotent() {
        let mut table = ProcessTable::new();
        table.register(7, 7);
        table.register(7, 7);
        assert_eq!(table.pgid_of(7), Some(7));
    }
}
