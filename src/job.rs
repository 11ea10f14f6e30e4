//! ジョブテーブル。
//!
//! [`Job`] はパイプライン 1 本を表し、その [`crate::process::Process`] を単独で
//! 所有する。プロセステーブルはここから pid を逆引きするための索引に過ぎない。

use libc::pid_t;

use crate::process::{Pgid, Process, ProcessStatus, ProcessTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
    Done,
}

pub struct Job {
    pub id: u32,
    pub pgid: Pgid,
    pub command_line: String,
    pub processes: Vec<Process>,
    pub notified: bool,
}

impl Job {
    /// プロセス状態から集約ステータスを計算する。
    ///
    /// 全プロセスが Done なら Done。少なくとも 1 つが Stopped かつ
    /// Running が 1 つもなければ Stopped。それ以外は Running。
    pub fn status(&self) -> JobStatus {
        if self.processes.iter().all(|p| p.status == ProcessStatus::Done) {
            return JobStatus::Done;
        }
        let any_stopped = self
            .processes
            .iter()
            .any(|p| p.status == ProcessStatus::Stopped);
        let any_running = self
            .processes
            .iter()
            .any(|p| p.status == ProcessStatus::Running);
        if any_stopped && !any_running {
            JobStatus::Stopped
        } else {
            JobStatus::Running
        }
    }

    pub fn status_str(&self) -> &'static str {
        match self.status() {
            JobStatus::Running => "Running",
            JobStatus::Stopped => "Stopped",
            JobStatus::Done => "Done",
        }
    }
}

/// ジョブの集合。`job_id` は単調増加で、生きている間は再利用しない。
pub struct JobTable {
    jobs: Vec<Job>,
    next_id: u32,
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            next_id: 1,
        }
    }

    /// 新しいジョブを作成し、id を返す。プロセスはまだ付いていない。
    pub fn insert(&mut self, pgid: Pgid, command_line: String) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(Job {
            id,
            pgid,
            command_line,
            processes: Vec::new(),
            notified: false,
        });
        id
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: u32) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn find_by_pgid(&self, pgid: Pgid) -> Option<&Job> {
        self.jobs.iter().find(|j| j.pgid == pgid)
    }

    pub fn find_by_pgid_mut(&mut self, pgid: Pgid) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.pgid == pgid)
    }

    /// 指定ジョブにプロセスを追加し、プロセステーブルにも登録する。
    pub fn attach_process(&mut self, job_id: u32, pid: pid_t, processes: &mut ProcessTable) {
        if let Some(job) = self.find_by_id_mut(job_id) {
            processes.register(pid, job.pgid);
            job.processes.push(Process {
                pid,
                pgid: job.pgid,
                status: ProcessStatus::Running,
            });
        }
    }

    /// `pgid` に属するジョブの中から `pid` のプロセス状態を更新する。
    pub fn update_process_status(&mut self, pgid: Pgid, pid: pid_t, status: ProcessStatus) {
        if let Some(job) = self.find_by_pgid_mut(pgid) {
            if let Some(proc) = job.processes.iter_mut().find(|p| p.pid == pid) {
                proc.status = status;
            }
        }
    }

    /// ジョブ内の全プロセスの状態を一斉に変更する（`fg`/`bg` の SIGCONT 後に使う）。
    pub fn mark_all(&mut self, job_id: u32, status: ProcessStatus) {
        if let Some(job) = self.find_by_id_mut(job_id) {
            for proc in job.processes.iter_mut() {
                proc.status = status;
            }
        }
    }

    pub fn remove(&mut self, job_id: u32, processes: &mut ProcessTable) {
        if let Some(pos) = self.jobs.iter().position(|j| j.id == job_id) {
            let job = self.jobs.remove(pos);
            for proc in &job.processes {
                processes.forget(proc.pid);
            }
        }
    }

    pub fn iter_in_display_order(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Done になったがまだ通知していないジョブを (id, command_line) で返し、通知済みにする。
    /// 呼び出し側がこの戻り値を使って `[id]+ Done` 等を表示した後、
    /// 併せて [`JobTable::remove_notified_done`] を呼んで実際にテーブルから取り除くこと。
    pub fn take_done_unnotified(&mut self) -> Vec<(u32, String)> {
        let mut newly_done = Vec::new();
        for job in self.jobs.iter_mut() {
            if !job.notified && job.status() == JobStatus::Done {
                job.notified = true;
                newly_done.push((job.id, job.command_line.clone()));
            }
        }
        newly_done
    }

    /// 完了済みかつ通知済みのジョブを取り除く。
    pub fn remove_notified_done(&mut self, processes: &mut ProcessTable) {
        let done_ids: Vec<u32> = self
            .jobs
            .iter()
            .filter(|j| j.notified && j.status() == JobStatus::Done)
            .map(|j| j.id)
            .collect();
        for id in done_ids {
            self.remove(id, processes);
        }
    }

    /// まだ Done になっていない中で最も新しいジョブ。
    pub fn most_recent(&self) -> Option<&Job> {
        self.jobs
            .iter()
            .filter(|j| j.status() != JobStatus::Done)
            .max_by_key(|j| j.id)
    }

    /// Stopped 状態の中で最も新しいジョブ。
    pub fn most_recent_stopped(&self) -> Option<&Job> {
        self.jobs
            .iter()
            .filter(|j| j.status() == JobStatus::Stopped)
            .max_by_key(|j| j.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_process(pid: pid_t, pgid: Pgid, status: ProcessStatus) -> Process {
        Process { pid, pgid, status }
    }

    #[test]
    fn insert_assigns_monotonic_ids() {
        let mut jobs = JobTable::new();
        let a = jobs.insert(100, "sleep 1".into());
        let b = jobs.insert(200, "sleep 2".into());
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn status_done_when_all_done() {
        let mut jobs = JobTable::new();
        let id = jobs.insert(100, "true".into());
        let job = jobs.find_by_id_mut(id).unwrap();
        job.processes.push(make_process(100, 100, ProcessStatus::Done));
        assert_eq!(jobs.find_by_id(id).unwrap().status(), JobStatus::Done);
    }

    #[test]
    fn status_stopped_when_one_stopped_none_running() {
        let mut jobs = JobTable::new();
        let id = jobs.insert(100, "a | b".into());
        let job = jobs.find_by_id_mut(id).unwrap();
        job.processes.push(make_process(100, 100, ProcessStatus::Stopped));
        job.processes.push(make_process(101, 100, ProcessStatus::Done));
        assert_eq!(jobs.find_by_id(id).unwrap().status(), JobStatus::Stopped);
    }

    #[test]
    fn status_running_when_mixed_running_and_done() {
        let mut jobs = JobTable::new();
        let id = jobs.insert(100, "a | b".into());
        let job = jobs.find_by_id_mut(id).unwrap();
        job.processes.push(make_process(100, 100, ProcessStatus::Running));
        job.processes.push(make_process(101, 100, ProcessStatus::Done));
        assert_eq!(jobs.find_by_id(id).unwrap().status(), JobStatus::Running);
    }

    #[test]
    fn attach_process_registers_in_process_table() {
        let mut jobs = JobTable::new();
        let mut processes = ProcessTable::new();
        let id = jobs.insert(100, "sleep 1".into());
        jobs.attach_process(id, 100, &mut processes);
        assert_eq!(processes.pgid_of(100), Some(100));
        assert_eq!(jobs.find_by_id(id).unwrap().processes.len(), 1);
    }

    #[test]
    fn remove_forgets_all_processes() {
        let mut jobs = JobTable::new();
        let mut processes = ProcessTable::new();
        let id = jobs.insert(100, "sleep 1".into());
        jobs.attach_process(id, 100, &mut processes);
        jobs.attach_process(id, 101, &mut processes);
        jobs.remove(id, &mut processes);
        assert!(jobs.find_by_id(id).is_none());
        assert_eq!(processes.pgid_of(100), None);
        assert_eq!(processes.pgid_of(101), None);
    }

    #[test]
    fn most_recent_stopped_picks_highest_id() {
        let mut jobs = JobTable::new();
        let a = jobs.insert(100, "a".into());
        let b = jobs.insert(200, "b".into());
        jobs.find_by_id_mut(a)
            .unwrap()
            .processes
            .push(make_process(100, 100, ProcessStatus::Stopped));
        jobs.find_by_id_mut(b)
            .unwrap()
            .processes
            .push(make_process(200, 200, ProcessStatus::Stopped));
        assert_eq!(jobs.most_recent_stopped().unwrap().id, b);
    }

    #[test]
    fn most_recent_skips_done_jobs() {
        let mut jobs = JobTable::new();
        let a = jobs.insert(100, "a".into());
        let b = jobs.insert(200, "b".into());
        jobs.find_by_id_mut(a)
            .unwrap()
            .processes
            .push(make_process(100, 100, ProcessStatus::Running));
        jobs.find_by_id_mut(b)
            .unwrap()
            .processes
            .push(make_process(200, 200, ProcessStatus::Done));
        assert_eq!(jobs.most_recent().unwrap().id, a);
    }

    #[test]
    fn update_process_status_recomputes_aggregate() {
        let mut jobs = JobTable::new();
        let mut processes = ProcessTable::new();
        let id = jobs.insert(100, "sleep 1".into());
        jobs.attach_process(id, 100, &mut processes);
        jobs.update_process_status(100, 100, ProcessStatus::Stopped);
        assert_eq!(jobs.find_by_id(id).unwrap().status(), JobStatus::Stopped);
    }

    #[test]
    fn take_done_unnotified_marks_and_returns_once() {
        let mut jobs = JobTable::new();
        let mut processes = ProcessTable::new();
        let id = jobs.insert(100, "sleep 1".into());
        jobs.attach_process(id, 100, &mut processes);
        jobs.update_process_status(100, 100, ProcessStatus::Done);

        let newly_done = jobs.take_done_unnotified();
        assert_eq!(newly_done, vec![(id, "sleep 1".to_string())]);
        assert!(jobs.find_by_id(id).unwrap().notified);

        // 2 回目は既に通知済みなので空を返す。
        assert!(jobs.take_done_unnotified().is_empty());
    }

    #[test]
    fn take_done_unnotified_then_remove_notified_done_evicts() {
        let mut jobs = JobTable::new();
        let mut processes = ProcessTable::new();
        let id = jobs.insert(100, "true".into());
        jobs.attach_process(id, 100, &mut processes);
        jobs.update_process_status(100, 100, ProcessStatus::Done);

        jobs.take_done_unnotified();
        jobs.remove_notified_done(&mut processes);

        assert!(jobs.find_by_id(id).is_none());
    }
}
