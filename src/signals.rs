//! シグナル処理。
//!
//! ハンドラは `fg_pgid` と `sigchld_pending` という 2 つの atomic にしか触れない
//! （async-signal-safe であることが条件のため）。実際のジョブテーブル更新は
//! メインループから [`drain_sigchld`] を呼んで同期的に行う。

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use libc::pid_t;

use crate::job::JobTable;
use crate::process::{Pgid, ProcessStatus, ProcessTable};

/// 現在端末を保持しているフォアグラウンドプロセスグループ。0 ならシェル自身。
pub static FG_PGID: AtomicI32 = AtomicI32::new(0);

/// SIGCHLD が届いたことを示すフラグ。ハンドラが立て、`drain_sigchld` が降ろす。
pub static SIGCHLD_PENDING: AtomicBool = AtomicBool::new(false);

pub fn fg_pgid() -> Pgid {
    FG_PGID.load(Ordering::SeqCst)
}

pub fn set_fg_pgid(pgid: Pgid) {
    FG_PGID.store(pgid, Ordering::SeqCst);
}

extern "C" fn sigchld_handler(_sig: i32) {
    SIGCHLD_PENDING.store(true, Ordering::SeqCst);
}

extern "C" fn sigint_handler(_sig: i32) {
    let pgid = FG_PGID.load(Ordering::SeqCst);
    if pgid > 0 {
        unsafe {
            libc::killpg(pgid, libc::SIGINT);
        }
    }
}

extern "C" fn sigtstp_handler(_sig: i32) {
    let pgid = FG_PGID.load(Ordering::SeqCst);
    if pgid > 0 {
        unsafe {
            libc::killpg(pgid, libc::SIGTSTP);
        }
    }
}

/// シェル自身が使う全ハンドラをインストールする。非対話時は呼ばない。
pub fn install_shell_handlers() {
    unsafe {
        libc::signal(libc::SIGCHLD, sigchld_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, sigint_handler as libc::sighandler_t);
        libc::signal(libc::SIGTSTP, sigtstp_handler as libc::sighandler_t);
        libc::signal(libc::SIGTTOU, libc::SIG_IGN);
        libc::signal(libc::SIGTTIN, libc::SIG_IGN);
    }
}

/// fork 直後、exec 前に子プロセス側で呼ぶ。シグナルをデフォルトに戻し、
/// プロセスグループを設定する。`leader_pgid` は先頭コマンドなら 0。
pub fn prepare_child(leader_pgid: Pgid) {
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
        libc::signal(libc::SIGTSTP, libc::SIG_DFL);
        libc::signal(libc::SIGTTOU, libc::SIG_DFL);
        libc::signal(libc::SIGTTIN, libc::SIG_DFL);
        libc::signal(libc::SIGCHLD, libc::SIG_DFL);

        let pid = libc::getpid();
        if leader_pgid == 0 {
            libc::setpgid(0, 0);
        } else {
            libc::setpgid(0, leader_pgid);
        }
        let _ = pid;
    }
}

/// fork ループの前後で SIGCHLD をブロック／解除する。
pub fn block_sigchld() {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, libc::SIGCHLD);
        libc::sigprocmask(libc::SIG_BLOCK, &set, std::ptr::null_mut());
    }
}

pub fn unblock_sigchld() {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, libc::SIGCHLD);
        libc::sigprocmask(libc::SIG_UNBLOCK, &set, std::ptr::null_mut());
    }
}

/// 保留中の SIGCHLD を処理し、ジョブ・プロセステーブルの状態を
/// 実際の `waitpid` 結果に合わせて更新する。
///
/// フラグは loop の前にクリアする: 途中で新しい SIGCHLD が届いても
/// 取りこぼさず、次回の呼び出しでもう一巡するだけで済む。
pub fn drain_sigchld(jobs: &mut JobTable, processes: &mut ProcessTable) {
    if !SIGCHLD_PENDING.swap(false, Ordering::SeqCst) {
        return;
    }

    loop {
        let mut status: i32 = 0;
        let pid: pid_t = unsafe {
            libc::waitpid(
                -1,
                &mut status,
                libc::WNOHANG | libc::WUNTRACED | libc::WCONTINUED,
            )
        };

        if pid <= 0 {
            break;
        }

        let pgid = match processes.pgid_of(pid) {
            Some(pgid) => pgid,
            None => continue,
        };

        let new_status = if libc::WIFEXITED(status) || libc::WIFSIGNALED(status) {
            Some(ProcessStatus::Done)
        } else if libc::WIFSTOPPED(status) {
            Some(ProcessStatus::Stopped)
        } else if libc::WIFCONTINUED(status) {
            Some(ProcessStatus::Running)
        } else {
            None
        };

        if let Some(new_status) = new_status {
            jobs.update_process_status(pgid, pid, new_status);
            if new_status == ProcessStatus::Done {
                processes.forget(pid);
            }
        }
    }
}
