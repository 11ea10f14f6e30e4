//! パイプライン実行: fork/pipe/リダイレクト/プロセスグループ/フォアグラウンド待機。
//!
//! 単一コマンドが親プロセス限定ビルトインの場合のみ fork を経由しない。
//! それ以外はすべて fork した子プロセス側で実行する（子プロセスセーフな
//! ビルトインも、外部コマンドと同じ fork パスを通る）。

use std::ffi::CString;
use std::io;

use libc::{c_int, pid_t};

use crate::builtins;
use crate::job::JobStatus;
use crate::parser::{Command, Pipeline, RedirectKind};
use crate::process::{Pgid, ProcessStatus};
use crate::shell::Shell;
use crate::signals;

/// パイプラインを実行し、終了ステータスを返す。
pub fn execute(shell: &mut Shell, pipeline: Pipeline) -> i32 {
    if pipeline.commands.is_empty() {
        return shell.last_status;
    }

    if pipeline.commands.len() == 1 {
        let name = pipeline.commands[0].args[0].as_str();
        if builtins::is_parent_only(name) {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            return builtins::exec_parent_only(name, &pipeline.commands[0].args, shell, &mut lock);
        }
    }

    run_forked_pipeline(shell, pipeline)
}

fn run_forked_pipeline(shell: &mut Shell, pipeline: Pipeline) -> i32 {
    let n = pipeline.commands.len();
    let mut pipe_fds: Vec<(i32, i32)> = Vec::with_capacity(n.saturating_sub(1));
    for _ in 0..n.saturating_sub(1) {
        let mut fds = [0 as c_int; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
            eprintln!("nsh: pipe: {}", io::Error::last_os_error());
            return 1;
        }
        pipe_fds.push((fds[0], fds[1]));
    }

    signals::block_sigchld();

    let mut pids: Vec<pid_t> = Vec::with_capacity(n);
    let mut leader: Pgid = 0;

    for (i, command) in pipeline.commands.iter().enumerate() {
        let pid = unsafe { libc::fork() };
        if pid < 0 {
            eprintln!("nsh: fork: {}", io::Error::last_os_error());
            break;
        }

        if pid == 0 {
            signals::unblock_sigchld();
            signals::prepare_child(leader);

            if i > 0 {
                unsafe { libc::dup2(pipe_fds[i - 1].0, libc::STDIN_FILENO) };
            }
            if i < n.saturating_sub(1) {
                unsafe { libc::dup2(pipe_fds[i].1, libc::STDOUT_FILENO) };
            }
            for (read_fd, write_fd) in &pipe_fds {
                unsafe {
                    libc::close(*read_fd);
                    libc::close(*write_fd);
                }
            }

            if let Err(code) = apply_redirects(command) {
                unsafe { libc::_exit(code) };
            }

            run_child(command, &*shell);
        }

        // 子と親の両方で setpgid を呼び、次の fork までに必ず完了させる
        // （どちらが先に走っても結果は同じ）。
        let target_leader = if i == 0 { pid } else { leader };
        unsafe {
            libc::setpgid(pid, target_leader);
        }
        if i == 0 {
            leader = pid;
        }
        pids.push(pid);
    }

    for (read_fd, write_fd) in &pipe_fds {
        unsafe {
            libc::close(*read_fd);
            libc::close(*write_fd);
        }
    }

    if pids.is_empty() {
        signals::unblock_sigchld();
        return 1;
    }

    if pipeline.background {
        let job_id = shell.jobs.insert(leader, pipeline.command_line.clone());
        for pid in &pids {
            shell.jobs.attach_process(job_id, *pid, &mut shell.processes);
        }
        signals::unblock_sigchld();
        println!("[{}] PGID: {}", job_id, leader);
        0
    } else {
        signals::set_fg_pgid(leader);
        shell.terminal.give_to(leader);
        signals::unblock_sigchld();

        let status = foreground_wait(shell, leader, &pids, &pipeline.command_line);

        shell.terminal.reclaim();
        signals::set_fg_pgid(0);
        status
    }
}

/// 子プロセス側: リダイレクトを適用する。失敗したら子が `_exit` すべき終了コードを返す。
fn apply_redirects(command: &Command) -> Result<(), i32> {
    for redirect in &command.redirects {
        let target = match CString::new(redirect.target.as_str()) {
            Ok(c) => c,
            Err(_) => return Err(1),
        };

        let (flags, dst_fd) = match redirect.kind {
            RedirectKind::Output => (libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC, libc::STDOUT_FILENO),
            RedirectKind::Append => (libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND, libc::STDOUT_FILENO),
            RedirectKind::Input => (libc::O_RDONLY, libc::STDIN_FILENO),
        };

        let fd = unsafe { libc::open(target.as_ptr(), flags, 0o644) };
        if fd < 0 {
            eprintln!(
                "nsh: {}: {}",
                redirect.target,
                io::Error::last_os_error()
            );
            return Err(1);
        }
        unsafe {
            libc::dup2(fd, dst_fd);
            libc::close(fd);
        }
    }
    Ok(())
}

/// 子プロセス側: ビルトインまたは外部コマンドを実行して `_exit` する。戻らない。
fn run_child(command: &Command, shell: &Shell) -> ! {
    let name = command.args[0].as_str();

    if builtins::is_builtin(name) && !builtins::is_parent_only(name) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let status = builtins::exec_child_safe(name, &command.args, shell, &mut lock);
        unsafe { libc::_exit(status) };
    }

    exec_external(command);
}

fn exec_external(command: &Command) -> ! {
    let name = command.args[0].as_str();
    let c_args: Vec<CString> = command
        .args
        .iter()
        .map(|a| CString::new(a.as_str()).unwrap_or_default())
        .collect();
    let mut c_ptrs: Vec<*const libc::c_char> = c_args.iter().map(|a| a.as_ptr()).collect();
    c_ptrs.push(std::ptr::null());

    let c_name = match CString::new(name) {
        Ok(c) => c,
        Err(_) => unsafe { libc::_exit(127) },
    };

    unsafe {
        libc::execvp(c_name.as_ptr(), c_ptrs.as_ptr());
    }

    let err = io::Error::last_os_error();
    let code = if err.kind() == io::ErrorKind::NotFound {
        eprintln!("nsh: {}: command not found", name);
        127
    } else if err.kind() == io::ErrorKind::PermissionDenied {
        eprintln!("nsh: {}: permission denied", name);
        126
    } else {
        eprintln!("nsh: {}: {}", name, err);
        1
    };
    unsafe { libc::_exit(code) };
}

/// フォアグラウンド待機ループ。子が全て終了するか、途中で stop した場合に戻る。
/// stop が検出された時点で初めてジョブを作成し、それ以外は一切ジョブを作らない。
fn foreground_wait(shell: &mut Shell, pgid: Pgid, pids: &[pid_t], command_line: &str) -> i32 {
    let mut alive = pids.len();
    let mut job_id: Option<u32> = None;
    let mut last_status = 0;

    while alive > 0 {
        let mut status: c_int = 0;
        let pid = unsafe { libc::waitpid(-1, &mut status, libc::WUNTRACED) };

        if pid < 0 {
            let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
            if errno == libc::EINTR {
                continue;
            }
            break; // ECHILD 等
        }
        if pid == 0 {
            continue;
        }
        if !pids.contains(&pid) {
            continue; // 無関係なバックグラウンド子
        }

        if libc::WIFSTOPPED(status) {
            let id = *job_id.get_or_insert_with(|| {
                let id = shell.jobs.insert(pgid, command_line.to_string());
                for p in pids {
                    shell.jobs.attach_process(id, *p, &mut shell.processes);
                }
                id
            });
            shell.jobs.update_process_status(pgid, pid, ProcessStatus::Stopped);
            if let Some(job) = shell.jobs.find_by_id(id) {
                println!("\n[{}]+  Stopped\t{}", job.id, job.command_line);
            }
            last_status = 128 + libc::WSTOPSIG(status);
            break;
        } else if libc::WIFEXITED(status) || libc::WIFSIGNALED(status) {
            if libc::WIFEXITED(status) {
                last_status = libc::WEXITSTATUS(status);
            } else {
                last_status = 128 + libc::WTERMSIG(status);
            }
            if let Some(id) = job_id {
                shell.jobs.update_process_status(pgid, pid, ProcessStatus::Done);
                if shell.jobs.find_by_id(id).map(|j| j.status()) == Some(JobStatus::Done) {
                    shell.jobs.remove(id, &mut shell.processes);
                }
            } else {
                shell.processes.forget(pid);
            }
            alive -= 1;
        }
    }

    last_status
}

/// `fg` ビルトインから呼ぶ: 既に登録済みのジョブをフォアグラウンドで待つ。
pub fn wait_for_foreground_job(shell: &mut Shell, job_id: u32) -> i32 {
    let (pgid, command_line, pids) = match shell.jobs.find_by_id(job_id) {
        Some(job) => (
            job.pgid,
            job.command_line.clone(),
            job.processes.iter().map(|p| p.pid).collect::<Vec<_>>(),
        ),
        None => return 1,
    };

    let status = foreground_wait(shell, pgid, &pids, &command_line);

    if let Some(job) = shell.jobs.find_by_id(job_id) {
        if job.status() == JobStatus::Done {
            shell.jobs.remove(job_id, &mut shell.processes);
        }
    }

    status
}
