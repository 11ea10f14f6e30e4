//! ビルトインコマンドのディスパッチテーブル。
//!
//! 各ビルトインは「親プロセス限定」（シェル状態を変更するため fork せず直接呼ぶ）
//! と「子プロセスセーフ」（fork した子の中で実行してよい）の 2 種類に分かれる。
//! `exit` は一見子プロセスセーフに見えるが、`should_exit` はシェル自身の
//! プロセスでしか立てられないため常に親プロセス限定として扱う。
//! `jobs` も同様の理由で親プロセス限定とする: fork した子に見せるのは
//! 親のジョブテーブルのコピーに過ぎず、そこで `notified` を立てて取り除いても
//! 親側のテーブルには一切反映されず、Done なジョブが永遠に残ってしまう。

use std::io::Write;
use std::path::Path;

use crate::job::JobStatus;
use crate::process::ProcessStatus;
use crate::shell::Shell;

/// コマンド名がビルトインかどうかを判定する。
pub fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "cd" | "pwd"
            | "echo"
            | "export"
            | "unset"
            | "set"
            | "env"
            | "exit"
            | "ls"
            | "cat"
            | "jobs"
            | "fg"
            | "bg"
    )
}

/// このビルトインを fork せずシェルプロセス内で直接実行すべきか。
pub fn is_parent_only(name: &str) -> bool {
    matches!(
        name,
        "cd" | "fg" | "bg" | "set" | "unset" | "export" | "env" | "exit" | "jobs"
    )
}

/// 子プロセスセーフなビルトインを実行する。fork された子の中から呼ばれる。
pub fn exec_child_safe(name: &str, args: &[String], shell: &Shell, stdout: &mut dyn Write) -> i32 {
    match name {
        "pwd" => builtin_pwd(stdout),
        "echo" => builtin_echo(args, stdout),
        "ls" => builtin_ls(stdout),
        "cat" => builtin_cat(args, stdout),
        _ => unreachable!("{name} is not child-safe"),
    }
}

/// 親プロセス限定ビルトインを実行する。`shell` を直接変更してよい。
pub fn exec_parent_only(name: &str, args: &[String], shell: &mut Shell, stdout: &mut dyn Write) -> i32 {
    match name {
        "cd" => builtin_cd(args),
        "fg" => builtin_fg(args, shell, stdout),
        "bg" => builtin_bg(args, shell, stdout),
        "set" => builtin_set(args, shell),
        "unset" => builtin_unset(args, shell),
        "export" => builtin_export(args, shell),
        "env" => builtin_env(args, shell, stdout),
        "exit" => builtin_exit(args, shell),
        "jobs" => builtin_jobs(shell, stdout),
        _ => unreachable!("{name} is not parent-only"),
    }
}

// ── 子プロセスセーフなビルトイン ──────────────────────────────────────

fn builtin_pwd(stdout: &mut dyn Write) -> i32 {
    match std::env::current_dir() {
        Ok(dir) => {
            let _ = writeln!(stdout, "{}", dir.display());
            0
        }
        Err(e) => {
            eprintln!("pwd: {}", e);
            1
        }
    }
}

fn builtin_echo(args: &[String], stdout: &mut dyn Write) -> i32 {
    let mut words = &args[1..];
    let mut no_newline = false;
    if words.first().map(String::as_str) == Some("-n") {
        no_newline = true;
        words = &words[1..];
    }
    let _ = write!(stdout, "{}", words.join(" "));
    if !no_newline {
        let _ = writeln!(stdout);
    }
    0
}

fn builtin_ls(stdout: &mut dyn Write) -> i32 {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("ls: {}", e);
            return 1;
        }
    };
    let entries = match std::fs::read_dir(&cwd) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("ls: {}", e);
            return 1;
        }
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    for name in names {
        let _ = writeln!(stdout, "{}", name);
    }
    0
}

fn builtin_cat(args: &[String], stdout: &mut dyn Write) -> i32 {
    let files = &args[1..];
    if files.is_empty() {
        let mut buf = Vec::new();
        if std::io::Read::read_to_end(&mut std::io::stdin(), &mut buf).is_ok() {
            let _ = stdout.write_all(&buf);
        }
        return 0;
    }

    let mut status = 0;
    for file in files {
        match std::fs::read(Path::new(file)) {
            Ok(contents) => {
                let _ = stdout.write_all(&contents);
            }
            Err(e) => {
                eprintln!("cat: {}: {}", file, e);
                status = 1;
            }
        }
    }
    status
}

// ── 親プロセス限定ビルトイン ──────────────────────────────────────────

fn builtin_jobs(shell: &mut Shell, stdout: &mut dyn Write) -> i32 {
    for job in shell.jobs.iter_in_display_order() {
        let _ = writeln!(
            stdout,
            "[{}] PGID: {}  {}  ({})",
            job.id,
            job.pgid,
            job.status_str(),
            job.command_line
        );
    }
    // 上の一覧で Done 行は既に表示済みなので、通知済みにしてテーブルから取り除く。
    shell.jobs.take_done_unnotified();
    shell.jobs.remove_notified_done(&mut shell.processes);
    0
}

fn builtin_cd(args: &[String]) -> i32 {
    let target = if args.len() == 1 {
        match std::env::var("HOME") {
            Ok(home) => home,
            Err(_) => "/".to_string(),
        }
    } else {
        args[1].clone()
    };

    match std::env::set_current_dir(&target) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("cd: {}: {}", target, e);
            1
        }
    }
}

fn parse_job_ref(arg: &str) -> Option<u32> {
    arg.strip_prefix('%').unwrap_or(arg).parse().ok()
}

fn builtin_fg(args: &[String], shell: &mut Shell, stdout: &mut dyn Write) -> i32 {
    let job_id = match args.get(1) {
        Some(arg) => match parse_job_ref(arg) {
            Some(id) => id,
            None => {
                eprintln!("fg: invalid job id: {}", arg);
                return 1;
            }
        },
        None => match shell.jobs.most_recent_stopped() {
            Some(job) => job.id,
            None => {
                eprintln!("fg: no current job");
                return 1;
            }
        },
    };

    let (pgid, command_line) = match shell.jobs.find_by_id(job_id) {
        Some(job) => {
            if job.status() == JobStatus::Running && crate::signals::fg_pgid() == job.pgid {
                eprintln!("fg: job already in foreground");
                return 1;
            }
            (job.pgid, job.command_line.clone())
        }
        None => {
            eprintln!("fg: no such job");
            return 1;
        }
    };

    crate::signals::set_fg_pgid(pgid);
    if unsafe { libc::killpg(pgid, libc::SIGCONT) } < 0 {
        eprintln!("fg: kill: {}", std::io::Error::last_os_error());
        crate::signals::set_fg_pgid(0);
        return 1;
    }
    shell.terminal.give_to(pgid);
    shell.jobs.mark_all(job_id, ProcessStatus::Running);
    let _ = writeln!(stdout, "{}", command_line);

    let status = crate::executor::wait_for_foreground_job(shell, job_id);
    shell.terminal.reclaim();
    crate::signals::set_fg_pgid(0);
    status
}

fn builtin_bg(args: &[String], shell: &mut Shell, stdout: &mut dyn Write) -> i32 {
    let job_id = match args.get(1) {
        Some(arg) => match parse_job_ref(arg) {
            Some(id) => id,
            None => {
                eprintln!("bg: invalid job id: {}", arg);
                return 1;
            }
        },
        None => match shell.jobs.most_recent_stopped() {
            Some(job) => job.id,
            None => {
                eprintln!("bg: no current job");
                return 1;
            }
        },
    };

    let (pgid, command_line, status) = match shell.jobs.find_by_id(job_id) {
        Some(job) => (job.pgid, job.command_line.clone(), job.status()),
        None => {
            eprintln!("bg: no such job");
            return 1;
        }
    };

    if status != JobStatus::Stopped {
        println!("bg: job [{}] already running", job_id);
        return 1;
    }

    if unsafe { libc::killpg(pgid, libc::SIGCONT) } < 0 {
        eprintln!("bg: kill: {}", std::io::Error::last_os_error());
        return 1;
    }
    shell.jobs.mark_all(job_id, ProcessStatus::Running);
    let _ = writeln!(stdout, "[{}] {} &", job_id, command_line);
    0
}

fn builtin_set(args: &[String], shell: &mut Shell) -> i32 {
    if args.len() < 2 {
        eprintln!("set: invalid format, not enough arguments");
        return 1;
    }
    let mut status = 0;
    for arg in &args[1..] {
        match arg.split_once('=') {
            Some((name, value)) => shell.variables.set(name, value),
            None => {
                eprintln!("set: invalid format, use NAME=value");
                status = 1;
            }
        }
    }
    status
}

fn builtin_export(args: &[String], shell: &mut Shell) -> i32 {
    if args.len() < 2 {
        eprintln!("export: usage: export VAR or export VAR=value");
        return 1;
    }
    let mut status = 0;
    for arg in &args[1..] {
        if let Some((name, value)) = arg.split_once('=') {
            shell.variables.set(name, value);
            shell.variables.export(name);
        } else if !shell.variables.export(arg) {
            eprintln!("export: variable '{}' not found", arg);
            status = 1;
        }
    }
    status
}

fn builtin_unset(args: &[String], shell: &mut Shell) -> i32 {
    if args.len() < 2 {
        eprintln!("unset: usage: unset VAR");
        return 1;
    }
    for arg in &args[1..] {
        shell.variables.unset(arg);
    }
    0
}

fn builtin_env(args: &[String], shell: &mut Shell, stdout: &mut dyn Write) -> i32 {
    if args.len() > 1 {
        eprintln!("env: invalid format, too many arguments");
        return 1;
    }
    let mut pairs: Vec<(String, String)> = shell
        .variables
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    pairs.sort();
    for (name, value) in pairs {
        let _ = writeln!(stdout, "{}={}", name, value);
    }
    0
}

fn builtin_exit(args: &[String], shell: &mut Shell) -> i32 {
    shell.should_exit = true;
    match args.get(1) {
        Some(code) => code.parse().unwrap_or(shell.last_status),
        None => shell.last_status,
    }
}
