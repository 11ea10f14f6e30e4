//! nsh — ジョブコントロール対応のRust製対話シェル
//!
//! REPLループ: プロンプト表示 → 入力読み取り → パース → 実行 → ループ
//!
//! 起動時に端末の制御プロセスグループを掌握し、`SIGCHLD`/`SIGINT`/`SIGTSTP`
//! のシェルハンドラをインストールしてからループに入る。

mod builtins;
mod complete;
mod editor;
mod executor;
mod highlight;
mod history;
mod job;
mod parser;
mod process;
mod shell;
mod signals;
mod terminal;
mod variables;

use editor::LineEditor;
use shell::Shell;

fn main() {
    let mut shell = Shell::new();

    if shell.terminal.is_interactive() {
        signals::install_shell_handlers();
    }

    let mut editor = LineEditor::new();

    loop {
        signals::drain_sigchld(&mut shell.jobs, &mut shell.processes);
        report_done_jobs(&mut shell);

        let prompt = if shell.last_status == 0 {
            "nsh$ ".to_string()
        } else {
            format!("[{}] nsh$ ", shell.last_status)
        };

        let line = match editor.read_line(&prompt) {
            Some(line) => line,
            None => break, // Ctrl+D (EOF)
        };

        editor.add_history(&line);
        shell.history.add(&line);

        let pipeline = match parser::parse(&line, &shell.variables) {
            Ok(Some(pipeline)) => pipeline,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("nsh: {}", e);
                shell.last_status = 2;
                continue;
            }
        };

        shell.last_status = executor::execute(&mut shell, pipeline);

        signals::drain_sigchld(&mut shell.jobs, &mut shell.processes);
        report_done_jobs(&mut shell);

        if shell.should_exit {
            break;
        }
    }

    std::process::exit(shell.last_status);
}

/// バックグラウンドジョブが完了したら次のプロンプトで一度だけ報告し、取り除く。
fn report_done_jobs(shell: &mut Shell) {
    for (id, command_line) in shell.jobs.take_done_unnotified() {
        println!("[{}]+  Done\t{}", id, command_line);
    }
    shell.jobs.remove_notified_done(&mut shell.processes);
}
