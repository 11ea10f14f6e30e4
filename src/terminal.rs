//! 制御端末の所有権管理。
//!
//! シェル自身がプロセスグループのリーダーになり、起動時に端末のフォアグラウンド
//! プロセスグループを自分自身にする。フォアグラウンドジョブの実行前後で端末を
//! 貸し出し／回収する。

use std::io;

use libc::pid_t;

use crate::process::Pgid;

/// 端末の所有権を管理する。`shell_tty` は非対話時は無効な fd（-1）。
pub struct TerminalController {
    shell_tty: i32,
    shell_pgid: Pgid,
    interactive: bool,
}

impl TerminalController {
    /// 標準入力が端末であればシェルをプロセスグループリーダーにし、
    /// 端末のフォアグラウンドプロセスグループをシェル自身にする。
    pub fn initialize() -> io::Result<Self> {
        let shell_tty = libc::STDIN_FILENO;
        let interactive = unsafe { libc::isatty(shell_tty) } == 1;

        if !interactive {
            return Ok(Self {
                shell_tty,
                shell_pgid: unsafe { libc::getpid() },
                interactive: false,
            });
        }

        unsafe {
            // tcsetpgrp を呼ぶ前に、自分自身を SIGTTOU で止めないよう無視する。
            libc::signal(libc::SIGTTOU, libc::SIG_IGN);
            libc::signal(libc::SIGTTIN, libc::SIG_IGN);

            let mut shell_pgid = libc::getpgrp();
            while libc::getpid() != shell_pgid {
                if libc::setpgid(0, 0) < 0 {
                    return Err(io::Error::last_os_error());
                }
                shell_pgid = libc::getpgrp();
            }

            if libc::tcsetpgrp(shell_tty, shell_pgid) < 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Self {
                shell_tty,
                shell_pgid,
                interactive: true,
            })
        }
    }

    pub fn shell_pgid(&self) -> Pgid {
        self.shell_pgid
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn tty_fd(&self) -> i32 {
        self.shell_tty
    }

    /// 端末のフォアグラウンドプロセスグループを `pgid` に移す。
    pub fn give_to(&self, pgid: Pgid) {
        if !self.interactive || pgid <= 0 {
            return;
        }
        unsafe {
            libc::tcsetpgrp(self.shell_tty, pgid as pid_t);
        }
    }

    /// 端末をシェル自身に取り戻す。
    pub fn reclaim(&self) {
        if !self.interactive {
            return;
        }
        unsafe {
            libc::tcsetpgrp(self.shell_tty, self.shell_pgid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn give_to_noop_when_not_interactive() {
        let ctl = TerminalController {
            shell_tty: -1,
            shell_pgid: 1,
            interactive: false,
        };
        // 非対話時は何もせず、パニックしないことだけを確認する。
        ctl.give_to(123);
        ctl.reclaim();
    }

    #[test]
    fn give_to_noop_for_nonpositive_pgid() {
        let ctl = TerminalController {
            shell_tty: 0,
            shell_pgid: 1,
            interactive: true,
        };
        ctl.give_to(0);
        ctl.give_to(-1);
    }
}
