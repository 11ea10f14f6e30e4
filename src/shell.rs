//! シェルの実行状態。
//!
//! REPL ループ全体で共有される 1 つのレコード。ジョブテーブル・プロセステーブル・
//! 変数テーブル・端末制御・直前の終了ステータスなどをまとめて保持する。

use crate::history::History;
use crate::job::JobTable;
use crate::process::ProcessTable;
use crate::terminal::TerminalController;
use crate::variables::VariableTable;

pub struct Shell {
    pub terminal: TerminalController,
    pub jobs: JobTable,
    pub processes: ProcessTable,
    pub variables: VariableTable,
    pub history: History,
    /// 直前のフォアグラウンドコマンドの終了ステータス。プロンプトと `$?` に使う。
    pub last_status: i32,
    /// `exit` ビルトインで true にセットされ、REPL ループを終了させる。
    pub should_exit: bool,
}

impl Shell {
    pub fn new() -> Self {
        let terminal =
            TerminalController::initialize().expect("failed to initialize controlling terminal");
        Self {
            terminal,
            jobs: JobTable::new(),
            processes: ProcessTable::new(),
            variables: VariableTable::from_environment(),
            history: History::new(),
            last_status: 0,
            should_exit: false,
        }
    }
}
