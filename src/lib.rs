//! nsh ライブラリ — ベンチマーク・テスト用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//! この `lib.rs` は `benches/bench_main.rs` 等の外部クレートから
//! パーサー・ビルトイン・実行エンジンに直接アクセスするために存在する。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`editor`] | 行エディタ（raw モード、キー入力、バッファ操作、表示更新） |
//! | [`history`] | コマンド履歴（インメモリ、↑↓ ナビゲーション、最大 100 件） |
//! | [`complete`] | Tab 補完（コマンド名、ファイル名、`|` 後のコマンド位置認識） |
//! | [`highlight`] | シンタックスハイライト（ANSI カラー、PATH キャッシュ、`$VAR` 対応） |
//! | [`parser`] | 構文解析（パイプライン、リダイレクト、変数展開 `$VAR`、`&`） |
//! | [`executor`] | コマンド実行（fork/pipe/プロセスグループ/フォアグラウンド待機） |
//! | [`builtins`] | ビルトイン（`cd`, `pwd`, `echo`, `export`, `unset`, `set`, `env`, `exit`, `ls`, `cat`, `jobs`, `fg`, `bg`） |
//! | [`process`] | プロセステーブル（pid → pgid の検索インデックス） |
//! | [`job`] | ジョブテーブル（バックグラウンド実行、Ctrl+Z サスペンド、`fg`/`bg` 復帰） |
//! | [`terminal`] | 端末制御（制御プロセスグループの掌握・委譲） |
//! | [`signals`] | シグナルサブシステム（`SIGCHLD`/`SIGINT`/`SIGTSTP` ハンドラ、子の刈り取り） |
//! | [`variables`] | シェルローカル変数テーブル（`export` で OS 環境へ昇格） |
//! | [`shell`] | シェルのグローバル状態（終了ステータス、ジョブテーブル、プロセステーブル） |

pub mod builtins;
pub mod complete;
pub mod editor;
pub mod executor;
pub mod highlight;
pub mod history;
pub mod job;
pub mod parser;
pub mod process;
pub mod shell;
pub mod signals;
pub mod terminal;
pub mod variables;
