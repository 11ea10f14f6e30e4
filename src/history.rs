//! コマンド履歴の管理。
//!
//! インメモリのみで、ファイルへの永続化は行わない。↑↓キーによるナビゲーションで
//! 過去のコマンドを呼び出せる。最大 100 件を超えると古いエントリから捨てる。
//!
//! ## ナビゲーション
//!
//! `nav_index` は `entries` のインデックスで、`entries.len()` は「現在の入力」を指す。
//! ↑で `nav_index` を減少、↓で増加し、末尾に到達すると `saved_buf`（保存した入力）を復元する。

/// コマンド履歴。エントリとナビゲーション状態だけを保持する（永続化なし）。
pub struct History {
    /// 履歴エントリのリスト（古い順）。
    entries: Vec<String>,
    /// 保持する最大エントリ数。
    max_size: usize,
    /// 現在のナビゲーション位置。`entries.len()` は「現在の入力」を意味する。
    nav_index: usize,
    /// ↑で履歴に入る前の入力バッファ。↓で末尾に戻ったときに復元する。
    saved_buf: String,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_size: 100,
            nav_index: 0,
            saved_buf: String::new(),
        }
    }

    /// エントリ追加。空行・直前との重複はスキップ。
    pub fn add(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if self.entries.last().map_or(false, |last| last == line) {
            return;
        }
        self.entries.push(line.to_string());
        if self.entries.len() > self.max_size {
            self.entries.remove(0);
        }
    }

    /// ナビゲーション状態をリセット（`read_line` 開始時に呼ぶ）。
    pub fn reset_nav(&mut self) {
        self.nav_index = self.entries.len();
        self.saved_buf.clear();
    }

    /// 現在の入力バッファを保存（初回 Up 時）。
    pub fn save_current(&mut self, buf: &str) {
        self.saved_buf = buf.to_string();
    }

    /// ナビゲーション位置が末尾（= まだ履歴に入っていない）か。
    pub fn at_end(&self) -> bool {
        self.nav_index == self.entries.len()
    }

    /// ↑: 一つ前のエントリを返す。先頭なら None。
    pub fn prev(&mut self) -> Option<&str> {
        if self.nav_index > 0 {
            self.nav_index -= 1;
            Some(&self.entries[self.nav_index])
        } else {
            None
        }
    }

    /// ↓: 一つ次のエントリを返す。末尾到達時は saved_buf を復元。
    pub fn next(&mut self) -> Option<&str> {
        if self.nav_index < self.entries.len() {
            self.nav_index += 1;
            if self.nav_index == self.entries.len() {
                Some(&self.saved_buf)
            } else {
                Some(&self.entries[self.nav_index])
            }
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_history(entries: &[&str]) -> History {
        History {
            entries: entries.iter().map(|s| s.to_string()).collect(),
            max_size: 100,
            nav_index: entries.len(),
            saved_buf: String::new(),
        }
    }

    #[test]
    fn prev_next_navigation() {
        let mut h = make_history(&["first", "second", "third"]);
        h.save_current("current");

        assert_eq!(h.prev(), Some("third"));
        assert_eq!(h.prev(), Some("second"));
        assert_eq!(h.prev(), Some("first"));
        assert_eq!(h.prev(), None);

        assert_eq!(h.next(), Some("second"));
        assert_eq!(h.next(), Some("third"));
        assert_eq!(h.next(), Some("current"));
        assert_eq!(h.next(), None);
    }

    #[test]
    fn add_skips_empty_and_duplicates() {
        let mut h = make_history(&[]);
        h.add("");
        assert!(h.entries.is_empty());

        h.add("  ");
        assert!(h.entries.is_empty());

        h.add("echo hello");
        assert_eq!(h.entries.len(), 1);

        h.add("echo hello");
        assert_eq!(h.entries.len(), 1); // duplicate skipped

        h.add("echo world");
        assert_eq!(h.entries.len(), 2);
    }

    #[test]
    fn caps_at_max_size() {
        let mut h = History::new();
        for i in 0..150 {
            h.add(&format!("cmd{}", i));
        }
        assert_eq!(h.entries.len(), 100);
        assert_eq!(h.entries.first().unwrap(), "cmd50");
        assert_eq!(h.entries.last().unwrap(), "cmd149");
    }

    #[test]
    fn at_end_and_save() {
        let mut h = make_history(&["a", "b"]);
        assert!(h.at_end());

        h.prev();
        assert!(!h.at_end());

        h.next();
        assert!(h.at_end());
    }

    #[test]
    fn reset_nav_goes_to_end() {
        let mut h = make_history(&["a", "b"]);
        h.prev();
        h.prev();
        assert_eq!(h.nav_index, 0);

        h.reset_nav();
        assert!(h.at_end());
    }
}
