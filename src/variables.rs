//! シェルローカル変数テーブル。
//!
//! プロセス環境とは別物。`export` するまでは子プロセスに見えない。
//! 起動時にプロセス環境からシードされるが、以後は独立して変更できる。

use std::collections::HashMap;

/// 名前 -> 値 のシェルローカル変数テーブル。
pub struct VariableTable {
    vars: HashMap<String, String>,
}

impl VariableTable {
    /// 現在のプロセス環境からシードして新規作成する。
    pub fn from_environment() -> Self {
        let vars = std::env::vars().collect();
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// シェルローカル変数として設定する（環境には反映しない）。
    pub fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// 既存の変数をプロセス環境へ昇格する。未設定なら `false` を返す。
    pub fn export(&self, name: &str) -> bool {
        match self.vars.get(name) {
            Some(value) => {
                std::env::set_var(name, value);
                true
            }
            None => false,
        }
    }

    /// 変数テーブルとプロセス環境の両方から削除する。
    pub fn unset(&mut self, name: &str) {
        self.vars.remove(name);
        std::env::remove_var(name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut vars = VariableTable {
            vars: HashMap::new(),
        };
        vars.set("FOO", "bar");
        assert_eq!(vars.get("FOO"), Some("bar"));
    }

    #[test]
    fn export_fails_when_unset() {
        let vars = VariableTable {
            vars: HashMap::new(),
        };
        assert!(!vars.export("NOT_SET_ANYWHERE_XYZ"));
    }

    #[test]
    fn export_promotes_to_environment() {
        let mut vars = VariableTable {
            vars: HashMap::new(),
        };
        vars.set("NSH_TEST_EXPORT_VAR", "42");
        assert!(vars.export("NSH_TEST_EXPORT_VAR"));
        assert_eq!(
            std::env::var("NSH_TEST_EXPORT_VAR").as_deref(),
            Ok("42")
        );
        std::env::remove_var("NSH_TEST_EXPORT_VAR");
    }

    #[test]
    fn unset_removes_from_both() {
        let mut vars = VariableTable {
            vars: HashMap::new(),
        };
        vars.set("NSH_TEST_UNSET_VAR", "x");
        vars.export("NSH_TEST_UNSET_VAR");
        vars.unset("NSH_TEST_UNSET_VAR");
        assert_eq!(vars.get("NSH_TEST_UNSET_VAR"), None);
        assert!(std::env::var("NSH_TEST_UNSET_VAR").is_err());
    }
}
