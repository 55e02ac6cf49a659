//! 依賴變更偵測

use std::cell::RefCell;

use derived_core::{GetValue, IsUnchanged, Object};

use crate::snapshot::SnapshotStore;

/// 檢查依賴是否變更
///
/// 逐一（依宣告順序）以取值策略讀取目前值，並以 `is_unchanged(舊值, 新值)`
/// 與快照比較。所有依賴都會被檢查，不提前結束；每個變更的依賴都會以新值的
/// 深層複本覆寫快照。任一依賴變更即回傳 `true`。
///
/// 呼叫使用者策略時不持有快照的借用，策略本身可以讀取同一個宿主。
pub fn needs_recompute(
    host: &Object,
    dependencies: &[String],
    snapshot: &RefCell<SnapshotStore>,
    get_value: &GetValue,
    is_unchanged: &IsUnchanged,
) -> bool {
    let mut changed = false;

    for dependency in dependencies {
        let current = get_value(host, dependency);
        let stored = snapshot.borrow().get(dependency);

        if !is_unchanged(&stored, &current) {
            tracing::trace!(dependency = %dependency, "依賴已變更");
            snapshot.borrow_mut().record(dependency, &current);
            changed = true;
        }
    }

    changed
}

/// 強制刷新所有依賴快照（首次計算或停用快取時），不呼叫比較策略
pub fn refresh_all(
    host: &Object,
    dependencies: &[String],
    snapshot: &RefCell<SnapshotStore>,
    get_value: &GetValue,
) {
    for dependency in dependencies {
        let current = get_value(host, dependency);
        snapshot.borrow_mut().record(dependency, &current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{default_get_value, default_is_unchanged};
    use derived_core::Value;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn dependencies(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn primed(host: &Object, names: &[String]) -> RefCell<SnapshotStore> {
        let snapshot = RefCell::new(SnapshotStore::new());
        refresh_all(host, names, &snapshot, &default_get_value());
        snapshot
    }

    #[test]
    fn test_unchanged_dependencies() {
        let host = Object::from_json(json!({ "dirname": "views", "ext": ".hbs" })).unwrap();
        let names = dependencies(&["dirname"]);
        let snapshot = primed(&host, &names);

        host.set("ext", ".html").unwrap();

        assert!(!needs_recompute(
            &host,
            &names,
            &snapshot,
            &default_get_value(),
            &default_is_unchanged()
        ));
    }

    #[test]
    fn test_every_changed_dependency_is_refreshed() {
        let host = Object::from_json(json!({ "a": 1, "b": 1, "c": 1 })).unwrap();
        let names = dependencies(&["a", "b", "c"]);
        let snapshot = primed(&host, &names);

        host.set("a", 2).unwrap();
        host.set("c", 3).unwrap();

        assert!(needs_recompute(
            &host,
            &names,
            &snapshot,
            &default_get_value(),
            &default_is_unchanged()
        ));

        let store = snapshot.borrow();
        assert_eq!(store.get("a"), Value::from(2));
        assert_eq!(store.get("b"), Value::from(1));
        assert_eq!(store.get("c"), Value::from(3));
    }

    #[test]
    fn test_no_short_circuit() {
        let host = Object::from_json(json!({ "a": 1, "b": 1 })).unwrap();
        let names = dependencies(&["a", "b"]);
        let snapshot = primed(&host, &names);

        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let always_changed: IsUnchanged = Rc::new(move |_old: &Value, _new: &Value| {
            counter.set(counter.get() + 1);
            false
        });

        assert!(needs_recompute(
            &host,
            &names,
            &snapshot,
            &default_get_value(),
            &always_changed
        ));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_comparison_receives_stored_then_current() {
        let host = Object::from_json(json!({ "count": 1 })).unwrap();
        let names = dependencies(&["count"]);
        let snapshot = primed(&host, &names);
        host.set("count", 2).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let record: IsUnchanged = Rc::new(move |old: &Value, new: &Value| {
            log.borrow_mut().push((old.clone(), new.clone()));
            true
        });

        assert!(!needs_recompute(
            &host,
            &names,
            &snapshot,
            &default_get_value(),
            &record
        ));
        assert_eq!(*seen.borrow(), vec![(Value::from(1), Value::from(2))]);
        // 未變更時不覆寫快照
        assert_eq!(snapshot.borrow().get("count"), Value::from(1));
    }

    #[test]
    fn test_fresh_objects_always_change_under_identity() {
        let host = Object::from_json(json!({ "nested": { "value": 1 } })).unwrap();
        let names = dependencies(&["nested"]);
        let snapshot = primed(&host, &names);

        // 快照為深層複本，身分與宿主上的物件不同
        assert!(needs_recompute(
            &host,
            &names,
            &snapshot,
            &default_get_value(),
            &default_is_unchanged()
        ));
    }
}
