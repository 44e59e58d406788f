use serde_json::json;
use spark_tree::{path, tick, Node, Tree, Value};

fn store() -> Tree {
    Tree::from_json(json!({
        "user": { "name": "foo", "emailValidated": false, "authorizationLevel": 3 },
        "create": {
            "bgImage": {
                "base64url": null,
                "position": { "x": 100.34, "y": 32.32 },
                "base64export": null
            },
            "stations": [{ "title": "bar" }]
        },
        "server": { "isWaitingForServer": false, "lastServerAction": "USER_LOGIN_SUCCESS" }
    }))
}

#[test]
fn set_simple_value() {
    let tree = store();
    tree.root()["user"]["name"].set("ohnoes");
    tick();

    let root = tree.root();
    assert_eq!(root["user"]["name"].value().as_str(), Some("ohnoes"));
    assert_eq!(root.value().child(&"user".into()).unwrap(), json!({
        "name": "ohnoes", "emailValidated": false, "authorizationLevel": 3
    }));
}

#[test]
fn set_complex_object() {
    let tree = store();
    tree.root()["user"].set(json!({ "name": "what", "roles": ["admin"] }));
    tick();

    let user = &tree.root()["user"];
    assert_eq!(user.to_json(), json!({ "name": "what", "roles": ["admin"] }));
    assert_eq!(user["name"].value().as_str(), Some("what"));
    assert_eq!(user["roles"][0].value().as_str(), Some("admin"));
    assert_eq!(user["roles"].path(), &path!("user", "roles"));
    assert!(user.get("emailValidated").is_none());
}

#[test]
fn set_changes_kind() {
    let tree = store();
    tree.root()["user"]["name"].set(json!({ "first": "a", "last": "b" }));
    tree.root()["create"]["stations"].set("none");
    tick();

    let root = tree.root();
    assert_eq!(root["user"]["name"].len(), 2);
    assert_eq!(root["user"]["name"]["last"].value().as_str(), Some("b"));
    assert!(root["create"]["stations"].is_empty());
    assert_eq!(root["create"]["stations"].value().as_str(), Some("none"));
}

#[test]
fn update_receives_current_value() {
    let tree = store();
    tree.root()["user"]["authorizationLevel"].update(|v| (v.as_i64().unwrap_or(0) * 2).into());
    tree.root()["user"]["authorizationLevel"].update(|v| (v.as_i64().unwrap_or(0) + 1).into());
    tick();

    assert_eq!(tree.root()["user"]["authorizationLevel"].value().as_i64(), Some(7));
}

#[test]
fn update_runs_once_at_processing_time() {
    use std::cell::Cell;
    use std::rc::Rc;

    let tree = store();
    let runs = Rc::new(Cell::new(0));
    let runs_clone = runs.clone();
    tree.root()["server"]["isWaitingForServer"].update(move |v| {
        runs_clone.set(runs_clone.get() + 1);
        (!v.as_bool().unwrap_or(false)).into()
    });

    assert_eq!(runs.get(), 0);
    tick();
    assert_eq!(runs.get(), 1);
    tick();
    assert_eq!(runs.get(), 1);
    assert_eq!(tree.root()["server"]["isWaitingForServer"].value().as_bool(), Some(true));
}

#[test]
fn two_sets_before_a_tick() {
    let tree = store();
    let root = tree.root();
    root["user"]["name"].set("first");
    root["create"]["bgImage"]["position"]["x"].set(1);
    tick();

    let after = tree.root();
    assert_eq!(after["user"]["name"].value().as_str(), Some("first"));
    assert_eq!(after["create"]["bgImage"]["position"]["x"].value().as_i64(), Some(1));
    // The old snapshot still sees the old data in its own nodes
    assert!(!Node::ptr_eq(&root["user"]["name"], &after["user"]["name"]));
    assert_eq!(root["user"]["name"].value().as_str(), Some("foo"));
}

#[test]
fn push_to_array() {
    let tree = store();
    let stations = tree.root()["create"]["stations"].clone();
    stations.push(json!({ "title": "baz" }));
    stations.push(json!({ "title": "qux" }));
    tick();

    let stations = &tree.root()["create"]["stations"];
    assert_eq!(stations.len(), 3);
    assert_eq!(stations[2]["title"].value().as_str(), Some("qux"));
    assert_eq!(stations[1].path(), &path!("create", "stations", 1));
}

#[test]
fn push_then_set_new_item_in_same_batch() {
    let tree = store();
    let stations = tree.root()["create"]["stations"].clone();
    stations.push(json!({ "title": "baz" }));
    tree.set_at(path!("create", "stations", 1, "title"), "renamed");
    tick();

    assert_eq!(
        tree.root()["create"]["stations"].to_json(),
        json!([{ "title": "bar" }, { "title": "renamed" }])
    );
}

#[test]
fn root_set_and_push() {
    let tree = Tree::from_json(json!([1]));
    tree.root().push(2);
    tick();
    assert_eq!(tree.to_json(), json!([1, 2]));

    tree.root().set(json!({ "fresh": true }));
    tick();
    assert_eq!(tree.to_json(), json!({ "fresh": true }));
    assert!(tree.root().path().is_empty());
}

#[test]
fn input_is_copied() {
    let data = json!({ "list": [1, 2] });
    let tree = Tree::from_json(data.clone());
    tree.root()["list"].push(3);
    tick();

    assert_eq!(data, json!({ "list": [1, 2] }));
    assert_eq!(tree.to_json(), json!({ "list": [1, 2, 3] }));
}

#[test]
fn tree_from_raw_value_copies_it() {
    let list = spark_tree::List::from_vec(vec![Value::from(1)]);
    let tree = Tree::new(list.clone());
    assert!(!Value::is_identical(&tree.value(), &Value::List(list.clone())));

    // Edits on either side stay on that side
    list.push(Value::from(99));
    tree.root().push(2);
    tick();

    assert_eq!(tree.to_json(), json!([1, 2]));
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(1), Some(Value::from(99)));
}
