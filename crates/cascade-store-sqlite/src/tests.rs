//! Integration tests for `SqliteStore` against an in-memory database.

use cascade_core::{NewParameter, store::ParameterStore};
use serde_json::{Value, json};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new(org_id: &str, path: &str, value: Value) -> NewParameter {
  NewParameter::new(org_id, path, value)
}

fn keys(paths: &[&str]) -> Vec<String> { paths.iter().map(|p| (*p).to_owned()).collect() }

fn sorted_paths(params: &[cascade_core::Parameter]) -> Vec<&str> {
  let mut paths: Vec<&str> = params.iter().map(|p| p.path.as_str()).collect();
  paths.sort_unstable();
  paths
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_returns_stored_rows_in_input_order() {
  let s = store().await;

  let stored = s
    .upsert_many(vec![new("org_X", "b", json!(1)), new("org_X", "a", json!(2))])
    .await
    .unwrap();

  assert_eq!(stored.len(), 2);
  assert_eq!(stored[0].path, "b");
  assert_eq!(stored[1].path, "a");
  assert!(stored.iter().all(|p| p.org_id == "org_X"));
  assert!(stored.iter().all(|p| p.created_at == p.updated_at));
}

#[tokio::test]
async fn upsert_replaces_value_and_keeps_created_at() {
  let s = store().await;

  let first = s.upsert_many(vec![new("org_X", "p", json!("old"))]).await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = s.upsert_many(vec![new("org_X", "p", json!("new"))]).await.unwrap();

  assert_eq!(second[0].value, json!("new"));
  assert_eq!(second[0].created_at, first[0].created_at);
  assert!(second[0].updated_at > first[0].updated_at);

  let found = s.find_by_keys("org_X", &keys(&["p"])).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].value, json!("new"));
}

#[tokio::test]
async fn empty_upsert_is_a_no_op() {
  let s = store().await;
  assert!(s.upsert_many(Vec::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn values_round_trip_losslessly() {
  let s = store().await;
  let values = [
    json!(null),
    json!(0),
    json!(-1.5),
    json!(""),
    json!("text with 'quotes' and \"escapes\""),
    json!([1, [2, [3]], { "k": null }]),
    json!({ "a": { "string_value": "s", "list_value": { "values": [{ "bool_value": false }] } } }),
  ];

  let rows = values
    .iter()
    .enumerate()
    .map(|(i, v)| new("org_X", &format!("v/{i}"), v.clone()))
    .collect();
  s.upsert_many(rows).await.unwrap();

  for (i, v) in values.iter().enumerate() {
    let found = s.find_by_keys("org_X", &[format!("v/{i}")]).await.unwrap();
    assert_eq!(&found[0].value, v);
  }
}

// ─── Find ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_by_keys_skips_missing() {
  let s = store().await;
  s.upsert_many(vec![new("org_X", "a", json!(1)), new("org_X", "b", json!(2))])
    .await
    .unwrap();

  let found = s.find_by_keys("org_X", &keys(&["a", "missing", "b"])).await.unwrap();
  assert_eq!(sorted_paths(&found), vec!["a", "b"]);

  assert!(s.find_by_keys("org_X", &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn find_by_keys_spans_chunks() {
  let s = store().await;
  let rows = (0..1200).map(|i| new("org_X", &format!("k/{i}"), json!(i))).collect();
  s.upsert_many(rows).await.unwrap();

  let wanted: Vec<String> = (0..1300).map(|i| format!("k/{i}")).collect();
  let found = s.find_by_keys("org_X", &wanted).await.unwrap();
  assert_eq!(found.len(), 1200);
}

#[tokio::test]
async fn paths_are_case_sensitive() {
  let s = store().await;
  s.upsert_many(vec![new("org_X", "Config", json!(1))]).await.unwrap();

  assert!(s.find_by_keys("org_X", &keys(&["config"])).await.unwrap().is_empty());
  assert!(s.find_by_pattern("org_X", "config*").await.unwrap().is_empty());
  assert_eq!(s.find_by_pattern("org_X", "Con*").await.unwrap().len(), 1);
}

#[tokio::test]
async fn pattern_matches_any_suffix() {
  let s = store().await;
  s.upsert_many(vec![
    new("org_X", "MYCONFIG.PARAM.A", json!(1)),
    new("org_X", "MYCONFIG.PARAM.B/site", json!(2)),
    new("org_X", "MYCONFIGURATION", json!(3)),
    new("org_X", "OTHER", json!(4)),
  ])
  .await
  .unwrap();

  let found = s.find_by_pattern("org_X", "MYCONFIG.*").await.unwrap();
  assert_eq!(sorted_paths(&found), vec!["MYCONFIG.PARAM.A", "MYCONFIG.PARAM.B/site"]);
}

#[tokio::test]
async fn only_the_first_star_is_a_wildcard() {
  let s = store().await;
  s.upsert_many(vec![
    new("org_X", "a-x*", json!(1)),
    new("org_X", "a-xy", json!(2)),
    new("org_X", "a?", json!(3)),
  ])
  .await
  .unwrap();

  let found = s.find_by_pattern("org_X", "a*x*").await.unwrap();
  assert_eq!(sorted_paths(&found), vec!["a-x*"]);

  assert!(s.find_by_pattern("org_X", "a?*").await.unwrap().len() == 1);
}

#[tokio::test]
async fn underscores_and_percents_are_literal() {
  let s = store().await;
  s.upsert_many(vec![new("org_X", "a_b", json!(1)), new("org_X", "axb", json!(2))])
    .await
    .unwrap();

  let found = s.find_by_pattern("org_X", "a_*").await.unwrap();
  assert_eq!(sorted_paths(&found), vec!["a_b"]);
  assert!(s.find_by_pattern("org_X", "%*").await.unwrap().is_empty());
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_reports_removed_rows() {
  let s = store().await;
  s.upsert_many(vec![new("org_X", "a", json!(1)), new("org_X", "b", json!(2))])
    .await
    .unwrap();

  assert_eq!(s.delete_by_keys("org_X", &keys(&["a", "missing"])).await.unwrap(), 1);
  assert_eq!(s.delete_by_keys("org_X", &keys(&["a"])).await.unwrap(), 0);
  assert_eq!(s.delete_by_keys("org_X", &[]).await.unwrap(), 0);

  let left = s.find_by_keys("org_X", &keys(&["a", "b"])).await.unwrap();
  assert_eq!(sorted_paths(&left), vec!["b"]);
}

// ─── Isolation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn organizations_do_not_see_each_other() {
  let s = store().await;
  s.upsert_many(vec![new("org_A", "p", json!("a")), new("org_B", "p", json!("b"))])
    .await
    .unwrap();

  let a = s.find_by_keys("org_A", &keys(&["p"])).await.unwrap();
  assert_eq!(a.len(), 1);
  assert_eq!(a[0].value, json!("a"));

  assert_eq!(s.find_by_pattern("org_B", "*").await.unwrap().len(), 1);
  assert_eq!(s.delete_by_keys("org_A", &keys(&["p"])).await.unwrap(), 1);
  assert_eq!(s.find_by_keys("org_B", &keys(&["p"])).await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_keys_are_rejected_by_the_schema() {
  let s = store().await;
  assert!(s.upsert_many(vec![new("org_X", "", json!(1))]).await.is_err());
  assert!(s.upsert_many(vec![new("", "p", json!(1))]).await.is_err());
}

// ─── Reopen ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_a_file_keeps_rows() {
  let dir = std::env::temp_dir().join(format!("cascade-store-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("reopen.db");
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.upsert_many(vec![new("org_X", "p", json!(1))]).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.find_by_keys("org_X", &keys(&["p"])).await.unwrap().len(), 1);

  drop(s);
  let _ = std::fs::remove_dir_all(&dir);
}
