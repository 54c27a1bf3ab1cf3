//! Name filtering and subplot grouping.

use std::collections::HashSet;
use std::fs;

use termplot::config::{PlotConfig, XAxisKind};
use termplot::source::{
    filter_names, guess_prefix, ConsolidatedStats, DataSource, SourceInput, SourceKind,
};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn prefix_stops_at_slash_then_underscore() {
    assert_eq!(guess_prefix("Loss/train"), "Loss");
    assert_eq!(guess_prefix("score_test"), "score");
    assert_eq!(guess_prefix("plain"), "plain");
    assert_eq!(guess_prefix("a_b/c"), "a_b");
}

#[test]
fn filtered_names_respect_both_lists() {
    let raw = names(&["loss/train", "loss/val", "acc/train", "lr", "acc/val"]);
    let whitelist = names(&["loss", "acc"]);
    let blacklist = names(&["val"]);
    let kept = filter_names(&raw, &whitelist, &blacklist, &HashSet::new());

    assert_eq!(kept, names(&["loss/train", "acc/train"]));
    for name in &kept {
        assert!(raw.contains(name));
        assert!(!blacklist.iter().any(|kw| name.contains(kw.as_str())));
        assert!(whitelist.iter().any(|kw| name.contains(kw.as_str())));
    }
}

#[test]
fn empty_whitelist_keeps_everything_not_blacklisted() {
    let raw = names(&["a", "b", "ab"]);
    let kept = filter_names(&raw, &[], &names(&["b"]), &HashSet::new());
    assert_eq!(kept, names(&["a"]));
}

#[test]
fn level_zero_keys_each_series_and_skips_the_x_axis() {
    let stats = ConsolidatedStats::build(names(&["step", "loss", "acc"]), 0, "step");
    let keys: Vec<&str> = stats.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["loss", "acc"]);
    assert!(stats.iter().all(|g| g.names == vec![g.key.clone()]));
}

#[test]
fn level_one_groups_by_prefix_in_first_appearance_order() {
    let stats = ConsolidatedStats::build(
        names(&["val_loss", "train/acc", "val_acc", "train/loss", "val_loss"]),
        1,
        "step",
    );
    assert_eq!(stats.len(), 2);
    assert_eq!(stats.groups[0].key, "val");
    assert_eq!(stats.groups[0].names, names(&["val_acc", "val_loss"]));
    assert_eq!(stats.groups[1].key, "train");
    assert_eq!(stats.groups[1].names, names(&["train/acc", "train/loss"]));
}

#[test]
fn level_two_flattens_into_one_group() {
    let stats = ConsolidatedStats::build(names(&["b", "a", "time"]), 2, "time");
    assert_eq!(stats.len(), 1);
    assert_eq!(stats.groups[0].key, "");
    assert_eq!(stats.groups[0].names, names(&["a", "b"]));
}

#[test]
fn stats_are_stable_without_new_data() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("m.csv");
    fs::write(&file, "loss/train,loss/val,acc\n1,2,3\n").expect("write");

    let config = PlotConfig {
        consolidate: 1,
        x_axis: XAxisKind::Step,
        ..PlotConfig::default()
    };
    let source = DataSource::open(
        SourceKind::Csv,
        &SourceInput::Path(file),
        &config,
        &HashSet::new(),
    )
    .expect("open");
    assert_eq!(source.consolidated_stats(), source.consolidated_stats());
    assert_eq!(source.consolidated_stats().len(), 2);
}
