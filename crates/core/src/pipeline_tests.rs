// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn dependency_starts_unsatisfied() {
    let dep = PortDependency::new("d", "a", DependencyType::FinishToStart);
    assert!(!dep.satisfied);
}

#[test]
fn satisfy_flips_the_flag() {
    let mut dep = PortDependency::new("d", "a", DependencyType::FinishToStart);
    dep.satisfy();
    assert!(dep.satisfied);
}

#[test]
fn pipeline_tracks_group_order() {
    let mut pipeline = Pipeline::new("pipe-1", "feature pipeline", 3, 0);
    pipeline.add_port("a", 0);
    pipeline.add_port("b", 0);
    pipeline.add_port("d", 1);
    assert_eq!(pipeline.group_order_of("a"), Some(0));
    assert_eq!(pipeline.group_order_of("d"), Some(1));
    assert_eq!(pipeline.port_ids().count(), 3);
}
