//! Black-box coverage of the six resolve/order/schedule scenarios, driven
//! through the public API rather than through any internal module.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kiln::graph::provider_index::ProviderIndex;
use kiln::plugin::NoopHooks;
use kiln::scheduler::{self, Mode};
use kiln::{order, resolver, Error, GraphBuilder, Outcome};

#[test]
fn linear_chain_builds_leaves_first() {
    let mut builder = GraphBuilder::new();
    builder.declare("c").exists = Some("c.out".into());
    builder.declare("b").exists = Some("b.out".into());
    builder.declare("b").depends.push("c".into());
    builder.declare("a").exists = Some("a.out".into());
    builder.declare("a").depends.push("b".into());

    let graph = builder.build(&mut NoopHooks).unwrap();
    let index = ProviderIndex::build(&graph);
    let outcome = resolver::resolve(&graph, &index, &["a".to_string()]).unwrap();
    let sequence = order::order(&graph, &outcome.queue_set, &outcome.full_provides);

    assert_eq!(sequence, vec!["c".to_string(), "b".to_string(), "a".to_string()]);
}

#[test]
fn diamond_orders_shared_base_first_and_apex_last() {
    let mut builder = GraphBuilder::new();
    builder.declare("d").exists = Some("d.out".into());
    builder.declare("b").exists = Some("b.out".into());
    builder.declare("b").depends.push("d".into());
    builder.declare("c").exists = Some("c.out".into());
    builder.declare("c").depends.push("d".into());
    builder.declare("a").exists = Some("a.out".into());
    builder.declare("a").depends.push("b".into());
    builder.declare("a").depends.push("c".into());

    let graph = builder.build(&mut NoopHooks).unwrap();
    let index = ProviderIndex::build(&graph);
    let outcome = resolver::resolve(&graph, &index, &["a".to_string()]).unwrap();
    let sequence = order::order(&graph, &outcome.queue_set, &outcome.full_provides);

    assert_eq!(sequence.len(), 4);
    assert_eq!(sequence[0], "d");
    assert_eq!(sequence[3], "a");
    assert_eq!(&sequence[1..3], &["b".to_string(), "c".to_string()]);
}

#[test]
fn abstract_cover_is_satisfied_by_its_sole_provider() {
    let mut builder = GraphBuilder::new();
    builder.declare("feat");
    builder.declare("impl1").exists = Some("impl1.out".into());
    builder.declare("impl1").provides.push("feat".into());
    builder.declare("user").exists = Some("user.out".into());
    builder.declare("user").depends.push("feat".into());

    let graph = builder.build(&mut NoopHooks).unwrap();
    let index = ProviderIndex::build(&graph);
    let outcome = resolver::resolve(&graph, &index, &["user".to_string()]).unwrap();
    let sequence = order::order(&graph, &outcome.queue_set, &outcome.full_provides);

    assert_eq!(sequence, vec!["impl1".to_string(), "user".to_string()]);
    assert!(!sequence.contains(&"feat".to_string()));
}

#[test]
fn abstract_cover_orders_provider_before_consumer_regardless_of_name() {
    // Name order alone (aaa_user < zzz_impl) would put the consumer first;
    // depth must follow the provider through the abstract capability.
    let mut builder = GraphBuilder::new();
    builder.declare("feat");
    builder.declare("zzz_impl").exists = Some("zzz_impl.out".into());
    builder.declare("zzz_impl").provides.push("feat".into());
    builder.declare("aaa_user").exists = Some("aaa_user.out".into());
    builder.declare("aaa_user").depends.push("feat".into());

    let graph = builder.build(&mut NoopHooks).unwrap();
    let index = ProviderIndex::build(&graph);
    let outcome = resolver::resolve(&graph, &index, &["aaa_user".to_string()]).unwrap();
    let sequence = order::order(&graph, &outcome.queue_set, &outcome.full_provides);

    assert_eq!(sequence, vec!["zzz_impl".to_string(), "aaa_user".to_string()]);
}

#[test]
fn ambiguous_providers_report_candidate_set() {
    let mut builder = GraphBuilder::new();
    builder.declare("feat");
    builder.declare("impl1").exists = Some("impl1.out".into());
    builder.declare("impl1").provides.push("feat".into());
    builder.declare("impl2").exists = Some("impl2.out".into());
    builder.declare("impl2").provides.push("feat".into());
    builder.declare("user").exists = Some("user.out".into());
    builder.declare("user").depends.push("feat".into());

    let graph = builder.build(&mut NoopHooks).unwrap();
    let index = ProviderIndex::build(&graph);
    let err = resolver::resolve(&graph, &index, &["user".to_string()]).unwrap_err();

    match err {
        Error::Ambiguous(residual) => {
            let candidates = &residual["feat"];
            assert!(candidates.contains("impl1"));
            assert!(candidates.contains("impl2"));
        }
        other => panic!("expected Ambiguous, got {other:?}"),
    }
}

#[test]
fn essential_family_member_is_preferred_over_the_other_platform() {
    let mut builder = GraphBuilder::new();
    builder.declare("plat_a").exists = Some("plat_a.out".into());
    builder.mark_essential("plat_a");
    builder.declare("plat_b").exists = Some("plat_b.out".into());
    builder.mark_essential("plat_b");

    builder.declare("lib_a").exists = Some("lib_a.out".into());
    builder.declare("lib_a").depends.push("plat_a".into());
    builder.declare("lib_a").provides.push("feat".into());

    builder.declare("lib_b").exists = Some("lib_b.out".into());
    builder.declare("lib_b").depends.push("plat_b".into());
    builder.declare("lib_b").provides.push("feat".into());

    builder.declare("feat");

    builder.declare("user").exists = Some("user.out".into());
    builder.declare("user").depends.push("feat".into());
    builder.declare("user").depends.push("plat_a".into());

    let graph = builder.build(&mut NoopHooks).unwrap();
    let index = ProviderIndex::build(&graph);
    let outcome = resolver::resolve(&graph, &index, &["user".to_string()]).unwrap();

    assert!(outcome.queue_set.contains("lib_a"));
    assert!(!outcome.queue_set.contains("lib_b"));
    assert!(!outcome.queue_set.contains("plat_b"));
}

#[test]
fn up_to_date_target_skips_its_action_end_to_end() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let mut builder = GraphBuilder::new();
    builder.declare("src").exists = Some("src.out".into());
    builder.declare("art").exists = Some("art.out".into());
    builder.declare("art").depends.push("src".into());
    builder.set_action("art", Arc::new(move |_| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        Outcome::ok("built")
    }));

    let mut graph = builder.build(&mut NoopHooks).unwrap();
    // No filesystem probe in this test: both targets keep their load-time
    // timestamp of 0 except `art`, which we set newer than `src` directly
    // to model "already built and fresher than its dependency".
    graph.get_mut("src").unwrap().timestamp = 1.0;
    graph.get_mut("art").unwrap().timestamp = 2.0;

    let index = ProviderIndex::build(&graph);
    let outcome = resolver::resolve(&graph, &index, &["art".to_string()]).unwrap();
    let sequence = order::order(&graph, &outcome.queue_set, &outcome.full_provides);
    let report = scheduler::run(&mut graph, &sequence, Mode::Build, false);

    assert!(report.success);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.results.last().unwrap().message, "up to date");
}
