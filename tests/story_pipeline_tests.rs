mod common;

use common::*;
use roadtale::models::{Fact, TasteProfile};
use std::collections::HashMap;

fn taste() -> TasteProfile {
    TasteProfile::default()
}

#[tokio::test]
async fn happy_path_speaks_then_goes_silent_for_same_user() {
    let poi = graph_poi("Q41225", "Big Ben", 300.0);
    let provider = StaticProvider::new("graph", vec![poi]);
    let mut graph_facts = HashMap::new();
    graph_facts.insert("Q41225".to_string(), fact_set(3, 9));
    let story = compliant_story();
    let llm = ScriptedLlm::new(&[story.as_str(), story.as_str()]);

    let harness = build_harness(vec![provider.clone()], graph_facts, llm);

    let first = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(first.decision.should_speak);
    assert_eq!(first.decision.reason, "ok");
    let enveloped = first.decision.poi.as_ref().unwrap();
    assert_eq!(enveloped.poi.label, "Big Ben");
    assert!(enveloped.facts.len() >= 2);
    assert!(enveloped.facts.len() <= 8);
    assert!(enveloped.facts.iter().any(|f| f.is_anchored()));
    assert!(!enveloped.story_text.is_empty());
    assert!(first.decision.distance_meters_approx.unwrap() % 50.0 < 1e-9);
    assert!(first.audio.is_some());
    assert_eq!(harness.tts.call_count(), 1);

    // The only candidate is now in the user's heard set
    let second = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();
    assert!(!second.decision.should_speak);
    assert_eq!(second.decision.reason, "no_strong_poi");
    assert!(second.audio.is_none());
}

#[tokio::test]
async fn heard_filter_is_per_user() {
    let poi = graph_poi("Q41225", "Big Ben", 300.0);
    let provider = StaticProvider::new("graph", vec![poi]);
    let mut graph_facts = HashMap::new();
    graph_facts.insert("Q41225".to_string(), fact_set(3, 9));
    let story = compliant_story();
    let llm = ScriptedLlm::new(&[story.as_str(), story.as_str()]);

    let harness = build_harness(vec![provider], graph_facts, llm);

    let first = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();
    assert!(first.decision.should_speak);

    // A different user still gets the story
    let other = harness
        .narrator
        .narrate(origin(), "u2", "en", &taste(), None)
        .await
        .unwrap();
    assert!(other.decision.should_speak);
}

#[tokio::test]
async fn weak_facts_walk_the_radius_ladder_and_stay_silent() {
    let poi = graph_poi("Q1", "Thin Place", 300.0);
    let provider = StaticProvider::new("graph", vec![poi]);
    let mut graph_facts = HashMap::new();
    // Plenty of POI, not enough facts
    graph_facts.insert("Q1".to_string(), fact_set(2, 5));
    let llm = ScriptedLlm::new(&[]);

    let harness = build_harness(vec![provider.clone()], graph_facts, llm);

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(!result.decision.should_speak);
    assert_eq!(result.decision.reason, "no_strong_poi");
    // One fetch per rung of the expanding-radius ladder
    assert_eq!(provider.call_count(), 4);
    assert_eq!(harness.tts.call_count(), 0);
}

#[tokio::test]
async fn model_no_story_skips_tts_and_history() {
    let poi = graph_poi("Q41225", "Big Ben", 300.0);
    let provider = StaticProvider::new("graph", vec![poi]);
    let mut graph_facts = HashMap::new();
    graph_facts.insert("Q41225".to_string(), fact_set(3, 9));
    let llm = ScriptedLlm::new(&["NO_STORY"]);

    let harness = build_harness(vec![provider], graph_facts, llm);

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(!result.decision.should_speak);
    assert_eq!(result.decision.reason, "model_no_story");
    assert!(result.audio.is_none());
    assert_eq!(harness.tts.call_count(), 0);
    // The POI stays eligible for a later attempt
    assert!(harness.history.heard_set("u1").await.is_empty());
}

#[tokio::test]
async fn short_draft_is_repaired_and_spoken() {
    let poi = graph_poi("Q41225", "Big Ben", 300.0);
    let provider = StaticProvider::new("graph", vec![poi]);
    let mut graph_facts = HashMap::new();
    graph_facts.insert("Q41225".to_string(), fact_set(3, 9));
    // First draft is below the minimum, the repair complies
    let story = compliant_story();
    let llm = ScriptedLlm::new(&["Too short in 1820.", story.as_str()]);

    let harness = build_harness(vec![provider], graph_facts, llm.clone());

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(result.decision.should_speak);
    let story = &result.decision.poi.as_ref().unwrap().story_text;
    assert_eq!(story, &compliant_story());

    // The second prompt was the corrective one, quoting reason and draft
    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("bad_length"));
    assert!(prompts[1].contains("Too short in 1820."));
}

#[tokio::test]
async fn failed_repair_prefers_silence() {
    let poi = graph_poi("Q41225", "Big Ben", 300.0);
    let provider = StaticProvider::new("graph", vec![poi]);
    let mut graph_facts = HashMap::new();
    graph_facts.insert("Q41225".to_string(), fact_set(3, 9));
    // Both drafts are too short
    let llm = ScriptedLlm::new(&["Still short 1820.", "Again short 1820."]);

    let harness = build_harness(vec![provider], graph_facts, llm);

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(!result.decision.should_speak);
    assert_eq!(result.decision.reason, "final_validation_failed_bad_length");
    assert_eq!(harness.tts.call_count(), 0);
    assert!(harness.history.heard_set("u1").await.is_empty());
}

#[tokio::test]
async fn one_failing_source_does_not_block_the_pipeline() {
    let osm = StaticProvider::failing("osm");
    let poi = graph_poi("Q90210", "Crown Fountain", 200.0);
    let graph = StaticProvider::new("graph", vec![poi]);
    let mut graph_facts = HashMap::new();
    graph_facts.insert("Q90210".to_string(), fact_set(4, 8));
    let story = compliant_story();
    let llm = ScriptedLlm::new(&[story.as_str()]);

    let harness = build_harness(vec![osm, graph], graph_facts, llm);

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(result.decision.should_speak);
    assert_eq!(result.decision.poi.unwrap().poi.source.to_string(), "graph");
}

#[tokio::test]
async fn all_sources_empty_means_no_strong_poi() {
    let osm = StaticProvider::new("osm", vec![]);
    let graph = StaticProvider::new("graph", vec![]);
    let llm = ScriptedLlm::new(&[]);

    let harness = build_harness(vec![osm, graph], HashMap::new(), llm);

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(!result.decision.should_speak);
    assert_eq!(result.decision.reason, "no_strong_poi");
}

#[tokio::test]
async fn sensitive_facts_are_dropped_from_the_story_inputs() {
    let poi = graph_poi("Q5", "Old Fortress", 250.0);
    let provider = StaticProvider::new("graph", vec![poi]);
    let mut facts = fact_set(3, 9);
    facts.push(Fact::from_sentence("The site was shelled during the war of 1948").unwrap());
    let mut graph_facts = HashMap::new();
    graph_facts.insert("Q5".to_string(), facts);
    let story = compliant_story();
    let llm = ScriptedLlm::new(&[story.as_str()]);

    let harness = build_harness(vec![provider], graph_facts, llm.clone());

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(result.decision.should_speak);
    for fact in &result.decision.poi.unwrap().facts {
        assert!(!fact.text.to_lowercase().contains("war"));
    }
    // The FACTS block handed to the generator is clean too
    let prompts = llm.prompts.lock().unwrap();
    assert!(!prompts[0].to_lowercase().contains("war of 1948"));
}

#[tokio::test]
async fn sensitive_filtering_can_fail_the_story_gate() {
    let poi = graph_poi("Q6", "Border Post", 250.0);
    let provider = StaticProvider::new("graph", vec![poi]);
    // Exactly 10 facts, one of which is sensitive: filtered set is 9
    let mut facts = fact_set(3, 6);
    facts.push(Fact::from_sentence("A massacre took place nearby in 1905").unwrap());
    assert_eq!(facts.len(), 10);
    let mut graph_facts = HashMap::new();
    graph_facts.insert("Q6".to_string(), facts);
    let llm = ScriptedLlm::new(&[]);

    let harness = build_harness(vec![provider], graph_facts, llm);

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(!result.decision.should_speak);
    assert_eq!(result.decision.reason, "no_strong_poi");
}

#[tokio::test]
async fn nearest_dense_candidate_wins() {
    let near_sparse = graph_poi("Q10", "Sparse Near", 150.0);
    let far_dense = graph_poi("Q11", "Dense Far", 420.0);
    let provider = StaticProvider::new("graph", vec![near_sparse, far_dense]);

    let mut graph_facts = HashMap::new();
    // Near one barely passes the gate; far one is much denser
    graph_facts.insert("Q10".to_string(), fact_set(2, 8));
    graph_facts.insert("Q11".to_string(), fact_set(8, 14));
    let story = compliant_story();
    let llm = ScriptedLlm::new(&[story.as_str()]);

    let harness = build_harness(vec![provider], graph_facts, llm);

    let result = harness
        .narrator
        .narrate(origin(), "u1", "en", &taste(), None)
        .await
        .unwrap();

    assert!(result.decision.should_speak);
    // 420m - (20*80 + 8*220) beats 150m - (10*80 + 2*220)
    assert_eq!(result.decision.poi.unwrap().poi.label, "Dense Far");
}
