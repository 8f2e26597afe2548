//! End-to-end scenario tests for the story engine.
//!
//! These run the full session surface against scripted capabilities -
//! no API keys, no network. Each test mirrors one contract the engine
//! has to hold whatever the oracle returns.

use muse_core::testing::{ScriptedOracle, ScriptedSearch};
use muse_core::{
    ConsolidateOutcome, CuratorRole, ResearchBrief, Retrieved, SessionConfig, StorySession,
    WriteMode, Workspace, CORE_EMOTIONS, NO_RELEVANT_MEMORIES,
};
use std::sync::Arc;
use tempfile::TempDir;

async fn scripted_session(dir: &TempDir, oracle: Arc<ScriptedOracle>) -> StorySession {
    StorySession::with_components(
        SessionConfig::new(dir.path()),
        oracle,
        Arc::new(ScriptedSearch::new()),
    )
    .await
    .expect("session should open on an empty project")
}

fn write_identity_file(dir: &TempDir, name: &str, lines: &[&str]) {
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(dir.path().join(name), content).unwrap();
}

// ============================================================================
// Scenario: core phrases survive a hostile rewrite
// ============================================================================

#[tokio::test]
async fn emotions_evolution_keeps_core_and_clamps() {
    let dir = TempDir::new().unwrap();
    write_identity_file(
        &dir,
        "emotions.txt",
        &[
            "Wonder and curiosity",
            "Melancholy hope",
            "Quiet intensity",
            "Soft grief",
            "Sharp delight",
        ],
    );

    let oracle = Arc::new(ScriptedOracle::new());
    // Seven novel lines, none of the protected core.
    oracle.queue(
        "Fierce longing\nRestless awe\nBitter nostalgia\nGentle defiance\n\
         Electric dread\nWeightless joy\nSlow burning anger",
    );

    let session = scripted_session(&dir, oracle).await;
    let report = session
        .emotions()
        .evolve("Story just written:\nThe tide pulled back.")
        .await
        .unwrap();

    assert_eq!(report.items.len(), 5);
    for phrase in CORE_EMOTIONS {
        assert!(report.items.iter().any(|i| i == phrase));
    }
    let novel_kept = report
        .items
        .iter()
        .filter(|i| ["Fierce longing", "Restless awe"].contains(&i.as_str()))
        .count();
    assert_eq!(novel_kept, 2);

    // And the file on disk agrees with the returned list.
    let on_disk = std::fs::read_to_string(dir.path().join("emotions.txt")).unwrap();
    let disk_items: Vec<&str> = on_disk.lines().collect();
    assert_eq!(disk_items, report.items);
}

// ============================================================================
// Scenario: empty stores answer with sentinels
// ============================================================================

#[tokio::test]
async fn empty_identity_yields_sentinels() {
    let dir = TempDir::new().unwrap();
    let session = scripted_session(&dir, Arc::new(ScriptedOracle::new())).await;

    match session.topics().retrieve().await {
        Retrieved::Empty { sentinel } => assert_eq!(sentinel, "No topics defined yet."),
        Retrieved::Items(items) => panic!("expected sentinel, got {items:?}"),
    }

    assert_eq!(session.recall("anything").await, NO_RELEVANT_MEMORIES);
}

// ============================================================================
// Scenario: memory store is never a no-op
// ============================================================================

#[tokio::test]
async fn memory_store_falls_back_to_raw_experience() {
    let dir = TempDir::new().unwrap();
    let oracle = Arc::new(ScriptedOracle::new());
    oracle.queue("Instructions:\n\nReturn the list below:\n"); // nothing usable

    let session = scripted_session(&dir, oracle).await;
    let report = session
        .remember("Learned about tidal locking", "astronomy")
        .await
        .unwrap();

    assert!(report.used_fallback);
    assert_eq!(report.memories, vec!["Learned about tidal locking"]);
}

#[tokio::test]
async fn memory_ceiling_holds_across_many_stores() {
    let dir = TempDir::new().unwrap();
    let oracle = Arc::new(ScriptedOracle::new());
    // Every store call fails, so each one appends its raw line.
    for _ in 0..30 {
        oracle.queue_failure();
    }

    let session = scripted_session(&dir, oracle).await;
    for i in 0..30 {
        let report = session
            .remember(&format!("Experience number {i}"), "")
            .await
            .unwrap();
        assert!(report.memories.len() <= 20, "ceiling broken at store {i}");
        assert_eq!(
            report.memories.last().map(String::as_str),
            Some(format!("Experience number {i}").as_str()),
            "newest experience must always land"
        );
    }

    assert_eq!(session.memory().len().await, 20);
}

#[tokio::test]
async fn consolidate_refuses_small_stores() {
    let dir = TempDir::new().unwrap();
    write_identity_file(
        &dir,
        "memories.txt",
        &["one", "two", "three", "four", "five"],
    );

    let session = scripted_session(&dir, Arc::new(ScriptedOracle::new())).await;
    let outcome = session.consolidate().await.unwrap();

    assert_eq!(outcome, ConsolidateOutcome::NotEnough { count: 5 });
    assert_eq!(session.memory().len().await, 5);
}

// ============================================================================
// Scenario: the write -> evolve cycle end to end
// ============================================================================

#[tokio::test]
async fn full_story_cycle_with_scripted_oracle() {
    let dir = TempDir::new().unwrap();
    write_identity_file(&dir, "topics.txt", &["tidal locking", "slime molds"]);
    write_identity_file(
        &dir,
        "emotions.txt",
        &["Wonder and curiosity", "Melancholy hope", "Quiet intensity", "Soft grief"],
    );
    write_identity_file(&dir, "personality.txt", &["wry", "precise", "tender"]);

    let oracle = Arc::new(ScriptedOracle::new());
    // research: plan + synthesis
    oracle.queue(r#"["tidal locking exoplanets", "tidal locking habitability"]"#);
    oracle.queue("SUMMARY:\nLocked worlds keep one face to their star.\n\nKEY_FACTS:\n- Twilight bands may host life\n\nDISCOVERED_TOPICS:\n- Terminator ecosystems");
    // write_story: memory is empty so retrieval answers locally, then
    // the three oracle stages run in order
    oracle.queue("A keeper tends the last lighthouse on the twilight band.");
    oracle.queue("The keeper climbed toward the violet sky, remembering water.");
    oracle.queue("The keeper climbed toward the violet sky.");
    // evolve_identity: topics, emotions, personality
    oracle.queue("terminator ecosystems\nslime molds\ndeep sea vents\nauroras\nfungal networks");
    oracle.queue("Wonder and curiosity\nMelancholy hope\nQuiet intensity\nWeightless joy");
    oracle.queue("wry\nprecise\ntender\nspare\npatient\nvivid\nsly\nhonest\nwarm\nplain spoken");
    // remember
    oracle.queue("Wrote about a lighthouse keeper on a tidally locked world");

    let session = scripted_session(&dir, oracle).await;
    session.begin_run();

    let brief = session.research("tidal locking").await;
    assert_eq!(brief.queries.len(), 2);
    assert!(brief.summary().contains("one face"));

    let output = session.write_story("tidal locking", &brief).await.unwrap();
    assert_eq!(output.story, "The keeper climbed toward the violet sky.");
    assert_eq!(output.stage_log.len(), 4);

    let evolution = session
        .evolve_identity("tidal locking", &output.story, &brief)
        .await
        .unwrap();
    assert_eq!(evolution.topics.items.len(), 5);
    assert_eq!(evolution.emotions.items.len(), 4);
    assert_eq!(evolution.personality.items.len(), 10);

    let report = session
        .remember("Wrote about tidal locking", "creative writing")
        .await
        .unwrap();
    assert_eq!(report.memories.len(), 1);

    // Every mutated file is persisted one item per line.
    let topics = std::fs::read_to_string(dir.path().join("topics.txt")).unwrap();
    assert_eq!(topics.lines().count(), 5);
    assert!(topics.ends_with('\n'));
}

// ============================================================================
// Scenario: the file capability holds its boundary
// ============================================================================

#[tokio::test]
async fn workspace_refuses_escapes_and_roundtrips() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());

    let refusal = ws.write("/etc/passwd", "x", WriteMode::Overwrite).await;
    assert!(refusal.starts_with("Refusing"));

    let refusal = ws.read("../secrets.txt").await;
    assert!(refusal.contains("outside the project directory"));

    ws.write("stories/x.txt", "exactly this", WriteMode::Overwrite)
        .await;
    assert_eq!(ws.read("stories/x.txt").await, "exactly this");
}

// ============================================================================
// Scenario: curator roles carry their configured shapes
// ============================================================================

#[tokio::test]
async fn curator_roles_expose_expected_policies() {
    assert_eq!(CuratorRole::Topics.limits().min, 5);
    assert_eq!(CuratorRole::Topics.limits().max, 6);
    assert!(CuratorRole::Topics.core().is_empty());

    assert_eq!(CuratorRole::Emotions.limits().min, 4);
    assert_eq!(CuratorRole::Emotions.limits().max, 5);
    assert_eq!(CuratorRole::Emotions.core().len(), 3);

    assert_eq!(CuratorRole::Personality.limits().min, 10);
    assert_eq!(CuratorRole::Personality.limits().max, 12);
    assert!(CuratorRole::Personality.core().is_empty());
}

// ============================================================================
// Scenario: research never consumes a brief it didn't earn
// ============================================================================

#[tokio::test]
async fn research_brief_reaches_topic_evolution() {
    let dir = TempDir::new().unwrap();
    write_identity_file(
        &dir,
        "topics.txt",
        &["one", "two", "three", "four", "five"],
    );

    let oracle = Arc::new(ScriptedOracle::new());
    oracle.queue("alpha\nbeta\ngamma\ndelta\nepsilon");

    let session = scripted_session(&dir, oracle.clone()).await;
    let brief = ResearchBrief {
        topic: "moths".to_string(),
        queries: vec![],
        raw: "KEY_FACTS:\n- moths navigate by the moon".to_string(),
    };

    session
        .evolve_identity("moths", "a story about moths", &brief)
        .await
        .unwrap();

    let requests = oracle.requests();
    assert!(requests[0].prompt.contains("moths navigate by the moon"));
    assert!(requests[0].prompt.contains("Just explored: moths"));
}
