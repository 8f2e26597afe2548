//! Run one full story session against the live APIs.
//!
//! Run with: `cargo run -p muse-core --example write_story [topic]`
//!
//! Requires ANTHROPIC_API_KEY and TAVILY_API_KEY to be set (a .env
//! file in the working directory is honored).

use muse_core::{Retrieved, SessionConfig, StorySession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let session = StorySession::new(SessionConfig::from_env(".")).await?;
    session.begin_run();

    // Pick the requested topic, or the first curated one.
    let topic = match std::env::args().nth(1) {
        Some(topic) => topic,
        None => match session.topics().retrieve().await {
            Retrieved::Items(items) => items[0].clone(),
            Retrieved::Empty { sentinel } => {
                eprintln!("{sentinel} Pass a topic as the first argument.");
                return Ok(());
            }
        },
    };

    println!("Researching: {topic}");
    let brief = session.research(&topic).await;
    println!("Queries: {:?}", brief.queries);

    let output = session.write_story(&topic, &brief).await?;
    println!("\n{}\n", output.story);
    for line in &output.stage_log {
        println!("{line}");
    }

    let evolution = session.evolve_identity(&topic, &output.story, &brief).await?;
    for summary in evolution.summaries() {
        println!("{summary}");
    }

    let report = session
        .remember(&format!("Wrote a story about {topic}"), "creative writing")
        .await?;
    println!("Memories: {}", report.memories.len());

    Ok(())
}
