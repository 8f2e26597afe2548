//! Multi-stage story generation.
//!
//! A strict Outline -> Draft -> Refine -> Persist state machine. Each
//! stage blocks on one oracle call, writes only its own field of the
//! shared [`WriterState`], and appends exactly one line to the stage
//! log; stages never revisit an earlier stage's output. There is no
//! branching and no retry - a stage failure aborts the run.

use crate::error::WriterError;
use crate::format::{clean_story_formatting, estimate_tokens, topic_slug, word_count};
use crate::oracle::{Oracle, OracleRequest};
use crate::tools::{Workspace, WriteMode};
use std::sync::Arc;

const OUTLINER_SYSTEM: &str =
    "You are a story outliner. Create concise, effective story structures.";
const DRAFTER_SYSTEM: &str =
    "You are a skilled creative fiction writer. Write vivid, emotionally resonant stories.";
const EDITOR_SYSTEM: &str =
    "You are an expert editor. Refine stories to exact specifications while maintaining voice and impact.";

/// Token targets for a pipeline run.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Deliberately over-length draft target.
    pub draft_tokens: usize,

    /// Final story target.
    pub target_tokens: usize,

    /// Acceptable deviation from the target.
    pub tolerance: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            draft_tokens: 600,
            target_tokens: 500,
            tolerance: 20,
        }
    }
}

/// Inputs gathered by the caller before a run.
#[derive(Debug, Clone)]
pub struct StoryInputs {
    /// The single topic this story focuses on.
    pub topic: String,

    /// Research brief text (best-effort prose).
    pub research: String,

    /// Personality traits, one per line, or a sentinel.
    pub personality: String,

    /// Emotional palette, one per line, or a sentinel.
    pub emotions: String,

    /// Relevant memory excerpt, or a sentinel.
    pub memories: String,

    /// Timestamp used in the story filename.
    pub timestamp: String,
}

/// State threaded through the pipeline. Owned by exactly one run.
#[derive(Debug, Clone)]
pub struct WriterState {
    pub inputs: StoryInputs,

    // Intermediate artifacts, each owned by one stage.
    pub outline: String,
    pub draft: String,
    pub refined: String,

    // Outputs.
    pub final_text: String,
    pub filename: String,

    /// Appended to by each stage, never overwritten.
    pub stage_log: Vec<String>,
}

impl WriterState {
    fn new(inputs: StoryInputs) -> Self {
        Self {
            inputs,
            outline: String::new(),
            draft: String::new(),
            refined: String::new(),
            final_text: String::new(),
            filename: String::new(),
            stage_log: Vec::new(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct StoryOutput {
    /// The persisted story text.
    pub story: String,

    /// Path the story was written to, relative to the project root.
    pub filename: String,

    /// One line per stage, in order.
    pub stage_log: Vec<String>,
}

/// The story pipeline.
pub struct WriterPipeline {
    oracle: Arc<dyn Oracle>,
    workspace: Arc<Workspace>,
    config: WriterConfig,
}

impl WriterPipeline {
    pub fn new(oracle: Arc<dyn Oracle>, workspace: Arc<Workspace>) -> Self {
        Self {
            oracle,
            workspace,
            config: WriterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the full pipeline and persist the story.
    pub async fn run(&self, inputs: StoryInputs) -> Result<StoryOutput, WriterError> {
        let mut state = WriterState::new(inputs);

        self.outline(&mut state).await?;
        self.draft(&mut state).await?;
        self.refine(&mut state).await?;
        self.persist(&mut state).await?;

        Ok(StoryOutput {
            story: state.final_text,
            filename: state.filename,
            stage_log: state.stage_log,
        })
    }

    async fn outline(&self, state: &mut WriterState) -> Result<(), WriterError> {
        let inputs = &state.inputs;
        let prompt = format!(
            "Create a brief story outline based on these elements:\n\n\
             Topic: {}\n\
             Research: {}\n\
             Personality: {}\n\
             Emotions: {}\n\
             Memories: {}\n\n\
             Instructions:\n\
             Create a 3-5 sentence outline for a {}-token story that:\n\
             - Has a clear narrative arc (beginning, development, climax, resolution)\n\
             - Focuses on the topic\n\
             - Channels 1-2 emotions authentically\n\
             - Will subtly weave in research insights\n\n\
             Return ONLY the outline, no explanations.",
            inputs.topic,
            inputs.research,
            inputs.personality,
            inputs.emotions,
            inputs.memories,
            self.config.target_tokens,
        );

        let request = OracleRequest::new(OUTLINER_SYSTEM, prompt)
            .with_temperature(0.6)
            .with_max_tokens(512);

        let outline = self
            .oracle
            .invoke(request)
            .await
            .map_err(|source| WriterError::Stage {
                stage: "outline",
                source,
            })?;

        state.outline = outline.trim().to_string();
        state
            .stage_log
            .push(format!("📝 Created story outline ({} words)", word_count(&state.outline)));
        Ok(())
    }

    async fn draft(&self, state: &mut WriterState) -> Result<(), WriterError> {
        let inputs = &state.inputs;
        let prompt = format!(
            "Write a complete story draft based on this outline and context.\n\n\
             Outline:\n{}\n\n\
             Topic: {}\n\
             Research Context: {}\n\
             Personality Traits: {}\n\
             Emotional Palette: {}\n\
             Relevant Memories: {}\n\n\
             Instructions:\n\
             Write a {}-token story draft (we'll refine to {}) that:\n\
             1. Follows the outline structure\n\
             2. Expresses personality traits through narrative voice\n\
             3. Channels 1-2 emotions authentically\n\
             4. Subtly references research insights\n\
             5. Uses vivid, concrete imagery\n\
             6. Shows, don't tell\n\
             7. Has a satisfying conclusion\n\n\
             Return ONLY the story text, no meta-commentary.",
            state.outline,
            inputs.topic,
            inputs.research,
            inputs.personality,
            inputs.emotions,
            inputs.memories,
            self.config.draft_tokens,
            self.config.target_tokens,
        );

        let request = OracleRequest::new(DRAFTER_SYSTEM, prompt)
            .with_temperature(0.7)
            .with_max_tokens(2048);

        let draft = self
            .oracle
            .invoke(request)
            .await
            .map_err(|source| WriterError::Stage {
                stage: "draft",
                source,
            })?;

        state.draft = draft.trim().to_string();
        let words = word_count(&state.draft);
        state.stage_log.push(format!(
            "✍️ Drafted story (~{} tokens, {} words)",
            estimate_tokens(&state.draft),
            words
        ));
        Ok(())
    }

    async fn refine(&self, state: &mut WriterState) -> Result<(), WriterError> {
        let prompt = format!(
            "Refine this story draft to exactly {target} tokens with perfect formatting.\n\n\
             Draft:\n{draft}\n\n\
             Instructions:\n\
             1. Edit to EXACTLY {target} tokens (±{tolerance} acceptable)\n\
             2. Fix any formatting issues:\n\
                - Ensure proper possessives (e.g., \"Solace's\" not \"Solaces\")\n\
                - Add em-dashes or commas where needed\n\
                - Fix any concatenated words\n\
                - Ensure proper spacing\n\
             3. Tighten prose (remove redundancy, sharpen language)\n\
             4. Strengthen opening hook and closing resonance\n\
             5. Ensure smooth flow between paragraphs\n\n\
             Return ONLY the refined story text.",
            target = self.config.target_tokens,
            tolerance = self.config.tolerance,
            draft = state.draft,
        );

        let request = OracleRequest::new(EDITOR_SYSTEM, prompt)
            .with_temperature(0.5)
            .with_max_tokens(2048);

        let refined = self
            .oracle
            .invoke(request)
            .await
            .map_err(|source| WriterError::Stage {
                stage: "refine",
                source,
            })?;

        // The oracle was asked to fix its artifacts; this pass is the
        // guarantee. Pure and oracle-independent.
        state.refined = clean_story_formatting(&refined);
        state.stage_log.push(format!(
            "🔧 Refined and formatted (~{} tokens, {} words)",
            estimate_tokens(&state.refined),
            word_count(&state.refined)
        ));
        Ok(())
    }

    async fn persist(&self, state: &mut WriterState) -> Result<(), WriterError> {
        let slug = topic_slug(&state.inputs.topic);
        let filename = format!("stories/{}_{}.txt", state.inputs.timestamp, slug);

        self.workspace
            .try_write(&filename, &state.refined, WriteMode::Overwrite)
            .await?;

        state.filename = filename.clone();
        state.final_text = state.refined.clone();
        state.stage_log.push(format!("💾 Saved to: {filename}"));
        Ok(())
    }
}
