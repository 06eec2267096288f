//! Startup check that the external programs can be found.

use crate::config::ToolsConfig;
use crate::errors::PipelineError;
use crate::pipeline::PipelineStage;

/// A program required by a stage that `which` could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTool {
    pub stage: PipelineStage,
    pub program: String,
}

/// Programs each stage shells out to.
pub fn required_programs(tools: &ToolsConfig, stage: PipelineStage) -> Vec<&str> {
    match stage {
        PipelineStage::Ingest => vec![tools.classifier.as_str()],
        PipelineStage::Synthesize => vec![tools.testbench.as_str()],
        PipelineStage::Simulate => vec![tools.compiler.as_str(), tools.runner.as_str()],
        PipelineStage::Render => vec![tools.extractor.as_str(), tools.renderer.as_str()],
    }
}

/// Look up every program the given stages need, warning once per missing
/// program. Never fatal: the affected modules simply fail their stage.
pub fn check_environment(
    tools: &ToolsConfig,
    stages: impl IntoIterator<Item = PipelineStage>,
) -> Vec<MissingTool> {
    let mut missing: Vec<MissingTool> = Vec::new();
    for stage in stages {
        for program in required_programs(tools, stage) {
            if missing.iter().any(|m| m.program == program) {
                continue;
            }
            if which::which(program).is_err() {
                let err = PipelineError::EnvironmentMissing {
                    tool: program.to_string(),
                };
                log::warn!("{err}; the {stage} stage will fail for every module");
                missing.push(MissingTool {
                    stage,
                    program: program.to_string(),
                });
            }
        }
    }
    missing
}
