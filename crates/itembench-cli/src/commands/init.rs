//! The `itembench init` command.

use std::path::Path;

use anyhow::{Context, Result};

use itembench_providers::config::{CONFIG_FILE, SAMPLE_CONFIG};

const EXAMPLE_PROMPTS_FILE: &str = "prompts.jsonl";

pub fn execute() -> Result<()> {
    write_if_missing(Path::new(CONFIG_FILE), SAMPLE_CONFIG)?;
    write_if_missing(Path::new(EXAMPLE_PROMPTS_FILE), EXAMPLE_PROMPTS)?;

    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to point at your generation service");
    println!("  2. Run: itembench batch -i {EXAMPLE_PROMPTS_FILE}");
    println!("  3. Run: itembench eval");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const EXAMPLE_PROMPTS: &str = r#"{"type": "mcq", "grade": "5", "subject": "ela", "difficulty": "easy", "skills": {"substandard_id": "CCSS.ELA-LITERACY.RL.5.1"}}
{"type": "msq", "grade": "5", "subject": "ela", "difficulty": "medium", "skills": {"substandard_id": "CCSS.ELA-LITERACY.RL.5.2"}}
{"type": "fill-in", "grade": "5", "subject": "ela", "difficulty": "hard", "skills": {"substandard_id": "CCSS.ELA-LITERACY.L.5.4"}}
"#;
