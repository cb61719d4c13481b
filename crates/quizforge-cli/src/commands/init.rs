//! The `quizforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create quizforge.toml
    if std::path::Path::new("quizforge.toml").exists() {
        println!("quizforge.toml already exists, skipping.");
    } else {
        std::fs::write("quizforge.toml", SAMPLE_CONFIG)?;
        println!("Created quizforge.toml");
    }

    // Create example application file
    let example_path = std::path::Path::new("sample-app.json");
    if example_path.exists() {
        println!("sample-app.json already exists, skipping.");
    } else {
        std::fs::write(example_path, SAMPLE_APP)?;
        println!("Created sample-app.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizforge.toml with your API keys");
    println!("  2. Run: quizforge score --app sample-app.json --choices A,B");
    println!("  3. Run: quizforge generate --app sample-app.json --stream");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

default_provider = "zhipu"
default_model = "glm-4-flash"
cache_capacity = 1024
cache_idle_secs = 300

[providers.zhipu]
type = "zhipu"
api_key = "${ZHIPU_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
"#;

const SAMPLE_APP: &str = r#"{
  "app": {
    "id": 1,
    "name": "Arithmetic check",
    "description": "Third-grade arithmetic",
    "app_type": "graded"
  },
  "strategy": "custom_score",
  "questions": [
    {
      "title": "2 + 2 = ?",
      "options": [
        { "key": "A", "value": "4", "score": 10 },
        { "key": "B", "value": "5" }
      ]
    },
    {
      "title": "3 * 3 = ?",
      "options": [
        { "key": "A", "value": "6" },
        { "key": "B", "value": "9", "score": 10 }
      ]
    }
  ],
  "tiers": [
    { "app_id": 1, "score_threshold": 0, "result_name": "Needs practice", "result_desc": "Keep at it." },
    { "app_id": 1, "score_threshold": 10, "result_name": "Getting there", "result_desc": "One slipped through." },
    { "app_id": 1, "score_threshold": 20, "result_name": "Perfect", "result_desc": "Every answer correct." }
  ]
}
"#;
