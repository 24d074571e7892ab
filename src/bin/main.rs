//! Offline analysis CLI.
//!
//! Each argument is one user turn. A report is generated first, then every
//! turn is answered against the user and assistant turns before it.
//! `--json` prints the full decision per turn; `--type` sets the leadership
//! type of the report.
//!
//!     coach --type 개별비전형 "안녕하세요" "팀원이 말을 안 들어요" "이미 다 해봤는데 안 돼요"

use link_coach_core::{
    coaching::{CoachingService, CoachingSession},
    config::Settings,
    lexicon::Lexicon,
    llm::MockGenerator,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let mut json = false;
    let mut leadership_type = "참여코칭형".to_string();
    let mut questions = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--type" => match args.next() {
                Some(value) => leadership_type = value,
                None => questions.clear(),
            },
            _ => questions.push(arg),
        }
    }

    if questions.is_empty() {
        eprintln!("usage: coach [--json] [--type <leadership type>] <question> [<question> ...]");
        std::process::exit(2);
    }

    let settings = Settings::from_env()?;
    let lexicon = match &settings.lexicon_path {
        Some(path) => Lexicon::from_json_file(path)?,
        None => Lexicon::builtin(),
    };
    info!(version = lexicon.version(), "Lexicon loaded");

    let service = CoachingService::new(Arc::new(lexicon), Arc::new(MockGenerator::new()));
    let report = service.generate_interpretation("cli", &leadership_type, None).await?;
    let mut session = CoachingSession::new(&report);

    for (turn, question) in questions.iter().enumerate() {
        let answer = session.ask(&service, question).await?;
        let decision = &answer.decision;

        if json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            let analysis = &decision.analysis;
            let traits: Vec<&str> = analysis.traits.iter().map(|t| t.label()).collect();

            println!("\n=== TURN {} ===", turn + 1);
            println!("Question:   {}", question);
            println!("Stage:      {}", analysis.stage);
            match analysis.offtopic_category {
                Some(category) => println!("Off-topic:  {}", category),
                None => println!("Off-topic:  -"),
            }
            println!("Traits:     {}", traits.join(", "));
            println!(
                "Emotion:    frustrated={} resistant={} positive={} urgent={}",
                analysis.emotion.frustrated,
                analysis.emotion.resistant,
                analysis.emotion.positive,
                analysis.emotion.urgent
            );
            println!("Context:    {}", analysis.requires_context);
            println!("Strategy:   {}", decision.strategy.strategy_key);
            println!(
                "Engagement: {} (consult: {})",
                decision.engagement.total, decision.engagement.should_suggest_consultation
            );
            println!("Answer:     {}", answer.answer);
        }
    }

    Ok(())
}
