use prism_evaluator::scoring::MLHandle;
use prism_evaluator::settings::settings;
use prism_evaluator::utils::{
    log_dimmed, log_error, log_header, log_ml_step, log_newline, EvaluationReport,
};
use prism_evaluator::{fallback_result, Evaluator, Question};
use std::env;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!("Usage: score-response <question.json> <answer...> [--json|-j]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <question.json>  Question file: {{\"text\": ..., \"expected_keywords\": [{{\"keyword\": ..., \"weight\": ...}}]}}");
    eprintln!("  <answer>         Candidate answer text (may be empty: \"\")");
    eprintln!("  --json           Print the raw evaluation result as JSON");
}

fn load_question(path: &str) -> Result<Question, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| format!("cannot parse {path}: {e}"))
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let json_output = args.iter().any(|a| a == "--json" || a == "-j");

    let positional: Vec<&String> = args
        .iter()
        .skip(1)
        .filter(|a| *a != "--json" && *a != "-j")
        .collect();

    let Some((question_path, answer_parts)) = positional.split_first() else {
        print_usage();
        process::exit(1);
    };
    if answer_parts.is_empty() {
        print_usage();
        process::exit(1);
    }

    let answer = answer_parts
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let question = match load_question(question_path) {
        Ok(q) => q,
        Err(e) => {
            log_error("[ERROR]", &e);
            process::exit(1);
        }
    };

    let s = settings();
    log_ml_step("Loading models...");
    log_dimmed("\u{2514}\u{2500} This may take a while on first run");
    let ml_handle = match MLHandle::spawn(s.ml.embedding_model) {
        Ok(handle) => handle,
        Err(e) => {
            log_error("[ERROR]", &format!("Failed to load ML models: {e}"));
            process::exit(1);
        }
    };

    let evaluator = Evaluator::with_models(ml_handle, s);
    let (result, fallback) =
        match evaluator.try_evaluate(Some(answer.as_str()), &question, evaluator.default_weights()) {
            Ok(result) => (result, false),
            Err(reason) => {
                log_error("[FALLBACK]", &reason.to_string());
                (fallback_result(&reason), true)
            }
        };

    if json_output {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                log_error("[ERROR]", &e.to_string());
                process::exit(1);
            }
        }
        return;
    }

    log_newline();
    log_header("Evaluation");
    EvaluationReport::new(&result, s.scoring.match_threshold)
        .fallback(fallback)
        .print();
}
