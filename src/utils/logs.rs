use console::{measure_text_width, Style};

use crate::service::ServiceStats;
use crate::settings::Settings;
use crate::types::{EvaluationResult, SentimentLabel};

pub const TREE_BRANCH: char = '\u{251C}';
pub const TREE_END: char = '\u{2514}';
pub const TREE_HORIZ: char = '\u{2500}';
pub const TREE_VERT: char = '\u{2502}';

const TREE_PREFIX_WIDTH: usize = 4;
const VALUE_COLUMN: usize = 25;

fn tree_branch() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_BRANCH, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_end() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_END, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_indent() -> String {
    dim().apply_to(format!("{}   ", TREE_VERT)).to_string()
}

fn tree_blank() -> String {
    " ".repeat(TREE_PREFIX_WIDTH)
}

pub fn dim() -> Style {
    Style::new().dim()
}

fn blue() -> Style {
    Style::new().blue()
}

fn magenta() -> Style {
    Style::new().magenta()
}

fn cyan() -> Style {
    Style::new().cyan()
}

fn green() -> Style {
    Style::new().green()
}

fn red() -> Style {
    Style::new().red()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn bold() -> Style {
    Style::new().bold()
}

fn init_prefix() -> String {
    blue().apply_to("[INIT]").to_string()
}

fn ml_prefix() -> String {
    yellow().apply_to("[ML]").to_string()
}

fn serve_prefix() -> String {
    magenta().apply_to("[SERVE]").to_string()
}

pub fn pad_label(label: &str, depth: usize) -> String {
    let prefix_width = depth * TREE_PREFIX_WIDTH;
    let target_width = VALUE_COLUMN.saturating_sub(prefix_width);
    let current_width = measure_text_width(label);
    if current_width < target_width {
        format!("{}{}", label, " ".repeat(target_width - current_width))
    } else {
        format!("{} ", label)
    }
}

fn score_style(score: f64) -> Style {
    if score >= 70.0 {
        green()
    } else if score >= 40.0 {
        yellow()
    } else {
        red()
    }
}

pub fn log_init(settings: &Settings) {
    eprintln!(
        "{} starting prism-evaluator with {}...",
        init_prefix(),
        cyan().apply_to(settings.ml.embedding_model),
    );
    eprintln!(
        "{} match threshold {}, weights {}/{}, keyword cache {}.",
        init_prefix(),
        bold().apply_to(settings.scoring.match_threshold),
        bold().apply_to(settings.scoring.weights.keyword),
        bold().apply_to(settings.scoring.weights.sentiment),
        if settings.cache.capacity > 0 {
            green().apply_to(format!("{} entries", settings.cache.capacity))
        } else {
            yellow().apply_to("disabled".to_string())
        }
    );
}

pub fn log_ml_step(message: &str) {
    eprintln!("{} {}", ml_prefix(), message);
}

pub fn log_ml_model_loaded(name: &str, seconds: f32) {
    eprintln!(
        "{}{} loaded {}",
        tree_end(),
        name,
        dim().apply_to(format!("({seconds:.1}s)"))
    );
}

pub fn log_ml_ready() {
    eprintln!("{} models ready!", ml_prefix());
}

pub fn log_ml_error(error: &str) {
    eprintln!("{} {} {}", ml_prefix(), red().apply_to("error:"), error);
}

pub fn log_probe_ok() {
    eprintln!("{} startup probe {}", ml_prefix(), green().apply_to("passed"));
}

pub fn log_serving(max_in_flight: usize) {
    eprintln!(
        "{} reading payloads from stdin ({} in flight max)",
        serve_prefix(),
        bold().apply_to(max_in_flight)
    );
}

pub fn log_service_summary(stats: &ServiceStats) {
    eprintln!("{} done.", serve_prefix());
    eprintln!(
        "{}{} {}",
        tree_branch(),
        pad_label("served", 1),
        bold().apply_to(stats.served)
    );
    let fallback_style = if stats.fallbacks > 0 { yellow() } else { dim() };
    eprintln!(
        "{}{} {}",
        tree_end(),
        pad_label("fallbacks", 1),
        fallback_style.apply_to(stats.fallbacks)
    );
}

pub fn log_header(title: &str) {
    println!("{}", bold().apply_to(title.to_uppercase()));
}

pub fn log_newline() {
    println!();
}

pub fn log_dimmed(message: &str) {
    println!("{}", dim().apply_to(message));
}

pub fn log_error(prefix: &str, message: &str) {
    eprintln!("{} {}", red().apply_to(prefix), message);
}

fn preview(text: &str) -> String {
    let preview = if text.chars().count() > 60 {
        format!("{}...", text.chars().take(57).collect::<String>())
    } else {
        text.to_string()
    };
    preview.replace('\n', " ")
}

/// Pretty tree view of one evaluation.
pub struct EvaluationReport<'a> {
    result: &'a EvaluationResult,
    threshold: f64,
    fallback: bool,
}

impl<'a> EvaluationReport<'a> {
    pub fn new(result: &'a EvaluationResult, threshold: f64) -> Self {
        Self {
            result,
            threshold,
            fallback: false,
        }
    }

    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn render(&self) -> String {
        let r = self.result;
        let mut lines: Vec<String> = Vec::new();

        lines.push(format!(
            "{} \"{}\"",
            magenta().apply_to(bold().apply_to("[EVALUATION]")),
            dim().apply_to(preview(&r.question))
        ));
        lines.push(format!("{}", dim().apply_to(format!("\"{}\"", preview(&r.response)))));

        lines.push(String::new());
        lines.push(format!("{}", bold().apply_to("KEYWORDS")));
        if r.feedback.keyword_detail.is_empty() {
            lines.push(format!("{}{}", tree_branch(), dim().apply_to("none")));
        } else {
            lines.push(format!("{}{}", tree_branch(), pad_label("similarity", 1)));
            let count = r.feedback.keyword_detail.len();
            for (i, (keyword, similarity)) in r.feedback.keyword_detail.iter().enumerate() {
                let branch = if i == count - 1 { tree_end() } else { tree_branch() };
                let style = if *similarity >= self.threshold { green() } else { dim() };
                lines.push(format!(
                    "{}{}{} {}",
                    tree_indent(),
                    branch,
                    pad_label(keyword, 2),
                    style.apply_to(format!("{similarity:.3}"))
                ));
            }
        }
        lines.push(format!(
            "{}{} {}",
            tree_branch(),
            pad_label("missing", 1),
            if r.feedback.missing_keywords.is_empty() {
                dim().apply_to("none".to_string())
            } else {
                yellow().apply_to(r.feedback.missing_keywords.join(", "))
            }
        ));
        lines.push(format!(
            "{}{} {}",
            tree_end(),
            pad_label("score", 1),
            score_style(r.scores.keyword).apply_to(format!("{:.2}", r.scores.keyword))
        ));

        lines.push(String::new());
        lines.push(format!("{}", bold().apply_to("SENTIMENT")));
        let label_style = match r.feedback.sentiment {
            SentimentLabel::Positive => green(),
            SentimentLabel::Neutral => dim(),
            SentimentLabel::Negative => red(),
        };
        lines.push(format!(
            "{}{} {}",
            tree_branch(),
            pad_label("label", 1),
            label_style.apply_to(r.feedback.sentiment)
        ));
        lines.push(format!(
            "{}{} {}",
            tree_end(),
            pad_label("score", 1),
            score_style(r.scores.sentiment).apply_to(format!("{:.2}", r.scores.sentiment))
        ));

        lines.push(String::new());
        lines.push(format!("{}", bold().apply_to("RESULT")));
        lines.push(format!("{}{}", tree_branch(), pad_label("weights", 1)));
        lines.push(format!(
            "{}{}{} {:.2}",
            tree_indent(),
            tree_branch(),
            pad_label("keyword", 2),
            r.scores.weights.keyword_weight
        ));
        lines.push(format!(
            "{}{}{} {:.2}",
            tree_indent(),
            tree_end(),
            pad_label("sentiment", 2),
            r.scores.weights.sentiment_weight
        ));
        lines.push(format!(
            "{}{} {}",
            tree_branch(),
            pad_label("final", 1),
            score_style(r.scores.final_score)
                .bold()
                .apply_to(format!("{:.2}", r.scores.final_score))
        ));
        let status = if self.fallback {
            red().bold().apply_to("FALLBACK")
        } else {
            green().bold().apply_to("SCORED")
        };
        lines.push(format!("{}{} {}", tree_branch(), pad_label("status", 1), status));
        lines.push(format!("{}{}", tree_end(), pad_label("suggestion", 1)));
        if r.feedback.suggestion.is_empty() {
            lines.push(format!("{}{}", tree_blank(), dim().apply_to("none")));
        } else {
            lines.push(format!("{}{}", tree_blank(), r.feedback.suggestion));
        }

        lines.join("\n")
    }

    pub fn print(&self) {
        println!("{}\n", self.render());
    }
}
