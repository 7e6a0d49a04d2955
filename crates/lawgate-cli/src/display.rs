//! Vertical card display for verdicts.
//!
//! One card per feature, grouped into decision, regulations, implementation
//! notes and reasoning sections.

use lawgate_core::{RegulationEntry, RetrievalResult, Verdict};
use lawgate_store::RetrievalMode;

const MAX_LIST_ITEMS: usize = 10;
const EXCERPT_CHARS: usize = 120;

// ── Public API ──

pub fn print_verdict_card(verdict: &Verdict) {
    println!("=== {} ===", verdict.feature_name);
    println!("{}", verdict.feature_id);
    println!();

    println!("Decision");
    for (label, value) in decision_rows(verdict) {
        println!("  {label:<26} {value}");
    }
    println!();

    if !verdict.applicable_regulations.is_empty() {
        let regs = &verdict.applicable_regulations;
        println!("Regulations ({})", regs.len());
        for reg in regs.iter().take(MAX_LIST_ITEMS) {
            println!("  {}", regulation_line(reg));
            for req in &reg.requirements {
                println!("      - {req}");
            }
        }
        if regs.len() > MAX_LIST_ITEMS {
            println!("  ... and {} more", regs.len() - MAX_LIST_ITEMS);
        }
        println!();
    }

    print_lines("Implementation Notes", &verdict.implementation_notes);
    print_lines("Reasoning", &verdict.reasoning);
}

pub fn print_batch_summary(verdicts: &[Verdict]) {
    let needs = verdicts.iter().filter(|v| v.needs_compliance_logic).count();
    let review = verdicts.iter().filter(|v| v.human_review_needed).count();
    println!("Summary");
    println!("  {:<26} {}", "features", verdicts.len());
    println!("  {:<26} {needs}", "need compliance logic");
    println!("  {:<26} {review}", "need human review");
    for v in verdicts {
        println!(
            "  {:<26} {:<22} {}",
            truncate(&v.feature_name, 26),
            v.action_required.as_str(),
            v.risk_level.as_str()
        );
    }
}

pub fn print_search_results(mode: RetrievalMode, query: &str, results: &RetrievalResult) {
    println!("{} result(s) for {query:?} ({mode} retrieval)", results.len());
    println!();
    for (rank, scored) in results.iter().enumerate() {
        let doc = &scored.document;
        let jurisdiction = doc.jurisdiction.as_deref().unwrap_or("-");
        println!(
            "{:>2}. {:.3}  {}  [{}, {}]",
            rank + 1,
            scored.score,
            doc.title,
            jurisdiction,
            doc.content_type.as_str()
        );
        println!("      {}", doc.excerpt(EXCERPT_CHARS));
    }
}

// ── Formatting ──

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

fn decision_rows(v: &Verdict) -> Vec<(&'static str, String)> {
    vec![
        ("needs compliance logic", yes_no(v.needs_compliance_logic).to_string()),
        ("risk level", v.risk_level.as_str().to_string()),
        ("action required", v.action_required.as_str().to_string()),
        ("human review", yes_no(v.human_review_needed).to_string()),
        ("confidence", format!("{:.2}", v.confidence)),
        ("agent consensus", format!("{:.2}", v.agent_consensus)),
        ("agents", format!("{}/{}", v.successful_agents, v.total_agents)),
        ("analyzed at", v.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    ]
}

fn regulation_line(reg: &RegulationEntry) -> String {
    let mut tags = Vec::new();
    if let Some(j) = &reg.jurisdiction {
        tags.push(j.clone());
    }
    if let Some(risk) = reg.risk {
        tags.push(format!("{risk} risk"));
    }
    if let Some(rel) = reg.relevance {
        tags.push(format!("relevance {rel:.2}"));
    }
    if tags.is_empty() {
        format!("{}: {}", reg.name, reg.reason)
    } else {
        format!("{} ({}): {}", reg.name, tags.join(", "), reg.reason)
    }
}

fn print_lines(header: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    println!("{header}");
    for line in lines {
        println!("  {line}");
    }
    println!();
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
