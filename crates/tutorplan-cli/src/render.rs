//! Plain-text rendering of plans, summaries and student lists.

use std::fmt::Write as _;

use tutorplan_core::plan::{Mastery, PlanSummary, StudyPlan, summarize_plan};
use tutorplan_core::source::StudentProfile;

/// Minutes as hours with one decimal.
pub fn hours(minutes: u64) -> String {
    format!("{:.1}", minutes as f64 / 60.0)
}

fn mastery_label(m: Mastery) -> &'static str {
    match m {
        Mastery::PriorityGap => "priority gap",
        Mastery::Developing => "developing",
        Mastery::Proficient => "proficient",
        Mastery::Mastered => "mastered",
        Mastery::Unknown => "unknown",
    }
}

/// Printable plan: header, then each week with its blocks.
pub fn render_plan(plan: &StudyPlan) -> String {
    let summary = summarize_plan(plan);
    let mut out = String::new();

    let _ = writeln!(out, "Study plan for {}", plan.owner_id);
    if let Some(name) = &plan.meta.student_name {
        let _ = writeln!(out, "  Student:      {name}");
    }
    let _ = writeln!(
        out,
        "  Generated:    {}",
        plan.meta.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "  Total time:   {} hours (RW {}h, Math {}h)",
        hours(summary.total_minutes.total()),
        hours(summary.total_minutes.rw),
        hours(summary.total_minutes.math),
    );
    let _ = writeln!(
        out,
        "  Weekly cap:   {} minutes",
        plan.meta.cap_per_week_minutes
    );
    let _ = writeln!(out, "  Rules:        {}", plan.meta.rules_version);

    for week in &plan.weeks {
        let items: u64 = week.blocks.iter().map(|b| u64::from(b.practice_items)).sum();
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Week {} ({} topics, {} minutes, {} items)",
            week.week,
            week.blocks.len(),
            week.minutes(),
            items,
        );
        for block in &week.blocks {
            let _ = writeln!(
                out,
                "  [{:<4}] {} ({})",
                block.section.to_string(),
                block.topic,
                mastery_label(block.mastery),
            );
            let _ = writeln!(
                out,
                "         {} min, {} items, retest by {}",
                block.minutes,
                block.practice_items,
                block.due_date.format("%Y-%m-%d"),
            );
            let _ = writeln!(out, "         Goal: {}", block.goal);
            let _ = writeln!(out, "         Resources: {}", block.resource_slugs.join(", "));
        }
    }

    out
}

pub fn render_summary(summary: &PlanSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total time:     {} hours ({} minutes)",
        hours(summary.total_minutes.total()),
        summary.total_minutes.total()
    );
    let _ = writeln!(out, "  RW:           {} minutes", summary.total_minutes.rw);
    let _ = writeln!(out, "  Math:         {} minutes", summary.total_minutes.math);
    let _ = writeln!(out, "Blocks:         {}", summary.total_blocks);
    let _ = writeln!(out, "Practice items: {}", summary.total_practice_items);
    let _ = writeln!(out, "Mastery:");
    for (mastery, count) in &summary.mastery_distribution {
        let _ = writeln!(out, "  {:<14}{count}", mastery.to_string());
    }
    let _ = writeln!(out, "Weeks:");
    for week in &summary.weeks {
        let _ = writeln!(
            out,
            "  Week {:<3} {:>3} blocks  {:>5} minutes",
            week.week, week.blocks, week.minutes
        );
    }
    out
}

pub fn render_students(students: &[StudentProfile]) -> String {
    if students.is_empty() {
        return "No tested students found.\n".to_owned();
    }

    let id_w = students.iter().map(|s| s.id.len()).max().unwrap_or(2).max(2);
    let name_w = students
        .iter()
        .map(|s| s.display_name().chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<id_w$}  {:<name_w$}  RW  MATH  SESSION",
        "ID", "NAME"
    );
    for s in students {
        let _ = writeln!(
            out,
            "{:<id_w$}  {:<name_w$}  {:>2}  {:>4}  {} min",
            s.id,
            s.display_name(),
            s.section_priority.rw,
            s.section_priority.math,
            s.session_length_min,
        );
    }
    out
}
