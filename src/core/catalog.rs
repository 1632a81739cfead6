//! Static seed catalog of documents

use std::sync::OnceLock;

use super::document::{Document, Section, StatusRow};

static CATALOG: OnceLock<Vec<Document>> = OnceLock::new();

/// The static document catalog. Never mutate through this; use [`seed_documents`].
pub fn catalog() -> &'static [Document] {
    CATALOG.get_or_init(build_catalog)
}

/// Deep copy of the catalog, safe to mutate
pub fn seed_documents() -> Vec<Document> {
    catalog().to_vec()
}

fn build_catalog() -> Vec<Document> {
    vec![Document {
        id: "launch-plan".to_string(),
        title: "Horizon v2.0 \u{2014} Launch Plan".to_string(),
        last_edited: "Today, 8:15 AM".to_string(),
        icon: "\u{1F4C4}".to_string(),
        sections: vec![
            Section::heading("overview", "Launch Overview"),
            Section::paragraph(
                "intro",
                "This document outlines the launch plan for Horizon v2.0. The release includes a major \
                 dashboard redesign, new API endpoints, and an updated onboarding flow. All teams have \
                 been aligned on the timeline below.",
            ),
            Section::status_table(
                "status-table",
                vec![
                    StatusRow::new("Engineering", "Ready", "status-ready"),
                    StatusRow::new("Customer", "Notified", "status-notified"),
                    StatusRow::new("Launch Time", "10:00 AM", ""),
                    StatusRow::new("Final System Check", "Pending", "status-pending"),
                ],
            ),
            Section::heading("timeline", "Timeline"),
            Section::list(
                "timeline-details",
                &[
                    "8:00 AM \u{2014} Team standup & final checklist review",
                    "8:30 AM \u{2014} Staging environment verification",
                    "9:00 AM \u{2014} Go/no-go decision with engineering lead",
                    "9:30 AM \u{2014} Marketing assets go live (blog post, email blast)",
                    "10:00 AM \u{2014} Production deploy & feature flag flip",
                    "10:15 AM \u{2014} Smoke tests on production",
                    "10:30 AM \u{2014} All-hands announcement in #general",
                ],
            ),
            Section::heading("rollback", "Rollback Plan"),
            Section::paragraph(
                "rollback-details",
                "If critical issues are detected within the first 30 minutes post-launch, we will revert \
                 via feature flag (instant) and roll back the database migration if needed (estimated 5 \
                 minutes). Alex Rivera is the designated rollback owner.",
            ),
            Section::heading("stakeholders", "Stakeholders"),
            Section::list(
                "stakeholder-list",
                &[
                    "Sarah Chen \u{2014} Engineering Manager (launch coordinator)",
                    "Alex Rivera \u{2014} Senior Engineer (tech lead & rollback owner)",
                    "Jordan Kim \u{2014} Product Designer (dashboard & onboarding UX)",
                    "Priya Patel \u{2014} VP of Product (executive sponsor)",
                    "Marketing Team \u{2014} Press release & customer communications",
                ],
            ),
            Section::heading("notes", "Notes"),
            Section::paragraph(
                "notes-content",
                "Please flag any blockers in #horizon-launch immediately. The go/no-go call at 9:00 AM \
                 is the last checkpoint before we commit to the 10:00 AM deploy.",
            ),
        ],
    }]
}
