//! Text rendering of upgrade failure reports.

use bastion_core::{FailureReport, FailureSeverity, RefundTier, ResourceKind};

/// Renders the message shown to the player when an upgrade fails.
pub(crate) fn render_failure(report: &FailureReport) -> String {
    let worker = report.worker.get();
    let turret = report.turret.get();
    let mut message = match report.severity {
        FailureSeverity::Minor => {
            format!("Worker {worker} failed to upgrade turret {turret}.")
        }
        FailureSeverity::Major => format!(
            "Worker {worker} botched the upgrade of turret {turret}, dealing {:.0} damage.",
            report.damage
        ),
    };

    if let Some(loss) = loss_phrase(report.tier) {
        message.push(' ');
        message.push_str(loss);
    }

    if !report.refunded.is_empty() {
        let recovered = report
            .refunded
            .iter()
            .map(|stack| format!("{} {}", stack.quantity, kind_label(stack.kind)))
            .collect::<Vec<_>>()
            .join(", ");
        message.push_str(&format!(" Recovered {recovered}."));
    }

    message
}

fn loss_phrase(tier: RefundTier) -> Option<&'static str> {
    match tier {
        RefundTier::NoLoss => None,
        RefundTier::SmallLoss => Some("Some of the materials were lost."),
        RefundTier::MediumLoss => Some("Many of the materials were lost."),
        RefundTier::HighLoss => Some("Most of the materials were lost."),
        RefundTier::None => Some("All of the materials were lost."),
    }
}

/// Human readable name of a resource kind.
pub(crate) fn kind_label(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Steel => "steel",
        ResourceKind::Plasteel => "plasteel",
        ResourceKind::Components => "components",
        ResourceKind::AdvancedComponents => "advanced components",
        ResourceKind::Uranium => "uranium",
        ResourceKind::Silver => "silver",
        ResourceKind::Wood => "wood",
    }
}
