use anyhow::Result;

use crate::shuttle::{PhaseStatus, ShuttleEngine, TextId, TextProjection};

pub struct ShowCommand {
    pub id: TextId,
    pub json: bool,
}

impl ShowCommand {
    pub async fn execute(&self, engine: &ShuttleEngine) -> Result<()> {
        let projection = engine.projection(self.id).await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&projection)?);
            return Ok(());
        }

        println!("📄 {} - {}", projection.reference, projection.title);
        println!("==========================");
        println!("   🏛️  Location: {}", projection.current_location);
        println!("   🧭 Phase: {} ({})", projection.phase, projection.phase_ordinal);
        println!("   🚌 Shuttles: {}", projection.shuttle_count);
        println!("   📖 Reading: {}", projection.reading_number);
        if projection.urgency {
            println!("   ⚡ Accelerated procedure");
        }
        println!();
        for view in &projection.phases {
            let marker = match view.status {
                PhaseStatus::Completed => "✅",
                PhaseStatus::Active => "▶️ ",
                PhaseStatus::Upcoming => "⏳",
                PhaseStatus::Skipped => "⏭️ ",
            };
            println!("   {} {}", marker, view.phase);
        }

        println!();
        if projection.is_terminal {
            println!("🏁 Procedure closed");
        } else if projection.can_transmit {
            println!("💡 Ready to transmit to the other chamber");
        }
        if projection.can_convene_cmp {
            println!("💡 A joint committee can be convened");
        }
        Ok(())
    }
}

pub struct HistoryCommand {
    pub id: TextId,
    pub json: bool,
}

impl HistoryCommand {
    pub async fn execute(&self, engine: &ShuttleEngine) -> Result<()> {
        let history = engine.history(self.id).await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&history)?);
            return Ok(());
        }

        if history.is_empty() {
            println!("📋 No transitions yet");
            return Ok(());
        }
        for record in &history {
            println!(
                "{:>4}  {}  {:<18} {} → {}",
                record.sequence,
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.command.as_str(),
                record.from,
                record.to
            );
        }
        Ok(())
    }
}

pub struct ListCommand {
    pub json: bool,
}

impl ListCommand {
    pub async fn execute(&self, engine: &ShuttleEngine) -> Result<()> {
        let projections = engine.list().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&projections)?);
            return Ok(());
        }

        if projections.is_empty() {
            println!("📋 No texts tracked yet");
            println!("   💡 Deposit one with: navette create --origin assembly --title '...' --reference '...'");
            return Ok(());
        }
        for projection in &projections {
            println!("{}", summary_line(projection));
        }
        Ok(())
    }
}

fn summary_line(projection: &TextProjection) -> String {
    let urgent = if projection.urgency { " ⚡" } else { "" };
    format!(
        "{}  {:<14} {:<18} shuttles={}{}  {}",
        projection.text_id,
        projection.reference,
        projection.current_location.as_str(),
        projection.shuttle_count,
        urgent,
        projection.title
    )
}
