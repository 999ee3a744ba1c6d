use anyhow::{Context, Result};

use crate::shuttle::{Command, ShuttleEngine, TextId};

/// Any state-changing operator command on one text
pub struct TransitionCommand {
    pub id: TextId,
    pub command: Command,
}

impl TransitionCommand {
    pub fn new(id: TextId, command: Command) -> Self {
        Self { id, command }
    }

    pub async fn execute(&self, engine: &ShuttleEngine) -> Result<()> {
        let before = engine.get_text(self.id).await?.current_location();
        let text = engine
            .execute_with_retry(self.id, self.command.clone())
            .await
            .with_context(|| format!("{} failed for text {}", self.command.kind(), self.id))?;

        println!("✅ {} {}", text.reference(), self.command.kind());
        println!("   {} → {}", before, text.current_location());
        println!(
            "   🚌 shuttles: {}   📖 reading: {}",
            text.shuttle_count(),
            text.reading_number()
        );
        Ok(())
    }
}
