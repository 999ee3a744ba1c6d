use anyhow::Result;

use crate::shuttle::{Chamber, ShuttleEngine};

pub struct CreateCommand {
    pub origin: Chamber,
    pub title: String,
    pub reference: String,
    pub urgent: bool,
}

impl CreateCommand {
    pub fn new(origin: Chamber, title: String, reference: String) -> Self {
        Self {
            origin,
            title,
            reference,
            urgent: false,
        }
    }

    pub fn with_urgency(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }

    pub async fn execute(&self, engine: &ShuttleEngine) -> Result<()> {
        let text = engine
            .create(self.origin, &self.title, &self.reference, self.urgent)
            .await?;

        println!("📥 Text deposited");
        println!("   🆔 {}", text.id());
        println!("   📄 {} - {}", text.reference(), text.title());
        println!("   🏛️  {}", text.current_location());
        if text.urgency() {
            println!("   ⚡ Accelerated procedure");
        }
        Ok(())
    }
}
