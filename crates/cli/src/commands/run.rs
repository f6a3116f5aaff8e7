use std::io::{self, Write};

use stockroom_agent::runtime::AgentError;
use stockroom_core::config::{AppConfig, LoadOptions};
use stockroom_core::errors::ApplicationError;
use stockroom_core::{should_list_inventory, FinalSummary, InventoryRecord};
use stockroom_db::InventoryRepository;
use tracing::{error, info};

use crate::bootstrap::{bootstrap_with_config, Application};
use crate::commands::CommandResult;
use crate::logging::init_logging;

/// Everything printed for one completed intent.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub intent: String,
    pub summary: FinalSummary,
    pub inventory: Option<Vec<InventoryRecord>>,
}

impl RunReport {
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("RUN Initiated: {}", self.intent),
            format!(
                "Summary ({}): {}",
                self.summary.classification.as_str(),
                self.summary.summary
            ),
        ];

        if let Some(records) = &self.inventory {
            lines.push(String::new());
            lines.push("Current Inventory:".to_string());
            lines.extend(records.iter().map(InventoryRecord::listing_line));
        }

        lines.join("\n")
    }
}

pub fn run(intent: &str) -> CommandResult {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "run",
                &ApplicationError::Configuration(error.to_string()),
            );
        }
    };
    init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "run",
                &ApplicationError::Runtime(format!("failed to initialize async runtime: {error}")),
            );
        }
    };

    let result = runtime.block_on(async {
        let app = bootstrap_with_config(config).await.map_err(ApplicationError::from)?;
        let report = announce_and_execute(&app, intent, &mut io::stdout()).await;
        app.db_pool.close().await;
        report
    });

    match result {
        Ok(report) => CommandResult::success(report.render()),
        Err(error) => {
            error!(
                event_name = "cli.run.failed",
                correlation_id = "cli",
                error_class = error.error_class(),
                error = %error,
                "intent could not be completed"
            );
            CommandResult::failure("run", &error)
        }
    }
}

/// Writes the store-origin line before the run starts, so it is shown even
/// when the intent fails.
pub async fn announce_and_execute<W: Write>(
    app: &Application,
    intent: &str,
    out: &mut W,
) -> Result<RunReport, ApplicationError> {
    writeln!(out, "{}", app.store_origin)
        .and_then(|()| out.flush())
        .map_err(|error| ApplicationError::Runtime(format!("failed to write output: {error}")))?;
    execute(app, intent).await
}

/// Runs one intent through the agent and lists the store when the summary asks for it.
pub async fn execute(app: &Application, intent: &str) -> Result<RunReport, ApplicationError> {
    info!(
        event_name = "cli.run.started",
        correlation_id = "cli",
        store_origin = %app.store_origin,
        "running intent"
    );

    let summary = app.agent_runtime.run(intent).await.map_err(|error| match error {
        AgentError::Collaborator(source) => ApplicationError::Collaborator(source.to_string()),
        budget @ AgentError::BudgetExhausted { .. } => {
            ApplicationError::Runtime(budget.to_string())
        }
    })?;

    let inventory = if should_list_inventory(&summary) {
        let records = app
            .store
            .list_all()
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        Some(records)
    } else {
        None
    };

    Ok(RunReport { intent: intent.to_string(), summary, inventory })
}

#[cfg(test)]
mod tests {
    use stockroom_core::{Classification, FinalSummary, InventoryRecord, ItemId};

    use super::RunReport;

    fn record(id: i64, name: &str, quantity: i64) -> InventoryRecord {
        InventoryRecord { id: ItemId(id), name: name.to_string(), quantity }
    }

    #[test]
    fn inventory_report_ends_with_listing() {
        let report = RunReport {
            intent: "show me everything".to_string(),
            summary: FinalSummary::new(Classification::IsInventory, "Two items in stock."),
            inventory: Some(vec![record(1, "Bolt", 10), record(3, "Nut", -2)]),
        };

        assert_eq!(
            report.render(),
            "RUN Initiated: show me everything\n\
             Summary (is_inventory): Two items in stock.\n\
             \n\
             Current Inventory:\n\
             ID: 1, Name: Bolt, Quantity: 10\n\
             ID: 3, Name: Nut, Quantity: -2"
        );
    }

    #[test]
    fn non_inventory_report_has_no_listing() {
        let report = RunReport {
            intent: "what is the weather".to_string(),
            summary: FinalSummary::new(Classification::NotInventory, "I only manage inventory."),
            inventory: None,
        };

        let rendered = report.render();
        assert!(rendered.ends_with("Summary (not_inventory): I only manage inventory."));
        assert!(!rendered.contains("Current Inventory:"));
    }

    #[test]
    fn empty_inventory_still_prints_header() {
        let report = RunReport {
            intent: "list".to_string(),
            summary: FinalSummary::new(Classification::IsInventory, "Nothing stored."),
            inventory: Some(Vec::new()),
        };

        assert!(report.render().ends_with("\nCurrent Inventory:"));
    }
}
